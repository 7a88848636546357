use super::context::{Context, NodeId};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Semantic relation holding between a source node and a target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "=")]
    Equivalent,
    #[serde(rename = ">")]
    MoreGeneral,
    #[serde(rename = "<")]
    LessGeneral,
    #[serde(rename = "!")]
    Disjoint,
}

impl Relation {
    pub fn symbol(&self) -> char {
        match self {
            Relation::Equivalent => '=',
            Relation::MoreGeneral => '>',
            Relation::LessGeneral => '<',
            Relation::Disjoint => '!',
        }
    }

    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol.trim() {
            "=" => Ok(Relation::Equivalent),
            ">" => Ok(Relation::MoreGeneral),
            "<" => Ok(Relation::LessGeneral),
            "!" => Ok(Relation::Disjoint),
            other => Err(anyhow!("unknown relation symbol {other:?}")),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MappingElement {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
}

/// Correspondences between the nodes of two contexts.
///
/// A mapping shares its contexts so filters and renderers can resolve node ids
/// without the caller threading the contexts through every stage. At most one
/// relation is kept per node pair; inserting again replaces it. Elements are
/// keyed by `(source, target)` and iterate in that order.
#[derive(Debug, Clone)]
pub struct Mapping {
    source: Arc<Context>,
    target: Arc<Context>,
    elements: BTreeMap<(NodeId, NodeId), Relation>,
}

impl Mapping {
    pub fn new(source: Arc<Context>, target: Arc<Context>) -> Self {
        Mapping {
            source,
            target,
            elements: BTreeMap::new(),
        }
    }

    /// An empty mapping over the same contexts.
    pub fn empty_like(&self) -> Self {
        Mapping::new(Arc::clone(&self.source), Arc::clone(&self.target))
    }

    pub fn source(&self) -> &Context {
        &self.source
    }

    pub fn target(&self) -> &Context {
        &self.target
    }

    pub fn insert(&mut self, source: NodeId, target: NodeId, relation: Relation) {
        self.elements.insert((source, target), relation);
    }

    pub fn relation(&self, source: NodeId, target: NodeId) -> Option<Relation> {
        self.elements.get(&(source, target)).copied()
    }

    pub fn elements(&self) -> impl Iterator<Item = MappingElement> + '_ {
        self.elements
            .iter()
            .map(|(&(source, target), &relation)| MappingElement {
                source,
                target,
                relation,
            })
    }

    /// True when the element's pair is present with the same relation.
    pub fn contains(&self, element: &MappingElement) -> bool {
        self.relation(element.source, element.target) == Some(element.relation)
    }

    pub fn retain<F: FnMut(&MappingElement) -> bool>(&mut self, mut keep: F) {
        self.elements.retain(|&(source, target), relation| {
            keep(&MappingElement {
                source,
                target,
                relation: *relation,
            })
        });
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_subset_of(&self, other: &Mapping) -> bool {
        self.len() <= other.len() && self.elements().all(|element| other.contains(&element))
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
            && *self.source == *other.source
            && *self.target == *other.target
    }
}
