//! Mapping filters. Every filter returns a subset of its input.
use super::MappingFilter;
use crate::config::ComponentParams;
use crate::data::{Context, Mapping, MappingElement, NodeId, Relation};
use anyhow::{anyhow, Result};
use std::collections::{BTreeSet, HashMap};

/// Drops elements entailed by another element through the tree order.
///
/// Deeper nodes are more specific than their ancestors, so `s < t` follows from
/// `s' <= t` for an ancestor `s'` of `s`, or from `s <= t'` for a descendant `t'`
/// of `t`; the other relations follow the mirrored rules. What remains is the
/// minimal mapping.
#[derive(Debug, Default)]
pub struct RedundancyFilter;

impl RedundancyFilter {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(RedundancyFilter)
    }
}

impl MappingFilter for RedundancyFilter {
    fn filter(&self, mapping: &Mapping) -> Result<Mapping> {
        let index = RelationIndex::new(mapping);
        let mut filtered = mapping.clone();
        filtered.retain(|element| !index.is_redundant(element));
        tracing::debug!(
            before = mapping.len(),
            after = filtered.len(),
            "redundancy filter applied"
        );
        Ok(filtered)
    }
}

/// Preorder entry and exit positions per node; `a` is a proper ancestor of `d`
/// exactly when `d` enters strictly inside `a`'s span.
struct Spans {
    enter: Vec<usize>,
    exit: Vec<usize>,
}

impl Spans {
    fn new(context: &Context) -> Self {
        let order = context.preorder();
        let mut enter = vec![0; context.len()];
        for (position, &id) in order.iter().enumerate() {
            enter[id] = position;
        }
        let mut size = vec![1; context.len()];
        for &id in order.iter().rev() {
            if let Some(parent) = context.node(id).parent {
                size[parent] += size[id];
            }
        }
        let exit = enter.iter().zip(&size).map(|(start, len)| start + len).collect();
        Spans { enter, exit }
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.enter[ancestor] < self.enter[id] && self.enter[id] < self.exit[ancestor]
    }
}

/// Lookup tables over one mapping for the entailment checks.
struct RelationIndex<'a> {
    mapping: &'a Mapping,
    by_source: HashMap<NodeId, Vec<(NodeId, Relation)>>,
    by_target: HashMap<NodeId, Vec<(NodeId, Relation)>>,
    source_spans: Spans,
    target_spans: Spans,
}

impl<'a> RelationIndex<'a> {
    fn new(mapping: &'a Mapping) -> Self {
        let mut by_source: HashMap<NodeId, Vec<(NodeId, Relation)>> = HashMap::new();
        let mut by_target: HashMap<NodeId, Vec<(NodeId, Relation)>> = HashMap::new();
        for element in mapping.elements() {
            by_source
                .entry(element.source)
                .or_default()
                .push((element.target, element.relation));
            by_target
                .entry(element.target)
                .or_default()
                .push((element.source, element.relation));
        }
        RelationIndex {
            mapping,
            by_source,
            by_target,
            source_spans: Spans::new(mapping.source()),
            target_spans: Spans::new(mapping.target()),
        }
    }

    fn holds(&self, s: NodeId, t: NodeId, accepted: &[Relation]) -> bool {
        self.mapping
            .relation(s, t)
            .is_some_and(|relation| accepted.contains(&relation))
    }

    /// Some descendant of `s` relates to `t` with an accepted relation.
    fn source_descendant_holds(&self, s: NodeId, t: NodeId, accepted: &[Relation]) -> bool {
        self.by_target.get(&t).is_some_and(|related| {
            related.iter().any(|&(other, relation)| {
                accepted.contains(&relation) && self.source_spans.is_ancestor(s, other)
            })
        })
    }

    /// `s` relates to some descendant of `t` with an accepted relation.
    fn target_descendant_holds(&self, s: NodeId, t: NodeId, accepted: &[Relation]) -> bool {
        self.by_source.get(&s).is_some_and(|related| {
            related.iter().any(|&(other, relation)| {
                accepted.contains(&relation) && self.target_spans.is_ancestor(t, other)
            })
        })
    }

    fn is_redundant(&self, element: &MappingElement) -> bool {
        let source = self.mapping.source();
        let target = self.mapping.target();
        let (s, t) = (element.source, element.target);
        match element.relation {
            Relation::LessGeneral => {
                let accepted = [Relation::LessGeneral, Relation::Equivalent];
                source.ancestors(s).any(|up| self.holds(up, t, &accepted))
                    || self.target_descendant_holds(s, t, &accepted)
            }
            Relation::MoreGeneral => {
                let accepted = [Relation::MoreGeneral, Relation::Equivalent];
                target.ancestors(t).any(|up| self.holds(s, up, &accepted))
                    || self.source_descendant_holds(s, t, &accepted)
            }
            Relation::Disjoint => {
                let accepted = [Relation::Disjoint];
                let target_line: Vec<NodeId> =
                    std::iter::once(t).chain(target.ancestors(t)).collect();
                std::iter::once(s).chain(source.ancestors(s)).any(|up_s| {
                    target_line
                        .iter()
                        .any(|&up_t| (up_s, up_t) != (s, t) && self.holds(up_s, up_t, &accepted))
                })
            }
            Relation::Equivalent => false,
        }
    }
}

/// Keeps the elements reachable from a related root pair by descending the two
/// trees together, one or both sides at a time.
///
/// Fails when the roots themselves are unrelated: without that anchor the
/// structure cannot be followed.
#[derive(Debug, Default)]
pub struct RootAnchoredFilter;

impl RootAnchoredFilter {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(RootAnchoredFilter)
    }
}

impl MappingFilter for RootAnchoredFilter {
    fn filter(&self, mapping: &Mapping) -> Result<Mapping> {
        let source = mapping.source();
        let target = mapping.target();
        let (Some(source_root), Some(target_root)) = (source.root(), target.root()) else {
            return Err(anyhow!("both contexts need a root to anchor the mapping"));
        };
        if mapping.relation(source_root, target_root).is_none() {
            return Err(anyhow!(
                "roots {:?} and {:?} are unrelated; nothing anchors the structure",
                source.node(source_root).name,
                target.node(target_root).name
            ));
        }

        let mut ordered: Vec<MappingElement> = mapping.elements().collect();
        ordered.sort_by_key(|element| depth_sum(source, target, element));

        let mut kept: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
        for element in ordered {
            let (s, t) = (element.source, element.target);
            let anchored = (s, t) == (source_root, target_root)
                || parent_pairs(source, target, s, t)
                    .into_iter()
                    .any(|pair| kept.contains(&pair));
            if anchored {
                kept.insert((s, t));
            }
        }

        let mut filtered = mapping.clone();
        filtered.retain(|element| kept.contains(&(element.source, element.target)));
        Ok(filtered)
    }
}

fn depth_sum(source: &Context, target: &Context, element: &MappingElement) -> usize {
    source.depth(element.source) + target.depth(element.target)
}

fn parent_pairs(source: &Context, target: &Context, s: NodeId, t: NodeId) -> Vec<(NodeId, NodeId)> {
    let source_parent = source.node(s).parent;
    let target_parent = target.node(t).parent;
    let mut pairs = Vec::with_capacity(3);
    if let (Some(ps), Some(pt)) = (source_parent, target_parent) {
        pairs.push((ps, pt));
    }
    if let Some(ps) = source_parent {
        pairs.push((ps, t));
    }
    if let Some(pt) = target_parent {
        pairs.push((s, pt));
    }
    pairs
}

/// Keeps only elements carrying one of the configured relations.
#[derive(Debug)]
pub struct RetainRelationsFilter {
    relations: BTreeSet<Relation>,
}

impl RetainRelationsFilter {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&["relations"])?;
        let symbols = params
            .string_list("relations")?
            .ok_or_else(|| anyhow!("param relations is required"))?;
        if symbols.is_empty() {
            return Err(anyhow!("param relations must name at least one relation"));
        }
        let relations = symbols
            .iter()
            .map(|symbol| Relation::from_symbol(symbol))
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(RetainRelationsFilter { relations })
    }
}

impl MappingFilter for RetainRelationsFilter {
    fn filter(&self, mapping: &Mapping) -> Result<Mapping> {
        let mut filtered = mapping.clone();
        filtered.retain(|element| self.relations.contains(&element.relation));
        Ok(filtered)
    }
}

#[cfg(test)]
#[path = "filters_tests.rs"]
mod tests;
