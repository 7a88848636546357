use super::Matcher;
use crate::config::ComponentParams;
use crate::data::{Context, Mapping, NodeId, Relation};
use anyhow::{anyhow, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Relates nodes by comparing their concepts in context.
///
/// A node's concept in context is the conjunction of the concepts on its path,
/// so more tokens means a more specific node: a strict superset is less general,
/// a strict subset is more general, equal sets are equivalent. Pairs that fall
/// in none of these cases get no element.
#[derive(Debug, Default)]
pub struct ConceptSubsumptionMatcher;

impl ConceptSubsumptionMatcher {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(ConceptSubsumptionMatcher)
    }
}

impl Matcher for ConceptSubsumptionMatcher {
    fn compute(&self, source: Arc<Context>, target: Arc<Context>) -> Result<Mapping> {
        let start = Instant::now();
        let source_concepts = concepts_in_context(&source, "source")?;
        let target_concepts = concepts_in_context(&target, "target")?;
        let mut mapping = Mapping::new(source, target);
        for (source_id, source_concept) in &source_concepts {
            for (target_id, target_concept) in &target_concepts {
                if let Some(relation) = compare(source_concept, target_concept) {
                    mapping.insert(*source_id, *target_id, relation);
                }
            }
        }
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis(),
            elements = mapping.len(),
            "concept matching complete"
        );
        Ok(mapping)
    }
}

fn concepts_in_context(context: &Context, side: &str) -> Result<Vec<(NodeId, BTreeSet<String>)>> {
    if context.root().is_none() {
        return Err(anyhow!("{side} context is empty"));
    }
    context
        .preorder()
        .into_iter()
        .map(|id| {
            context
                .path_concept(id)
                .map(|concept| (id, concept))
                .ok_or_else(|| {
                    anyhow!(
                        "{side} node {:?} has no concept (run offline preprocessing first)",
                        context.path(id).join("/")
                    )
                })
        })
        .collect()
}

fn compare(source: &BTreeSet<String>, target: &BTreeSet<String>) -> Option<Relation> {
    if source == target {
        Some(Relation::Equivalent)
    } else if source.is_superset(target) {
        Some(Relation::LessGeneral)
    } else if source.is_subset(target) {
        Some(Relation::MoreGeneral)
    } else {
        None
    }
}
