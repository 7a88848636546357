//! Offline preprocessing: turn each node label into a concept.
//!
//! A concept is the set of normalized content tokens of the label. The concept of
//! a node in context is the union of its own and its ancestors' concepts, which
//! the matcher computes from these per-node annotations.
use super::Preprocessor;
use crate::config::ComponentParams;
use crate::data::{Concept, Context};
use anyhow::{anyhow, Context as _, Result};
use regex::Regex;
use std::collections::BTreeSet;

pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "for", "in", "of", "on", "or", "the", "to", "with",
];

#[derive(Debug)]
pub struct LabelConceptPreprocessor {
    stop_words: BTreeSet<String>,
    stem_plurals: bool,
    token_pattern: Regex,
}

impl LabelConceptPreprocessor {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&["stop_words", "stem_plurals"])?;
        let stop_words = match params.string_list("stop_words")? {
            Some(words) => words.iter().map(|word| word.to_lowercase()).collect(),
            None => DEFAULT_STOP_WORDS.iter().map(|word| word.to_string()).collect(),
        };
        let stem_plurals = params.bool("stem_plurals")?.unwrap_or(true);
        Ok(LabelConceptPreprocessor {
            stop_words,
            stem_plurals,
            token_pattern: Regex::new(r"[\p{L}\p{N}]+").context("compile token pattern")?,
        })
    }

    pub fn label_concept(&self, label: &str) -> Concept {
        let tokens = self
            .token_pattern
            .find_iter(label)
            .map(|token| token.as_str().to_lowercase())
            .filter(|token| !self.stop_words.contains(token))
            .map(|token| {
                if self.stem_plurals {
                    singular(&token)
                } else {
                    token
                }
            });
        Concept::new(tokens)
    }
}

impl Preprocessor for LabelConceptPreprocessor {
    fn preprocess(&self, context: &mut Context) -> Result<()> {
        if context.root().is_none() {
            return Err(anyhow!("context has no root node"));
        }
        for id in context.preorder() {
            let concept = self.label_concept(&context.node(id).name);
            context.node_mut(id).concept = Some(concept);
        }
        tracing::debug!(nodes = context.len(), "preprocessed context");
        Ok(())
    }
}

fn singular(token: &str) -> String {
    let chars = token.chars().count();
    if chars > 4 && token.ends_with("ies") {
        return format!("{}y", &token[..token.len() - 3]);
    }
    if chars > 3 && token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}
