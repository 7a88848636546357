//! Tab-indented tree files.
//!
//! One node per line; the number of leading tabs is the depth. A preprocessed
//! node carries its concept tokens after a further tab, space separated:
//!
//! ```text
//! Top
//! 	Cars	car
//! 		Red cars	red car
//! ```
use super::{ContextLoader, ContextRenderer};
use crate::config::ComponentParams;
use crate::data::{Concept, Context, NodeId};
use crate::output;
use anyhow::{anyhow, Context as _, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Default)]
pub struct TabTreeLoader;

impl TabTreeLoader {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(TabTreeLoader)
    }
}

impl ContextLoader for TabTreeLoader {
    fn load(&self, locator: &Path) -> Result<Context> {
        let text = fs::read_to_string(locator)
            .with_context(|| format!("read {}", locator.display()))?;
        parse_tab_tree(&text)
    }

    fn is_structured(&self) -> bool {
        true
    }
}

pub fn parse_tab_tree(text: &str) -> Result<Context> {
    let mut context = Context::new();
    // stack[d] is the most recent node at depth d
    let mut stack: Vec<NodeId> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let depth = line.chars().take_while(|&ch| ch == '\t').count();
        let body = &line[depth..];
        let (name, concept) = match body.split_once('\t') {
            Some((name, tokens)) => (name, Some(Concept::new(tokens.split_whitespace()))),
            None => (body, None),
        };
        let name = name.trim_end_matches('\r');
        if name.trim().is_empty() {
            return Err(anyhow!("line {line_no}: empty node name"));
        }

        let id = if depth == 0 {
            if context.root().is_some() {
                return Err(anyhow!("line {line_no}: second root {name:?}"));
            }
            context.create_root(name)
        } else {
            if depth > stack.len() {
                return Err(anyhow!(
                    "line {line_no}: indentation jumps to depth {depth} under depth {}",
                    stack.len().saturating_sub(1)
                ));
            }
            let parent = stack[depth - 1];
            context.create_child(parent, name)
        };
        context.node_mut(id).concept = concept;
        stack.truncate(depth);
        stack.push(id);
    }
    Ok(context)
}

#[derive(Debug, Default)]
pub struct TabTreeRenderer;

impl TabTreeRenderer {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(TabTreeRenderer)
    }
}

impl ContextRenderer for TabTreeRenderer {
    fn render(&self, context: &Context, locator: &Path) -> Result<()> {
        let text = format_tab_tree(context)?;
        output::write_text(locator, &text)
    }

    fn is_structured(&self) -> bool {
        true
    }
}

pub fn format_tab_tree(context: &Context) -> Result<String> {
    let mut out = String::new();
    for id in context.preorder() {
        let node = context.node(id);
        if node.name.contains(['\t', '\n']) {
            return Err(anyhow!(
                "node {:?} cannot be written as a tab tree (contains tab or newline)",
                node.name
            ));
        }
        for _ in 0..context.depth(id) {
            out.push('\t');
        }
        out.push_str(&node.name);
        if let Some(concept) = &node.concept {
            out.push('\t');
            let tokens: Vec<&str> = concept.tokens.iter().map(String::as_str).collect();
            out.push_str(&tokens.join(" "));
        }
        out.push('\n');
    }
    Ok(out)
}
