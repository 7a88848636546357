//! Nested JSON trees: `{ "root": { "name": ..., "concept": [...], "children": [...] } }`.
use super::{ContextLoader, ContextRenderer};
use crate::config::ComponentParams;
use crate::data::{Concept, Context, NodeId};
use crate::output;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
struct TreeFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root: Option<TreeNode>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TreeNode {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    concept: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode>,
}

#[derive(Debug, Default)]
pub struct JsonTreeLoader;

impl JsonTreeLoader {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(JsonTreeLoader)
    }
}

impl ContextLoader for JsonTreeLoader {
    fn load(&self, locator: &Path) -> Result<Context> {
        let bytes = fs::read(locator).with_context(|| format!("read {}", locator.display()))?;
        let file: TreeFile = serde_json::from_slice(&bytes).context("parse JSON tree")?;
        let mut context = Context::new();
        if let Some(root) = &file.root {
            let id = context.create_root(&root.name);
            attach(&mut context, id, root);
        }
        Ok(context)
    }

    fn is_structured(&self) -> bool {
        true
    }
}

fn attach(context: &mut Context, id: NodeId, node: &TreeNode) {
    context.node_mut(id).concept = node
        .concept
        .as_ref()
        .map(|tokens| Concept::new(tokens.iter().cloned()));
    for child in &node.children {
        let child_id = context.create_child(id, &child.name);
        attach(context, child_id, child);
    }
}

#[derive(Debug, Default)]
pub struct JsonTreeRenderer;

impl JsonTreeRenderer {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(JsonTreeRenderer)
    }
}

impl ContextRenderer for JsonTreeRenderer {
    fn render(&self, context: &Context, locator: &Path) -> Result<()> {
        let file = TreeFile {
            root: context.root().map(|root| to_tree_node(context, root)),
        };
        output::write_json(locator, &file)
    }

    fn is_structured(&self) -> bool {
        true
    }
}

fn to_tree_node(context: &Context, id: NodeId) -> TreeNode {
    let node = context.node(id);
    TreeNode {
        name: node.name.clone(),
        concept: node
            .concept
            .as_ref()
            .map(|concept| concept.tokens.iter().cloned().collect()),
        children: node
            .children
            .iter()
            .map(|&child| to_tree_node(context, child))
            .collect(),
    }
}
