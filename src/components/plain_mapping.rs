//! Plain-text mappings, one element per line:
//! `source\path<TAB>relation<TAB>target\path`.
//!
//! Within a node name `%`, `\`, tab, CR and LF are written as `%25`, `%5C`,
//! `%09`, `%0D` and `%0A`, so every name survives a render and load.
use super::{join_path, split_path, MappingLoader, MappingRenderer};
use crate::config::ComponentParams;
use crate::data::{Context, Mapping, Relation};
use crate::output;
use anyhow::{anyhow, Context as _, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct PlainMappingLoader;

impl PlainMappingLoader {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(PlainMappingLoader)
    }
}

impl MappingLoader for PlainMappingLoader {
    fn load(&self, source: Arc<Context>, target: Arc<Context>, locator: &Path) -> Result<Mapping> {
        let text = fs::read_to_string(locator)
            .with_context(|| format!("read {}", locator.display()))?;
        parse_plain_mapping(&text, source, target)
    }
}

pub fn parse_plain_mapping(
    text: &str,
    source: Arc<Context>,
    target: Arc<Context>,
) -> Result<Mapping> {
    let mut mapping = Mapping::new(source, target);
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [source_path, relation, target_path] = fields.as_slice() else {
            return Err(anyhow!(
                "line {line_no}: expected 3 tab-separated fields, found {}",
                fields.len()
            ));
        };
        let relation =
            Relation::from_symbol(relation).with_context(|| format!("line {line_no}"))?;
        let source_id = mapping
            .source()
            .find_by_path(&split_path(source_path))
            .ok_or_else(|| anyhow!("line {line_no}: source node {source_path:?} not found"))?;
        let target_id = mapping
            .target()
            .find_by_path(&split_path(target_path))
            .ok_or_else(|| anyhow!("line {line_no}: target node {target_path:?} not found"))?;
        mapping.insert(source_id, target_id, relation);
    }
    Ok(mapping)
}

#[derive(Debug, Default)]
pub struct PlainMappingRenderer;

impl PlainMappingRenderer {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(PlainMappingRenderer)
    }
}

impl MappingRenderer for PlainMappingRenderer {
    fn render(&self, mapping: &Mapping, locator: &Path) -> Result<()> {
        output::write_text(locator, &format_plain_mapping(mapping))
    }
}

pub fn format_plain_mapping(mapping: &Mapping) -> String {
    let mut out = String::new();
    for element in mapping.elements() {
        out.push_str(&join_path(&mapping.source().path(element.source)));
        out.push('\t');
        out.push(element.relation.symbol());
        out.push('\t');
        out.push_str(&join_path(&mapping.target().path(element.target)));
        out.push('\n');
    }
    out
}
