//! JSON mappings with node paths spelled out as name arrays.
use super::{MappingLoader, MappingRenderer};
use crate::config::ComponentParams;
use crate::data::{Context, Mapping, Relation};
use crate::output;
use anyhow::{anyhow, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct MappingFile {
    elements: Vec<ElementEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ElementEntry {
    source: Vec<String>,
    relation: Relation,
    target: Vec<String>,
}

#[derive(Debug, Default)]
pub struct JsonMappingLoader;

impl JsonMappingLoader {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(JsonMappingLoader)
    }
}

impl MappingLoader for JsonMappingLoader {
    fn load(&self, source: Arc<Context>, target: Arc<Context>, locator: &Path) -> Result<Mapping> {
        let bytes = fs::read(locator).with_context(|| format!("read {}", locator.display()))?;
        let file: MappingFile = serde_json::from_slice(&bytes).context("parse JSON mapping")?;
        let mut mapping = Mapping::new(source, target);
        for (index, entry) in file.elements.iter().enumerate() {
            let source_id = mapping
                .source()
                .find_by_path(&entry.source)
                .ok_or_else(|| {
                    anyhow!("element {index}: source node {:?} not found", entry.source)
                })?;
            let target_id = mapping
                .target()
                .find_by_path(&entry.target)
                .ok_or_else(|| {
                    anyhow!("element {index}: target node {:?} not found", entry.target)
                })?;
            mapping.insert(source_id, target_id, entry.relation);
        }
        Ok(mapping)
    }
}

#[derive(Debug, Default)]
pub struct JsonMappingRenderer;

impl JsonMappingRenderer {
    pub fn from_params(params: &ComponentParams) -> Result<Self> {
        params.expect_only(&[])?;
        Ok(JsonMappingRenderer)
    }
}

impl MappingRenderer for JsonMappingRenderer {
    fn render(&self, mapping: &Mapping, locator: &Path) -> Result<()> {
        let to_owned = |names: Vec<&str>| -> Vec<String> {
            names.into_iter().map(str::to_string).collect()
        };
        let file = MappingFile {
            elements: mapping
                .elements()
                .map(|element| ElementEntry {
                    source: to_owned(mapping.source().path(element.source)),
                    relation: element.relation,
                    target: to_owned(mapping.target().path(element.target)),
                })
                .collect(),
        };
        output::write_json(locator, &file)
    }
}
