//! Typed component registry.
//!
//! Every capability slot has its own table mapping a configuration `kind` to a
//! factory. Building a manager instantiates every configured slot up front, so
//! an unknown kind or bad params fails before any stage runs.
use crate::components::filters::{RedundancyFilter, RetainRelationsFilter, RootAnchoredFilter};
use crate::components::json_mapping::{JsonMappingLoader, JsonMappingRenderer};
use crate::components::json_tree::{JsonTreeLoader, JsonTreeRenderer};
use crate::components::matcher::ConceptSubsumptionMatcher;
use crate::components::plain_mapping::{PlainMappingLoader, PlainMappingRenderer};
use crate::components::preprocess::LabelConceptPreprocessor;
use crate::components::tab_tree::{TabTreeLoader, TabTreeRenderer};
use crate::components::word_list::{WordListLoader, WordListRenderer};
use crate::components::{
    ContextLoader, ContextRenderer, MappingFilter, MappingLoader, MappingRenderer, Matcher,
    Preprocessor,
};
use crate::config::{ComponentParams, ComponentSpec, ComponentsConfig};
use crate::manager::MatchManager;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;

pub type Factory<T> = fn(&ComponentParams) -> Result<Box<T>>;

/// Factories for one capability slot, keyed by component kind.
pub struct FactoryTable<T: ?Sized> {
    slot: &'static str,
    factories: BTreeMap<&'static str, Factory<T>>,
}

impl<T: ?Sized> FactoryTable<T> {
    fn new(slot: &'static str) -> Self {
        FactoryTable {
            slot,
            factories: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, kind: &'static str, factory: Factory<T>) {
        self.factories.insert(kind, factory);
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    fn build(&self, spec: Option<&ComponentSpec>) -> Result<Option<Box<T>>> {
        let Some(spec) = spec else {
            return Ok(None);
        };
        let factory = self.factories.get(spec.kind.as_str()).ok_or_else(|| {
            anyhow!(
                "unknown {} kind {:?} (known: {})",
                self.slot,
                spec.kind,
                self.kinds().join(", ")
            )
        })?;
        let component = factory(&spec.params)
            .with_context(|| format!("build {} {:?}", self.slot, spec.kind))?;
        tracing::debug!(slot = self.slot, kind = %spec.kind, "component ready");
        Ok(Some(component))
    }
}

pub struct ComponentRegistry {
    pub context_loaders: FactoryTable<dyn ContextLoader>,
    pub context_renderers: FactoryTable<dyn ContextRenderer>,
    pub mapping_loaders: FactoryTable<dyn MappingLoader>,
    pub mapping_renderers: FactoryTable<dyn MappingRenderer>,
    pub preprocessors: FactoryTable<dyn Preprocessor>,
    pub matchers: FactoryTable<dyn Matcher>,
    pub filters: FactoryTable<dyn MappingFilter>,
}

impl ComponentRegistry {
    pub fn empty() -> Self {
        ComponentRegistry {
            context_loaders: FactoryTable::new("context_loader"),
            context_renderers: FactoryTable::new("context_renderer"),
            mapping_loaders: FactoryTable::new("mapping_loader"),
            mapping_renderers: FactoryTable::new("mapping_renderer"),
            preprocessors: FactoryTable::new("preprocessor"),
            matchers: FactoryTable::new("matcher"),
            filters: FactoryTable::new("filter"),
        }
    }

    /// Registry with every component shipped in this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.context_loaders.register("tab-tree", tab_tree_loader);
        registry.context_loaders.register("json-tree", json_tree_loader);
        registry.context_loaders.register("word-list", word_list_loader);
        registry.context_renderers.register("tab-tree", tab_tree_renderer);
        registry.context_renderers.register("json-tree", json_tree_renderer);
        registry.context_renderers.register("word-list", word_list_renderer);
        registry.mapping_loaders.register("plain-mapping", plain_mapping_loader);
        registry.mapping_loaders.register("json-mapping", json_mapping_loader);
        registry.mapping_renderers.register("plain-mapping", plain_mapping_renderer);
        registry.mapping_renderers.register("json-mapping", json_mapping_renderer);
        registry.preprocessors.register("label-concepts", label_concepts);
        registry.matchers.register("concept-subsumption", concept_subsumption);
        registry.filters.register("redundancy", redundancy_filter);
        registry.filters.register("root-anchored", root_anchored_filter);
        registry.filters.register("retain-relations", retain_relations_filter);
        registry
    }

    /// Instantiate every configured component; any failure aborts the whole build.
    pub fn build(&self, components: &ComponentsConfig) -> Result<MatchManager> {
        let mut builder = MatchManager::builder();
        if let Some(loader) = self.context_loaders.build(components.context_loader.as_ref())? {
            builder = builder.context_loader(loader);
        }
        if let Some(renderer) = self
            .context_renderers
            .build(components.context_renderer.as_ref())?
        {
            builder = builder.context_renderer(renderer);
        }
        if let Some(loader) = self.mapping_loaders.build(components.mapping_loader.as_ref())? {
            builder = builder.mapping_loader(loader);
        }
        if let Some(renderer) = self
            .mapping_renderers
            .build(components.mapping_renderer.as_ref())?
        {
            builder = builder.mapping_renderer(renderer);
        }
        if let Some(preprocessor) = self.preprocessors.build(components.preprocessor.as_ref())? {
            builder = builder.preprocessor(preprocessor);
        }
        if let Some(matcher) = self.matchers.build(components.matcher.as_ref())? {
            builder = builder.matcher(matcher);
        }
        if let Some(filter) = self.filters.build(components.filter.as_ref())? {
            builder = builder.filter(filter);
        }
        Ok(builder.build())
    }
}

fn tab_tree_loader(params: &ComponentParams) -> Result<Box<dyn ContextLoader>> {
    Ok(Box::new(TabTreeLoader::from_params(params)?))
}

fn json_tree_loader(params: &ComponentParams) -> Result<Box<dyn ContextLoader>> {
    Ok(Box::new(JsonTreeLoader::from_params(params)?))
}

fn word_list_loader(params: &ComponentParams) -> Result<Box<dyn ContextLoader>> {
    Ok(Box::new(WordListLoader::from_params(params)?))
}

fn tab_tree_renderer(params: &ComponentParams) -> Result<Box<dyn ContextRenderer>> {
    Ok(Box::new(TabTreeRenderer::from_params(params)?))
}

fn json_tree_renderer(params: &ComponentParams) -> Result<Box<dyn ContextRenderer>> {
    Ok(Box::new(JsonTreeRenderer::from_params(params)?))
}

fn word_list_renderer(params: &ComponentParams) -> Result<Box<dyn ContextRenderer>> {
    Ok(Box::new(WordListRenderer::from_params(params)?))
}

fn plain_mapping_loader(params: &ComponentParams) -> Result<Box<dyn MappingLoader>> {
    Ok(Box::new(PlainMappingLoader::from_params(params)?))
}

fn json_mapping_loader(params: &ComponentParams) -> Result<Box<dyn MappingLoader>> {
    Ok(Box::new(JsonMappingLoader::from_params(params)?))
}

fn plain_mapping_renderer(params: &ComponentParams) -> Result<Box<dyn MappingRenderer>> {
    Ok(Box::new(PlainMappingRenderer::from_params(params)?))
}

fn json_mapping_renderer(params: &ComponentParams) -> Result<Box<dyn MappingRenderer>> {
    Ok(Box::new(JsonMappingRenderer::from_params(params)?))
}

fn label_concepts(params: &ComponentParams) -> Result<Box<dyn Preprocessor>> {
    Ok(Box::new(LabelConceptPreprocessor::from_params(params)?))
}

fn concept_subsumption(params: &ComponentParams) -> Result<Box<dyn Matcher>> {
    Ok(Box::new(ConceptSubsumptionMatcher::from_params(params)?))
}

fn redundancy_filter(params: &ComponentParams) -> Result<Box<dyn MappingFilter>> {
    Ok(Box::new(RedundancyFilter::from_params(params)?))
}

fn root_anchored_filter(params: &ComponentParams) -> Result<Box<dyn MappingFilter>> {
    Ok(Box::new(RootAnchoredFilter::from_params(params)?))
}

fn retain_relations_filter(params: &ComponentParams) -> Result<Box<dyn MappingFilter>> {
    Ok(Box::new(RetainRelationsFilter::from_params(params)?))
}
