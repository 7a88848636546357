//! The match manager: a set of optional pipeline capabilities.
//!
//! Each capability is present or absent independently of the others, so callers
//! check the [`CapabilitySet`] before starting a recipe instead of discovering a
//! missing stage halfway through.
use crate::components::{
    ContextLoader, ContextRenderer, MappingFilter, MappingLoader, MappingRenderer, Matcher,
    Preprocessor,
};
use crate::config::{load_config, ConfigLocator, Overrides};
use crate::data::{Context, Mapping};
use crate::error::SmatchError;
use crate::registry::ComponentRegistry;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    LoadContext,
    RenderContext,
    LoadMapping,
    RenderMapping,
    Preprocess,
    Match,
    Filter,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::LoadContext,
        Capability::RenderContext,
        Capability::LoadMapping,
        Capability::RenderMapping,
        Capability::Preprocess,
        Capability::Match,
        Capability::Filter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::LoadContext => "load context",
            Capability::RenderContext => "render context",
            Capability::LoadMapping => "load mapping",
            Capability::RenderMapping => "render mapping",
            Capability::Preprocess => "offline preprocess",
            Capability::Match => "online match",
            Capability::Filter => "filter mapping",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a recipe needs from the manager before it may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Present(Capability),
    /// A context loader that keeps the full tree shape.
    StructuredLoading,
    /// A context renderer that keeps the full tree shape.
    StructuredRendering,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Present(capability) => write!(f, "{capability}"),
            Requirement::StructuredLoading => f.write_str("structured context loading"),
            Requirement::StructuredRendering => f.write_str("structured context rendering"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    present: BTreeSet<Capability>,
    structured_loading: bool,
    structured_rendering: bool,
}

impl CapabilitySet {
    pub fn has(&self, capability: Capability) -> bool {
        self.present.contains(&capability)
    }

    pub fn structured_loading(&self) -> bool {
        self.structured_loading
    }

    pub fn structured_rendering(&self) -> bool {
        self.structured_rendering
    }

    pub fn satisfies(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::Present(capability) => self.has(capability),
            Requirement::StructuredLoading => self.structured_loading,
            Requirement::StructuredRendering => self.structured_rendering,
        }
    }

    pub fn missing(&self, requirements: &[Requirement]) -> Vec<Requirement> {
        requirements
            .iter()
            .copied()
            .filter(|requirement| !self.satisfies(*requirement))
            .collect()
    }
}

#[derive(Default)]
pub struct MatchManager {
    context_loader: Option<Box<dyn ContextLoader>>,
    context_renderer: Option<Box<dyn ContextRenderer>>,
    mapping_loader: Option<Box<dyn MappingLoader>>,
    mapping_renderer: Option<Box<dyn MappingRenderer>>,
    preprocessor: Option<Box<dyn Preprocessor>>,
    matcher: Option<Box<dyn Matcher>>,
    filter: Option<Box<dyn MappingFilter>>,
}

impl fmt::Debug for MatchManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchManager")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

impl MatchManager {
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::default()
    }

    pub fn capabilities(&self) -> CapabilitySet {
        let mut present = BTreeSet::new();
        let slots = [
            (Capability::LoadContext, self.context_loader.is_some()),
            (Capability::RenderContext, self.context_renderer.is_some()),
            (Capability::LoadMapping, self.mapping_loader.is_some()),
            (Capability::RenderMapping, self.mapping_renderer.is_some()),
            (Capability::Preprocess, self.preprocessor.is_some()),
            (Capability::Match, self.matcher.is_some()),
            (Capability::Filter, self.filter.is_some()),
        ];
        for (capability, is_present) in slots {
            if is_present {
                present.insert(capability);
            }
        }
        CapabilitySet {
            present,
            structured_loading: self
                .context_loader
                .as_ref()
                .is_some_and(|loader| loader.is_structured()),
            structured_rendering: self
                .context_renderer
                .as_ref()
                .is_some_and(|renderer| renderer.is_structured()),
        }
    }

    /// Check every requirement of `recipe` at once, naming all that are missing.
    pub fn require(&self, recipe: &str, requirements: &[Requirement]) -> Result<(), SmatchError> {
        let missing = self.capabilities().missing(requirements);
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
        Err(SmatchError::unavailable(format!(
            "{recipe} needs {} in the configured manager",
            names.join(" and ")
        )))
    }

    pub fn create_context(&self) -> Context {
        Context::new()
    }

    pub fn load_context(&self, locator: &Path) -> Result<Context, SmatchError> {
        let loader = slot(&self.context_loader, Capability::LoadContext)?;
        let start = Instant::now();
        let context = loader
            .load(locator)
            .map_err(|err| SmatchError::load(locator, err))?;
        tracing::info!(
            path = %locator.display(),
            nodes = context.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "loaded context"
        );
        Ok(context)
    }

    pub fn render_context(&self, context: &Context, locator: &Path) -> Result<(), SmatchError> {
        let renderer = slot(&self.context_renderer, Capability::RenderContext)?;
        renderer
            .render(context, locator)
            .map_err(|err| SmatchError::render(locator, err))?;
        tracing::info!(path = %locator.display(), nodes = context.len(), "rendered context");
        Ok(())
    }

    pub fn load_mapping(
        &self,
        source: &Context,
        target: &Context,
        locator: &Path,
    ) -> Result<Mapping, SmatchError> {
        let loader = slot(&self.mapping_loader, Capability::LoadMapping)?;
        let mapping = loader
            .load(Arc::new(source.clone()), Arc::new(target.clone()), locator)
            .map_err(|err| SmatchError::load(locator, err))?;
        tracing::info!(path = %locator.display(), elements = mapping.len(), "loaded mapping");
        Ok(mapping)
    }

    pub fn render_mapping(&self, mapping: &Mapping, locator: &Path) -> Result<(), SmatchError> {
        let renderer = slot(&self.mapping_renderer, Capability::RenderMapping)?;
        renderer
            .render(mapping, locator)
            .map_err(|err| SmatchError::render(locator, err))?;
        tracing::info!(path = %locator.display(), elements = mapping.len(), "rendered mapping");
        Ok(())
    }

    /// Enrich `context` with concepts in place. Running it twice is not guarded.
    pub fn offline(&self, context: &mut Context) -> Result<(), SmatchError> {
        let preprocessor = slot(&self.preprocessor, Capability::Preprocess)?;
        let start = Instant::now();
        preprocessor
            .preprocess(context)
            .map_err(|cause| SmatchError::Processing { cause })?;
        tracing::info!(
            nodes = context.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "offline preprocessing complete"
        );
        Ok(())
    }

    pub fn online(&self, source: &Context, target: &Context) -> Result<Mapping, SmatchError> {
        let matcher = slot(&self.matcher, Capability::Match)?;
        let start = Instant::now();
        let mapping = matcher
            .compute(Arc::new(source.clone()), Arc::new(target.clone()))
            .map_err(|cause| SmatchError::Matching { cause })?;
        tracing::info!(
            elements = mapping.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "online matching complete"
        );
        Ok(mapping)
    }

    pub fn filter_mapping(&self, mapping: &Mapping) -> Result<Mapping, SmatchError> {
        let filter = slot(&self.filter, Capability::Filter)?;
        let filtered = filter
            .filter(mapping)
            .map_err(|cause| SmatchError::Filter { cause })?;
        tracing::info!(
            before = mapping.len(),
            after = filtered.len(),
            "filtered mapping"
        );
        Ok(filtered)
    }

    /// Preprocess both contexts, then match them.
    pub fn match_contexts(
        &self,
        source: &mut Context,
        target: &mut Context,
    ) -> Result<Mapping, SmatchError> {
        self.offline(source)?;
        self.offline(target)?;
        self.online(source, target)
    }
}

fn slot<T: ?Sized>(component: &Option<Box<T>>, capability: Capability) -> Result<&T, SmatchError> {
    component
        .as_deref()
        .ok_or_else(|| SmatchError::unavailable(format!("no component configured to {capability}")))
}

#[derive(Default)]
pub struct ManagerBuilder {
    manager: MatchManager,
}

impl ManagerBuilder {
    pub fn context_loader(mut self, loader: Box<dyn ContextLoader>) -> Self {
        self.manager.context_loader = Some(loader);
        self
    }

    pub fn context_renderer(mut self, renderer: Box<dyn ContextRenderer>) -> Self {
        self.manager.context_renderer = Some(renderer);
        self
    }

    pub fn mapping_loader(mut self, loader: Box<dyn MappingLoader>) -> Self {
        self.manager.mapping_loader = Some(loader);
        self
    }

    pub fn mapping_renderer(mut self, renderer: Box<dyn MappingRenderer>) -> Self {
        self.manager.mapping_renderer = Some(renderer);
        self
    }

    pub fn preprocessor(mut self, preprocessor: Box<dyn Preprocessor>) -> Self {
        self.manager.preprocessor = Some(preprocessor);
        self
    }

    pub fn matcher(mut self, matcher: Box<dyn Matcher>) -> Self {
        self.manager.matcher = Some(matcher);
        self
    }

    pub fn filter(mut self, filter: Box<dyn MappingFilter>) -> Self {
        self.manager.filter = Some(filter);
        self
    }

    pub fn build(self) -> MatchManager {
        self.manager
    }
}

/// Resolves a fresh manager for one command execution.
pub trait ManagerFactory {
    fn resolve(
        &self,
        locator: &ConfigLocator,
        overrides: &Overrides,
    ) -> Result<MatchManager, SmatchError>;
}

/// Factory that reads a JSON configuration and builds it with a registry.
pub struct ConfiguredFactory {
    registry: ComponentRegistry,
}

impl ConfiguredFactory {
    pub fn new(registry: ComponentRegistry) -> Self {
        ConfiguredFactory { registry }
    }
}

impl ManagerFactory for ConfiguredFactory {
    fn resolve(
        &self,
        locator: &ConfigLocator,
        overrides: &Overrides,
    ) -> Result<MatchManager, SmatchError> {
        let config = load_config(locator, overrides)?;
        let manager = self
            .registry
            .build(&config.components)
            .map_err(|err| SmatchError::configuration(locator, err))?;
        tracing::debug!(capabilities = ?manager.capabilities(), "manager resolved");
        Ok(manager)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
