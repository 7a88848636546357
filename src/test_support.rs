//! Recording fakes for manager and dispatcher tests.
use crate::components::{
    ContextLoader, ContextRenderer, MappingFilter, MappingLoader, MappingRenderer, Matcher,
    Preprocessor,
};
use crate::config::{ConfigLocator, Overrides};
use crate::data::{Concept, Context, Mapping, Relation};
use crate::error::SmatchError;
use crate::manager::{ManagerBuilder, ManagerFactory, MatchManager};
use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

/// Shared log of stage calls plus every mapping handed to the renderer.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<String>>>,
    rendered: Rc<RefCell<Vec<Mapping>>>,
    matched: Rc<RefCell<Vec<Mapping>>>,
}

impl Recorder {
    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn rendered(&self) -> Vec<Mapping> {
        self.rendered.borrow().clone()
    }

    pub fn matched(&self) -> Vec<Mapping> {
        self.matched.borrow().clone()
    }
}

fn stem(locator: &Path) -> String {
    locator
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Loads `<stem>` as a root with children `a` and `b`.
pub struct FakeLoader {
    pub recorder: Recorder,
    pub structured: bool,
}

impl ContextLoader for FakeLoader {
    fn load(&self, locator: &Path) -> Result<Context> {
        let name = stem(locator);
        self.recorder.record(format!("load_context {name}"));
        if name == "missing" {
            return Err(anyhow!("no such resource"));
        }
        let mut context = Context::new();
        let root = context.create_root(name);
        context.create_child(root, "a");
        context.create_child(root, "b");
        Ok(context)
    }

    fn is_structured(&self) -> bool {
        self.structured
    }
}

pub struct FakeContextRenderer {
    pub recorder: Recorder,
    pub structured: bool,
}

impl ContextRenderer for FakeContextRenderer {
    fn render(&self, context: &Context, locator: &Path) -> Result<()> {
        let preprocessed = if context.is_preprocessed() {
            " preprocessed"
        } else {
            ""
        };
        self.recorder
            .record(format!("render_context {}{preprocessed}", stem(locator)));
        Ok(())
    }

    fn is_structured(&self) -> bool {
        self.structured
    }
}

pub struct FakeMappingLoader {
    pub recorder: Recorder,
}

impl MappingLoader for FakeMappingLoader {
    fn load(&self, source: Arc<Context>, target: Arc<Context>, locator: &Path) -> Result<Mapping> {
        self.recorder.record(format!("load_mapping {}", stem(locator)));
        let mut mapping = Mapping::new(source, target);
        mapping.insert(0, 0, Relation::Equivalent);
        mapping.insert(1, 0, Relation::LessGeneral);
        Ok(mapping)
    }
}

pub struct FakeMappingRenderer {
    pub recorder: Recorder,
}

impl MappingRenderer for FakeMappingRenderer {
    fn render(&self, mapping: &Mapping, locator: &Path) -> Result<()> {
        self.recorder
            .record(format!("render_mapping {}", stem(locator)));
        self.recorder.rendered.borrow_mut().push(mapping.clone());
        Ok(())
    }
}

pub struct FakePreprocessor {
    pub recorder: Recorder,
}

impl Preprocessor for FakePreprocessor {
    fn preprocess(&self, context: &mut Context) -> Result<()> {
        let root = context.root().ok_or_else(|| anyhow!("empty context"))?;
        self.recorder
            .record(format!("offline {}", context.node(root).name));
        for id in context.preorder() {
            let name = context.node(id).name.clone();
            context.node_mut(id).concept = Some(Concept::new([name]));
        }
        Ok(())
    }
}

/// Produces roots `=`, `a = a`, and `a < root`.
pub struct FakeMatcher {
    pub recorder: Recorder,
}

impl Matcher for FakeMatcher {
    fn compute(&self, source: Arc<Context>, target: Arc<Context>) -> Result<Mapping> {
        let preprocessed = source.is_preprocessed() && target.is_preprocessed();
        self.recorder.record(format!(
            "online {}{}",
            source.node(0).name,
            if preprocessed { " preprocessed" } else { "" }
        ));
        let mut mapping = Mapping::new(source, target);
        mapping.insert(0, 0, Relation::Equivalent);
        mapping.insert(1, 1, Relation::Equivalent);
        mapping.insert(1, 0, Relation::LessGeneral);
        self.recorder.matched.borrow_mut().push(mapping.clone());
        Ok(mapping)
    }
}

/// Keeps only equivalences, or fails when `fail` is set.
pub struct FakeFilter {
    pub recorder: Recorder,
    pub fail: bool,
}

impl MappingFilter for FakeFilter {
    fn filter(&self, mapping: &Mapping) -> Result<Mapping> {
        self.recorder.record("filter".to_string());
        if self.fail {
            return Err(anyhow!("auxiliary data absent"));
        }
        let mut filtered = mapping.clone();
        filtered.retain(|element| element.relation == Relation::Equivalent);
        Ok(filtered)
    }
}

/// Which fakes to wire into a manager.
#[derive(Clone, Copy)]
pub struct FakeWiring {
    pub structured_loading: bool,
    pub structured_rendering: bool,
    pub mapping_io: bool,
    pub preprocessor: bool,
    pub matcher: bool,
    pub filter: Option<bool>,
}

impl FakeWiring {
    /// Every capability present; the filter succeeds.
    pub fn full() -> Self {
        FakeWiring {
            structured_loading: true,
            structured_rendering: true,
            mapping_io: true,
            preprocessor: true,
            matcher: true,
            filter: Some(false),
        }
    }

    pub fn build(self, recorder: &Recorder) -> MatchManager {
        let mut builder: ManagerBuilder = MatchManager::builder()
            .context_loader(Box::new(FakeLoader {
                recorder: recorder.clone(),
                structured: self.structured_loading,
            }))
            .context_renderer(Box::new(FakeContextRenderer {
                recorder: recorder.clone(),
                structured: self.structured_rendering,
            }));
        if self.mapping_io {
            builder = builder
                .mapping_loader(Box::new(FakeMappingLoader {
                    recorder: recorder.clone(),
                }))
                .mapping_renderer(Box::new(FakeMappingRenderer {
                    recorder: recorder.clone(),
                }));
        }
        if self.preprocessor {
            builder = builder.preprocessor(Box::new(FakePreprocessor {
                recorder: recorder.clone(),
            }));
        }
        if self.matcher {
            builder = builder.matcher(Box::new(FakeMatcher {
                recorder: recorder.clone(),
            }));
        }
        if let Some(fail) = self.filter {
            builder = builder.filter(Box::new(FakeFilter {
                recorder: recorder.clone(),
                fail,
            }));
        }
        builder.build()
    }
}

/// Factory handing out fresh fake managers and counting resolutions.
pub struct FakeFactory {
    pub recorder: Recorder,
    pub wiring: FakeWiring,
    pub resolutions: Cell<usize>,
    pub fail: bool,
}

impl FakeFactory {
    pub fn new(wiring: FakeWiring) -> Self {
        FakeFactory {
            recorder: Recorder::default(),
            wiring,
            resolutions: Cell::new(0),
            fail: false,
        }
    }
}

impl ManagerFactory for FakeFactory {
    fn resolve(
        &self,
        locator: &ConfigLocator,
        _overrides: &Overrides,
    ) -> Result<MatchManager, SmatchError> {
        self.resolutions.set(self.resolutions.get() + 1);
        if self.fail {
            return Err(SmatchError::configuration(
                locator,
                anyhow!("component could not be instantiated"),
            ));
        }
        Ok(self.wiring.build(&self.recorder))
    }
}
