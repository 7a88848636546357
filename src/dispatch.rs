//! Command dispatch: the command table, argument validation, and the stage
//! recipe each command runs against a freshly resolved manager.
//!
//! Validation happens before a manager is resolved, so a usage error never
//! touches configuration or the filesystem. Capability checks happen before the
//! first stage, so a recipe either starts with everything it needs or does no
//! I/O at all.
use crate::cli::Invocation;
use crate::data::Mapping;
use crate::error::{ErrorKind, SmatchError};
use crate::manager::{Capability, ManagerFactory, MatchManager, Requirement};
use crate::wordnet::{CacheBuilder, CacheRequest};
use std::fmt;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipe {
    WordNetCache,
    ConvertContext,
    ConvertMapping,
    Offline,
    Online,
    Filter,
    AllSteps,
}

impl Recipe {
    /// Capabilities the manager must offer before the recipe starts.
    pub fn requirements(&self) -> &'static [Requirement] {
        use Capability as C;
        use Requirement::{Present, StructuredLoading, StructuredRendering};
        match self {
            Recipe::WordNetCache => &[],
            Recipe::ConvertContext => &[Present(C::LoadContext), Present(C::RenderContext)],
            Recipe::ConvertMapping => &[
                StructuredLoading,
                Present(C::LoadMapping),
                Present(C::RenderMapping),
            ],
            Recipe::Offline => &[
                StructuredLoading,
                StructuredRendering,
                Present(C::Preprocess),
            ],
            Recipe::Online => &[
                StructuredLoading,
                Present(C::Match),
                Present(C::RenderMapping),
            ],
            Recipe::Filter => &[
                StructuredLoading,
                Present(C::LoadMapping),
                Present(C::Filter),
                Present(C::RenderMapping),
            ],
            Recipe::AllSteps => &[
                StructuredLoading,
                Present(C::Preprocess),
                Present(C::Match),
                Present(C::RenderMapping),
            ],
        }
    }
}

/// One accepted shape of a command: its name and positional arguments.
#[derive(Debug)]
pub struct Form {
    pub command: &'static str,
    pub args: &'static [&'static str],
    pub about: &'static str,
    pub recipe: Recipe,
}

impl Form {
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn synopsis(&self) -> String {
        format!("{} {}", self.command, self.args.join(" "))
    }
}

pub const FORMS: &[Form] = &[
    Form {
        command: "wntoflat",
        args: &[
            "<properties>",
            "<adj-syn>",
            "<adj-ant>",
            "<noun-hyp>",
            "<noun-ant>",
            "<adv-ant>",
            "<verb-hyp>",
            "<nominalizations>",
            "<multiwords>",
        ],
        about: "build WordNet lookup caches",
        recipe: Recipe::WordNetCache,
    },
    Form {
        command: "convert",
        args: &["<input>", "<output>"],
        about: "read a context and write it with the configured renderer",
        recipe: Recipe::ConvertContext,
    },
    Form {
        command: "convert",
        args: &["<source>", "<target>", "<input>", "<output>"],
        about: "read a mapping between two contexts and write it",
        recipe: Recipe::ConvertMapping,
    },
    Form {
        command: "offline",
        args: &["<input>", "<output>"],
        about: "read a context, preprocess it, and write it",
        recipe: Recipe::Offline,
    },
    Form {
        command: "online",
        args: &["<source>", "<target>", "<output>"],
        about: "match two preprocessed contexts and write the mapping",
        recipe: Recipe::Online,
    },
    Form {
        command: "filter",
        args: &["<source>", "<target>", "<input>", "<output>"],
        about: "filter a mapping between two contexts and write it",
        recipe: Recipe::Filter,
    },
    Form {
        command: "allsteps",
        args: &["<source>", "<target>", "<output>"],
        about: "preprocess, match, and filter two contexts, then write the mapping",
        recipe: Recipe::AllSteps,
    },
];

/// Usage text listing every command form and the global options.
pub fn usage() -> String {
    let width = FORMS
        .iter()
        .map(|form| form.synopsis().len())
        .max()
        .unwrap_or_default();
    let mut text = String::from("Commands:\n");
    for form in FORMS {
        text.push_str(&format!("  {:<width$}  {}\n", form.synopsis(), form.about));
    }
    text.push_str(
        "\nOptions:\n  -config=<file.json>  read the manager configuration from file.json \
         instead of the embedded default\n  -D<key>=<value>      supply a value for ${key} \
         placeholders in the configuration\n",
    );
    text
}

/// A validated command: the form it matched and its positional arguments.
#[derive(Debug)]
pub struct Plan {
    pub form: &'static Form,
    pub args: Vec<String>,
}

impl Plan {
    fn path(&self, index: usize) -> &Path {
        Path::new(&self.args[index])
    }
}

/// Match `command` and `args` against the command table.
///
/// Commands with several forms need an exact argument count; the others take at
/// least their listed count and ignore the rest.
pub fn plan(command: &str, args: &[String]) -> Result<Plan, SmatchError> {
    let forms: Vec<&'static Form> = FORMS.iter().filter(|form| form.command == command).collect();
    let form = match forms.as_slice() {
        [] => {
            return Err(SmatchError::usage(format!(
                "unrecognized command {command:?}"
            )))
        }
        [form] => {
            if args.len() < form.arity() {
                return Err(SmatchError::usage(format!(
                    "not enough arguments for {command} command (usage: {})",
                    form.synopsis()
                )));
            }
            if args.len() > form.arity() {
                tracing::warn!(
                    command,
                    ignored = ?&args[form.arity()..],
                    "ignoring extra arguments"
                );
            }
            *form
        }
        forms => forms
            .iter()
            .copied()
            .find(|form| form.arity() == args.len())
            .ok_or_else(|| {
                let synopses: Vec<String> = forms.iter().map(|form| form.synopsis()).collect();
                SmatchError::usage(format!(
                    "wrong number of arguments for {command} command (usage: {})",
                    synopses.join(" | ")
                ))
            })?,
    };
    Ok(Plan {
        form,
        args: args[..form.arity()].to_vec(),
    })
}

/// How a command ended.
#[derive(Debug)]
pub enum Outcome {
    /// Every stage of the recipe ran.
    Completed,
    /// `allsteps` rendered the unfiltered mapping because filtering was skipped.
    Unfiltered,
    /// Nothing ran: bad usage or a missing capability.
    Declined(SmatchError),
    /// Configuration or a stage failed and aborted the command.
    Failed(SmatchError),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed => f.write_str("completed"),
            Outcome::Unfiltered => f.write_str("completed without filtering"),
            Outcome::Declined(err) => write!(f, "declined ({})", err.kind()),
            Outcome::Failed(err) => write!(f, "failed ({})", err.kind()),
        }
    }
}

/// Result of the `allsteps` filter stage.
#[derive(Debug)]
pub enum Filtered {
    Applied(Mapping),
    Skipped {
        unfiltered: Mapping,
        reason: SmatchError,
    },
}

impl Filtered {
    pub fn mapping(&self) -> &Mapping {
        match self {
            Filtered::Applied(mapping) => mapping,
            Filtered::Skipped { unfiltered, .. } => unfiltered,
        }
    }
}

/// Filter `mapping`, falling back to it unchanged when no filter is configured
/// or the filter fails. Any other error still aborts the command.
pub fn filter_or_skip(manager: &MatchManager, mapping: Mapping) -> Result<Filtered, SmatchError> {
    if !manager.capabilities().has(Capability::Filter) {
        tracing::info!("no filter configured; rendering the unfiltered mapping");
        return Ok(Filtered::Skipped {
            unfiltered: mapping,
            reason: SmatchError::unavailable("no filter configured"),
        });
    }
    match manager.filter_mapping(&mapping) {
        Ok(filtered) => Ok(Filtered::Applied(filtered)),
        Err(reason @ SmatchError::Filter { .. }) => {
            tracing::info!("no filtering was performed (set SMATCH_LOG=debug to see why)");
            tracing::debug!(reason = %reason, "filter failure");
            Ok(Filtered::Skipped {
                unfiltered: mapping,
                reason,
            })
        }
        Err(err) => Err(err),
    }
}

/// Runs invocations against a manager factory and a cache builder.
pub struct Dispatcher<'a> {
    factory: &'a dyn ManagerFactory,
    cache_builder: &'a dyn CacheBuilder,
}

/// Log a command's error at the level its kind calls for and turn it into an
/// outcome. Usage errors are followed by the usage text.
pub fn settle(command: &str, err: SmatchError) -> Outcome {
    match err.kind() {
        ErrorKind::Usage => {
            tracing::error!(command, "{err}");
            tracing::info!("\n{}", usage());
            Outcome::Declined(err)
        }
        ErrorKind::CapabilityUnavailable => {
            tracing::warn!(command, "{err}");
            Outcome::Declined(err)
        }
        kind => {
            tracing::error!(command, kind = %kind, "{err}");
            Outcome::Failed(err)
        }
    }
}

impl<'a> Dispatcher<'a> {
    pub fn new(factory: &'a dyn ManagerFactory, cache_builder: &'a dyn CacheBuilder) -> Self {
        Dispatcher {
            factory,
            cache_builder,
        }
    }

    /// Run one invocation, logging how it ended.
    pub fn dispatch(&self, invocation: &Invocation) -> Outcome {
        let start = Instant::now();
        let outcome = match self.run(invocation) {
            Ok(outcome) => outcome,
            Err(err) => settle(&invocation.command, err),
        };
        tracing::debug!(
            command = %invocation.command,
            outcome = %outcome,
            elapsed_ms = start.elapsed().as_millis(),
            "command finished"
        );
        outcome
    }

    fn run(&self, invocation: &Invocation) -> Result<Outcome, SmatchError> {
        let plan = plan(&invocation.command, &invocation.args)?;
        if plan.form.recipe == Recipe::WordNetCache {
            let request = CacheRequest::from_args(&plan.args).ok_or_else(|| {
                SmatchError::usage(format!("usage: {}", plan.form.synopsis()))
            })?;
            self.cache_builder.build(&request)?;
            return Ok(Outcome::Completed);
        }
        let manager = self
            .factory
            .resolve(&invocation.locator, &invocation.overrides)?;
        manager.require(plan.form.command, plan.form.recipe.requirements())?;
        tracing::info!(command = plan.form.command, args = ?plan.args, "running recipe");
        execute(&manager, &plan)
    }
}

fn execute(manager: &MatchManager, plan: &Plan) -> Result<Outcome, SmatchError> {
    match plan.form.recipe {
        Recipe::WordNetCache => Err(SmatchError::usage(
            "wntoflat does not run against a manager",
        )),
        Recipe::ConvertContext => {
            let context = manager.load_context(plan.path(0))?;
            manager.render_context(&context, plan.path(1))?;
            Ok(Outcome::Completed)
        }
        Recipe::ConvertMapping => {
            let source = manager.load_context(plan.path(0))?;
            let target = manager.load_context(plan.path(1))?;
            let mapping = manager.load_mapping(&source, &target, plan.path(2))?;
            manager.render_mapping(&mapping, plan.path(3))?;
            Ok(Outcome::Completed)
        }
        Recipe::Offline => {
            let mut context = manager.load_context(plan.path(0))?;
            manager.offline(&mut context)?;
            manager.render_context(&context, plan.path(1))?;
            Ok(Outcome::Completed)
        }
        Recipe::Online => {
            let source = manager.load_context(plan.path(0))?;
            let target = manager.load_context(plan.path(1))?;
            let mapping = manager.online(&source, &target)?;
            manager.render_mapping(&mapping, plan.path(2))?;
            Ok(Outcome::Completed)
        }
        Recipe::Filter => {
            let source = manager.load_context(plan.path(0))?;
            let target = manager.load_context(plan.path(1))?;
            let mapping = manager.load_mapping(&source, &target, plan.path(2))?;
            let filtered = manager.filter_mapping(&mapping)?;
            manager.render_mapping(&filtered, plan.path(3))?;
            Ok(Outcome::Completed)
        }
        Recipe::AllSteps => {
            let mut source = manager.load_context(plan.path(0))?;
            manager.offline(&mut source)?;
            let mut target = manager.load_context(plan.path(1))?;
            manager.offline(&mut target)?;
            let mapping = manager.online(&source, &target)?;
            let filtered = filter_or_skip(manager, mapping)?;
            manager.render_mapping(filtered.mapping(), plan.path(2))?;
            Ok(match filtered {
                Filtered::Applied(_) => Outcome::Completed,
                Filtered::Skipped { .. } => Outcome::Unfiltered,
            })
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
