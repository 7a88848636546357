use smatch::cli::{parse_invocation, usage_error};
use smatch::dispatch::{settle, usage, Dispatcher, Outcome};
use smatch::manager::ConfiguredFactory;
use smatch::registry::ComponentRegistry;
use smatch::wordnet::WordNetCacheBuilder;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SMATCH_LOG";

fn main() -> ExitCode {
    init_tracing();
    let invocation = match parse_invocation(std::env::args()) {
        Ok(Some(invocation)) => invocation,
        Ok(None) => {
            tracing::info!("Usage: smatch <command> <arguments> [options]\n{}", usage());
            return ExitCode::SUCCESS;
        }
        Err(err) => match usage_error(&err) {
            Some(usage_err) => return exit_code(&settle("", usage_err)),
            None => err.exit(),
        },
    };

    let factory = ConfiguredFactory::new(ComponentRegistry::builtin());
    let outcome = Dispatcher::new(&factory, &WordNetCacheBuilder).dispatch(&invocation);
    exit_code(&outcome)
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Diagnostics go to stderr; `SMATCH_LOG` takes precedence over `RUST_LOG`.
fn init_tracing() {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
