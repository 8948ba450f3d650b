//! Construction and execution of the workload invocation.

mod inprocess;
mod subprocess;
mod traits;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

pub use inprocess::{InProcessRuntime, LoadingContext};
pub use subprocess::SubprocessRuntime;
pub use traits::{ExitOutcome, Invocation, WorkloadRuntime};

use crate::cleanup::CleanupManager;
use crate::cli::args::Strategy;
use crate::config::LaunchConfiguration;
use crate::error::{Result, RunletError};
use crate::locate::RuntimeComponents;
use crate::scratch::ScratchDir;

/// Dependency groups the workload must not try to resolve; they are not
/// packaged into the bundle.
const DEPS_EXCLUDED_GROUPS: &str = "test:development";

/// Component file-name suffix expected for the given strategy: a shared
/// library when loading in-process, an executable when spawning.
pub fn component_suffix(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Subprocess => std::env::consts::EXE_SUFFIX,
        Strategy::InProcess => std::env::consts::DLL_SUFFIX,
    }
}

/// Assemble the argument vector, environment overrides, and working
/// directory for the workload: `[target, ...params, ...passthrough]`, run
/// from the application root, with dependency resolution pointed into the
/// scratch directory.
pub fn build_invocation(
    config: &LaunchConfiguration,
    passthrough: &[String],
    scratch: &ScratchDir,
) -> Invocation {
    let mut argv = Vec::with_capacity(1 + config.params.len() + passthrough.len());
    argv.push(config.target.clone());
    argv.extend(config.params.iter().cloned());
    argv.extend(passthrough.iter().cloned());

    let deps = scratch.deps_dir();
    let mut env = vec![
        ("DEPS_PATH".to_string(), deps.display().to_string()),
        ("PORT".to_string(), config.port.to_string()),
    ];
    if let Some(suffix) = &config.deps_suffix {
        env.push((
            "DEPS_SUFFIX_PATH".to_string(),
            deps.join(suffix).display().to_string(),
        ));
    }
    if config.precompile {
        env.push(("RUNTIME_PRECOMPILE".to_string(), "true".to_string()));
    }

    Invocation {
        argv,
        env,
        workdir: scratch.app_root(),
    }
}

/// Write the dependency-manager configuration into the application root so
/// the workload resolves its dependencies from the extracted location
/// rather than any ambient host location.
pub fn write_deps_config(app_root: &Path, deps_path: &Path) -> Result<()> {
    let config_dir = app_root.join(".deps");
    std::fs::create_dir_all(&config_dir)?;
    let config_file = config_dir.join("config");

    let mut file = std::fs::File::create(&config_file)?;
    writeln!(file, "---")?;
    writeln!(file, "DEPS_PATH: {}", deps_path.display())?;
    writeln!(file, "DEPS_WITHOUT: {DEPS_EXCLUDED_GROUPS}")?;

    debug!(path = %config_file.display(), "Wrote dependency-manager config");
    Ok(())
}

/// Select the invocation adapter for the configured strategy.
pub fn create_runtime(
    strategy: Strategy,
    components: &RuntimeComponents,
    cleanup: Arc<CleanupManager>,
) -> Box<dyn WorkloadRuntime> {
    match strategy {
        Strategy::Subprocess => Box::new(SubprocessRuntime::new(components.core.clone())),
        Strategy::InProcess => Box::new(InProcessRuntime::new(components.clone(), cleanup)),
    }
}

/// Raise a non-zero workload outcome as this process's own failure signal.
pub fn surface_outcome(outcome: ExitOutcome) -> Result<ExitOutcome> {
    if outcome.success() {
        Ok(outcome)
    } else {
        Err(RunletError::WorkloadFailed { code: outcome.code })
    }
}
