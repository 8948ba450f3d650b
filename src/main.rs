use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use runlet::cleanup::{self, CleanupManager};
use runlet::cli::args::Cli;
use runlet::config::load_launch_config;
use runlet::env;
use runlet::error::Result;
use runlet::extract::ArchiveExtractor;
use runlet::launch::{self, ExitOutcome};
use runlet::locate::RuntimeLocator;
use runlet::scratch::ScratchDir;
use runlet::BOOTSTRAP_FAILURE_CODE;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Read once, at startup
    let retain = env::keep_scratch_requested();

    let scratch = match ScratchDir::create() {
        Ok(scratch) => scratch,
        Err(e) => {
            error!(error = %e, "Could not create scratch directory");
            std::process::exit(BOOTSTRAP_FAILURE_CODE);
        }
    };

    let manager = Arc::new(CleanupManager::new(scratch.path().to_path_buf(), retain));
    cleanup::register_termination_handler(manager.clone());

    let code = match run(&cli, &scratch, manager.clone()).await {
        Ok(outcome) => outcome.code,
        Err(e) => {
            error!(error = %e, "Launch failed");
            e.exit_code()
        }
    };

    manager.run();
    std::process::exit(code);
}

/// The bootstrap pipeline: extract, locate, configure, sanitize, invoke.
async fn run(cli: &Cli, scratch: &ScratchDir, manager: Arc<CleanupManager>) -> Result<ExitOutcome> {
    let bundle = match &cli.bundle {
        Some(path) => path.clone(),
        None => std::env::current_exe()?,
    };

    ArchiveExtractor::new().extract(&bundle, scratch.path())?;

    let suffix = launch::component_suffix(cli.strategy);
    let components = RuntimeLocator::with_suffix(suffix).locate(scratch.path())?;

    let config = load_launch_config(scratch.path())?;

    env::check_toxic_variables();

    let invocation = launch::build_invocation(&config, &cli.args, scratch);
    launch::write_deps_config(&scratch.app_root(), &scratch.deps_dir())?;

    let runtime = launch::create_runtime(cli.strategy, &components, manager);
    info!(
        runtime = runtime.name(),
        target = %config.target,
        "Invoking workload"
    );
    let outcome = runtime.invoke(&invocation).await?;
    launch::surface_outcome(outcome)
}

fn init_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
