use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "runlet")]
#[clap(version, about = "Self-contained application bootstrapper")]
pub struct Cli {
    /// Bundle archive to boot. Defaults to the running executable, which
    /// carries the bundle in self-contained deployments.
    #[clap(long, env = "RUNLET_BUNDLE")]
    pub bundle: Option<PathBuf>,

    /// How to invoke the managed runtime
    #[clap(long, default_value = "subprocess", value_enum)]
    pub strategy: Strategy,

    /// Verbosity level (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Arguments appended verbatim after the configured parameters when
    /// invoking the workload
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Invocation strategy for the managed runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Spawn the runtime as a child process and relay its output
    #[default]
    Subprocess,
    /// Load the runtime into this process and call its entry point
    InProcess,
}
