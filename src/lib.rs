pub mod cleanup;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod extract;
pub mod launch;
pub mod locate;
pub mod platform;
pub mod scratch;

pub use error::{Result, RunletError};

/// Exit status for failures in the bootstrap pipeline itself, as opposed to
/// failures of the invoked workload (whose own status is mirrored).
pub const BOOTSTRAP_FAILURE_CODE: i32 = 70;

/// Exit status when the launch is interrupted by a termination signal.
pub const INTERRUPTED_CODE: i32 = 130;
