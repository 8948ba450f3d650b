use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;

/// Result of a completed workload invocation.
#[derive(Debug, Clone, Copy)]
pub struct ExitOutcome {
    pub code: i32,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// A fully resolved workload invocation: the argument vector handed to the
/// runtime's entry point, the environment overrides for the invocation
/// context, and the working directory (the application root).
#[derive(Debug, Clone)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
    pub workdir: PathBuf,
}

/// Capability to run the managed runtime with an argument vector.
///
/// Callers depend only on this trait; whether the runtime is loaded into
/// the current process or spawned as a subprocess is an adapter concern.
#[async_trait]
pub trait WorkloadRuntime: Send + Sync {
    /// Adapter name for diagnostics.
    fn name(&self) -> &str;

    /// Invoke the runtime synchronously with the given invocation and
    /// report its exit outcome. A non-zero outcome is not an error of this
    /// operation; failing to load, resolve, or start the runtime is.
    async fn invoke(&self, invocation: &Invocation) -> Result<ExitOutcome>;
}
