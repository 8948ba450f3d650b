use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunletError {
    // Extraction errors
    #[error("Archive entry escapes the extraction root: {entry}")]
    PathTraversal { entry: String },

    #[error("Extraction failed: {0}")]
    Extraction(#[source] std::io::Error),

    #[error("Bundle archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    // Component location errors
    #[error("Runtime component '{component}' not found in extracted bundle")]
    MissingComponent { component: String },

    // Configuration errors
    #[error("Required configuration key '{key}' missing in {file}")]
    MissingRequiredConfig { key: String, file: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    // Invocation errors
    #[error("Runtime invocation failed: {0}")]
    Invocation(String),

    #[error("Workload exited with status {code}")]
    WorkloadFailed { code: i32 },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunletError {
    /// Exit status to report for this failure. Workload failures mirror the
    /// workload's own status; everything else is a bootstrap-stage failure
    /// and maps to a fixed code the workload cannot produce by convention.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::WorkloadFailed { code } => *code,
            _ => crate::BOOTSTRAP_FAILURE_CODE,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunletError>;
