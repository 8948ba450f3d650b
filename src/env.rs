//! The program's enumerated environment surface.
//!
//! All ambient environment-variable reads happen here, once, at defined
//! points in the pipeline; nothing else in the crate consults them.

use tracing::{info, warn};

/// Ambient variables known to redirect the managed runtime's dependency
/// resolution or interpreter behavior away from the bundled copies.
/// Advisory only: their presence is reported, never acted on.
pub const TOXIC_VARIABLES: &[&str] = &[
    "DEPS_BIN_PATH",
    "DEPS_HOME",
    "DEPS_MANAGER_SETUP",
    "DEPS_MANAGER_VERSION",
    "DEPS_MANIFEST",
    "DEPS_PATH",
    "RUNTIME_LIB",
    "RUNTIME_OPTS",
    "RUNTIME_PATH",
    "RUNTIME_SHELL",
];

/// Diagnostics flag: when set to a truthy value the scratch directory is
/// retained at exit instead of deleted. Read once at startup.
pub const KEEP_SCRATCH_VAR: &str = "RUNLET_KEEP_SCRATCH";

/// Deny-listed variable names found in the inherited environment.
#[derive(Debug, Default, Clone)]
pub struct ToxicVariableReport {
    pub present: Vec<String>,
}

impl ToxicVariableReport {
    pub fn is_clean(&self) -> bool {
        self.present.is_empty()
    }
}

/// Scan the inherited environment for deny-listed variables and warn about
/// each finding. Never mutates the environment and never blocks the launch.
pub fn check_toxic_variables() -> ToxicVariableReport {
    // Presence check via var_os: a non-UTF-8 value is still a finding.
    let report = scan(|name| std::env::var_os(name).is_some());
    for name in &report.present {
        warn!(
            variable = %name,
            "Ambient environment variable may redirect the packaged runtime; \
             remove it before launch if the workload misbehaves"
        );
    }
    if !report.is_clean() {
        warn!(
            count = report.present.len(),
            "Host environment leaks into the sandboxed runtime (advisory only)"
        );
    }
    report
}

fn scan<F>(is_present: F) -> ToxicVariableReport
where
    F: Fn(&str) -> bool,
{
    ToxicVariableReport {
        present: TOXIC_VARIABLES
            .iter()
            .filter(|name| is_present(name))
            .map(|name| name.to_string())
            .collect(),
    }
}

/// Whether diagnostics retention of the scratch directory was requested.
pub fn keep_scratch_requested() -> bool {
    let requested = is_truthy(std::env::var(KEEP_SCRATCH_VAR).ok());
    if requested {
        info!(
            variable = KEEP_SCRATCH_VAR,
            "Scratch directory will be retained for diagnostics"
        );
    }
    requested
}

fn is_truthy(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
