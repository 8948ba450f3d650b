//! Guaranteed scratch-directory removal, exactly once per launch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::launch::LoadingContext;

/// Owns the scratch directory's teardown.
///
/// Both the normal exit path and the termination-signal handler call
/// [`run`](Self::run); an atomic guard ensures the deletion logic executes
/// at most once per process lifetime. When an in-process loading context
/// exists it is released first, since loaded libraries can keep their files
/// locked and block removal.
pub struct CleanupManager {
    scratch: PathBuf,
    retain: bool,
    fired: AtomicBool,
    invoking: AtomicBool,
    context: Mutex<Option<LoadingContext>>,
}

impl CleanupManager {
    pub fn new(scratch: PathBuf, retain: bool) -> Self {
        Self {
            scratch,
            retain,
            fired: AtomicBool::new(false),
            invoking: AtomicBool::new(false),
            context: Mutex::new(None),
        }
    }

    /// Hand over the in-process loading context; it will be released on the
    /// cleanup path, before directory deletion begins.
    pub fn adopt_context(&self, context: LoadingContext) {
        if let Ok(mut slot) = self.context.lock() {
            *slot = Some(context);
        }
    }

    /// Mark the runtime entry point as executing. While the mark is set, a
    /// cleanup triggered from the signal path must not unmap the runtime
    /// libraries: another thread's instruction pointer is inside them.
    pub fn begin_invocation(&self) {
        self.invoking.store(true, Ordering::SeqCst);
    }

    /// Clear the mark set by [`begin_invocation`](Self::begin_invocation).
    pub fn end_invocation(&self) {
        self.invoking.store(false, Ordering::SeqCst);
    }

    /// Perform cleanup. Returns `true` if this call did the work, `false`
    /// if cleanup already ran.
    pub fn run(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }

        if let Ok(mut slot) = self.context.lock() {
            if let Some(context) = slot.take() {
                debug!("Releasing runtime loading context");
                release_or_leak(context, self.invoking.load(Ordering::SeqCst));
            }
        }

        if self.retain {
            info!(
                path = %self.scratch.display(),
                "Diagnostics retention requested, scratch directory kept"
            );
            return true;
        }

        debug!(path = %self.scratch.display(), "Removing scratch directory");
        remove_tree_best_effort(&self.scratch);
        true
    }
}

/// Dropping the loading context unmaps the runtime libraries. When the
/// entry point is still executing on another thread, dropping would unmap
/// the code under its instruction pointer, so the context is leaked
/// instead: the process is about to exit and the OS reclaims the mappings.
/// Deletion still proceeds best-effort; on platforms that lock mapped
/// files the component entries fail individually and are logged.
fn release_or_leak<T>(resource: T, in_flight: bool) {
    if in_flight {
        std::mem::forget(resource);
    } else {
        drop(resource);
    }
}

/// Depth-first removal. Individual failures are logged and skipped; they
/// never abort the remaining walk and never surface as an error.
fn remove_tree_best_effort(path: &Path) {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not list directory during cleanup");
            return;
        }
    };

    for entry in entries.flatten() {
        let child = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            remove_tree_best_effort(&child);
        } else if let Err(e) = std::fs::remove_file(&child) {
            warn!(path = %child.display(), error = %e, "Could not remove file during cleanup");
        }
    }

    if let Err(e) = std::fs::remove_dir(path) {
        warn!(path = %path.display(), error = %e, "Could not remove directory during cleanup");
    }
}

/// Intercept a termination signal, clean up, and exit. Registered before
/// invocation begins so signal delivery during the workload still tears the
/// scratch directory down.
pub fn register_termination_handler(manager: Arc<CleanupManager>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Termination signal received");
            manager.run();
            std::process::exit(crate::INTERRUPTED_CODE);
        }
    });
}
