use std::ffi::{c_char, c_int, CString};
use std::sync::Arc;

use async_trait::async_trait;
use libloading::Library;
use tracing::debug;

use crate::cleanup::CleanupManager;
use crate::error::{Result, RunletError};
use crate::launch::traits::{ExitOutcome, Invocation, WorkloadRuntime};
use crate::locate::RuntimeComponents;

/// Entry point published by the runtime core component.
const ENTRY_SYMBOL: &[u8] = b"runlet_runtime_main\0";

type EntryFn = unsafe extern "C" fn(c_int, *const *const c_char) -> c_int;

/// The loaded runtime libraries backing an in-process invocation.
///
/// Must be dropped before scratch-directory deletion is attempted: loaded
/// libraries keep their files locked on some platforms, and deletion would
/// fail. Release is coordinated through [`CleanupManager`].
pub struct LoadingContext {
    core: Library,
    _stdlib: Library,
}

impl LoadingContext {
    pub fn load(components: &RuntimeComponents) -> Result<Self> {
        // stdlib first so core can resolve against it at load time
        let stdlib = unsafe { Library::new(&components.stdlib) }.map_err(|e| {
            RunletError::Invocation(format!(
                "failed to load stdlib component '{}': {e}",
                components.stdlib.display()
            ))
        })?;
        let core = unsafe { Library::new(&components.core) }.map_err(|e| {
            RunletError::Invocation(format!(
                "failed to load core component '{}': {e}",
                components.core.display()
            ))
        })?;
        Ok(Self {
            core,
            _stdlib: stdlib,
        })
    }

    fn entry(&self) -> Result<EntryFn> {
        let symbol = unsafe { self.core.get::<EntryFn>(ENTRY_SYMBOL) }.map_err(|e| {
            RunletError::Invocation(format!("runtime entry point not resolvable: {e}"))
        })?;
        Ok(*symbol)
    }
}

/// Loads the runtime components into this process and calls the published
/// entry point with the argument vector.
pub struct InProcessRuntime {
    components: RuntimeComponents,
    cleanup: Arc<CleanupManager>,
}

impl InProcessRuntime {
    pub fn new(components: RuntimeComponents, cleanup: Arc<CleanupManager>) -> Self {
        Self {
            components,
            cleanup,
        }
    }
}

#[async_trait]
impl WorkloadRuntime for InProcessRuntime {
    fn name(&self) -> &str {
        "in-process"
    }

    async fn invoke(&self, invocation: &Invocation) -> Result<ExitOutcome> {
        let context = LoadingContext::load(&self.components)?;
        let entry = context.entry()?;
        // The cleanup path owns the context from here on and releases it
        // before directory deletion, on whichever exit path fires.
        self.cleanup.adopt_context(context);

        // In-process runs share this process's environment and working
        // directory; both overrides end with the process.
        std::env::set_current_dir(&invocation.workdir).map_err(|e| {
            RunletError::Invocation(format!(
                "cannot enter application root '{}': {e}",
                invocation.workdir.display()
            ))
        })?;
        for (key, value) in &invocation.env {
            std::env::set_var(key, value);
        }

        debug!(argv = ?invocation.argv, "Calling runtime entry point");
        let argv = invocation.argv.clone();
        // While the entry point executes, a signal-path cleanup must leak
        // the loading context rather than unmap it from under this call.
        self.cleanup.begin_invocation();
        let joined = tokio::task::spawn_blocking(move || -> Result<i32> {
            let strings: Vec<CString> = argv
                .iter()
                .map(|arg| {
                    CString::new(arg.as_str()).map_err(|_| {
                        RunletError::Invocation(format!("argument contains NUL byte: {arg:?}"))
                    })
                })
                .collect::<Result<_>>()?;
            let mut pointers: Vec<*const c_char> =
                strings.iter().map(|s| s.as_ptr()).collect();
            pointers.push(std::ptr::null());

            // Safety: the entry signature is the component contract; the
            // loading context stays mapped for the duration of this call
            // (cleanup leaks it instead of unmapping while we are inside).
            let code = unsafe { entry(strings.len() as c_int, pointers.as_ptr()) };
            Ok(code)
        })
        .await;
        self.cleanup.end_invocation();

        let code = joined
            .map_err(|e| RunletError::Invocation(format!("runtime call panicked: {e}")))??;
        debug!(code, "Runtime entry point returned");
        Ok(ExitOutcome { code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn unloadable_component_is_an_invocation_error() {
        let dir = tempfile::tempdir().unwrap();
        // Present but not a valid shared library.
        let core = dir.path().join("runtime-core.so");
        let stdlib = dir.path().join("runtime-stdlib.so");
        std::fs::write(&core, b"not a library").unwrap();
        std::fs::write(&stdlib, b"not a library").unwrap();

        let cleanup = Arc::new(CleanupManager::new(PathBuf::from("/nonexistent"), true));
        let runtime = InProcessRuntime::new(
            RuntimeComponents {
                core,
                stdlib,
            },
            cleanup,
        );
        let invocation = Invocation {
            argv: vec!["app/start".to_string()],
            env: Vec::new(),
            workdir: dir.path().to_path_buf(),
        };
        let err = runtime.invoke(&invocation).await.unwrap_err();
        assert!(matches!(err, RunletError::Invocation(_)));
    }
}
