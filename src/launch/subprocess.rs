use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, RunletError};
use crate::launch::traits::{ExitOutcome, Invocation, WorkloadRuntime};

/// Runs the runtime core component as a child process, relaying its output.
pub struct SubprocessRuntime {
    core: PathBuf,
}

impl SubprocessRuntime {
    pub fn new(core: PathBuf) -> Self {
        Self { core }
    }
}

#[async_trait]
impl WorkloadRuntime for SubprocessRuntime {
    fn name(&self) -> &str {
        "subprocess"
    }

    async fn invoke(&self, invocation: &Invocation) -> Result<ExitOutcome> {
        debug!(
            core = %self.core.display(),
            argv = ?invocation.argv,
            workdir = %invocation.workdir.display(),
            "Spawning runtime subprocess"
        );

        let mut cmd = Command::new(&self.core);
        cmd.args(&invocation.argv);
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        cmd.current_dir(&invocation.workdir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        // stderr goes straight to ours, already interleaved by the tty
        cmd.stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| {
            RunletError::Invocation(format!(
                "failed to spawn runtime '{}': {e}",
                self.core.display()
            ))
        })?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            RunletError::Invocation("runtime subprocess has no captured output stream".to_string())
        })?;

        // Relay byte-for-byte until the child's output stream is exhausted;
        // this is the launcher's only suspension point.
        tokio::io::copy(&mut stdout, &mut tokio::io::stdout()).await?;

        let status = child.wait().await?;
        let code = exit_code_of(&status);
        debug!(code, "Runtime subprocess finished");
        Ok(ExitOutcome { code })
    }
}

/// Mirror the child's exit status. A signal-killed child has no exit code;
/// it maps to the conventional `128 + signal` on unix.
fn exit_code_of(status: &std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
