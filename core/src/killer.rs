//! Process termination via graceful and forced signals.
//!
//! Signals go out through `/bin/kill`; success is the tool's zero exit
//! status. The graceful protocol is two-stage: request termination, give the
//! process a short grace period to flush and exit, then kill unconditionally.

use std::time::Duration;

use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Grace period between the termination request and the forced kill.
const GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Delivery seam for termination signals.
///
/// Implementations report `Ok(true)` when the underlying mechanism confirms
/// delivery, `Ok(false)` for harmless non-delivery (no such process), and an
/// error only for conditions worth logging distinctly (permission denied,
/// missing tool).
pub trait SignalDelivery: Send + Sync {
    /// Deliver one signal. `forceful` selects the unconditional kill signal
    /// over the graceful termination request.
    fn deliver(
        &self,
        pid: u32,
        forceful: bool,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// Signal delivery through the system `kill` tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct KillCommand;

impl SignalDelivery for KillCommand {
    /// Runs `/bin/kill -15 PID` (graceful) or `/bin/kill -9 PID` (forced).
    async fn deliver(&self, pid: u32, forceful: bool) -> Result<bool> {
        let signal = if forceful { "-9" } else { "-15" };
        debug!(pid, signal, "sending signal");

        let output = Command::new("/bin/kill")
            .arg(signal)
            .arg(pid.to_string())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run kill: {}", e)))?;

        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);

        if stderr.contains("Operation not permitted") || stderr.contains("Permission denied") {
            return Err(Error::PermissionDenied(format!(
                "kill {} {}",
                signal, pid
            )));
        }

        // Signalling a PID that no longer exists is a no-op, not an error:
        // the port is already free.
        if stderr.contains("No such process") || output.status.code() == Some(1) {
            debug!(pid, "process not found");
            return Ok(false);
        }

        Err(Error::KillFailed {
            pid,
            reason: stderr.trim().to_string(),
        })
    }
}

/// Two-stage process terminator.
pub struct ProcessKiller<D: SignalDelivery = KillCommand> {
    delivery: D,
}

impl ProcessKiller<KillCommand> {
    /// Terminator backed by the system `kill` tool.
    pub fn new() -> Self {
        Self {
            delivery: KillCommand,
        }
    }
}

impl Default for ProcessKiller<KillCommand> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: SignalDelivery> ProcessKiller<D> {
    /// Terminator with a custom delivery mechanism.
    pub fn with_delivery(delivery: D) -> Self {
        Self { delivery }
    }

    /// Send one signal to a process.
    ///
    /// Never faults: any delivery error (missing tool, permission denied,
    /// no such process) comes back as `false`. Callers surface a `false`
    /// result to the user; permission problems are additionally logged so
    /// the caller can suggest elevated privileges.
    pub async fn kill(&self, pid: u32, forceful: bool) -> bool {
        match self.delivery.deliver(pid, forceful).await {
            Ok(delivered) => delivered,
            Err(e @ Error::PermissionDenied(_)) => {
                warn!(pid, error = %e, "not permitted to signal process");
                false
            }
            Err(e) => {
                warn!(pid, error = %e, "signal delivery failed");
                false
            }
        }
    }

    /// Gracefully terminate a process, guaranteeing a kill attempt.
    ///
    /// 1. Request graceful termination.
    /// 2. If the request was delivered, wait the grace period so the process
    ///    can close handles and flush buffers.
    /// 3. Send the forced kill unconditionally; the outcome never depends on
    ///    the process honoring the request.
    ///
    /// The forced signal's result is the overall result. No retries beyond
    /// this sequence.
    pub async fn kill_gracefully(&self, pid: u32) -> bool {
        if self.kill(pid, false).await {
            sleep(GRACE_PERIOD).await;
        }
        self.kill(pid, true).await
    }

    /// Check whether a process currently exists (signal-0 probe).
    #[cfg(unix)]
    pub fn is_running(&self, pid: u32) -> bool {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid as i32), None).is_ok()
    }

    #[cfg(not(unix))]
    pub fn is_running(&self, _pid: u32) -> bool {
        false
    }
}
