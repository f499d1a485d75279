//! Port scanning with platform-specific enumerators.

#[cfg(target_os = "macos")]
mod darwin;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
compile_error!("Unsupported platform: only macOS and Linux are supported");

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use crate::domain::PortRecord;
use crate::error::{Error, Result};

/// Upper bound on one enumerator invocation. A hung external tool must not
/// stall the scan cycle; hitting the bound counts as a failed step.
const ENUMERATOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for platform-specific port scanning implementations.
pub trait Scanner: Send + Sync {
    /// Enumerate all listening TCP ports.
    fn scan(&self) -> impl std::future::Future<Output = Result<Vec<PortRecord>>> + Send;
}

/// The main port scanner, backed by the current platform's enumerators.
pub struct PortScanner {
    #[cfg(target_os = "macos")]
    inner: darwin::DarwinScanner,

    #[cfg(target_os = "linux")]
    inner: linux::LinuxScanner,
}

impl PortScanner {
    /// Create a new port scanner for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "macos")]
            inner: darwin::DarwinScanner::new(),

            #[cfg(target_os = "linux")]
            inner: linux::LinuxScanner::new(),
        }
    }

    /// Run one scan cycle.
    ///
    /// A failed cycle reports "no ports observed" rather than an error:
    /// enumerator failures degrade to an empty inventory and are logged.
    pub async fn scan(&self) -> Vec<PortRecord> {
        match Scanner::scan(&self.inner).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "port scan failed");
                Vec::new()
            }
        }
    }
}

impl Scanner for PortScanner {
    async fn scan(&self) -> Result<Vec<PortRecord>> {
        Ok(PortScanner::scan(self).await)
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Invoke one enumerator and collect its stdout as UTF-8 text.
///
/// `output()` drains the pipe concurrently with child exit, so a child that
/// fills the pipe buffer cannot deadlock against our wait.
pub(crate) async fn run_enumerator(program: &str, args: &[&str]) -> Result<String> {
    let invocation = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output();

    let output = match timeout(ENUMERATOR_TIMEOUT, invocation).await {
        Ok(result) => {
            result.map_err(|e| Error::CommandFailed(format!("Failed to run {}: {}", program, e)))?
        }
        Err(_) => {
            return Err(Error::CommandFailed(format!(
                "{} did not finish within {:?}",
                program, ENUMERATOR_TIMEOUT
            )))
        }
    };

    String::from_utf8(output.stdout)
        .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in {} output: {}", program, e)))
}
