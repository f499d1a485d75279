//! Portwarden Core Library
//!
//! Discovers processes bound to listening TCP ports and terminates them on
//! request. Provides functionality to:
//! - Scan listening sockets into a de-duplicated, stably ordered inventory
//! - Detect real inventory changes and watched-port transitions
//! - Kill processes by PID (gracefully or forcefully)
//! - Drive periodic auto-refresh with prompt cancellation
//! - Manage user configuration (favorites, watched ports, settings)
//!
//! # Architecture
//! The [`engine::PortEngine`] is the single owner of canonical state; the
//! scanning pipeline (`scanner` → `parse`) and the termination protocol
//! (`killer`) run off that boundary and hand it finished results. The
//! `reconcile` module holds the pure diffing/ordering logic between the two.
//!
//! # Platform Support
//! - macOS: uses the `lsof` and `ps` commands
//! - Linux: uses the `ss` and `ps` commands

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod killer;
pub mod parse;
pub mod reconcile;
pub mod refresh;
pub mod scanner;

// Re-export the primary API surface
pub use config::{Config, ConfigStore};
pub use domain::{PortRecord, WatchedPort};
pub use engine::{EngineEvent, PortEngine};
pub use error::{Error, Result};
pub use killer::{KillCommand, ProcessKiller, SignalDelivery};
pub use refresh::RefreshScheduler;
pub use scanner::{PortScanner, Scanner};
