//! Central state owner for the port inventory.
//!
//! The engine is the single exclusive-access boundary for the canonical
//! port list, the watched-port status map and the favorites/watched caches.
//! Scan execution (subprocess invocation, text parsing) runs outside any
//! lock; only the short result-merge step takes the write lock. Consumers
//! read snapshots and subscribe to [`EngineEvent`]s.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::ConfigStore;
use crate::domain::{PortRecord, WatchedPort};
use crate::error::Result;
use crate::killer::{KillCommand, ProcessKiller, SignalDelivery};
use crate::reconcile;
use crate::scanner::{PortScanner, Scanner};

/// State-change events emitted to subscribers.
///
/// Delivery of user-facing notifications is the subscriber's concern; the
/// engine only reports what changed.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The canonical port list was replaced.
    PortsChanged,
    /// A watched port crossed between active and inactive.
    WatchTransition {
        port: u16,
        to_active: bool,
        process_name: Option<String>,
    },
}

/// The central engine: scans, reconciles, kills, and notifies.
///
/// Generic over the scanner and signal delivery so tests can inject stubs;
/// production code uses [`PortEngine::new`] with the platform defaults.
pub struct PortEngine<S = PortScanner, D = KillCommand>
where
    S: Scanner,
    D: SignalDelivery,
{
    scanner: S,
    killer: ProcessKiller<D>,
    config: ConfigStore,

    // Canonical state, mutated only behind these locks.
    ports: RwLock<Vec<PortRecord>>,
    watch_statuses: RwLock<HashMap<u16, bool>>,
    favorites: RwLock<HashSet<u16>>,
    watched: RwLock<Vec<WatchedPort>>,

    scan_in_flight: AtomicBool,
    events: broadcast::Sender<EngineEvent>,
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PortEngine {
    /// Engine with the platform scanner and system signal delivery.
    pub async fn new() -> Result<Self> {
        Self::with_parts(PortScanner::new(), ProcessKiller::new(), ConfigStore::new()?).await
    }
}

impl<S, D> PortEngine<S, D>
where
    S: Scanner,
    D: SignalDelivery,
{
    /// Engine with injected collaborators.
    ///
    /// Loads favorites and watched ports from the store; favorited ports
    /// start out as inactive placeholders until the first scan lands.
    pub async fn with_parts(scanner: S, killer: ProcessKiller<D>, config: ConfigStore) -> Result<Self> {
        let favorites = config.get_favorites().await?;
        let watched = config.get_watched_ports().await?;
        let (events, _) = broadcast::channel(64);

        Ok(Self {
            scanner,
            killer,
            config,
            ports: RwLock::new(reconcile::canonical_order(Vec::new(), &favorites)),
            watch_statuses: RwLock::new(HashMap::new()),
            favorites: RwLock::new(favorites),
            watched: RwLock::new(watched),
            scan_in_flight: AtomicBool::new(false),
            events,
        })
    }

    /// Subscribe to state-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Run one scan-and-reconcile cycle.
    ///
    /// At most one cycle runs at a time: a call that arrives while another
    /// is in flight returns immediately without scanning. It does not queue
    /// or block.
    pub async fn refresh(&self) {
        if self
            .scan_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("refresh skipped, scan already in flight");
            return;
        }
        let _guard = ScanGuard(&self.scan_in_flight);

        let scanned = match self.scanner.scan().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "scan failed, treating this cycle as empty");
                Vec::new()
            }
        };

        self.apply_scan(scanned);
    }

    /// Merge one scan result into canonical state. This is the only place
    /// the canonical list is replaced.
    fn apply_scan(&self, scanned: Vec<PortRecord>) {
        let favorites = self.favorites.read().clone();
        let watched = self.watched.read().clone();

        let adopted = {
            let mut ports = self.ports.write();
            match reconcile::reconcile(&ports, scanned, &favorites) {
                Some(new_list) => {
                    *ports = new_list;
                    true
                }
                None => false,
            }
        };

        // Transition detection runs every cycle so newly watched ports get
        // their status seeded even when the inventory itself is unchanged.
        let transitions = {
            let ports = self.ports.read();
            let mut statuses = self.watch_statuses.write();
            reconcile::detect_transitions(&watched, &ports, &mut statuses)
        };

        if adopted {
            let _ = self.events.send(EngineEvent::PortsChanged);
        }
        for t in transitions {
            let _ = self.events.send(EngineEvent::WatchTransition {
                port: t.port,
                to_active: t.to_active,
                process_name: t.process_name,
            });
        }
    }

    /// Snapshot of the last reconciled canonical list.
    pub fn current_ports(&self) -> Vec<PortRecord> {
        self.ports.read().clone()
    }

    /// Check if a port currently has an active binding.
    pub fn is_port_active(&self, port: u16) -> bool {
        self.ports
            .read()
            .iter()
            .any(|r| r.is_active && r.port == port)
    }

    // =========================================================================
    // Process termination
    // =========================================================================

    /// Send a single signal to a process.
    pub async fn kill_process(&self, pid: u32, forceful: bool) -> bool {
        self.killer.kill(pid, forceful).await
    }

    /// Two-stage graceful termination of a process.
    pub async fn kill_gracefully(&self, pid: u32) -> bool {
        self.killer.kill_gracefully(pid).await
    }

    /// Gracefully terminate whatever owns `port`, then rescan to confirm.
    ///
    /// On reported success the killed records are dropped from the canonical
    /// list right away so callers see the effect immediately; the follow-up
    /// scan is authoritative and re-adds the binding if the port was not
    /// actually freed.
    pub async fn kill_port(&self, port: u16) -> bool {
        let target = self
            .ports
            .read()
            .iter()
            .find(|r| r.is_active && r.port == port)
            .cloned();

        let Some(record) = target else {
            return false;
        };

        let killed = self.killer.kill_gracefully(record.pid).await;
        if killed {
            self.remove_pid_optimistically(record.pid);
            self.refresh().await;
        }
        killed
    }

    /// Check whether a process currently exists.
    pub fn is_process_running(&self, pid: u32) -> bool {
        self.killer.is_running(pid)
    }

    fn remove_pid_optimistically(&self, pid: u32) {
        let favorites = self.favorites.read().clone();
        let mut ports = self.ports.write();

        let remaining: Vec<PortRecord> = ports
            .iter()
            .filter(|r| r.is_active && r.pid != pid)
            .cloned()
            .collect();

        if remaining.len() != ports.iter().filter(|r| r.is_active).count() {
            *ports = reconcile::canonical_order(remaining, &favorites);
            drop(ports);
            let _ = self.events.send(EngineEvent::PortsChanged);
        }
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Get all favorite ports.
    pub fn favorites(&self) -> HashSet<u16> {
        self.favorites.read().clone()
    }

    /// Check if a port is a favorite.
    pub fn is_favorite(&self, port: u16) -> bool {
        self.favorites.read().contains(&port)
    }

    /// Add a port to favorites.
    pub async fn add_favorite(&self, port: u16) -> Result<()> {
        self.config.add_favorite(port).await?;
        self.favorites.write().insert(port);
        self.reorder_canonical();
        Ok(())
    }

    /// Remove a port from favorites.
    pub async fn remove_favorite(&self, port: u16) -> Result<()> {
        self.config.remove_favorite(port).await?;
        self.favorites.write().remove(&port);
        self.reorder_canonical();
        Ok(())
    }

    /// Toggle favorite status; returns the new state.
    pub async fn toggle_favorite(&self, port: u16) -> Result<bool> {
        if self.is_favorite(port) {
            self.remove_favorite(port).await?;
            Ok(false)
        } else {
            self.add_favorite(port).await?;
            Ok(true)
        }
    }

    /// Recompute canonical ordering after a favorites change.
    fn reorder_canonical(&self) {
        let favorites = self.favorites.read().clone();
        let mut ports = self.ports.write();

        let active: Vec<PortRecord> = ports.iter().filter(|r| r.is_active).cloned().collect();
        *ports = reconcile::canonical_order(active, &favorites);
        drop(ports);

        let _ = self.events.send(EngineEvent::PortsChanged);
    }

    // =========================================================================
    // Watched ports
    // =========================================================================

    /// Get all watched ports.
    pub fn watched_ports(&self) -> Vec<WatchedPort> {
        self.watched.read().clone()
    }

    /// Check if a port is being watched.
    pub fn is_watched(&self, port: u16) -> bool {
        self.watched.read().iter().any(|w| w.port == port)
    }

    /// Start watching a port.
    pub async fn add_watched_port(
        &self,
        port: u16,
        notify_on_start: bool,
        notify_on_stop: bool,
    ) -> Result<WatchedPort> {
        let spec = self
            .config
            .add_watched_port(port, notify_on_start, notify_on_stop)
            .await?;
        self.watched.write().push(spec.clone());
        Ok(spec)
    }

    /// Stop watching a port.
    pub async fn remove_watched_port(&self, port: u16) -> Result<()> {
        self.config.remove_watched_port(port).await?;
        self.watched.write().retain(|w| w.port != port);
        self.watch_statuses.write().remove(&port);
        Ok(())
    }

    /// Update notification settings for a watched port.
    pub async fn update_watched_port(
        &self,
        port: u16,
        notify_on_start: bool,
        notify_on_stop: bool,
    ) -> Result<()> {
        self.config
            .update_watched_port(port, notify_on_start, notify_on_stop)
            .await?;

        if let Some(spec) = self.watched.write().iter_mut().find(|w| w.port == port) {
            spec.notify_on_start = notify_on_start;
            spec.notify_on_stop = notify_on_stop;
        }
        Ok(())
    }

    /// Toggle watch status; returns the new state.
    pub async fn toggle_watch(&self, port: u16) -> Result<bool> {
        if self.is_watched(port) {
            self.remove_watched_port(port).await?;
            Ok(false)
        } else {
            self.add_watched_port(port, true, true).await?;
            Ok(true)
        }
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Get the refresh interval in seconds.
    pub async fn refresh_interval(&self) -> Result<u64> {
        self.config.get_refresh_interval().await
    }

    /// Set the refresh interval in seconds.
    pub async fn set_refresh_interval(&self, interval: u64) -> Result<()> {
        self.config.set_refresh_interval(interval).await
    }

    /// Get the show-inactive view flag.
    pub async fn show_inactive(&self) -> Result<bool> {
        self.config.get_show_inactive().await
    }

    /// Set the show-inactive view flag.
    pub async fn set_show_inactive(&self, enabled: bool) -> Result<()> {
        self.config.set_show_inactive(enabled).await
    }
}
