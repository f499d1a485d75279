//! Inventory reconciliation.
//!
//! Decides whether a fresh scan actually changed the canonical port list,
//! computes the canonical ordering, and detects watched-port transitions
//! between cycles. All functions here are pure over their inputs; the
//! engine owns the state they operate on.

use std::collections::{HashMap, HashSet};

use crate::domain::{PortRecord, WatchedPort};

/// A watched port crossing between active and inactive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTransition {
    /// The watched port that changed status.
    pub port: u16,
    /// True when the port just became active.
    pub to_active: bool,
    /// Name of the newly bound process, for start transitions.
    pub process_name: Option<String>,
}

/// Reconcile a fresh scan against the previous canonical list.
///
/// Returns `None` when the `(port, pid)` key sets of the previous active
/// records and the scan are equal: the previous list is then retained
/// unchanged, so cosmetic field churn (command text, descriptors) never
/// ripples out as a state change. Otherwise returns the scan in canonical
/// order, ready to replace the previous list.
pub fn reconcile(
    previous: &[PortRecord],
    scanned: Vec<PortRecord>,
    favorites: &HashSet<u16>,
) -> Option<Vec<PortRecord>> {
    let previous_keys: HashSet<(u16, u32)> = previous
        .iter()
        .filter(|r| r.is_active)
        .map(PortRecord::key)
        .collect();
    let scanned_keys: HashSet<(u16, u32)> = scanned.iter().map(PortRecord::key).collect();

    if previous_keys == scanned_keys {
        return None;
    }

    Some(canonical_order(scanned, favorites))
}

/// Canonical presentation order: favorited ports first, then ascending port
/// within each partition. Favorited ports with no live binding get an
/// inactive placeholder so they stay visible.
pub fn canonical_order(active: Vec<PortRecord>, favorites: &HashSet<u16>) -> Vec<PortRecord> {
    let bound: HashSet<u16> = active.iter().map(|r| r.port).collect();

    let mut records = active;
    records.extend(
        favorites
            .iter()
            .filter(|port| !bound.contains(port))
            .map(|&port| PortRecord::inactive(port)),
    );

    // Stable sort: within a partition, equal ports keep encounter order.
    records.sort_by_key(|r| (!favorites.contains(&r.port), r.port));
    records
}

/// Detect active/inactive flips for watched ports.
///
/// `statuses` is the persistent port → was-active map from the previous
/// cycle. The first sighting of a watched port only seeds the map; events
/// fire on genuine cross-cycle changes, and only in the directions the
/// watch spec asked for. Status entries for ports no longer watched are
/// pruned.
pub fn detect_transitions(
    watched: &[WatchedPort],
    records: &[PortRecord],
    statuses: &mut HashMap<u16, bool>,
) -> Vec<WatchTransition> {
    let active: HashSet<u16> = records
        .iter()
        .filter(|r| r.is_active)
        .map(|r| r.port)
        .collect();

    let mut transitions = Vec::new();

    for spec in watched {
        let is_active = active.contains(&spec.port);

        if let Some(&was_active) = statuses.get(&spec.port) {
            if was_active && !is_active && spec.notify_on_stop {
                transitions.push(WatchTransition {
                    port: spec.port,
                    to_active: false,
                    process_name: None,
                });
            } else if !was_active && is_active && spec.notify_on_start {
                let process_name = records
                    .iter()
                    .find(|r| r.is_active && r.port == spec.port)
                    .map(|r| r.process_name.clone());
                transitions.push(WatchTransition {
                    port: spec.port,
                    to_active: true,
                    process_name,
                });
            }
        }

        statuses.insert(spec.port, is_active);
    }

    let watched_ports: HashSet<u16> = watched.iter().map(|w| w.port).collect();
    statuses.retain(|port, _| watched_ports.contains(port));

    transitions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(port: u16, pid: u32) -> PortRecord {
        PortRecord::active(port, pid, "proc", "*", "user", "proc --serve", "1u")
    }

    #[test]
    fn identical_key_sets_are_a_no_op() {
        let previous = vec![active(80, 1), active(3000, 2)];

        // Same keys, different cosmetic fields.
        let mut rescanned = vec![active(3000, 2), active(80, 1)];
        rescanned[0].command = "proc --serve --verbose".to_string();
        rescanned[1].fd = "9u".to_string();

        assert_eq!(reconcile(&previous, rescanned, &HashSet::new()), None);
    }

    #[test]
    fn placeholders_do_not_affect_the_key_comparison() {
        // Previous canonical list carries a placeholder for favorite 9000.
        let previous = vec![PortRecord::inactive(9000), active(80, 1)];
        let favorites = HashSet::from([9000]);

        assert_eq!(reconcile(&previous, vec![active(80, 1)], &favorites), None);
    }

    #[test]
    fn changed_keys_adopt_the_new_scan() {
        let previous = vec![active(80, 1)];
        let adopted = reconcile(&previous, vec![active(80, 1), active(3000, 2)], &HashSet::new())
            .expect("key sets differ");

        let ports: Vec<u16> = adopted.iter().map(|r| r.port).collect();
        assert_eq!(ports, vec![80, 3000]);
    }

    #[test]
    fn same_port_new_pid_counts_as_a_change() {
        let previous = vec![active(3000, 2)];
        assert!(reconcile(&previous, vec![active(3000, 7)], &HashSet::new()).is_some());
    }

    #[test]
    fn favorites_sort_first_then_port_ascending() {
        let favorites = HashSet::from([8080, 5432]);
        let ordered = canonical_order(
            vec![active(80, 1), active(8080, 2), active(3000, 3), active(5432, 4)],
            &favorites,
        );

        let ports: Vec<u16> = ordered.iter().map(|r| r.port).collect();
        assert_eq!(ports, vec![5432, 8080, 80, 3000]);
    }

    #[test]
    fn unbound_favorites_get_placeholders() {
        let favorites = HashSet::from([9000]);
        let ordered = canonical_order(vec![active(80, 1)], &favorites);

        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].port, 9000);
        assert!(!ordered[0].is_active);
        assert_eq!(ordered[0].pid, 0);
        assert_eq!(ordered[1].port, 80);
    }

    #[test]
    fn bound_favorites_get_no_placeholder() {
        let favorites = HashSet::from([80]);
        let ordered = canonical_order(vec![active(80, 1)], &favorites);

        assert_eq!(ordered.len(), 1);
        assert!(ordered[0].is_active);
    }

    #[test]
    fn first_sighting_seeds_without_firing() {
        let watched = vec![WatchedPort::new(3000)];
        let mut statuses = HashMap::new();

        let events = detect_transitions(&watched, &[active(3000, 2)], &mut statuses);
        assert!(events.is_empty());
        assert_eq!(statuses.get(&3000), Some(&true));
    }

    #[test]
    fn start_transition_fires_exactly_once() {
        let watched = vec![WatchedPort::new(3000)];
        let mut statuses = HashMap::from([(3000, false)]);

        let events = detect_transitions(&watched, &[active(3000, 2)], &mut statuses);
        assert_eq!(
            events,
            vec![WatchTransition {
                port: 3000,
                to_active: true,
                process_name: Some("proc".to_string()),
            }]
        );

        // Unchanged next cycle: nothing fires.
        let events = detect_transitions(&watched, &[active(3000, 2)], &mut statuses);
        assert!(events.is_empty());
    }

    #[test]
    fn stop_transition_respects_the_spec_flags() {
        let silent_stop = vec![WatchedPort::with_notifications(3000, true, false)];
        let mut statuses = HashMap::from([(3000, true)]);

        let events = detect_transitions(&silent_stop, &[], &mut statuses);
        assert!(events.is_empty());
        assert_eq!(statuses.get(&3000), Some(&false));

        let noisy_stop = vec![WatchedPort::new(8080)];
        let mut statuses = HashMap::from([(8080, true)]);

        let events = detect_transitions(&noisy_stop, &[], &mut statuses);
        assert_eq!(
            events,
            vec![WatchTransition {
                port: 8080,
                to_active: false,
                process_name: None,
            }]
        );
    }

    #[test]
    fn placeholder_records_count_as_inactive() {
        let watched = vec![WatchedPort::new(9000)];
        let mut statuses = HashMap::from([(9000, true)]);

        // The canonical list still contains a placeholder for the port.
        let events = detect_transitions(&watched, &[PortRecord::inactive(9000)], &mut statuses);
        assert_eq!(events.len(), 1);
        assert!(!events[0].to_active);
    }

    #[test]
    fn statuses_for_unwatched_ports_are_pruned() {
        let mut statuses = HashMap::from([(3000, true), (8080, false)]);

        detect_transitions(&[WatchedPort::new(3000)], &[], &mut statuses);
        assert!(statuses.contains_key(&3000));
        assert!(!statuses.contains_key(&8080));
    }
}
