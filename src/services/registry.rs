//! Concurrency-safe vehicle session bookkeeping for one lot
//!
//! The registry is the single source of truth for which vehicles are
//! currently inside a lot. Admit, depart, and snapshot all funnel through
//! one exclusive lock over the whole map, so mutations execute strictly
//! serially and a snapshot never observes a half-applied mutation.
//!
//! Key behaviors:
//! - At most one active session per plate at any time
//! - Departure removes the session and derives minutes and fee from it
//! - Snapshot reflects a single consistent point in time

use crate::domain::types::{DepartureReceipt, LotStatus, RegistryError, VehicleSession};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// In-memory registry of active vehicle sessions for one lot instance.
///
/// Owned and explicit rather than process-global, so independent lot
/// instances can coexist in one process. Volatile: nothing survives a
/// restart.
pub struct LotRegistry {
    /// plate -> active session, guarded as a whole
    sessions: Mutex<HashMap<String, VehicleSession>>,
}

impl LotRegistry {
    pub fn new() -> Self {
        Self { sessions: Mutex::new(HashMap::new()) }
    }

    /// Admit a vehicle. `now` becomes the session's entry time.
    pub fn admit(&self, plate: &str, now: Instant) -> Result<(), RegistryError> {
        if plate.is_empty() {
            return Err(RegistryError::InvalidPlate);
        }

        let mut sessions = self.sessions.lock();
        if sessions.contains_key(plate) {
            return Err(RegistryError::AlreadyParked(plate.to_string()));
        }

        sessions.insert(
            plate.to_string(),
            VehicleSession { plate: plate.to_string(), entered_at: now },
        );
        info!(plate = %plate, occupied = sessions.len(), "vehicle_admitted");
        Ok(())
    }

    /// Depart a vehicle, destroying its session.
    ///
    /// Minutes parked are rounded down to whole minutes; the fee follows
    /// from them (one unit per minute). A failed departure leaves the
    /// registry untouched.
    pub fn depart(&self, plate: &str, now: Instant) -> Result<DepartureReceipt, RegistryError> {
        if plate.is_empty() {
            return Err(RegistryError::InvalidPlate);
        }

        let mut sessions = self.sessions.lock();
        let session = sessions
            .remove(plate)
            .ok_or_else(|| RegistryError::NotFound(plate.to_string()))?;

        let minutes = now.duration_since(session.entered_at).as_secs() / 60;
        info!(plate = %plate, minutes = %minutes, occupied = sessions.len(), "vehicle_departed");
        Ok(DepartureReceipt { plate: session.plate, minutes })
    }

    /// Point-in-time view of the active plates and their count.
    ///
    /// Plates are sorted so repeated snapshots of an unchanged registry
    /// compare equal.
    pub fn snapshot(&self) -> LotStatus {
        let sessions = self.sessions.lock();
        let mut plates: Vec<String> = sessions.keys().cloned().collect();
        plates.sort();
        LotStatus { ocupados: plates.len() as u64, vehiculos_activos: plates }
    }
}

impl Default for LotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    #[test]
    fn test_admit_inserts_session() {
        let registry = LotRegistry::new();
        registry.admit("ABC123", Instant::now()).unwrap();

        let status = registry.snapshot();
        assert_eq!(status.ocupados, 1);
        assert_eq!(status.vehiculos_activos, vec!["ABC123".to_string()]);
    }

    #[test]
    fn test_admit_empty_plate_rejected() {
        let registry = LotRegistry::new();
        assert_eq!(registry.admit("", Instant::now()), Err(RegistryError::InvalidPlate));
        assert_eq!(registry.snapshot().ocupados, 0);
    }

    #[test]
    fn test_second_admit_of_same_plate_conflicts() {
        let registry = LotRegistry::new();
        registry.admit("ABC123", Instant::now()).unwrap();

        assert_eq!(
            registry.admit("ABC123", Instant::now()),
            Err(RegistryError::AlreadyParked("ABC123".to_string()))
        );
        assert_eq!(registry.snapshot().ocupados, 1);
    }

    #[test]
    fn test_plates_are_case_sensitive() {
        let registry = LotRegistry::new();
        registry.admit("abc123", Instant::now()).unwrap();
        registry.admit("ABC123", Instant::now()).unwrap();

        assert_eq!(registry.snapshot().ocupados, 2);
    }

    #[test]
    fn test_immediate_departure_is_free() {
        let registry = LotRegistry::new();
        let now = Instant::now();

        registry.admit("ABC123", now).unwrap();
        let receipt = registry.depart("ABC123", now).unwrap();

        assert_eq!(receipt.minutes, 0);
        assert_eq!(receipt.fee_display(), "$0.00");
        assert_eq!(registry.snapshot().ocupados, 0);
    }

    #[test]
    fn test_minutes_round_down() {
        let registry = LotRegistry::new();
        let now = Instant::now();

        registry.admit("ABC123", now).unwrap();
        // 2 minutes 59 seconds parked
        let later = now + Duration::from_secs(2 * 60 + 59);
        let receipt = registry.depart("ABC123", later).unwrap();

        assert_eq!(receipt.minutes, 2);
        assert_eq!(receipt.fee_display(), "$0.02");
    }

    #[test]
    fn test_fee_grows_with_minutes() {
        let registry = LotRegistry::new();
        let now = Instant::now();

        registry.admit("ABC123", now).unwrap();
        let later = now + Duration::from_secs(42 * 60);
        let receipt = registry.depart("ABC123", later).unwrap();

        assert_eq!(receipt.minutes, 42);
        assert_eq!(receipt.fee_display(), "$0.42");
    }

    #[test]
    fn test_fee_crosses_major_unit() {
        let registry = LotRegistry::new();
        let now = Instant::now();

        registry.admit("ABC123", now).unwrap();
        let later = now + Duration::from_secs(125 * 60 + 30);
        let receipt = registry.depart("ABC123", later).unwrap();

        assert_eq!(receipt.minutes, 125);
        assert_eq!(receipt.fee_display(), "$1.25");
    }

    #[test]
    fn test_depart_unknown_plate_not_found() {
        let registry = LotRegistry::new();
        registry.admit("ABC123", Instant::now()).unwrap();
        let before = registry.snapshot();

        assert_eq!(
            registry.depart("XYZ999", Instant::now()),
            Err(RegistryError::NotFound("XYZ999".to_string()))
        );
        // Failed departure leaves the registry unchanged
        assert_eq!(registry.snapshot(), before);
    }

    #[test]
    fn test_depart_empty_plate_rejected() {
        let registry = LotRegistry::new();
        assert_eq!(registry.depart("", Instant::now()), Err(RegistryError::InvalidPlate));
    }

    #[test]
    fn test_readmission_after_departure() {
        let registry = LotRegistry::new();
        let now = Instant::now();

        registry.admit("ABC123", now).unwrap();
        registry.depart("ABC123", now + Duration::from_secs(60)).unwrap();

        // Plate is free again once the session is destroyed
        registry.admit("ABC123", now + Duration::from_secs(120)).unwrap();
        let receipt = registry.depart("ABC123", now + Duration::from_secs(180)).unwrap();
        // Minutes count from re-admission, not the original entry
        assert_eq!(receipt.minutes, 1);
    }

    #[test]
    fn test_snapshot_idempotent() {
        let registry = LotRegistry::new();
        registry.admit("AAA111", Instant::now()).unwrap();
        registry.admit("BBB222", Instant::now()).unwrap();

        assert_eq!(registry.snapshot(), registry.snapshot());
    }

    #[test]
    fn test_snapshot_plates_sorted() {
        let registry = LotRegistry::new();
        registry.admit("ZZZ999", Instant::now()).unwrap();
        registry.admit("AAA111", Instant::now()).unwrap();
        registry.admit("MMM555", Instant::now()).unwrap();

        let status = registry.snapshot();
        assert_eq!(
            status.vehiculos_activos,
            vec!["AAA111".to_string(), "MMM555".to_string(), "ZZZ999".to_string()]
        );
        assert_eq!(status.ocupados, 3);
    }

    #[test]
    fn test_concurrent_admits_distinct_plates_both_succeed() {
        let registry = Arc::new(LotRegistry::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["AAA111", "BBB222"]
            .into_iter()
            .map(|plate| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.admit(plate, Instant::now())
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let status = registry.snapshot();
        assert_eq!(status.ocupados, 2);
        assert!(status.vehiculos_activos.contains(&"AAA111".to_string()));
        assert!(status.vehiculos_activos.contains(&"BBB222".to_string()));
    }

    #[test]
    fn test_concurrent_admits_same_plate_exactly_one_wins() {
        let registry = Arc::new(LotRegistry::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry.admit("ABC123", Instant::now())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(RegistryError::AlreadyParked(_))))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(registry.snapshot().ocupados, 1);
    }
}
