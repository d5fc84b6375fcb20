//! Shared types for the parqueadero nodes

use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// One vehicle's continuous presence in a lot, from admission to departure.
///
/// Destroyed on departure; no historical record is kept.
#[derive(Debug, Clone)]
pub struct VehicleSession {
    pub plate: String,
    /// Captured at admission. Monotonic, so departure math never goes backward.
    pub entered_at: Instant,
}

/// Outcome of a successful departure. The session it came from no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureReceipt {
    pub plate: String,
    /// Whole minutes parked, rounded down.
    pub minutes: u64,
}

impl DepartureReceipt {
    /// Fee display string: one smallest-currency-unit per minute, shown as a
    /// two-decimal major-unit amount.
    pub fn fee_display(&self) -> String {
        format!("${:.2}", self.minutes as f64 / 100.0)
    }
}

/// Occupancy payload a lot reports on its `/estado` route.
///
/// Also the shape the coordinator expects back when it queries a lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotStatus {
    pub vehiculos_activos: Vec<String>,
    pub ocupados: u64,
}

/// Registry operation failures, mapped to response codes at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Plate was empty (or the request body did not decode).
    #[error("empty plate")]
    InvalidPlate,
    /// An active session for this plate already exists.
    #[error("vehicle {0} already parked")]
    AlreadyParked(String),
    /// No active session for this plate.
    #[error("vehicle {0} not found")]
    NotFound(String),
}
