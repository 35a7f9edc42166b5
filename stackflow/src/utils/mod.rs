//! Utility functions for run identifiers and timestamp handling.

use chrono::Utc;
use uuid::Uuid;

/// Returns the current UTC time as an ISO 8601 string with microseconds.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Generates an identifier for one orchestration run.
#[must_use]
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}
