//! Application Configuration
//!
//! Settings of the background reconciliation pipeline.

use std::time::Duration;

/// Reconciliation pipeline configuration
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// How often the scanner re-reads not-yet-terminal orders
    pub scan_period: Duration,
    /// Number of concurrent provider workers
    pub workers: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            scan_period: Duration::from_secs(5),
            workers: 5,
        }
    }
}
