use serde::{Deserialize, Serialize};

/// Tolerance under which a balance adjustment is considered a no-op.
pub const ADJUSTMENT_EPSILON: f64 = 0.001;

/// Sync-engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Base URL of the remote API (no trailing slash)
    pub base_url: String,

    /// Interval between background reconciliation passes, in seconds
    pub reconcile_interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.pocketledger.dev/v1".to_string(),
            reconcile_interval_secs: 120,
        }
    }
}
