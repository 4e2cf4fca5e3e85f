use thiserror::Error;

/// Unified error type for the entire pocketledger-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
///
/// The enum is `Clone` (all payloads are plain strings/ints) so that a
/// coalesced fetch can broadcast its outcome to every waiting caller.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Snapshot file ───────────────────────────────────────────────
    #[error("Invalid snapshot format: {0}")]
    InvalidSnapshotFormat(String),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u16),

    // ── Local persistence ───────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    // ── Remote gateway ──────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed remote payload: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ── Business logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Decode(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs so that
        // account names and other query values never end up in logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
