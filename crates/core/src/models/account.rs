use serde::{Deserialize, Serialize};

/// The kind of a financial account.
/// Determines which detail screen a consumer routes the record to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Checking / savings bank accounts
    Bank,
    /// Credit cards
    Card,
    /// Investment positions (funds, fixed income, stocks)
    Investment,
    /// Anything the remote sends that this client does not model.
    /// Kept in storage so a full sync never drops unknown records.
    Unsupported,
}

impl AccountKind {
    /// Map a remote type label onto a kind. Unknown labels become
    /// `Unsupported` rather than failing the whole sync.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "bank" => AccountKind::Bank,
            "card" => AccountKind::Card,
            "investment" => AccountKind::Investment,
            _ => AccountKind::Unsupported,
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountKind::Bank => write!(f, "bank"),
            AccountKind::Card => write!(f, "card"),
            AccountKind::Investment => write!(f, "investment"),
            AccountKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// A financial account as persisted in the local store.
///
/// `id` is the primary key. Remote-origin records keep the id the remote
/// assigned; locally created records derive one from the name so that a
/// record created twice with the same name collapses into one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable unique identifier (primary key)
    pub id: String,

    /// Display name (e.g., "Nuconta", "Tesouro Selic 2029")
    pub name: String,

    /// Current balance. Signed: cards typically carry a negative value.
    pub balance: f64,

    /// Free-form grouping label (e.g., "Cards", "Fixed Income")
    pub category: String,

    /// Icon reference for the presentation layer
    pub icon: String,

    /// Account kind, routing detail views and sync behavior
    pub kind: AccountKind,

    /// `false` while a locally originated record has not yet been
    /// checked against the remote. Remote-origin records start `true`.
    #[serde(default = "default_synced")]
    pub synced: bool,
}

fn default_synced() -> bool {
    true
}

impl Account {
    /// Create an account as received from the remote (already confirmed).
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: f64,
        category: impl Into<String>,
        icon: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            balance,
            category: category.into(),
            icon: icon.into(),
            kind,
            synced: true,
        }
    }

    /// Create a locally originated account, not yet confirmed against the
    /// remote. The id is derived deterministically from the name.
    pub fn local(
        name: impl Into<String>,
        balance: f64,
        category: impl Into<String>,
        icon: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        let name = name.into();
        Self {
            id: Self::derive_id(&name),
            name,
            balance,
            category: category.into(),
            icon: icon.into(),
            kind,
            synced: false,
        }
    }

    /// Deterministic id for a locally created account: lowercased name with
    /// whitespace runs collapsed to a single `-`.
    pub fn derive_id(name: &str) -> String {
        name.trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }
}
