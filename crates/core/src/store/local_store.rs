use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::watch;

use crate::errors::CoreError;
use crate::models::account::Account;
use crate::models::investment::InvestmentDetail;
use crate::models::transaction::{StatementEntry, StatementFilter};

use super::format;
use super::snapshot::Snapshot;

/// Key-indexed persistent store for accounts, investment detail, and
/// statement entries.
///
/// One in-memory `Snapshot` behind a mutex is the single serialization
/// point for all writers; the snapshot is flushed to disk on every commit
/// (temp file + rename, so a crash mid-write never corrupts the previous
/// snapshot). Reads return independent copies — no caller ever holds a
/// live reference into mutable storage.
pub struct LocalStore {
    inner: Mutex<Snapshot>,
    path: Option<PathBuf>,
    /// Bumped after every committed write; consumers subscribe to re-read.
    revision: watch::Sender<u64>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.state();
        f.debug_struct("LocalStore")
            .field("accounts", &snap.accounts.len())
            .field("investments", &snap.investments.len())
            .field("statement", &snap.statement.len())
            .field("path", &self.path)
            .finish()
    }
}

impl LocalStore {
    /// Open a store backed by a snapshot file, loading it if present.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let bytes = std::fs::read(&path)?;
            let payload = format::read_file(&bytes)?;
            bincode::deserialize(payload)
                .map_err(|e| CoreError::Storage(format!("Failed to deserialize snapshot: {e}")))?
        } else {
            Snapshot::new()
        };

        let (revision, _) = watch::channel(0);
        Ok(Self {
            inner: Mutex::new(snapshot),
            path: Some(path),
            revision,
        })
    }

    /// Open a purely in-memory store (tests, or consumers that persist
    /// elsewhere).
    pub fn in_memory() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Snapshot::new()),
            path: None,
            revision,
        }
    }

    /// Subscribe to commit notifications. The carried value is a revision
    /// counter; consumers re-read whatever they display when it changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ── Reads (never suspend, always the latest committed state) ────

    /// Point lookup of an account by id.
    #[must_use]
    pub fn account(&self, id: &str) -> Option<Account> {
        self.state().accounts.get(id).cloned()
    }

    /// All accounts, unordered.
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        self.state().accounts.values().cloned().collect()
    }

    /// Accounts not yet confirmed against the remote.
    #[must_use]
    pub fn pending_accounts(&self) -> Vec<Account> {
        self.state()
            .accounts
            .values()
            .filter(|a| !a.synced)
            .cloned()
            .collect()
    }

    /// Point lookup of an investment detail by id.
    #[must_use]
    pub fn investment(&self, id: &str) -> Option<InvestmentDetail> {
        self.state().investments.get(id).cloned()
    }

    /// All investment details, unordered.
    #[must_use]
    pub fn investments(&self) -> Vec<InvestmentDetail> {
        self.state().investments.values().cloned().collect()
    }

    /// Statement entries for one account, newest-first, optionally
    /// restricted to a date window.
    #[must_use]
    pub fn statement_for(
        &self,
        account_name: &str,
        filter: Option<StatementFilter>,
    ) -> Vec<StatementEntry> {
        let now = Utc::now();
        let mut entries: Vec<StatementEntry> = self
            .state()
            .statement
            .values()
            .filter(|e| e.account_name == account_name)
            .filter(|e| filter.is_none_or(|f| f.matches(e.date_posted, now)))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date_posted.cmp(&a.date_posted));
        entries
    }

    // ── Writes (all funnel through the scoped transaction) ──────────

    /// Atomically delete every account and insert the given set.
    pub fn replace_all_accounts(&self, accounts: Vec<Account>) -> Result<(), CoreError> {
        self.write_scoped(|snap| {
            snap.accounts.clear();
            for account in accounts {
                snap.accounts.insert(account.id.clone(), account);
            }
            Ok(())
        })
    }

    /// Insert or overwrite one account by primary key.
    pub fn upsert_account(&self, account: Account) -> Result<(), CoreError> {
        self.write_scoped(|snap| {
            snap.accounts.insert(account.id.clone(), account);
            Ok(())
        })
    }

    /// Insert or overwrite one investment detail by primary key.
    pub fn upsert_investment(&self, detail: InvestmentDetail) -> Result<(), CoreError> {
        self.write_scoped(|snap| {
            snap.investments.insert(detail.id.clone(), detail);
            Ok(())
        })
    }

    /// Union-merge statement entries: existing fitids are overwritten,
    /// never duplicated; entries absent from `entries` are kept.
    pub fn upsert_statement_entries(
        &self,
        entries: Vec<StatementEntry>,
    ) -> Result<(), CoreError> {
        self.write_scoped(|snap| {
            for entry in entries {
                snap.statement.insert(entry.id.clone(), entry);
            }
            Ok(())
        })
    }

    /// Scoped write transaction. The mutator runs against a private copy of
    /// the snapshot; on `Ok` the copy is persisted and becomes the visible
    /// state, on `Err` it is discarded and prior state stays intact. No
    /// reader can observe a partially applied mutation.
    pub fn write_scoped<T>(
        &self,
        mutator: impl FnOnce(&mut Snapshot) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut next = guard.clone();
        let out = mutator(&mut next)?;

        // Durability first: if the disk write fails the in-memory state is
        // left untouched and the caller sees the store as unchanged.
        self.persist(&next)?;
        *guard = next;
        drop(guard);

        self.revision.send_modify(|rev| *rev += 1);
        Ok(out)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn state(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialize and write the snapshot: bincode → PKLG container → temp
    /// file → rename over the previous file.
    fn persist(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let payload = bincode::serialize(snapshot)
            .map_err(|e| CoreError::Storage(format!("Failed to serialize snapshot: {e}")))?;
        let bytes = format::write_file(format::CURRENT_VERSION, &payload);

        let tmp = path.with_extension("pklg.tmp");
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
