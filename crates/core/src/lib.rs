pub mod connectivity;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod services;
pub mod store;

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use connectivity::ConnectivityMonitor;
use errors::CoreError;
use gateway::rest::RestGateway;
use gateway::traits::RemoteGateway;
use models::account::Account;
use models::investment::InvestmentDetail;
use models::settings::SyncSettings;
use models::transaction::{StatementEntry, StatementFilter, Transaction};
use services::ledger_service::LedgerService;
use services::sync_service::SyncService;
use store::local_store::LocalStore;

/// Main entry point for the PocketLedger core library.
///
/// Owns the local store, the connectivity monitor, and the services that
/// operate on them. The presentation layer calls the read/refresh methods
/// here and re-reads on change notifications; it never writes storage
/// directly.
#[must_use]
pub struct PocketLedger {
    store: Arc<LocalStore>,
    connectivity: ConnectivityMonitor,
    sync: SyncService,
    ledger: LedgerService,
    settings: SyncSettings,
    reconciler: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for PocketLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PocketLedger")
            .field("store", &self.store)
            .field("reachable", &self.connectivity.is_reachable())
            .field("settings", &self.settings)
            .finish()
    }
}

impl PocketLedger {
    /// Open a ledger backed by a snapshot file, talking to the remote API
    /// configured in `settings`.
    pub fn open(path: impl AsRef<Path>, settings: SyncSettings) -> Result<Self, CoreError> {
        let store = Arc::new(LocalStore::open(path)?);
        let gateway: Arc<dyn RemoteGateway> = Arc::new(RestGateway::new(&settings.base_url));
        Ok(Self::build(store, gateway, settings))
    }

    /// Build a ledger over an existing store and gateway. This is the
    /// seam used by tests and by hosts that inject their own transport.
    pub fn with_gateway(
        store: Arc<LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        settings: SyncSettings,
    ) -> Self {
        Self::build(store, gateway, settings)
    }

    // ── Accounts ────────────────────────────────────────────────────

    /// All accounts, locally served; pulls from the remote on a cold
    /// (empty) store.
    pub async fn accounts(&self) -> Result<Vec<Account>, CoreError> {
        self.sync.accounts().await
    }

    /// Force a full account sync. Remote is authoritative: records absent
    /// from the payload are removed.
    pub async fn refresh_accounts(&self) -> Result<Vec<Account>, CoreError> {
        self.sync.refresh_accounts().await
    }

    /// Local point lookup of one account.
    #[must_use]
    pub fn account(&self, id: &str) -> Option<Account> {
        self.store.account(id)
    }

    /// Create an account locally. Its id is derived from the name and it
    /// stays marked unsynced until the background reconciler confirms it
    /// against the remote.
    pub fn add_local_account(
        &self,
        name: impl Into<String>,
        balance: f64,
        category: impl Into<String>,
        icon: impl Into<String>,
        kind: models::account::AccountKind,
    ) -> Result<Account, CoreError> {
        let account = Account::local(name, balance, category, icon, kind);
        self.store.upsert_account(account.clone())?;
        Ok(account)
    }

    /// Overwrite one account by id (local edit; the next full sync may
    /// replace it, since the remote stays authoritative).
    pub fn update_account(&self, account: Account) -> Result<(), CoreError> {
        self.store.upsert_account(account)
    }

    // ── Investment detail ───────────────────────────────────────────

    /// Detail for one investment, served locally when present.
    pub async fn investment_detail(&self, id: &str) -> Result<InvestmentDetail, CoreError> {
        self.sync.investment_detail(id).await
    }

    /// Force a remote refresh of one investment detail. Concurrent calls
    /// for the same id share a single fetch.
    pub async fn refresh_investment_detail(
        &self,
        id: &str,
    ) -> Result<InvestmentDetail, CoreError> {
        self.sync.refresh_investment_detail(id).await
    }

    // ── Statement ───────────────────────────────────────────────────

    /// Statement entries for one account, newest-first, optionally
    /// filtered to a date window.
    pub async fn statement(
        &self,
        account_name: &str,
        filter: Option<StatementFilter>,
    ) -> Result<Vec<StatementEntry>, CoreError> {
        self.sync.statement(account_name, filter).await
    }

    /// Force a statement refresh for one account (union merge by fitid).
    pub async fn refresh_statement(
        &self,
        account_name: &str,
    ) -> Result<Vec<StatementEntry>, CoreError> {
        self.sync.refresh_statement(account_name).await
    }

    // ── Ledger adjustments ──────────────────────────────────────────

    /// Set an investment's balance and append the explanatory adjustment
    /// transaction, atomically.
    pub fn adjust_balance(
        &self,
        investment_id: &str,
        new_balance: f64,
        at: DateTime<Utc>,
    ) -> Result<Transaction, CoreError> {
        self.ledger.adjust_balance(investment_id, new_balance, at)
    }

    /// `adjust_balance` with the timestamp defaulted to now.
    pub fn adjust_balance_now(
        &self,
        investment_id: &str,
        new_balance: f64,
    ) -> Result<Transaction, CoreError> {
        self.ledger.adjust_balance_now(investment_id, new_balance)
    }

    /// Parse a user-typed amount (comma or dot decimal separator) and
    /// apply it as a balance adjustment.
    pub fn adjust_balance_from_input(
        &self,
        investment_id: &str,
        input: &str,
    ) -> Result<Transaction, CoreError> {
        let new_balance = LedgerService::parse_amount(input)?;
        self.ledger.adjust_balance_now(investment_id, new_balance)
    }

    /// Remove a ledger transaction, symmetrically adjusting the owning
    /// balance.
    pub fn remove_transaction(
        &self,
        investment_id: &str,
        transaction_id: &str,
    ) -> Result<Transaction, CoreError> {
        self.ledger.remove_transaction(investment_id, transaction_id)
    }

    // ── Background reconciliation ───────────────────────────────────

    /// Start the periodic catch-up task (no-op when already running).
    /// Each pass runs only while the network is reachable.
    pub fn start_reconciler(&self) {
        let mut slot = self
            .reconciler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }
        let interval = Duration::from_secs(self.settings.reconcile_interval_secs);
        *slot = Some(self.sync.spawn_reconciler(self.connectivity.clone(), interval));
    }

    /// Stop the periodic catch-up task, if running.
    pub fn stop_reconciler(&self) {
        let mut slot = self
            .reconciler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Run one reconciliation pass immediately, regardless of the timer.
    pub async fn reconcile_now(&self) -> Result<usize, CoreError> {
        self.sync.reconcile_pending().await
    }

    // ── Observation ─────────────────────────────────────────────────

    /// Handle for the platform layer to feed reachability updates into,
    /// and for consumers to read or subscribe to.
    #[must_use]
    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Subscribe to store commit notifications; re-read on change.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(
        store: Arc<LocalStore>,
        gateway: Arc<dyn RemoteGateway>,
        settings: SyncSettings,
    ) -> Self {
        let connectivity = ConnectivityMonitor::new(false);
        let sync = SyncService::new(Arc::clone(&store), gateway);
        let ledger = LedgerService::new(Arc::clone(&store));

        Self {
            store,
            connectivity,
            sync,
            ledger,
            settings,
            reconciler: Mutex::new(None),
        }
    }
}

impl Drop for PocketLedger {
    fn drop(&mut self) {
        self.stop_reconciler();
    }
}
