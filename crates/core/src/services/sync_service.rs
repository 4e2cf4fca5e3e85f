use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::connectivity::ConnectivityMonitor;
use crate::errors::CoreError;
use crate::gateway::traits::RemoteGateway;
use crate::models::account::Account;
use crate::models::investment::InvestmentDetail;
use crate::models::transaction::{StatementEntry, StatementFilter};
use crate::store::local_store::LocalStore;

/// Per-key registry of in-flight refreshes. The first caller for a key
/// runs the request in a detached task; later callers for the same key
/// subscribe to its broadcast instead of starting a second request.
struct InflightRegistry<T> {
    inflight: Arc<Mutex<HashMap<String, broadcast::Sender<Result<T, CoreError>>>>>,
}

impl<T> Clone for InflightRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<T: Clone + Send + 'static> InflightRegistry<T> {
    fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `fetch` for `key`, coalescing with any request already in
    /// flight for the same key. The fetch runs detached, so a caller that
    /// stops waiting abandons only its own observation while every other
    /// waiter still receives the shared result.
    async fn run<F>(&self, key: &str, fetch: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let mut rx = {
            let mut inflight = self
                .inflight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if let Some(tx) = inflight.get(key) {
                log::debug!("refresh '{key}': joining in-flight request");
                tx.subscribe()
            } else {
                let (tx, rx) = broadcast::channel(1);
                inflight.insert(key.to_string(), tx.clone());

                let registry = Arc::clone(&self.inflight);
                let key = key.to_string();
                tokio::spawn(async move {
                    let result = fetch.await;
                    // Deregister before broadcasting so a caller arriving
                    // after the send starts a fresh request instead of
                    // subscribing to a channel that already fired.
                    registry
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .remove(&key);
                    if let Err(ref e) = result {
                        log::warn!("refresh '{key}': failed: {e}");
                    }
                    let _ = tx.send(result);
                });
                rx
            }
        };

        match rx.recv().await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Network(
                "Refresh ended before producing a result".into(),
            )),
        }
    }
}

/// Reconciles the local store against the remote service.
///
/// Read paths are local-first: a local hit is served without touching the
/// gateway; a miss pulls once, persists, and re-reads. Full account syncs
/// are replace-all (remote is authoritative for existence and field
/// values); statement syncs are union merges keyed by fitid. A fetch
/// failure propagates to the caller while the last known local snapshot
/// stays readable.
///
/// Concurrent refreshes for the same target — one investment id, one
/// account's statement, or the full account list — coalesce into a single
/// gateway request.
///
/// Cheap to clone — all clones share the store, gateway, and in-flight
/// registries.
#[derive(Clone)]
pub struct SyncService {
    store: Arc<LocalStore>,
    gateway: Arc<dyn RemoteGateway>,
    accounts_inflight: InflightRegistry<Vec<Account>>,
    details_inflight: InflightRegistry<InvestmentDetail>,
    statements_inflight: InflightRegistry<Vec<StatementEntry>>,
}

impl SyncService {
    pub fn new(store: Arc<LocalStore>, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            store,
            gateway,
            accounts_inflight: InflightRegistry::new(),
            details_inflight: InflightRegistry::new(),
            statements_inflight: InflightRegistry::new(),
        }
    }

    // ── Accounts ────────────────────────────────────────────────────

    /// All accounts, served locally. An empty store triggers the
    /// cold-start fetch.
    pub async fn accounts(&self) -> Result<Vec<Account>, CoreError> {
        let local = self.store.accounts();
        if !local.is_empty() {
            log::debug!("accounts: served {} record(s) locally", local.len());
            return Ok(local);
        }
        log::info!("accounts: local store empty, pulling from remote");
        self.refresh_accounts().await
    }

    /// Pull the full account list and replace the local collection.
    /// Records absent from the remote payload are physically removed.
    /// Concurrent calls share a single fetch.
    pub async fn refresh_accounts(&self) -> Result<Vec<Account>, CoreError> {
        let store = Arc::clone(&self.store);
        let gateway = Arc::clone(&self.gateway);
        self.accounts_inflight
            .run("accounts", async move {
                fetch_and_persist_accounts(&store, gateway.as_ref()).await
            })
            .await
    }

    // ── Investment detail ───────────────────────────────────────────

    /// Detail for one investment, served locally when present.
    pub async fn investment_detail(&self, id: &str) -> Result<InvestmentDetail, CoreError> {
        if let Some(detail) = self.store.investment(id) {
            log::debug!("investment {id}: served locally");
            return Ok(detail);
        }
        log::info!("investment {id}: not found locally, pulling from remote");
        self.refresh_investment_detail(id).await
    }

    /// Pull one investment detail from the remote, replacing the local
    /// record wholesale. Concurrent calls for the same id share a single
    /// fetch.
    pub async fn refresh_investment_detail(
        &self,
        id: &str,
    ) -> Result<InvestmentDetail, CoreError> {
        let store = Arc::clone(&self.store);
        let gateway = Arc::clone(&self.gateway);
        let owned_id = id.to_string();
        self.details_inflight
            .run(id, async move {
                fetch_and_persist_detail(&store, gateway.as_ref(), &owned_id).await
            })
            .await
    }

    // ── Statement ───────────────────────────────────────────────────

    /// Statement entries for one account, newest-first, optionally
    /// filtered. An account with no local entries triggers the cold-start
    /// fetch.
    pub async fn statement(
        &self,
        account_name: &str,
        filter: Option<StatementFilter>,
    ) -> Result<Vec<StatementEntry>, CoreError> {
        let unfiltered = self.store.statement_for(account_name, None);
        if unfiltered.is_empty() {
            log::info!("statement for '{account_name}': local store empty, pulling from remote");
            self.refresh_statement(account_name).await?;
            return Ok(self.store.statement_for(account_name, filter));
        }
        if filter.is_none() {
            return Ok(unfiltered);
        }
        Ok(self.store.statement_for(account_name, filter))
    }

    /// Pull the statement for one account and union-merge it into the
    /// local store. Entries already known by fitid are overwritten, never
    /// duplicated; locally accumulated history is kept. Concurrent calls
    /// for the same account share a single fetch.
    pub async fn refresh_statement(
        &self,
        account_name: &str,
    ) -> Result<Vec<StatementEntry>, CoreError> {
        let store = Arc::clone(&self.store);
        let gateway = Arc::clone(&self.gateway);
        let owned_name = account_name.to_string();
        self.statements_inflight
            .run(account_name, async move {
                fetch_and_persist_statement(&store, gateway.as_ref(), &owned_name).await
            })
            .await
    }

    // ── Background reconciliation ───────────────────────────────────

    /// One catch-up pass: find accounts still marked unsynced, check them
    /// against the remote account list, and mark them synced. Ids the
    /// remote knows adopt the remote field values; ids it does not know
    /// are kept as-is but recorded as checked (the remote has no mutation
    /// endpoint, so nothing is pushed).
    ///
    /// Returns the number of records reconciled.
    pub async fn reconcile_pending(&self) -> Result<usize, CoreError> {
        let pending = self.store.pending_accounts();
        if pending.is_empty() {
            return Ok(0);
        }
        log::info!("reconciler: {} pending account(s)", pending.len());

        let remote = self.gateway.fetch_accounts().await?;
        let by_id: HashMap<String, Account> = remote
            .into_iter()
            .map(|r| {
                let account = r.into_account();
                (account.id.clone(), account)
            })
            .collect();

        self.store.write_scoped(|snap| {
            let mut reconciled = 0;
            for pending_account in &pending {
                let Some(account) = snap.accounts.get_mut(&pending_account.id) else {
                    continue; // removed since the scan
                };
                if account.synced {
                    continue;
                }
                match by_id.get(&pending_account.id) {
                    Some(confirmed) => *account = confirmed.clone(),
                    None => account.synced = true,
                }
                reconciled += 1;
            }
            Ok(reconciled)
        })
    }

    /// Spawn the periodic reconciliation task. Each tick runs a catch-up
    /// pass only while the connectivity monitor reports reachable; fetch
    /// or storage failures are logged and the cycle skipped, never fatal.
    pub fn spawn_reconciler(
        &self,
        connectivity: ConnectivityMonitor,
        interval: Duration,
    ) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately;
            // consume it so the first real pass happens after one period.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !connectivity.is_reachable() {
                    log::debug!("reconciler: offline, waiting for reachability");
                    continue;
                }
                match service.reconcile_pending().await {
                    Ok(0) => {}
                    Ok(n) => log::info!("reconciler: marked {n} account(s) synced"),
                    Err(e) => log::warn!("reconciler: cycle skipped: {e}"),
                }
            }
        })
    }
}

/// Fetch the full account list, replace the local collection, and re-read
/// the committed copy.
async fn fetch_and_persist_accounts(
    store: &LocalStore,
    gateway: &dyn RemoteGateway,
) -> Result<Vec<Account>, CoreError> {
    let remote = gateway.fetch_accounts().await?;
    let accounts: Vec<Account> = remote.into_iter().map(|r| r.into_account()).collect();
    log::info!("accounts: received {} record(s) from remote", accounts.len());
    store.replace_all_accounts(accounts)?;
    Ok(store.accounts())
}

/// Fetch one investment detail, persist it wholesale, and re-read the
/// committed copy.
async fn fetch_and_persist_detail(
    store: &LocalStore,
    gateway: &dyn RemoteGateway,
    id: &str,
) -> Result<InvestmentDetail, CoreError> {
    let remote = gateway.fetch_investment_detail(id).await?;
    let detail = remote.into_detail()?;
    store.upsert_investment(detail)?;
    store
        .investment(id)
        .ok_or_else(|| CoreError::Storage(format!("Investment {id} missing after write")))
}

/// Fetch one account's statement, union-merge it into the local store,
/// and re-read the committed entries.
async fn fetch_and_persist_statement(
    store: &LocalStore,
    gateway: &dyn RemoteGateway,
    account_name: &str,
) -> Result<Vec<StatementEntry>, CoreError> {
    let by_month = gateway.fetch_statement(account_name).await?;

    let mut entries = Vec::new();
    for month_entries in by_month.into_values() {
        for remote in month_entries {
            entries.push(remote.into_entry(account_name)?);
        }
    }
    log::info!(
        "statement for '{account_name}': merging {} remote entr(ies)",
        entries.len()
    );
    store.upsert_statement_entries(entries)?;
    Ok(store.statement_for(account_name, None))
}
