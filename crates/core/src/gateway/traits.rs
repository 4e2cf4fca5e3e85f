use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::CoreError;

use super::types::{RemoteAccount, RemoteInvestmentDetail, RemoteStatementEntry};

/// Trait abstraction over the remote financial-data service.
///
/// Implementations are pure request/decode: they build a request, await
/// the response, decode the body, and surface typed errors. No retries,
/// no local side effects — retry and persistence policy belong to the
/// sync engine. The seam exists so tests can substitute an in-memory
/// remote with canned payloads and call counters.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch the full account list.
    async fn fetch_accounts(&self) -> Result<Vec<RemoteAccount>, CoreError>;

    /// Fetch the detail of one investment by account id.
    /// A remote 404 surfaces as `CoreError::NotFound`.
    async fn fetch_investment_detail(
        &self,
        id: &str,
    ) -> Result<RemoteInvestmentDetail, CoreError>;

    /// Fetch the statement of one account by display name.
    /// Returns entries grouped by month key (e.g., "2026-07").
    async fn fetch_statement(
        &self,
        account_name: &str,
    ) -> Result<HashMap<String, Vec<RemoteStatementEntry>>, CoreError>;
}
