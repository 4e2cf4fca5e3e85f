use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;

use super::traits::RemoteGateway;
use super::types::{RemoteAccount, RemoteInvestmentDetail, RemoteStatementEntry};

/// REST implementation of the remote gateway.
///
/// Endpoints, rooted at the configured base URL:
/// - `GET /accounts`
/// - `GET /investments/{id}`
/// - `GET /transactions?account={name}` (name query-encoded)
///
/// Every call builds the request, awaits the response, and decodes the
/// body. A non-2xx status, a malformed body, and a transport failure all
/// surface as typed errors; the gateway never retries.
pub struct RestGateway {
    client: Client,
    base_url: String,
}

impl RestGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn get(&self, url: &str) -> Result<Response, CoreError> {
        let resp = self.client.get(url).send().await?;
        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::NOT_FOUND => Err(CoreError::NotFound(format!(
                "Remote returned 404 for {url}"
            ))),
            status => Err(CoreError::Network(format!(
                "Remote returned HTTP {status} for {url}"
            ))),
        }
    }
}

/// Statement endpoint envelope: entries grouped by month key.
#[derive(serde::Deserialize)]
struct StatementResponse {
    transactions_by_month: HashMap<String, Vec<RemoteStatementEntry>>,
}

#[async_trait]
impl RemoteGateway for RestGateway {
    async fn fetch_accounts(&self) -> Result<Vec<RemoteAccount>, CoreError> {
        let url = format!("{}/accounts", self.base_url);
        let resp = self.get(&url).await?;
        resp.json::<Vec<RemoteAccount>>()
            .await
            .map_err(|e| CoreError::Decode(format!("Failed to parse account list: {e}")))
    }

    async fn fetch_investment_detail(
        &self,
        id: &str,
    ) -> Result<RemoteInvestmentDetail, CoreError> {
        let url = format!("{}/investments/{id}", self.base_url);
        let resp = self.get(&url).await?;
        resp.json::<RemoteInvestmentDetail>()
            .await
            .map_err(|e| CoreError::Decode(format!("Failed to parse detail for {id}: {e}")))
    }

    async fn fetch_statement(
        &self,
        account_name: &str,
    ) -> Result<HashMap<String, Vec<RemoteStatementEntry>>, CoreError> {
        let encoded = urlencoding::encode(account_name);
        let url = format!("{}/transactions?account={encoded}", self.base_url);
        let resp = self.get(&url).await?;
        let body: StatementResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::Decode(format!("Failed to parse statement: {e}")))?;
        Ok(body.transactions_by_month)
    }
}
