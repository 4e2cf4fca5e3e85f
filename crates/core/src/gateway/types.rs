use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::account::{Account, AccountKind};
use crate::models::investment::{far_future, ChartPoint, InvestmentDetail};
use crate::models::transaction::{StatementEntry, Transaction};

// ── Wire types ──────────────────────────────────────────────────────
//
// Field shapes follow the remote API: the account list and investment
// detail use camelCase, the statement endpoint uses snake_case. Dates in
// the detail payload are ISO-8601; `date_posted` on statement entries is
// a naive `YYYY-MM-DDTHH:MM:SS` timestamp treated as UTC.

/// One element of the remote account list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAccount {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
}

/// The remote investment detail payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInvestmentDetail {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub current_balance: f64,
    pub initial_investment: f64,
    pub total_profitability: f64,
    pub annual_profitability: f64,
    pub liquidity: String,
    #[serde(default)]
    pub maturity_date: Option<String>,
    pub chart_data: Vec<RemoteChartPoint>,
    pub transactions: Vec<RemoteTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteChartPoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTransaction {
    pub id: String,
    pub description: String,
    pub date: String,
    pub value: f64,
}

/// One element of a month's statement list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStatementEntry {
    pub fitid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub memo: String,
    pub suggested_category: String,
    pub date_posted: String,
}

// ── Conversions into local models ───────────────────────────────────

impl RemoteAccount {
    /// Convert into a local account. Remote-origin records are confirmed
    /// by definition, so `synced` starts true.
    #[must_use]
    pub fn into_account(self) -> Account {
        let kind = AccountKind::from_label(&self.kind);
        Account::new(self.id, self.name, self.balance, self.category, self.icon, kind)
    }
}

impl RemoteInvestmentDetail {
    /// Convert into a local detail record. An unparsable date anywhere in
    /// the payload is a decode failure for the whole fetch.
    pub fn into_detail(self) -> Result<InvestmentDetail, CoreError> {
        let maturity_date = match &self.maturity_date {
            Some(raw) => parse_iso_date(raw)?,
            None => far_future(),
        };

        let chart_data = self
            .chart_data
            .iter()
            .map(|p| Ok(ChartPoint::new(parse_iso_datetime(&p.date)?, p.value)))
            .collect::<Result<Vec<_>, CoreError>>()?;

        let transactions = self
            .transactions
            .into_iter()
            .map(|t| {
                Ok(Transaction {
                    id: t.id,
                    description: t.description,
                    date: parse_iso_datetime(&t.date)?,
                    value: t.value,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(InvestmentDetail {
            id: self.id,
            name: self.name,
            kind_label: self.kind,
            category: self.category,
            current_balance: self.current_balance,
            initial_investment: self.initial_investment,
            total_profitability: self.total_profitability,
            annual_profitability: self.annual_profitability,
            liquidity: self.liquidity,
            maturity_date,
            chart_data,
            transactions,
        })
    }
}

impl RemoteStatementEntry {
    /// Convert into a local statement entry owned by `account_name`.
    pub fn into_entry(self, account_name: &str) -> Result<StatementEntry, CoreError> {
        let date_posted = parse_posted_datetime(&self.date_posted)?;
        Ok(StatementEntry {
            id: self.fitid,
            account_name: account_name.to_string(),
            kind: self.kind,
            date_posted,
            amount: self.amount,
            memo: self.memo,
            suggested_category: self.suggested_category,
        })
    }
}

// ── Date parsing ────────────────────────────────────────────────────

fn parse_iso_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| CoreError::Decode(format!("Invalid date '{raw}': {e}")))
}

fn parse_iso_datetime(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::Decode(format!("Invalid timestamp '{raw}': {e}")))
}

/// `date_posted` carries no timezone suffix and is defined to be UTC.
fn parse_posted_datetime(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.and_utc())
        .map_err(|e| CoreError::Decode(format!("Invalid posting timestamp '{raw}': {e}")))
}
