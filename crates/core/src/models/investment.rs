use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::Transaction;

/// Sentinel for investments without a maturity date ("far future").
pub fn far_future() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// One point of an investment's value-over-time chart.
///
/// Read-only derived data: the whole collection is replaced on every
/// remote fetch of the owning detail, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Synthetic id, regenerated on each sync
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(date: DateTime<Utc>, value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            value,
        }
    }
}

/// Full detail of one investment account. `id` matches the owning
/// `Account`'s id.
///
/// The current balance should equal `initial_investment` plus the signed
/// sum of all transaction values. The ledger-adjustment operation keeps
/// that relationship; storage does not enforce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentDetail {
    /// Primary key, same value as the owning account's id
    pub id: String,

    pub name: String,

    /// Product label from the remote (e.g., "CDB", "Tesouro Direto")
    pub kind_label: String,

    pub category: String,

    pub current_balance: f64,

    pub initial_investment: f64,

    /// Profitability since inception, as a decimal (0.12 = 12%)
    pub total_profitability: f64,

    /// Annualized profitability, as a decimal
    pub annual_profitability: f64,

    /// Liquidity label (e.g., "D+0", "D+30")
    pub liquidity: String,

    /// Maturity date; `far_future()` when the product has none
    pub maturity_date: NaiveDate,

    /// Value-over-time chart, replaced wholesale on every remote fetch
    pub chart_data: Vec<ChartPoint>,

    /// Ledger of this investment. Insertion order is irrelevant;
    /// display order is by date, descending.
    pub transactions: Vec<Transaction>,
}

impl InvestmentDetail {
    /// Transactions ordered newest-first for display.
    #[must_use]
    pub fn transactions_desc(&self) -> Vec<Transaction> {
        let mut txs = self.transactions.clone();
        txs.sort_by(|a, b| b.date.cmp(&a.date));
        txs
    }

    /// Difference between the stored balance and the balance implied by the
    /// ledger (`initial_investment` + sum of transaction values).
    /// Zero (within float noise) for a consistent record.
    #[must_use]
    pub fn ledger_drift(&self) -> f64 {
        let implied: f64 = self.initial_investment
            + self.transactions.iter().map(|t| t.value).sum::<f64>();
        self.current_balance - implied
    }
}
