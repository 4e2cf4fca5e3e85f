use chrono::{DateTime, Datelike, Months, Utc};
use serde::{Deserialize, Serialize};

/// A ledger line item owned by exactly one `InvestmentDetail`.
///
/// Sign convention: positive values increase the balance, negative values
/// decrease it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Remote-provided id, or a locally generated UUID string for
    /// adjustments created on this device
    pub id: String,

    pub description: String,

    pub date: DateTime<Utc>,

    /// Signed amount
    pub value: f64,
}

/// A bank/card statement line item, keyed by the remote `fitid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    /// Remote `fitid` (primary key)
    pub id: String,

    /// Name of the account this entry belongs to
    pub account_name: String,

    /// Remote transaction type label (e.g., "DEBIT", "CREDIT")
    pub kind: String,

    /// Posting timestamp. The remote sends a naive timestamp that is
    /// treated as UTC.
    pub date_posted: DateTime<Utc>,

    /// Signed amount
    pub amount: f64,

    pub memo: String,

    pub suggested_category: String,
}

/// Date-range filter for statement listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFilter {
    /// Entries posted in the current calendar month
    CurrentMonth,
    /// Entries posted in the previous calendar month
    PreviousMonth,
    /// Entries posted in the last six months (rolling window)
    LastSixMonths,
    /// Entries posted in the current calendar year
    ThisYear,
}

impl StatementFilter {
    /// Whether `date` falls inside this filter's window relative to `now`.
    #[must_use]
    pub fn matches(&self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            StatementFilter::CurrentMonth => {
                date.year() == now.year() && date.month() == now.month()
            }
            StatementFilter::PreviousMonth => {
                match now.checked_sub_months(Months::new(1)) {
                    Some(prev) => {
                        date.year() == prev.year() && date.month() == prev.month()
                    }
                    None => false,
                }
            }
            StatementFilter::LastSixMonths => {
                match now.checked_sub_months(Months::new(6)) {
                    Some(cutoff) => date >= cutoff,
                    None => false,
                }
            }
            StatementFilter::ThisYear => date.year() == now.year(),
        }
    }
}
