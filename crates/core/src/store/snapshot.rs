use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::account::Account;
use crate::models::investment::InvestmentDetail;
use crate::models::transaction::StatementEntry;

/// The durable root of the local store. Everything in here gets
/// bincode-serialized into the PKLG snapshot file.
///
/// Each record kind is keyed by its string primary id. Transactions and
/// chart points are owned sub-collections of their `InvestmentDetail`,
/// matching the persisted layout of the remote service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// All known accounts, keyed by account id
    pub accounts: HashMap<String, Account>,

    /// Per-investment detail (chart + ledger), keyed by account id
    pub investments: HashMap<String, InvestmentDetail>,

    /// Bank/card statement entries, keyed by remote fitid
    pub statement: HashMap<String, StatementEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }
}
