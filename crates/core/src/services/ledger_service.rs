use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::settings::ADJUSTMENT_EPSILON;
use crate::models::transaction::Transaction;
use crate::store::local_store::LocalStore;

/// Description attached to manually created adjustment transactions.
pub const ADJUSTMENT_DESCRIPTION: &str = "Manual balance adjustment";

/// Manual balance corrections on investment ledgers.
///
/// Every mutation is a single scoped store transaction: the balance
/// update and its explanatory transaction commit together or not at all,
/// so no reader can see one without the other. Validation failures
/// return synchronously with nothing written.
pub struct LedgerService {
    store: Arc<LocalStore>,
}

impl LedgerService {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    /// Parse a user-typed monetary amount. Accepts `,` or `.` as the
    /// decimal separator.
    pub fn parse_amount(input: &str) -> Result<f64, CoreError> {
        let normalized = input.trim().replace(',', ".");
        let value: f64 = normalized
            .parse()
            .map_err(|_| CoreError::Validation(format!("'{input}' is not a valid amount")))?;
        if !value.is_finite() {
            return Err(CoreError::Validation(format!(
                "'{input}' is not a valid amount"
            )));
        }
        Ok(value)
    }

    /// Set the investment's balance to `new_balance` and append a
    /// transaction carrying the delta, atomically.
    ///
    /// The delta is computed from the balance as read inside the write
    /// transaction, so concurrent adjustments to the same investment
    /// serialize cleanly instead of racing on a stale pre-read. A delta
    /// within `ADJUSTMENT_EPSILON` of zero is rejected: it carries no
    /// information and must not create a spurious ledger entry.
    ///
    /// Returns the created transaction.
    pub fn adjust_balance(
        &self,
        investment_id: &str,
        new_balance: f64,
        at: DateTime<Utc>,
    ) -> Result<Transaction, CoreError> {
        if !new_balance.is_finite() {
            return Err(CoreError::Validation(
                "New balance is not a valid amount".into(),
            ));
        }

        self.store.write_scoped(|snap| {
            let detail = snap.investments.get_mut(investment_id).ok_or_else(|| {
                CoreError::NotFound(format!("Investment {investment_id} not found"))
            })?;

            let delta = new_balance - detail.current_balance;
            if delta.abs() <= ADJUSTMENT_EPSILON {
                return Err(CoreError::Validation(
                    "New balance matches the current balance".into(),
                ));
            }

            detail.current_balance = new_balance;
            let adjustment = Transaction {
                id: Uuid::new_v4().to_string(),
                description: ADJUSTMENT_DESCRIPTION.to_string(),
                date: at,
                value: delta,
            };
            detail.transactions.push(adjustment.clone());

            log::info!(
                "ledger: adjusted {investment_id} by {delta:+.2} to {new_balance:.2}"
            );
            Ok(adjustment)
        })
    }

    /// `adjust_balance` with the timestamp defaulted to now.
    pub fn adjust_balance_now(
        &self,
        investment_id: &str,
        new_balance: f64,
    ) -> Result<Transaction, CoreError> {
        self.adjust_balance(investment_id, new_balance, Utc::now())
    }

    /// Remove a transaction from an investment's ledger and subtract its
    /// value from the balance, atomically. Returns the removed
    /// transaction.
    pub fn remove_transaction(
        &self,
        investment_id: &str,
        transaction_id: &str,
    ) -> Result<Transaction, CoreError> {
        self.store.write_scoped(|snap| {
            let detail = snap.investments.get_mut(investment_id).ok_or_else(|| {
                CoreError::NotFound(format!("Investment {investment_id} not found"))
            })?;

            let idx = detail
                .transactions
                .iter()
                .position(|t| t.id == transaction_id)
                .ok_or_else(|| {
                    CoreError::NotFound(format!(
                        "Transaction {transaction_id} not found on {investment_id}"
                    ))
                })?;

            let removed = detail.transactions.remove(idx);
            detail.current_balance -= removed.value;

            log::info!(
                "ledger: removed {transaction_id} ({:+.2}) from {investment_id}",
                removed.value
            );
            Ok(removed)
        })
    }
}
