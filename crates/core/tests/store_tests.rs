// ═══════════════════════════════════════════════════════════════════
// Store Tests — snapshot container format, LocalStore reads/writes,
// scoped transactions, persistence across reopen
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};

use pocketledger_core::errors::CoreError;
use pocketledger_core::models::account::{Account, AccountKind};
use pocketledger_core::models::investment::{far_future, InvestmentDetail};
use pocketledger_core::models::transaction::{StatementEntry, StatementFilter, Transaction};
use pocketledger_core::store::format::{self, CURRENT_VERSION, HEADER_SIZE, MAGIC};
use pocketledger_core::store::local_store::LocalStore;

fn account(id: &str, name: &str, balance: f64) -> Account {
    Account::new(id, name, balance, "Banks", "bank.icon", AccountKind::Bank)
}

fn investment(id: &str, balance: f64) -> InvestmentDetail {
    InvestmentDetail {
        id: id.to_string(),
        name: format!("Investment {id}"),
        kind_label: "investment".into(),
        category: "Fixed Income".into(),
        current_balance: balance,
        initial_investment: balance,
        total_profitability: 0.1,
        annual_profitability: 0.05,
        liquidity: "D+0".into(),
        maturity_date: far_future(),
        chart_data: Vec::new(),
        transactions: Vec::new(),
    }
}

fn entry(id: &str, account_name: &str, amount: f64, day: u32) -> StatementEntry {
    StatementEntry {
        id: id.to_string(),
        account_name: account_name.to_string(),
        kind: "DEBIT".into(),
        date_posted: Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap(),
        amount,
        memo: "memo".into(),
        suggested_category: "Other".into(),
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Snapshot container format
// ═══════════════════════════════════════════════════════════════════

mod container_format {
    use super::*;

    #[test]
    fn roundtrip() {
        let payload = b"hello snapshot";
        let bytes = format::write_file(CURRENT_VERSION, payload);
        let back = format::read_file(&bytes).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn header_layout() {
        let bytes = format::write_file(CURRENT_VERSION, b"xy");
        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(bytes.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn empty_payload_roundtrip() {
        let bytes = format::write_file(CURRENT_VERSION, b"");
        assert_eq!(format::read_file(&bytes).unwrap(), b"");
    }

    #[test]
    fn rejects_short_file() {
        let err = format::read_file(b"PK").unwrap_err();
        assert!(matches!(err, CoreError::InvalidSnapshotFormat(_)));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = format::write_file(CURRENT_VERSION, b"data");
        bytes[0..4].copy_from_slice(b"NOPE");
        let err = format::read_file(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSnapshotFormat(_)));
    }

    #[test]
    fn rejects_future_version() {
        let bytes = format::write_file(CURRENT_VERSION + 1, b"data");
        let err = format::read_file(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedVersion(v) if v == CURRENT_VERSION + 1));
    }

    #[test]
    fn rejects_version_zero() {
        let bytes = format::write_file(0, b"data");
        assert!(matches!(
            format::read_file(&bytes).unwrap_err(),
            CoreError::UnsupportedVersion(0)
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut bytes = format::write_file(CURRENT_VERSION, b"0123456789");
        bytes.truncate(bytes.len() - 3);
        let err = format::read_file(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSnapshotFormat(_)));
    }

    #[test]
    fn rejects_length_field_exceeding_the_file() {
        // A corrupted length field must be reported as a format error, never
        // overflow the slice arithmetic.
        let mut bytes = format::write_file(CURRENT_VERSION, b"data");
        bytes[6..14].copy_from_slice(&u64::MAX.to_le_bytes());
        let err = format::read_file(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSnapshotFormat(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Reads & upserts
// ═══════════════════════════════════════════════════════════════════

mod reads_and_upserts {
    use super::*;

    #[test]
    fn empty_store_has_no_records() {
        let store = LocalStore::in_memory();
        assert!(store.accounts().is_empty());
        assert!(store.investments().is_empty());
        assert!(store.account("missing").is_none());
        assert!(store.investment("missing").is_none());
    }

    #[test]
    fn upsert_then_point_lookup() {
        let store = LocalStore::in_memory();
        store.upsert_account(account("a1", "Nuconta", 100.0)).unwrap();
        let got = store.account("a1").unwrap();
        assert_eq!(got.name, "Nuconta");
        assert_eq!(got.balance, 100.0);
    }

    #[test]
    fn upsert_overwrites_by_primary_key() {
        let store = LocalStore::in_memory();
        store.upsert_account(account("a1", "Old", 1.0)).unwrap();
        store.upsert_account(account("a1", "New", 2.0)).unwrap();
        assert_eq!(store.accounts().len(), 1);
        assert_eq!(store.account("a1").unwrap().name, "New");
    }

    #[test]
    fn reads_return_independent_copies() {
        let store = LocalStore::in_memory();
        store.upsert_account(account("a1", "Nuconta", 100.0)).unwrap();

        let mut copy = store.account("a1").unwrap();
        copy.balance = 999.0;
        copy.name = "Tampered".into();

        // The store must be unaffected by mutations of a returned value.
        let fresh = store.account("a1").unwrap();
        assert_eq!(fresh.balance, 100.0);
        assert_eq!(fresh.name, "Nuconta");
    }

    #[test]
    fn pending_accounts_filters_on_synced_flag() {
        let store = LocalStore::in_memory();
        store.upsert_account(account("a1", "Synced", 1.0)).unwrap();
        store
            .upsert_account(Account::local("Draft", 2.0, "Cash", "i", AccountKind::Bank))
            .unwrap();

        let pending = store.pending_accounts();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "Draft");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  replace_all
// ═══════════════════════════════════════════════════════════════════

mod replace_all {
    use super::*;

    #[test]
    fn returns_exactly_the_written_set() {
        let store = LocalStore::in_memory();
        store.upsert_account(account("old", "Old", 1.0)).unwrap();

        store
            .replace_all_accounts(vec![account("a1", "A", 1.0), account("a2", "B", 2.0)])
            .unwrap();

        let mut ids: Vec<String> = store.accounts().into_iter().map(|a| a.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[test]
    fn removes_records_absent_from_the_new_set() {
        let store = LocalStore::in_memory();
        store
            .replace_all_accounts(vec![account("a1", "A", 1.0), account("a2", "B", 2.0)])
            .unwrap();
        store.replace_all_accounts(vec![account("a2", "B", 2.0)]).unwrap();

        assert!(store.account("a1").is_none());
        assert!(store.account("a2").is_some());
    }

    #[test]
    fn is_idempotent() {
        let store = LocalStore::in_memory();
        let batch = vec![account("a1", "A", 1.0), account("a2", "B", 2.0)];

        store.replace_all_accounts(batch.clone()).unwrap();
        let first: Vec<Account> = {
            let mut v = store.accounts();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            v
        };

        store.replace_all_accounts(batch).unwrap();
        let second: Vec<Account> = {
            let mut v = store.accounts();
            v.sort_by(|a, b| a.id.cmp(&b.id));
            v
        };

        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_ids_in_input_collapse_to_one() {
        let store = LocalStore::in_memory();
        store
            .replace_all_accounts(vec![account("a1", "First", 1.0), account("a1", "Second", 2.0)])
            .unwrap();
        assert_eq!(store.accounts().len(), 1);
    }

    #[test]
    fn empty_set_clears_the_collection() {
        let store = LocalStore::in_memory();
        store.replace_all_accounts(vec![account("a1", "A", 1.0)]).unwrap();
        store.replace_all_accounts(Vec::new()).unwrap();
        assert!(store.accounts().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Scoped transactions
// ═══════════════════════════════════════════════════════════════════

mod write_scoped {
    use super::*;

    #[test]
    fn commits_all_mutations_together() {
        let store = LocalStore::in_memory();
        store.upsert_investment(investment("inv-1", 1000.0)).unwrap();

        store
            .write_scoped(|snap| {
                let d = snap.investments.get_mut("inv-1").unwrap();
                d.current_balance = 1250.5;
                d.transactions.push(Transaction {
                    id: "t1".into(),
                    description: "adjustment".into(),
                    date: Utc::now(),
                    value: 250.5,
                });
                Ok(())
            })
            .unwrap();

        let d = store.investment("inv-1").unwrap();
        assert_eq!(d.current_balance, 1250.5);
        assert_eq!(d.transactions.len(), 1);
    }

    #[test]
    fn error_rolls_back_every_mutation() {
        let store = LocalStore::in_memory();
        store.upsert_investment(investment("inv-1", 1000.0)).unwrap();

        let result: Result<(), CoreError> = store.write_scoped(|snap| {
            let d = snap.investments.get_mut("inv-1").unwrap();
            d.current_balance = 9999.0;
            d.transactions.push(Transaction {
                id: "t1".into(),
                description: "should not survive".into(),
                date: Utc::now(),
                value: 1.0,
            });
            Err(CoreError::Validation("abort".into()))
        });

        assert!(matches!(result, Err(CoreError::Validation(_))));
        let d = store.investment("inv-1").unwrap();
        assert_eq!(d.current_balance, 1000.0);
        assert!(d.transactions.is_empty());
    }

    #[test]
    fn returns_the_mutator_value() {
        let store = LocalStore::in_memory();
        let n = store
            .write_scoped(|snap| {
                snap.accounts.insert("a1".into(), account("a1", "A", 1.0));
                Ok(snap.accounts.len())
            })
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn commit_bumps_the_revision_channel() {
        let store = LocalStore::in_memory();
        let rx = store.subscribe();
        assert_eq!(*rx.borrow(), 0);

        store.upsert_account(account("a1", "A", 1.0)).unwrap();
        assert_eq!(*rx.borrow(), 1);

        store.upsert_account(account("a2", "B", 2.0)).unwrap();
        assert_eq!(*rx.borrow(), 2);
    }

    #[test]
    fn rolled_back_write_does_not_notify() {
        let store = LocalStore::in_memory();
        let rx = store.subscribe();

        let _ = store.write_scoped(|_| -> Result<(), CoreError> {
            Err(CoreError::Validation("abort".into()))
        });

        assert_eq!(*rx.borrow(), 0);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Statement scans
// ═══════════════════════════════════════════════════════════════════

mod statement_scans {
    use super::*;

    #[test]
    fn filters_by_account_name() {
        let store = LocalStore::in_memory();
        store
            .upsert_statement_entries(vec![
                entry("f1", "Nuconta", -10.0, 1),
                entry("f2", "Cartao", -20.0, 2),
                entry("f3", "Nuconta", 30.0, 3),
            ])
            .unwrap();

        let got = store.statement_for("Nuconta", None);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|e| e.account_name == "Nuconta"));
    }

    #[test]
    fn orders_newest_first() {
        let store = LocalStore::in_memory();
        store
            .upsert_statement_entries(vec![
                entry("f1", "Nuconta", -10.0, 5),
                entry("f2", "Nuconta", -20.0, 20),
                entry("f3", "Nuconta", 30.0, 12),
            ])
            .unwrap();

        let ids: Vec<String> = store
            .statement_for("Nuconta", None)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["f2", "f3", "f1"]);
    }

    #[test]
    fn upsert_by_fitid_overwrites_instead_of_duplicating() {
        let store = LocalStore::in_memory();
        store.upsert_statement_entries(vec![entry("f1", "Nuconta", -10.0, 1)]).unwrap();
        store.upsert_statement_entries(vec![entry("f1", "Nuconta", -99.0, 1)]).unwrap();

        let got = store.statement_for("Nuconta", None);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].amount, -99.0);
    }

    #[test]
    fn merge_keeps_previously_synced_entries() {
        let store = LocalStore::in_memory();
        store.upsert_statement_entries(vec![entry("f1", "Nuconta", -10.0, 1)]).unwrap();
        store.upsert_statement_entries(vec![entry("f2", "Nuconta", -20.0, 2)]).unwrap();
        assert_eq!(store.statement_for("Nuconta", None).len(), 2);
    }

    #[test]
    fn this_year_filter_excludes_old_entries() {
        let store = LocalStore::in_memory();
        let mut old = entry("f-old", "Nuconta", -10.0, 1);
        old.date_posted = Utc.with_ymd_and_hms(2001, 3, 1, 0, 0, 0).unwrap();
        let mut recent = entry("f-new", "Nuconta", -20.0, 2);
        recent.date_posted = Utc::now();
        store.upsert_statement_entries(vec![old, recent]).unwrap();

        let got = store.statement_for("Nuconta", Some(StatementFilter::ThisYear));
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, "f-new");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  On-disk persistence
// ═══════════════════════════════════════════════════════════════════

mod persistence {
    use super::*;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.pklg");

        {
            let store = LocalStore::open(&path).unwrap();
            store.upsert_account(account("a1", "Nuconta", 123.45)).unwrap();
            store.upsert_investment(investment("inv-1", 1000.0)).unwrap();
        }

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.account("a1").unwrap().balance, 123.45);
        assert_eq!(reopened.investment("inv-1").unwrap().current_balance, 1000.0);
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("fresh.pklg")).unwrap();
        assert!(store.accounts().is_empty());
    }

    #[test]
    fn open_rejects_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.pklg");
        std::fs::write(&path, b"definitely not a snapshot").unwrap();

        let err = LocalStore::open(&path).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSnapshotFormat(_)));
    }

    #[test]
    fn replace_all_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.pklg");

        {
            let store = LocalStore::open(&path).unwrap();
            store
                .replace_all_accounts(vec![account("a1", "A", 1.0), account("a2", "B", 2.0)])
                .unwrap();
        }

        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(reopened.accounts().len(), 2);
    }
}
