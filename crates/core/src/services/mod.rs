pub mod ledger_service;
pub mod sync_service;
