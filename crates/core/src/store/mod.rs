pub mod format;
pub mod local_store;
pub mod snapshot;
