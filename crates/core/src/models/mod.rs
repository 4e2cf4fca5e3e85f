pub mod account;
pub mod investment;
pub mod settings;
pub mod transaction;
