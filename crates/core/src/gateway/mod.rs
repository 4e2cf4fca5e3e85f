pub mod rest;
pub mod traits;
pub mod types;
