pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod import;
pub mod repository;
pub mod store;
pub mod vault;
