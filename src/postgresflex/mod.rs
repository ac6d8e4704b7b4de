//! Resources of the Postgres Flex service

pub mod database;

pub use database::{DatabaseResource, Model as DatabaseModel};
