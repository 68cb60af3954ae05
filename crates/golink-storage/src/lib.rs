//! Storage backends for golink.
//!
//! [`LinkStore`] persists links and click statistics in PostgreSQL or
//! SQLite; [`InMemoryLinkStore`] keeps them in process memory.

pub mod config;
mod error;
pub mod memory;
pub mod sql;

pub use config::{ConcurrencyPolicy, StoreConfig, SCHEMA};
pub use golink_core::{
    ClickStats, ErrorKind, Link, LinkKey, LinkRepository, Result, StatsRepository, StorageError,
};
pub use memory::InMemoryLinkStore;
pub use sql::LinkStore;
