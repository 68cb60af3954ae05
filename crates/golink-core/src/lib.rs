//! Core types and traits for the golink storage layer.
//!
//! This crate provides the link model, short name normalization, the
//! injectable clock and the repository traits shared by every storage
//! backend.

pub mod clock;
pub mod error;
pub mod key;
pub mod link;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorKind, Result, StorageError};
pub use key::{normalize, LinkKey};
pub use link::{ClickStats, Link};
pub use repository::{LinkRepository, StatsRepository};
