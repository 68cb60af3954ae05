//! Disposable database servers for golink integration tests.

pub mod error;
pub mod postgres;

pub use error::{Result, TestInfraError};
