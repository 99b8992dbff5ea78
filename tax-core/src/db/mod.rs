//! Session-storage interface for return snapshots and results.
//!
//! The engine never touches storage. Backends live in their own crates and
//! are selected at runtime through [`RepositoryRegistry`].

pub mod factory;
pub mod repository;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use repository::{RepositoryError, ReturnRepository, StoredResult, StoredReturn};
