//! SQLite session storage for return snapshots and calculation results.
//!
//! Snapshots and results are stored as JSON documents alongside a few
//! indexed columns used for listing. Migrations are embedded and run when a
//! repository is opened through [`SqliteRepositoryFactory`].

mod factory;
mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
