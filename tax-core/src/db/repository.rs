use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CalculationResult, TaxReturn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A return snapshot as held by session storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReturn {
    pub id: i64,
    pub tax_return: TaxReturn,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The most recent engine output for a stored return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResult {
    pub return_id: i64,
    pub result: CalculationResult,
    pub calculated_at: DateTime<Utc>,
}

/// Session storage for return snapshots and their results.
///
/// Results are never patched: `save_result` replaces whatever was stored
/// for the return. Updating a return's snapshot discards its stored result,
/// since it no longer describes the snapshot.
#[async_trait]
pub trait ReturnRepository: Send + Sync {
    async fn save_return(
        &self,
        tax_return: &TaxReturn,
    ) -> Result<StoredReturn, RepositoryError>;

    async fn update_return(
        &self,
        id: i64,
        tax_return: &TaxReturn,
    ) -> Result<StoredReturn, RepositoryError>;

    async fn get_return(
        &self,
        id: i64,
    ) -> Result<StoredReturn, RepositoryError>;

    /// Stored returns, newest first, optionally limited to one tax year.
    async fn list_returns(
        &self,
        tax_year: Option<i32>,
    ) -> Result<Vec<StoredReturn>, RepositoryError>;

    async fn delete_return(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;

    async fn save_result(
        &self,
        return_id: i64,
        result: &CalculationResult,
    ) -> Result<StoredResult, RepositoryError>;

    async fn get_result(
        &self,
        return_id: i64,
    ) -> Result<StoredResult, RepositoryError>;
}
