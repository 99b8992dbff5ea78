use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tax_core::db::{StoredResult, StoredReturn};
use tax_core::{CalculationResult, RepositoryError, ReturnRepository, TaxReturn};
use tracing::debug;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the file if it does not exist.
    ///
    /// An in-memory database lives only as long as its connection, so the
    /// pool is held to a single connection in that case.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

#[derive(FromRow)]
struct ReturnRow {
    id: i64,
    snapshot: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReturnRow> for StoredReturn {
    type Error = RepositoryError;

    fn try_from(row: ReturnRow) -> Result<Self, Self::Error> {
        Ok(StoredReturn {
            id: row.id,
            tax_return: from_json(&row.snapshot)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ResultRow {
    return_id: i64,
    result: String,
    calculated_at: DateTime<Utc>,
}

impl TryFrom<ResultRow> for StoredResult {
    type Error = RepositoryError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        Ok(StoredResult {
            return_id: row.return_id,
            result: from_json(&row.result)?,
            calculated_at: row.calculated_at,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(json).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn db_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(err.to_string())
}

#[async_trait]
impl ReturnRepository for SqliteRepository {
    async fn save_return(
        &self,
        tax_return: &TaxReturn,
    ) -> Result<StoredReturn, RepositoryError> {
        let snapshot = to_json(tax_return)?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO tax_return (tax_year, filing_status, snapshot, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tax_return.tax_year)
        .bind(tax_return.filing_status.as_str())
        .bind(&snapshot)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = result.last_insert_rowid();
        debug!(id, tax_year = tax_return.tax_year, "return saved");

        Ok(StoredReturn {
            id,
            tax_return: tax_return.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_return(
        &self,
        id: i64,
        tax_return: &TaxReturn,
    ) -> Result<StoredReturn, RepositoryError> {
        let snapshot = to_json(tax_return)?;
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            "UPDATE tax_return
             SET tax_year = ?, filing_status = ?, snapshot = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(tax_return.tax_year)
        .bind(tax_return.filing_status.as_str())
        .bind(&snapshot)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM calculation_result WHERE return_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(id, "return updated; stored result discarded");

        self.get_return(id).await
    }

    async fn get_return(
        &self,
        id: i64,
    ) -> Result<StoredReturn, RepositoryError> {
        let row = sqlx::query_as::<_, ReturnRow>(
            "SELECT id, snapshot, created_at, updated_at FROM tax_return WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn list_returns(
        &self,
        tax_year: Option<i32>,
    ) -> Result<Vec<StoredReturn>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReturnRow>(
            "SELECT id, snapshot, created_at, updated_at FROM tax_return
             WHERE ?1 IS NULL OR tax_year = ?1
             ORDER BY id DESC",
        )
        .bind(tax_year)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(StoredReturn::try_from).collect()
    }

    async fn delete_return(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tax_return WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn save_result(
        &self,
        return_id: i64,
        result: &CalculationResult,
    ) -> Result<StoredResult, RepositoryError> {
        let json = to_json(result)?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let exists = sqlx::query("SELECT 1 FROM tax_return WHERE id = ?")
            .bind(return_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "INSERT INTO calculation_result (return_id, refund_or_owed, result, calculated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (return_id) DO UPDATE SET
                refund_or_owed = excluded.refund_or_owed,
                result = excluded.result,
                calculated_at = excluded.calculated_at",
        )
        .bind(return_id)
        .bind(result.refund_or_owed.to_string())
        .bind(&json)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(return_id, refund_or_owed = %result.refund_or_owed, "result saved");

        Ok(StoredResult {
            return_id,
            result: result.clone(),
            calculated_at: now,
        })
    }

    async fn get_result(
        &self,
        return_id: i64,
    ) -> Result<StoredResult, RepositoryError> {
        let row = sqlx::query_as::<_, ResultRow>(
            "SELECT return_id, result, calculated_at FROM calculation_result WHERE return_id = ?",
        )
        .bind(return_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
