//! Test utilities for database integration tests
//!
//! Backed by an in-memory SQLite database so integration tests run
//! without any external services. Each `TestDatabase` owns its own
//! database, which keeps tests isolated from each other.

use crate::DbConnection;
use mailroom_migrations::Migrator;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// In-memory test database
pub struct TestDatabase {
    pub db: Arc<DbConnection>,
    pub database_url: String,
}

impl TestDatabase {
    /// Create a new empty in-memory database without any schema
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = "sqlite::memory:".to_string();

        // A single pooled connection keeps every query on the same
        // in-memory database. A second connection would see a fresh,
        // empty database.
        let mut opt = ConnectOptions::new(database_url.clone());
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let db = Database::connect(opt).await?;

        Ok(TestDatabase {
            db: Arc::new(db),
            database_url,
        })
    }

    /// Create a new in-memory database with all migrations applied
    pub async fn with_migrations() -> anyhow::Result<Self> {
        let test_db = Self::new().await?;

        Migrator::up(&*test_db.db, None)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

        Ok(test_db)
    }

    /// Execute raw SQL for testing
    pub async fn execute_sql(&self, sql: &str) -> anyhow::Result<ExecResult> {
        let statement = Statement::from_string(DatabaseBackend::Sqlite, sql.to_owned());
        let result = self
            .db
            .execute(statement)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(result)
    }

    /// Query raw SQL and return results
    pub async fn query_sql(&self, sql: &str) -> anyhow::Result<Vec<QueryResult>> {
        let statement = Statement::from_string(DatabaseBackend::Sqlite, sql.to_owned());
        let result = self
            .db
            .query_all(statement)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(result)
    }

    /// Test database connectivity
    pub async fn test_connection(&self) -> anyhow::Result<()> {
        let statement = Statement::from_string(DatabaseBackend::Sqlite, "SELECT 1".to_owned());
        let result = self.db.query_one(statement).await?;

        if result.is_none() {
            return Err(anyhow::anyhow!("Connection test failed"));
        }

        Ok(())
    }

    /// Get the database connection
    pub fn connection(&self) -> &DbConnection {
        &self.db
    }

    /// Get the database connection as Arc
    pub fn connection_arc(&self) -> Arc<DbConnection> {
        Arc::clone(&self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_setup() -> anyhow::Result<()> {
        let test_db = TestDatabase::new().await?;

        test_db.test_connection().await?;

        let result = test_db.query_sql("SELECT 1 as test_value").await?;
        assert_eq!(result.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_with_migrations() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;

        let result = test_db
            .query_sql("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'emails'")
            .await?;

        assert!(!result.is_empty(), "Emails table should exist");
        Ok(())
    }
}
