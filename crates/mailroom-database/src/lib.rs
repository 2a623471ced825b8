//! Database connection and query utilities

pub use sea_orm;
mod connection;

pub use connection::{establish_connection, DbConnection};

// Export test utilities for use by other crates in their tests
pub mod test_utils;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnectionTrait;

    #[tokio::test]
    async fn test_establish_connection_runs_migrations() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("mailroom-test-{}.db", uuid::Uuid::new_v4()));
        let database_url = format!("sqlite://{}?mode=rwc", path.display());

        let db = establish_connection(&database_url).await?;

        let result = db
            .query_one(sea_orm::Statement::from_string(
                sea_orm::DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'emails'"
                    .to_owned(),
            ))
            .await?;
        assert!(result.is_some(), "Migrations should have created emails");

        drop(db);
        std::fs::remove_file(&path).ok();
        Ok(())
    }
}
