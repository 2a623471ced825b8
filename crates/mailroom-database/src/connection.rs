//! Database connection management

use mailroom_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;

pub type DbConnection = DatabaseConnection;

/// Connect to the database and bring the schema up to date.
pub async fn establish_connection(database_url: &str) -> Result<Arc<DbConnection>, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(100).min_connections(5);

    let db = Database::connect(opt).await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(Arc::new(db))
}
