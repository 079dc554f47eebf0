//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL. Creation is
//! idempotent (`IF NOT EXISTS`), so it runs on every start.

use crate::entities::{AuthToken, MenuItem, Order, OrderLine, User};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::TableCreateStatement,
};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/pizzashop.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a local `SQLite` file (created if missing).
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    table
}

/// Creates all tables that do not exist yet.
///
/// Referenced tables are created before the tables that point at them
/// (users before tokens and orders, orders and menu items before lines).
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        table_for(&schema, User),
        table_for(&schema, AuthToken),
        table_for(&schema, MenuItem),
        table_for(&schema, Order),
        table_for(&schema, OrderLine),
    ];

    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    info!("Database tables ensured.");
    Ok(())
}

/// Opens the configured database and makes sure the schema exists.
pub async fn init_database() -> Result<DatabaseConnection> {
    let db = create_connection().await?;
    create_tables(&db).await?;
    Ok(db)
}
