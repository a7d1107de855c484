use std::time::Duration;

use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, SqlxPostgresConnector,
    sea_query::Index,
};
use sqlx::postgres::PgPoolOptions;

use crate::entity::{
    AiEmailLogs, AiSupportMessages, AiSupportSessions, AuditLogs, InvoiceCounters, InvoiceItems,
    Invoices, Leads, Payments, Profiles, invoices,
};

pub type DbPool = sqlx::PgPool;

/// Create the Postgres pool the ORM connection is built on.
pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply `migrations/` against a Postgres pool.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Connect the store named by `database_url`.
///
/// Postgres urls get a migrated sqlx pool wrapped by SeaORM. SQLite urls
/// (`sqlite::memory:`) get a single-connection store whose tables are
/// created from the entity definitions.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    if database_url.starts_with("sqlite:") {
        let mut options = ConnectOptions::new(database_url.to_owned());
        // One connection: every pooled connection to `:memory:` would be a separate database.
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let conn = Database::connect(options).await?;
        create_schema(&conn).await?;
        return Ok(conn);
    }

    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    Ok(SqlxPostgresConnector::from_sqlx_postgres_pool(pool))
}

/// In-memory store with the full schema; used by tests and local runs.
pub async fn create_memory_store() -> Result<DatabaseConnection> {
    connect("sqlite::memory:").await
}

/// Create every table from its entity definition. Parents come before children.
pub async fn create_schema(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let tables = [
        schema.create_table_from_entity(Invoices),
        schema.create_table_from_entity(InvoiceItems),
        schema.create_table_from_entity(InvoiceCounters),
        schema.create_table_from_entity(Payments),
        schema.create_table_from_entity(Leads),
        schema.create_table_from_entity(Profiles),
        schema.create_table_from_entity(AuditLogs),
        schema.create_table_from_entity(AiEmailLogs),
        schema.create_table_from_entity(AiSupportSessions),
        schema.create_table_from_entity(AiSupportMessages),
    ];
    for table in &tables {
        conn.execute(backend.build(table)).await?;
    }

    let owner_number = Index::create()
        .name("invoices_user_number_key")
        .table(Invoices)
        .col(invoices::Column::UserId)
        .col(invoices::Column::InvoiceNumber)
        .unique()
        .to_owned();
    conn.execute(backend.build(&owner_number)).await?;

    Ok(())
}
