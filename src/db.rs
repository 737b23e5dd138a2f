use std::str::FromStr;

use log::{error, info};
use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const MAX_CONNECTIONS: u32 = 5;

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn pool_options(database_url: &str) -> SqlitePoolOptions {
    if is_in_memory(database_url) {
        // Every connection to an in-memory database sees its own schema, so
        // keep exactly one connection alive for the lifetime of the pool.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
    }
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true))
}

// Pool that only opens connections on first use, so the server can start
// while the database is unreachable.
pub fn connect_lazy(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = connect_options(database_url)?;
    Ok(pool_options(database_url).connect_lazy_with(options))
}

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = connect_options(database_url)?;
    pool_options(database_url).connect_with(options).await
}

// Creates every table and applies pending migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

// Startup connectivity check. Failures are logged and never fatal.
pub async fn probe(pool: &SqlitePool) -> bool {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => {
            info!("Database connection successful");
            true
        }
        Err(e) => {
            error!("Database connection error: {}", e);
            error!("Application will continue without database verification");
            false
        }
    }
}

// Registered models and their backing tables.
pub const MODELS: [(&str, &str); 5] = [
    ("User", "users"),
    ("Project", "projects"),
    ("Task", "tasks"),
    ("TaskComment", "task_comments"),
    ("ProjectMember", "project_members"),
];

pub async fn model_counts(pool: &SqlitePool) -> Result<Vec<(&'static str, i64)>, sqlx::Error> {
    let mut counts = Vec::with_capacity(MODELS.len());
    for (model, table) in MODELS {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await?;
        counts.push((model, count));
    }
    Ok(counts)
}
