// One-off maintenance commands run from the CLI instead of the server.

use log::{info, warn};
use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::config::Config;
use crate::db;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Creates every table and applies pending migrations. Production databases
/// are left alone.
pub async fn deploy(config: &Config) -> Result<(), CommandError> {
    if config.profile.is_production() {
        warn!("Production profile: skipping table creation");
        return Ok(());
    }
    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;
    info!("Database tables created on {}", config.database_url);
    Ok(())
}

// Model set with row counts, one line each.
pub async fn shell(config: &Config) -> Result<Vec<String>, CommandError> {
    let pool = db::connect(&config.database_url).await?;
    let lines = db::model_counts(&pool)
        .await?
        .into_iter()
        .map(|(model, count)| format!("{model:<14} {count} rows"))
        .collect();
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    #[actix_rt::test]
    async fn deploy_skips_production() {
        let mut config = Config::testing();
        config.profile = Profile::Production;
        config.database_url = "sqlite:///nonexistent-dir/for/sure/tasks.db".into();
        assert!(deploy(&config).await.is_ok());
    }

    #[actix_rt::test]
    async fn deploy_migrates_outside_production() {
        assert!(deploy(&Config::testing()).await.is_ok());
    }

    #[actix_rt::test]
    async fn shell_reports_unmigrated_database() {
        // A fresh in-memory database has no tables to count.
        assert!(matches!(
            shell(&Config::testing()).await,
            Err(CommandError::Database(_))
        ));
    }
}
