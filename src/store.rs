//! SQLite pool construction. In-memory databases live on a single pinned connection.

use crate::config::Settings;
use crate::error::{AppError, ConfigError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

/// Open the pool for `settings.database_url`, creating a file database if it does not exist.
pub async fn connect(settings: &Settings) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(&settings.database_url)
        .map_err(|e| ConfigError::Settings(format!("invalid DATABASE_URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool_opts = if settings.is_in_memory() {
        // Every connection to `:memory:` is a separate database; never let the one we have expire.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(settings.max_connections.max(1))
    };
    let script = init_script(settings).await?;
    let pool = pool_opts
        .after_connect(move |conn, _meta| {
            let script = script.clone();
            Box::pin(async move {
                if let Some(sql) = script.as_deref() {
                    sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(sql)).await?;
                }
                Ok(())
            })
        })
        .connect_with(opts)
        .await?;
    tracing::info!(url = %settings.database_url, in_memory = settings.is_in_memory(), "database connected");
    Ok(pool)
}

async fn init_script(settings: &Settings) -> Result<Option<Arc<str>>, AppError> {
    let Some(path) = settings.init_script.as_deref() else {
        return Ok(None);
    };
    let sql = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Settings(format!("SQLITE_INIT_SCRIPT {}: {}", path.display(), e)))?;
    tracing::info!(path = %path.display(), "connection init script loaded");
    Ok(Some(Arc::from(sql)))
}

/// Readiness probe.
pub async fn ping(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query("SELECT 1").fetch_optional(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_survives_across_queries() {
        let pool = connect(&Settings::default()).await.unwrap();
        sqlx::query("CREATE TABLE t (x INTEGER)").execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO t (x) VALUES (1)").execute(&pool).await.unwrap();
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM t").fetch_one(&pool).await.unwrap();
        assert_eq!(n, 1);
        ping(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        let settings = Settings {
            database_url: format!("sqlite://{}", path.display()),
            ..Settings::default()
        };
        let pool = connect(&settings).await.unwrap();
        ping(&pool).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn init_script_runs_on_connect() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("init.sql");
        std::fs::write(&script, "PRAGMA foreign_keys = OFF;\nCREATE TEMP TABLE seen (x INTEGER);").unwrap();
        let settings = Settings {
            init_script: Some(script),
            ..Settings::default()
        };
        let pool = connect(&settings).await.unwrap();
        let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&pool).await.unwrap();
        assert_eq!(fk, 0);
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen").fetch_one(&pool).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn missing_init_script_is_a_settings_error() {
        let settings = Settings {
            init_script: Some("/nonexistent/init.sql".into()),
            ..Settings::default()
        };
        let err = connect(&settings).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::Settings(_))));
    }
}
