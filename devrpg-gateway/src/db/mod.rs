//! Persistence for users, projects, reports and badge history
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS` at startup, so a
//! fresh database file is usable immediately.

pub mod dashboard;
pub mod projects;
pub mod reports;
pub mod users;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::PoolSettings;

/// Open the connection pool and create missing tables
pub async fn init_database(url: &str, settings: &PoolSettings) -> Result<SqlitePool, sqlx::Error> {
    // WAL allows concurrent readers alongside the single writer
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .min_connections(settings.min_connections)
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    info!("Database ready: {}", url);

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_users_table(pool).await?;
    create_projects_table(pool).await?;
    create_reports_table(pool).await?;
    create_user_badges_table(pool).await?;
    Ok(())
}

/// Cheap connectivity check used by `/health`
pub async fn ping(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// True when `err` is a UNIQUE constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

async fn create_users_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            display_name TEXT,
            xp_total INTEGER NOT NULL DEFAULT 0 CHECK (xp_total >= 0),
            level INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
            avatar_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_xp ON users(xp_total DESC)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_projects_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            repository_url TEXT,
            owner_id TEXT,
            language TEXT,
            framework TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_reports_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_reports (
            report_id TEXT PRIMARY KEY,
            project_id TEXT,
            commit_id TEXT,
            file_path TEXT,
            overall_score INTEGER NOT NULL,
            status TEXT NOT NULL,
            code_quality_score INTEGER,
            architecture_score INTEGER,
            event_loop_score INTEGER,
            efficiency_score INTEGER,
            code_quality_report TEXT,
            architecture_report TEXT,
            event_loop_report TEXT,
            cost_report TEXT,
            xp_earned INTEGER NOT NULL DEFAULT 0,
            badges_earned TEXT NOT NULL DEFAULT '[]',
            analyzed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reports_project ON analysis_reports(project_id, analyzed_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_badges_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_badges (
            user_id TEXT NOT NULL,
            badge TEXT NOT NULL,
            report_id TEXT,
            earned_at TEXT NOT NULL,
            PRIMARY KEY (user_id, badge)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
