//! User accounts, experience and badge history

use devrpg_common::scoring::{level_for_xp, Badge};
use devrpg_common::time;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Stored user, as returned by the API
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub xp_total: i64,
    pub level: i64,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

/// Body of `POST /api/users`
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Experience state of a user after a credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProgress {
    pub user_id: String,
    pub xp_total: i64,
    pub level: i64,
}

const USER_COLUMNS: &str =
    "id, username, email, display_name, xp_total, level, avatar_url, created_at";

/// Hex SHA-256 digest stored in place of the password
pub fn password_digest(password: &str) -> String {
    Sha256::digest(password.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Insert a new user
///
/// Fails with a unique violation when the username or email is taken.
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, username, email, password_hash, display_name, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(password_digest(&new_user.password))
    .bind(&new_user.display_name)
    .bind(time::now_rfc3339())
    .fetch_one(pool)
    .await?;

    info!(user_id = %user.id, username = %user.username, "Created user");
    Ok(user)
}

pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Newest users first
pub async fn list_users(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Add `xp_delta` to a user and record newly earned badges
///
/// The level is recomputed from the new cumulative total, so it always
/// matches `level_for_xp(xp_total)`. The increment happens in SQL and the
/// total is read back from the same statement. The level is only written
/// while `xp_total` still holds that total; a concurrent credit that moved
/// the total on writes its own level. Returns `None` when the user does not
/// exist.
pub async fn credit_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    xp_delta: i64,
    badges: &BTreeSet<Badge>,
    report_id: Option<&str>,
) -> Result<Option<UserProgress>, sqlx::Error> {
    let new_total: Option<i64> = sqlx::query_scalar(
        "UPDATE users SET xp_total = MAX(0, xp_total + ?) WHERE id = ? RETURNING xp_total",
    )
    .bind(xp_delta)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(xp_total) = new_total else {
        debug!(user_id = %user_id, "Credit skipped, no such user");
        return Ok(None);
    };

    let level = level_for_xp(xp_total);
    sqlx::query("UPDATE users SET level = ? WHERE id = ? AND xp_total = ?")
        .bind(level)
        .bind(user_id)
        .bind(xp_total)
        .execute(&mut *conn)
        .await?;

    let earned_at = time::now_rfc3339();
    for badge in badges {
        sqlx::query(
            "INSERT OR IGNORE INTO user_badges (user_id, badge, report_id, earned_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(badge.name())
        .bind(report_id)
        .bind(&earned_at)
        .execute(&mut *conn)
        .await?;
    }

    info!(
        user_id = %user_id,
        xp_delta,
        xp_total,
        level,
        badges = badges.len(),
        "Credited user"
    );

    Ok(Some(UserProgress {
        user_id: user_id.to_string(),
        xp_total,
        level,
    }))
}
