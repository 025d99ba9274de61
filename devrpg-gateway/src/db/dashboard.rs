//! Read-only aggregates: leaderboard and per-user dashboard

use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub xp_total: i64,
    pub level: i64,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_analyses: i64,
    pub average_score: f64,
    pub xp_earned_today: i64,
    pub active_projects: i64,
    /// Badge names, newest first
    pub recent_badges: Vec<String>,
}

/// Badges shown on the dashboard
const RECENT_BADGE_LIMIT: i64 = 5;

/// Users ordered by experience, ties broken by signup order
pub async fn leaderboard(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT
            ROW_NUMBER() OVER (ORDER BY xp_total DESC, created_at ASC) AS rank,
            id AS user_id,
            username,
            display_name,
            xp_total,
            level,
            avatar_url
        FROM users
        ORDER BY xp_total DESC, created_at ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Aggregates over the projects owned by `user_id`
///
/// `today` is the UTC date as `YYYY-MM-DD`; stored timestamps are RFC 3339
/// text, so a lexical comparison selects everything analyzed since midnight.
pub async fn dashboard(
    pool: &SqlitePool,
    user_id: &str,
    today: &str,
) -> Result<DashboardStats, sqlx::Error> {
    let (total_analyses, average_score): (i64, Option<f64>) = sqlx::query_as(
        r#"
        SELECT COUNT(r.report_id), AVG(r.overall_score)
        FROM analysis_reports r
        JOIN projects p ON p.id = r.project_id
        WHERE p.owner_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let xp_earned_today: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(r.xp_earned), 0)
        FROM analysis_reports r
        JOIN projects p ON p.id = r.project_id
        WHERE p.owner_id = ? AND r.analyzed_at >= ?
        "#,
    )
    .bind(user_id)
    .bind(today)
    .fetch_one(pool)
    .await?;

    let active_projects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE owner_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let recent_badges: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT badge
        FROM user_badges
        WHERE user_id = ?
        ORDER BY earned_at DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(RECENT_BADGE_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(DashboardStats {
        total_analyses,
        average_score: average_score.unwrap_or(0.0),
        xp_earned_today,
        active_projects,
        recent_badges,
    })
}
