//! Leaderboard and dashboard aggregates

use axum::{
    extract::rejection::QueryRejection,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::db::dashboard::{self, DashboardStats, LeaderboardEntry};
use crate::error::ApiResult;
use crate::pagination::PageQuery;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

/// GET /api/leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let Query(query) = query?;
    let page = PageQuery {
        limit: query.limit,
        offset: None,
    }
    .resolve(10)?;

    let pool = state.pool()?;
    Ok(Json(dashboard::leaderboard(pool, page.limit).await?))
}

/// GET /api/dashboard/:user_id
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<DashboardStats>> {
    let pool = state.pool()?;
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    Ok(Json(dashboard::dashboard(pool, &user_id, &today).await?))
}
