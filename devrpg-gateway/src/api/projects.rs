//! Projects

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::db::projects::{self, NewProject, Project};
use crate::error::{ApiError, ApiResult};
use crate::pagination::PageQuery;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: Option<String>,
}

/// POST /api/projects?owner_id=
pub async fn create_project(
    State(state): State<AppState>,
    owner: Result<Query<OwnerQuery>, QueryRejection>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Query(owner) = owner?;
    let Json(new_project) = payload?;
    if new_project.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let pool = state.pool()?;
    let project = projects::create_project(pool, &new_project, owner.owner_id.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Project>> {
    let pool = state.pool()?;
    projects::get_project(pool, &project_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Project>>> {
    let Query(query) = query?;
    let page = query.resolve(20)?;

    let pool = state.pool()?;
    Ok(Json(projects::list_projects(pool, page.limit, page.offset).await?))
}
