//! User accounts

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::db::{self, users::{self, NewUser, User}};
use crate::error::{ApiError, ApiResult};
use crate::pagination::PageQuery;
use crate::AppState;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 6;

fn validate(new_user: &NewUser) -> ApiResult<()> {
    let username_len = new_user.username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
        return Err(ApiError::BadRequest(format!(
            "username must be {} to {} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }
    if new_user.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".to_string()));
    }
    if new_user.password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {} characters",
            PASSWORD_MIN
        )));
    }
    Ok(())
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(new_user) = payload?;
    validate(&new_user)?;

    let pool = state.pool()?;
    match users::create_user(pool, &new_user).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) if db::is_unique_violation(&e) => Err(ApiError::Conflict(
            "Username or email already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    let pool = state.pool()?;
    users::get_user(pool, &user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<User>>> {
    let Query(query) = query?;
    let page = query.resolve(20)?;

    let pool = state.pool()?;
    Ok(Json(users::list_users(pool, page.limit, page.offset).await?))
}
