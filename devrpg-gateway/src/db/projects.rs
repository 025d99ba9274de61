//! Projects that analysis reports are filed under

use devrpg_common::time;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub repository_url: Option<String>,
    pub owner_id: Option<String>,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub created_at: String,
}

/// Body of `POST /api/projects`
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
}

const PROJECT_COLUMNS: &str =
    "id, name, description, repository_url, owner_id, language, framework, created_at";

pub async fn create_project(
    pool: &SqlitePool,
    new_project: &NewProject,
    owner_id: Option<&str>,
) -> Result<Project, sqlx::Error> {
    let project = sqlx::query_as::<_, Project>(&format!(
        r#"
        INSERT INTO projects (id, name, description, repository_url, owner_id, language, framework, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        PROJECT_COLUMNS
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(&new_project.name)
    .bind(&new_project.description)
    .bind(&new_project.repository_url)
    .bind(owner_id)
    .bind(&new_project.language)
    .bind(&new_project.framework)
    .bind(time::now_rfc3339())
    .fetch_one(pool)
    .await?;

    info!(project_id = %project.id, name = %project.name, "Created project");
    Ok(project)
}

pub async fn get_project(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects WHERE id = ?",
        PROJECT_COLUMNS
    ))
    .bind(project_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_projects(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects ORDER BY created_at DESC LIMIT ? OFFSET ?",
        PROJECT_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
