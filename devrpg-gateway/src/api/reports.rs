//! Report listing, lookup and the workflow callback

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    Json,
};
use devrpg_common::Report;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::db::reports::{self, StoredReport};
use crate::error::{ApiError, ApiResult};
use crate::pagination::PageQuery;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportListQuery {
    pub project_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/reports
pub async fn list_reports(
    State(state): State<AppState>,
    query: Result<Query<ReportListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<StoredReport>>> {
    let Query(query) = query?;
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(20)?;

    let pool = state.pool()?;
    let rows = reports::list_reports(pool, query.project_id.as_deref(), page.limit, page.offset)
        .await?;
    Ok(Json(rows))
}

/// GET /api/reports/:id
pub async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> ApiResult<Json<StoredReport>> {
    let pool = state.pool()?;
    reports::get_report(pool, &report_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))
}

/// POST /api/reports
///
/// Upsert a report computed by the external workflow. Storage is
/// best-effort: once the body is readable the answer is always 200, with
/// `status` telling whether the report was stored.
pub async fn report_callback(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let report = Report::from_callback(&body)?;
    info!(report_id = %report.report_id, "Storing report from workflow");

    let Some(pool) = &state.db else {
        warn!(report_id = %report.report_id, "Database unavailable, report not stored");
        return Ok(Json(json!({
            "status": "warning",
            "message": "Database unavailable",
            "report": body,
        })));
    };

    let result = async {
        let mut conn = pool.acquire().await?;
        reports::upsert_report(&mut *conn, &report).await
    }
    .await;

    match result {
        Ok(()) => Ok(Json(json!({
            "status": "success",
            "report_id": report.report_id,
        }))),
        Err(e) => {
            error!(report_id = %report.report_id, error = %e, "Failed to store report");
            Ok(Json(json!({
                "status": "error",
                "message": e.to_string(),
            })))
        }
    }
}
