//! Code analysis endpoint

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use devrpg_common::{time, AnalysisRequest, Report};
use tracing::{info, warn};

use crate::db::{reports, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/analyze
///
/// Fans the request out to every analysis backend and scores what comes
/// back. With a `project_id` the report is stored (and the user credited) in
/// one transaction, and a storage failure fails the request. With only a
/// `user_id` the credit is best-effort.
pub async fn analyze_code(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<Json<Report>> {
    let Json(request) = payload?;
    if request.code.trim().is_empty() {
        return Err(ApiError::BadRequest("code must not be empty".to_string()));
    }

    // Fail fast before the fan-out when the report cannot be stored
    if request.project_id.is_some() {
        state.pool()?;
    }

    info!(file = request.display_path(), "Starting analysis");

    let sub_reports = state.orchestrator.analyze(&request).await;
    let report = Report::from_analysis(&request, sub_reports, time::now());

    if request.project_id.is_some() {
        let pool = state.pool()?;
        reports::store_analysis(pool, &report, request.user_id.as_deref()).await?;
    } else if let Some(user_id) = request.user_id.as_deref() {
        credit_best_effort(&state, user_id, &report).await;
    }

    info!(
        report_id = %report.report_id,
        overall_score = report.overall_score,
        status = %report.status,
        "Analysis finished"
    );
    Ok(Json(report))
}

async fn credit_best_effort(state: &AppState, user_id: &str, report: &Report) {
    let Some(pool) = &state.db else {
        warn!(user_id = %user_id, "Database unavailable, experience not credited");
        return;
    };

    let result = async {
        let mut tx = pool.begin().await?;
        let progress = users::credit_user(
            &mut *tx,
            user_id,
            report.rpg_summary.xp_earned,
            &report.rpg_summary.badges_earned,
            Some(&report.report_id),
        )
        .await?;
        tx.commit().await?;
        Ok::<_, sqlx::Error>(progress)
    }
    .await;

    match result {
        Ok(Some(_)) => {}
        Ok(None) => warn!(user_id = %user_id, "Unknown user, experience not credited"),
        Err(e) => warn!(user_id = %user_id, error = %e, "Failed to credit experience"),
    }
}
