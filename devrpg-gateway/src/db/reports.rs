//! Analysis report storage
//!
//! Reports are keyed by `report_id`; writing the same identifier again
//! overwrites the stored row in place through SQLite's native upsert.

use devrpg_common::{AnalysisKind, Report, SubReport};
use serde::Serialize;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::users::{credit_user, UserProgress};

/// Gamification block of a stored report
#[derive(Debug, Clone, Serialize)]
pub struct StoredRpgSummary {
    pub xp_earned: i64,
    pub badges_earned: Vec<String>,
    pub level_up: bool,
}

/// Report as read back from the database
///
/// Serializes with the same shape as a freshly computed [`Report`].
#[derive(Debug, Clone, Serialize)]
pub struct StoredReport {
    pub report_id: String,
    pub project_id: Option<String>,
    pub commit_id: Option<String>,
    pub file_path: Option<String>,
    pub overall_score: i64,
    pub status: String,
    pub code_quality: Option<Value>,
    pub architecture: Option<Value>,
    pub event_loop: Option<Value>,
    pub cost_analysis: Option<Value>,
    pub rpg_summary: StoredRpgSummary,
    pub analyzed_at: String,
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    report_id: String,
    project_id: Option<String>,
    commit_id: Option<String>,
    file_path: Option<String>,
    overall_score: i64,
    status: String,
    code_quality_report: Option<String>,
    architecture_report: Option<String>,
    event_loop_report: Option<String>,
    cost_report: Option<String>,
    xp_earned: i64,
    badges_earned: String,
    analyzed_at: String,
}

impl From<ReportRow> for StoredReport {
    fn from(row: ReportRow) -> Self {
        let json_column =
            |text: Option<String>| text.and_then(|t| serde_json::from_str::<Value>(&t).ok());

        StoredReport {
            report_id: row.report_id,
            project_id: row.project_id,
            commit_id: row.commit_id,
            file_path: row.file_path,
            overall_score: row.overall_score,
            status: row.status,
            code_quality: json_column(row.code_quality_report),
            architecture: json_column(row.architecture_report),
            event_loop: json_column(row.event_loop_report),
            cost_analysis: json_column(row.cost_report),
            rpg_summary: StoredRpgSummary {
                xp_earned: row.xp_earned,
                badges_earned: serde_json::from_str(&row.badges_earned).unwrap_or_default(),
                level_up: row.overall_score >= 90,
            },
            analyzed_at: row.analyzed_at,
        }
    }
}

const REPORT_COLUMNS: &str = "report_id, project_id, commit_id, file_path, overall_score, status, \
     code_quality_report, architecture_report, event_loop_report, cost_report, \
     xp_earned, badges_earned, analyzed_at";

fn sub_report_json(report: &Report, kind: AnalysisKind) -> Result<Option<String>, sqlx::Error> {
    report
        .sub_reports
        .get(kind)
        .map(|sub| serde_json::to_string(sub).map_err(|e| sqlx::Error::Encode(Box::new(e))))
        .transpose()
}

fn sub_score(report: &Report, kind: AnalysisKind) -> Option<i64> {
    report.sub_reports.get(kind).map(|sub| i64::from(SubReport::score(sub)))
}

/// Insert `report`, or overwrite the stored report with the same identifier
///
/// Project, commit and file are kept from the stored row when the new report
/// omits them.
pub async fn upsert_report(conn: &mut SqliteConnection, report: &Report) -> Result<(), sqlx::Error> {
    let badges = serde_json::to_string(&report.badge_names())
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        r#"
        INSERT INTO analysis_reports (
            report_id, project_id, commit_id, file_path,
            overall_score, status,
            code_quality_score, architecture_score, event_loop_score, efficiency_score,
            code_quality_report, architecture_report, event_loop_report, cost_report,
            xp_earned, badges_earned, analyzed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(report_id) DO UPDATE SET
            project_id = COALESCE(excluded.project_id, analysis_reports.project_id),
            commit_id = COALESCE(excluded.commit_id, analysis_reports.commit_id),
            file_path = COALESCE(excluded.file_path, analysis_reports.file_path),
            overall_score = excluded.overall_score,
            status = excluded.status,
            code_quality_score = excluded.code_quality_score,
            architecture_score = excluded.architecture_score,
            event_loop_score = excluded.event_loop_score,
            efficiency_score = excluded.efficiency_score,
            code_quality_report = excluded.code_quality_report,
            architecture_report = excluded.architecture_report,
            event_loop_report = excluded.event_loop_report,
            cost_report = excluded.cost_report,
            xp_earned = excluded.xp_earned,
            badges_earned = excluded.badges_earned,
            analyzed_at = excluded.analyzed_at
        "#,
    )
    .bind(&report.report_id)
    .bind(&report.project_id)
    .bind(&report.commit_id)
    .bind(&report.file_path)
    .bind(i64::from(report.overall_score))
    .bind(report.status.as_str())
    .bind(sub_score(report, AnalysisKind::CodeQuality))
    .bind(sub_score(report, AnalysisKind::Architecture))
    .bind(sub_score(report, AnalysisKind::EventLoop))
    .bind(sub_score(report, AnalysisKind::Cost))
    .bind(sub_report_json(report, AnalysisKind::CodeQuality)?)
    .bind(sub_report_json(report, AnalysisKind::Architecture)?)
    .bind(sub_report_json(report, AnalysisKind::EventLoop)?)
    .bind(sub_report_json(report, AnalysisKind::Cost)?)
    .bind(report.rpg_summary.xp_earned)
    .bind(badges)
    .bind(&report.analyzed_at)
    .execute(&mut *conn)
    .await?;

    debug!(report_id = %report.report_id, "Upserted report");
    Ok(())
}

/// Persist `report` and credit `user_id` in one transaction
///
/// Either both the report row and the credit are written, or neither.
/// Crediting a user that does not exist is not an error.
pub async fn store_analysis(
    pool: &SqlitePool,
    report: &Report,
    user_id: Option<&str>,
) -> Result<Option<UserProgress>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    upsert_report(&mut *tx, report).await?;

    let progress = match user_id {
        Some(user_id) => {
            credit_user(
                &mut *tx,
                user_id,
                report.rpg_summary.xp_earned,
                &report.rpg_summary.badges_earned,
                Some(&report.report_id),
            )
            .await?
        }
        None => None,
    };

    tx.commit().await?;

    info!(
        report_id = %report.report_id,
        overall_score = report.overall_score,
        credited = progress.is_some(),
        "Stored analysis report"
    );
    Ok(progress)
}

pub async fn get_report(
    pool: &SqlitePool,
    report_id: &str,
) -> Result<Option<StoredReport>, sqlx::Error> {
    let row = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT {} FROM analysis_reports WHERE report_id = ?",
        REPORT_COLUMNS
    ))
    .bind(report_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(StoredReport::from))
}

/// Newest reports first, optionally for one project
pub async fn list_reports(
    pool: &SqlitePool,
    project_id: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<StoredReport>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ReportRow>(&format!(
        r#"
        SELECT {} FROM analysis_reports
        WHERE (?1 IS NULL OR project_id = ?1)
        ORDER BY analyzed_at DESC
        LIMIT ?2 OFFSET ?3
        "#,
        REPORT_COLUMNS
    ))
    .bind(project_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StoredReport::from).collect())
}

/// Number of stored rows for `report_id` (0 or 1)
pub async fn count_reports_with_id(pool: &SqlitePool, report_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM analysis_reports WHERE report_id = ?")
        .bind(report_id)
        .fetch_one(pool)
        .await
}
