//! HTTP API handlers for devrpg-gateway

pub mod analyze;
pub mod buildinfo;
pub mod health;
pub mod mcp;
pub mod projects;
pub mod reports;
pub mod stats;
pub mod users;
pub mod webhook;

pub use analyze::analyze_code;
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use mcp::{analyze_lighthouse, mcp_passthrough, mcp_status};
pub use projects::{create_project, get_project, list_projects};
pub use reports::{get_report, list_reports, report_callback};
pub use stats::{get_dashboard, get_leaderboard};
pub use users::{create_user, get_user, list_users};
pub use webhook::ci_webhook;
