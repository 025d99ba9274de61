//! # Dev-RPG Common Library
//!
//! Shared code for the Dev-RPG gateway and its analysis backends:
//! - Analysis request and sub-report model (one variant per analysis kind)
//! - JSON recovery from free-form LLM output
//! - Score composition, badges, experience and leveling
//! - Report model
//! - Configuration loading
//! - Timestamp and report identifier helpers

pub mod analysis;
pub mod config;
pub mod error;
pub mod json_recovery;
pub mod report;
pub mod scoring;
pub mod time;

pub use analysis::{AnalysisKind, AnalysisRequest, ServiceKind, SubReport, SubReportSet};
pub use error::{Error, Result};
pub use json_recovery::{extract_structured, is_parse_failure};
pub use report::{Report, RpgSummary};
pub use scoring::{compose, level_for_xp, Badge, Composition, Status};
