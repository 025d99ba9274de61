//! Score composition and gamification
//!
//! Turns a [`SubReportSet`] into the overall score, status, experience and
//! badges of a report. Weights are integer hundredths so the weighted average
//! is computed and rounded exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::analysis::{AnalysisKind, SubReportSet};
use crate::Error;

/// Experience awarded per point of overall score
pub const XP_PER_POINT: i64 = 10;

/// Sub-score at or above which the kind's badge is earned
pub const BADGE_THRESHOLD: u8 = 90;

/// Overall score at or above which "Code Legend" is earned
pub const LEGEND_THRESHOLD: u8 = 95;

/// Overall score at or above which a report is flagged as a level-up
pub const LEVEL_UP_THRESHOLD: u8 = 90;

const FIRST_LEVEL_XP: i64 = 100;

/// Achievement earned by a single report
///
/// Ordering follows declaration order, which is the order badges are listed
/// in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "Clean Coder")]
    CleanCoder,
    #[serde(rename = "Architect Master")]
    ArchitectMaster,
    #[serde(rename = "Async Ninja")]
    AsyncNinja,
    #[serde(rename = "Optimizer")]
    Optimizer,
    #[serde(rename = "Code Legend")]
    CodeLegend,
}

impl Badge {
    pub fn name(&self) -> &'static str {
        match self {
            Badge::CleanCoder => "Clean Coder",
            Badge::ArchitectMaster => "Architect Master",
            Badge::AsyncNinja => "Async Ninja",
            Badge::Optimizer => "Optimizer",
            Badge::CodeLegend => "Code Legend",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Badge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Clean Coder" => Ok(Badge::CleanCoder),
            "Architect Master" => Ok(Badge::ArchitectMaster),
            "Async Ninja" => Ok(Badge::AsyncNinja),
            "Optimizer" => Ok(Badge::Optimizer),
            "Code Legend" => Ok(Badge::CodeLegend),
            other => Err(Error::InvalidInput(format!("Unknown badge: {}", other))),
        }
    }
}

/// Quality band of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Excellent,
    Good,
    NeedsImprovement,
    Critical,
}

impl Status {
    pub fn from_score(score: u8) -> Status {
        if score >= 85 {
            Status::Excellent
        } else if score >= 70 {
            Status::Good
        } else if score >= 50 {
            Status::NeedsImprovement
        } else {
            Status::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Excellent => "excellent",
            Status::Good => "good",
            Status::NeedsImprovement => "needs_improvement",
            Status::Critical => "critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(Status::Excellent),
            "good" => Ok(Status::Good),
            "needs_improvement" => Ok(Status::NeedsImprovement),
            "critical" => Ok(Status::Critical),
            other => Err(Error::InvalidInput(format!("Unknown status: {}", other))),
        }
    }
}

/// Everything derived from the scores of one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub overall_score: u8,
    pub status: Status,
    pub xp_earned: i64,
    pub badges: BTreeSet<Badge>,
    pub level_up: bool,
}

/// Compose the sub-scores of `set`
///
/// The overall score is the weighted average over present kinds only, with
/// weights renormalized to the present subset and halves rounded up. An
/// empty set scores 0.
pub fn compose(set: &SubReportSet) -> Composition {
    let (weighted, weights) = AnalysisKind::ALL
        .iter()
        .filter_map(|kind| set.score(*kind).map(|score| (kind.weight_pct(), score)))
        .fold((0u32, 0u32), |(num, den), (weight, score)| {
            (num + weight * u32::from(score), den + weight)
        });

    let overall_score = if weights == 0 {
        0
    } else {
        ((2 * weighted + weights) / (2 * weights)).min(100) as u8
    };

    let mut badges: BTreeSet<Badge> = AnalysisKind::ALL
        .iter()
        .filter(|kind| set.score(**kind).is_some_and(|score| score >= BADGE_THRESHOLD))
        .map(AnalysisKind::badge)
        .collect();
    if overall_score >= LEGEND_THRESHOLD {
        badges.insert(Badge::CodeLegend);
    }

    Composition {
        overall_score,
        status: Status::from_score(overall_score),
        xp_earned: xp_for_score(overall_score),
        badges,
        level_up: overall_score >= LEVEL_UP_THRESHOLD,
    }
}

/// Experience earned by an overall score
pub fn xp_for_score(overall_score: u8) -> i64 {
    i64::from(overall_score) * XP_PER_POINT
}

/// Level reached with `xp` total experience
///
/// Level 1 needs nothing; each further level costs half again as much as the
/// previous one (100, 150, 225, ...). Negative experience counts as zero.
pub fn level_for_xp(xp: i64) -> i64 {
    let mut remaining = xp.max(0);
    let mut level = 1;
    let mut threshold = FIRST_LEVEL_XP;
    while remaining >= threshold {
        remaining -= threshold;
        level += 1;
        threshold = threshold * 3 / 2;
    }
    level
}
