use std::fmt;

use serde::Serialize;

use crate::model::{Demographics, MatchOutcome, MatchedIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportOutcome {
    #[serde(rename = "no match")]
    NoMatch,
    #[serde(rename = "exact match")]
    ExactMatch,
    #[serde(rename = "ambiguous match")]
    AmbiguousMatch,
    /// Name or state could not be determined, so no lookup ran.
    #[serde(rename = "unresolvable")]
    Unresolvable,
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => write!(f, "no match"),
            Self::ExactMatch => write!(f, "exact match"),
            Self::AmbiguousMatch => write!(f, "ambiguous match"),
            Self::Unresolvable => write!(f, "unresolvable"),
        }
    }
}

/// Outbound summary of one person's match.
///
/// Fields are private: a report can only come from [`build_report`] or
/// [`Report::unresolvable`], so demographics never appear on anything but
/// an exact match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    outcome: ReportOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched: Option<MatchedIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    demographics: Option<Demographics>,
}

impl Report {
    pub fn unresolvable() -> Self {
        Self::bare(ReportOutcome::Unresolvable)
    }

    fn bare(outcome: ReportOutcome) -> Self {
        Self { outcome, matched: None, demographics: None }
    }

    pub fn outcome(&self) -> ReportOutcome {
        self.outcome
    }

    pub fn matched(&self) -> Option<&MatchedIdentity> {
        self.matched.as_ref()
    }

    pub fn demographics(&self) -> Option<&Demographics> {
        self.demographics.as_ref()
    }
}

/// Shape a classification into a report. Pure: same outcome, same report.
pub fn build_report(outcome: &MatchOutcome) -> Report {
    match outcome {
        MatchOutcome::NoMatch => Report::bare(ReportOutcome::NoMatch),
        MatchOutcome::ExactMatch(candidate) => Report {
            outcome: ReportOutcome::ExactMatch,
            matched: Some(MatchedIdentity::from(candidate)),
            demographics: Some(candidate.demographics.clone()),
        },
        // Demographics cannot be attributed to one person.
        MatchOutcome::AmbiguousMatch(_) => Report::bare(ReportOutcome::AmbiguousMatch),
    }
}
