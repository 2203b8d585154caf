use crate::{
    bioload::{BioloadSummary, ResolvedEntry, TankDerivation},
    compat::{Issue, IssueCategory},
    filtration::FiltrationSummary,
    recommend::EnvironmentRecommendation,
    sanitize::Diagnostic,
    severity::Severity,
};
use serde::Serialize;

/// A display-ready reason attached to the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chip {
    pub tone: Severity,
    pub text: String,
    pub category: IssueCategory,
}

/// Single headline for the whole plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub severity: Severity,
    pub headline: String,
    pub category: Option<IssueCategory>,
}

impl Status {
    /// The first issue at the highest severity, or an all-clear headline.
    pub fn from_issues(issues: &[Issue]) -> Self {
        let worst = Severity::combine(issues.iter().map(|i| i.severity));
        match issues.iter().find(|i| i.severity == worst) {
            Some(issue) if worst > Severity::Ok => Self {
                severity: worst,
                headline: issue.message.clone(),
                category: Some(issue.category),
            },
            _ => Self {
                severity: Severity::Ok,
                headline: "No issues detected".to_string(),
                category: None,
            },
        }
    }
}

/// Everything computed for one plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedState {
    pub tank: TankDerivation,
    pub filtration: FiltrationSummary,
    pub entries: Vec<ResolvedEntry>,
    pub candidate: Option<ResolvedEntry>,
    pub bioload: BioloadSummary,
    pub issues: Vec<Issue>,
    pub chips: Vec<Chip>,
    pub status: Status,
    /// Non-empty when adding the candidate should be prevented.
    pub block_reasons: Vec<String>,
    pub recommendation: EnvironmentRecommendation,
    pub diagnostics: Vec<Diagnostic>,
}

impl ComputedState {
    pub fn percent(&self) -> f64 {
        self.bioload.proposed.percent
    }

    pub fn is_blocked(&self) -> bool {
        !self.block_reasons.is_empty()
    }

    pub fn has_chip(&self, needle: &str) -> bool {
        self.chips.iter().any(|c| c.text.contains(needle))
    }

    pub fn worst_in(&self, category: IssueCategory) -> Severity {
        Severity::combine(
            self.issues
                .iter()
                .filter(|i| i.category == category)
                .map(|i| i.severity),
        )
    }
}
