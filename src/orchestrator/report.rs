//! Result Aggregator
//!
//! Folds per-request outcomes and verdicts into the batch report. Pure, no
//! I/O; the report is assembled once and never mutated afterwards.

use crate::orchestrator::provisioner::{OutcomeStatus, ProvisionOutcome};
use crate::orchestrator::validator::ValidationVerdict;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate result of one batch run, input order preserved
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<ProvisionOutcome>,
    pub verdicts: Vec<ValidationVerdict>,
    pub total_requested: usize,
    /// Outcomes with status `Success`
    pub succeeded: usize,
    /// Outcomes with status `PartialSuccess`
    pub partial: usize,
    /// Outcomes with status `Failed`
    pub failed: usize,
    /// Outcomes with status `SkippedValidation`
    pub skipped: usize,
    /// `succeeded / total_requested`, one decimal; 0.0 for an empty batch
    pub success_rate_percent: f64,
    pub generated_at: DateTime<Utc>,
}

impl BatchReport {
    /// Whether every single outcome is a clean `Success`.
    ///
    /// Drives the process exit code: partial successes and skips count as a
    /// not-clean run even though the batch completed.
    pub fn is_full_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == OutcomeStatus::Success)
    }
}

/// Assemble the report from pipeline outputs.
pub fn aggregate(outcomes: Vec<ProvisionOutcome>, verdicts: Vec<ValidationVerdict>) -> BatchReport {
    let total_requested = outcomes.len();
    let mut succeeded = 0;
    let mut partial = 0;
    let mut failed = 0;
    let mut skipped = 0;
    for outcome in &outcomes {
        match outcome.status {
            OutcomeStatus::Success => succeeded += 1,
            OutcomeStatus::PartialSuccess => partial += 1,
            OutcomeStatus::Failed => failed += 1,
            OutcomeStatus::SkippedValidation => skipped += 1,
        }
    }

    let success_rate_percent = if total_requested == 0 {
        0.0
    } else {
        (succeeded as f64 / total_requested as f64 * 1000.0).round() / 10.0
    };

    BatchReport {
        outcomes,
        verdicts,
        total_requested,
        succeeded,
        partial,
        failed,
        skipped,
        success_rate_percent,
        generated_at: Utc::now(),
    }
}
