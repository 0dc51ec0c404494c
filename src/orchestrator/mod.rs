//! Provisioning Orchestrator
//!
//! Runs the pipeline: capture inventory, validate the batch against it,
//! provision valid requests sequentially, aggregate outcomes into the batch
//! report. Only a failed inventory capture aborts the run; every per-request
//! problem becomes report data instead.

pub mod provisioner;
pub mod report;
pub mod snapshot;
pub mod validator;

#[cfg(test)]
pub(crate) mod harness;

pub use provisioner::{OutcomeStatus, ProvisionOutcome, ResourceProvisioner};
pub use report::{aggregate, BatchReport};
pub use snapshot::InventorySnapshot;
pub use validator::{parse_size, validate, ValidationVerdict};

use crate::config::RunConfig;
use crate::domain::ports::{ArrayGatewayRef, ResourceRequest};
use crate::error::Result;
use tracing::{info, warn};

/// Batch provisioning pipeline over one array gateway
pub struct Orchestrator {
    gateway: ArrayGatewayRef,
    run_config: RunConfig,
}

impl Orchestrator {
    pub fn new(gateway: ArrayGatewayRef, run_config: RunConfig) -> Self {
        Self {
            gateway,
            run_config,
        }
    }

    /// Run the full pipeline for one batch.
    ///
    /// Fails only when the inventory snapshot cannot be captured; from there
    /// on the result is always a complete report.
    pub async fn run(&self, requests: &[ResourceRequest]) -> Result<BatchReport> {
        info!("Starting batch of {} request(s)", requests.len());

        let snapshot = InventorySnapshot::capture(self.gateway.as_ref()).await?;

        let verdicts = validator::validate(requests, &snapshot);
        let invalid = verdicts.iter().filter(|v| !v.is_valid).count();
        if invalid > 0 {
            warn!("{} of {} request(s) failed validation", invalid, requests.len());
        }

        let provisioner = ResourceProvisioner::new(self.gateway.clone(), &self.run_config);
        let outcomes = provisioner
            .provision_batch(requests, &verdicts, &snapshot)
            .await;

        let report = report::aggregate(outcomes, verdicts);
        info!(
            "Batch complete: {} success, {} partial, {} failed, {} skipped ({}%)",
            report.succeeded,
            report.partial,
            report.failed,
            report.skipped,
            report.success_rate_percent
        );
        Ok(report)
    }

    /// Capture and validate only; nothing is provisioned.
    pub async fn preflight(&self, requests: &[ResourceRequest]) -> Result<Vec<ValidationVerdict>> {
        let snapshot = InventorySnapshot::capture(self.gateway.as_ref()).await?;
        Ok(validator::validate(requests, &snapshot))
    }
}
