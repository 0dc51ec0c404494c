//! Resource Provisioner
//!
//! The only mutating stage of the pipeline. Walks the batch strictly in input
//! order, creates each valid resource, attaches its consumers, and converts
//! every gateway error into outcome data. An item's failure never unwinds
//! past that item; the batch always runs to completion.

use crate::config::RunConfig;
use crate::domain::ports::{ArrayGatewayRef, CreateResource, ResourceRequest};
use crate::error::{Error, Result};
use crate::orchestrator::snapshot::InventorySnapshot;
use crate::orchestrator::validator::{parse_size, ValidationVerdict};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

// =============================================================================
// Outcome
// =============================================================================

/// Final status of one provisioning attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    /// Resource created and every requested attachment succeeded
    Success,
    /// Resource created but at least one attachment failed
    PartialSuccess,
    /// Resource creation failed
    Failed,
    /// Request failed validation; no gateway call was made
    SkippedValidation,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Success => write!(f, "Success"),
            OutcomeStatus::PartialSuccess => write!(f, "PartialSuccess"),
            OutcomeStatus::Failed => write!(f, "Failed"),
            OutcomeStatus::SkippedValidation => write!(f, "SkippedValidation"),
        }
    }
}

/// Per-request result of attempted provisioning
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionOutcome {
    pub request_name: String,
    pub status: OutcomeStatus,
    /// Array identifier of the created resource
    pub resource_id: Option<String>,
    /// World-wide name, fetched after creation (block only)
    pub wwn: Option<String>,
    /// Consumers attached, in request order
    pub attached_consumers: Vec<String>,
    /// Consumers that failed to attach: (name, reason)
    pub failed_consumers: Vec<(String, String)>,
    pub message: String,
    /// Create call through last attachment attempt
    pub duration_millis: u64,
    pub timestamp: DateTime<Utc>,
}

impl ProvisionOutcome {
    fn skipped(verdict: &ValidationVerdict) -> Self {
        Self {
            request_name: verdict.request_name.clone(),
            status: OutcomeStatus::SkippedValidation,
            resource_id: None,
            wwn: None,
            attached_consumers: Vec::new(),
            failed_consumers: Vec::new(),
            message: verdict.errors.join("; "),
            duration_millis: 0,
            timestamp: Utc::now(),
        }
    }

    fn failed(name: &str, message: String, duration: Duration) -> Self {
        Self {
            request_name: name.to_string(),
            status: OutcomeStatus::Failed,
            resource_id: None,
            wwn: None,
            attached_consumers: Vec::new(),
            failed_consumers: Vec::new(),
            message,
            duration_millis: duration.as_millis() as u64,
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Provisioner
// =============================================================================

/// Sequential creator/attacher for one batch
pub struct ResourceProvisioner {
    gateway: ArrayGatewayRef,
    pause: Option<Duration>,
}

impl ResourceProvisioner {
    pub fn new(gateway: ArrayGatewayRef, run: &RunConfig) -> Self {
        Self {
            gateway,
            pause: run.pause(),
        }
    }

    /// Process the batch in input order, one outcome per request.
    ///
    /// Invalid requests become `SkippedValidation` outcomes with zero gateway
    /// calls. The inter-request pause throttles the management API; it is not
    /// a correctness requirement.
    pub async fn provision_batch(
        &self,
        requests: &[ResourceRequest],
        verdicts: &[ValidationVerdict],
        snapshot: &InventorySnapshot,
    ) -> Vec<ProvisionOutcome> {
        let total = requests.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, (request, verdict)) in requests.iter().zip(verdicts.iter()).enumerate() {
            let position = i + 1;
            if !verdict.is_valid {
                info!(
                    "[{}/{}] Skipping '{}': {}",
                    position,
                    total,
                    verdict.request_name,
                    verdict.errors.join("; ")
                );
                outcomes.push(ProvisionOutcome::skipped(verdict));
                continue;
            }

            info!(
                "[{}/{}] Provisioning {} '{}'",
                position,
                total,
                request.kind,
                request.trimmed_name()
            );
            let outcome = self.provision_one(request, snapshot).await;
            match outcome.status {
                OutcomeStatus::Success => info!(
                    "[{}/{}] Completed: {}",
                    position, total, outcome.message
                ),
                _ => warn!(
                    "[{}/{}] {}: {}",
                    position, total, outcome.status, outcome.message
                ),
            }
            outcomes.push(outcome);

            if let Some(pause) = self.pause {
                if position < total {
                    tokio::time::sleep(pause).await;
                }
            }
        }

        outcomes
    }

    /// Create one resource and attach its consumers.
    ///
    /// A failed attachment is recorded and the remaining attachments still
    /// run; only a failed create stops work on this request.
    async fn provision_one(
        &self,
        request: &ResourceRequest,
        snapshot: &InventorySnapshot,
    ) -> ProvisionOutcome {
        let name = request.trimmed_name().to_string();

        let payload = match build_payload(request, snapshot) {
            Ok(payload) => payload,
            Err(e) => return ProvisionOutcome::failed(&name, e.to_string(), Duration::ZERO),
        };

        let start = Instant::now();
        let timestamp = Utc::now();

        let resource_id = match self.gateway.create_resource(&payload).await {
            Ok(id) => id,
            Err(e) => return ProvisionOutcome::failed(&name, e.to_string(), start.elapsed()),
        };

        // The WWN only exists after creation; failing to read it back does
        // not fail the request.
        let wwn = match self
            .gateway
            .resource_details(request.kind, &resource_id)
            .await
        {
            Ok(details) => details.wwn,
            Err(e) => {
                warn!("Could not fetch details for '{}': {}", name, e);
                None
            }
        };

        let mut attached_consumers = Vec::new();
        let mut failed_consumers = Vec::new();
        for consumer in &request.consumers {
            match snapshot.hosts.get(consumer.as_str()) {
                Some(host) => {
                    match self
                        .gateway
                        .attach_consumer(request.kind, &resource_id, &host.id)
                        .await
                    {
                        Ok(()) => attached_consumers.push(consumer.clone()),
                        Err(e) => failed_consumers.push((consumer.clone(), e.to_string())),
                    }
                }
                // Unknown at validation time, still unknown now: fail locally
                // without a gateway call.
                None => failed_consumers.push((
                    consumer.clone(),
                    "not found in inventory".to_string(),
                )),
            }
        }
        let duration = start.elapsed();

        let status = if failed_consumers.is_empty() {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::PartialSuccess
        };
        let message = if failed_consumers.is_empty() {
            if attached_consumers.is_empty() {
                format!("created as {}", resource_id)
            } else {
                format!(
                    "created as {}, attached {} consumer(s)",
                    resource_id,
                    attached_consumers.len()
                )
            }
        } else {
            format!(
                "created as {}, {} of {} attachment(s) failed",
                resource_id,
                failed_consumers.len(),
                request.consumers.len()
            )
        };

        ProvisionOutcome {
            request_name: name,
            status,
            resource_id: Some(resource_id),
            wwn,
            attached_consumers,
            failed_consumers,
            message,
            duration_millis: duration.as_millis() as u64,
            timestamp,
        }
    }
}

/// Resolve a validated request into a creation payload.
///
/// Validation already checked the pool and sizes, so failures here mean the
/// verdicts and requests went out of step.
fn build_payload(request: &ResourceRequest, snapshot: &InventorySnapshot) -> Result<CreateResource> {
    let pool = snapshot
        .pools
        .get(request.pool.trim())
        .ok_or_else(|| Error::Internal(format!("pool '{}' vanished from snapshot", request.pool)))?;
    let size_bytes = parse_size(&request.size)?;
    let quota_bytes = match request.quota.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => Some(parse_size(q)?),
        _ => None,
    };

    Ok(CreateResource {
        name: request.trimmed_name().to_string(),
        kind: request.kind,
        size_bytes,
        pool: pool.clone(),
        description: request.description.clone(),
        thin: request.thin,
        protocol: request.protocol.clone(),
        quota_bytes,
        access_policy: request.access_policy.clone(),
    })
}
