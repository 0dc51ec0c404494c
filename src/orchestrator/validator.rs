//! Request Validator
//!
//! Pure per-request validation against the inventory snapshot and the batch
//! itself. Produces one verdict per request in input order; errors block
//! provisioning, warnings never do. No network calls are made here and no
//! input is mutated.

use crate::domain::ports::ResourceRequest;
use crate::error::{Error, Result};
use crate::orchestrator::snapshot::InventorySnapshot;
use serde::Serialize;
use std::collections::HashSet;

// =============================================================================
// Verdict
// =============================================================================

/// Per-request validation judgment
#[derive(Debug, Clone, Serialize)]
pub struct ValidationVerdict {
    pub request_name: String,
    pub is_valid: bool,
    /// Blocking problems; non-empty means the request is skipped
    pub errors: Vec<String>,
    /// Non-blocking observations (unknown host, capacity overrun)
    pub warnings: Vec<String>,
}

impl ValidationVerdict {
    fn new(request_name: &str) -> Self {
        Self {
            request_name: request_name.to_string(),
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
        self.is_valid = false;
    }

    fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validate a batch against the snapshot.
///
/// Rules, in order: required fields, size parses positive, pool exists with
/// the right kind, name not already on the array, name not duplicated earlier
/// in the batch, consumers known (warning), requested size within pool free
/// capacity (warning). A rule that cannot run because its field is missing or
/// malformed is skipped for that request; independent rules still run.
pub fn validate(
    requests: &[ResourceRequest],
    snapshot: &InventorySnapshot,
) -> Vec<ValidationVerdict> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut verdicts = Vec::with_capacity(requests.len());

    for request in requests {
        let name = request.trimmed_name();
        let pool_name = request.pool.trim();
        let size_raw = request.size.trim();
        let mut verdict = ValidationVerdict::new(name);

        // Rule 1: required fields
        if name.is_empty() {
            verdict.error("required field 'name' is empty".into());
        }
        if size_raw.is_empty() {
            verdict.error("required field 'size' is empty".into());
        }
        if pool_name.is_empty() {
            verdict.error("required field 'pool' is empty".into());
        }

        // Rule 2: size parses to a positive byte count
        let mut size_bytes = None;
        if !size_raw.is_empty() {
            match parse_size(size_raw) {
                Ok(bytes) => size_bytes = Some(bytes),
                Err(e) => verdict.error(format!("size '{}' is invalid: {}", size_raw, e)),
            }
        }
        if let Some(quota) = request.quota.as_deref().map(str::trim) {
            if !quota.is_empty() {
                if let Err(e) = parse_size(quota) {
                    verdict.error(format!("quota '{}' is invalid: {}", quota, e));
                }
            }
        }

        // Rule 3: pool exists with the kind the request needs
        let mut pool = None;
        if !pool_name.is_empty() {
            match snapshot.pools.get(pool_name) {
                Some(info) if info.kind == request.kind => pool = Some(info),
                Some(info) => verdict.error(format!(
                    "'{}' is a {} allocation domain, but the request is {}",
                    pool_name, info.kind, request.kind
                )),
                None => verdict.error(format!("pool '{}' not found on the array", pool_name)),
            }
        }

        // Rule 4: name not already on the array (duplicate policy: reject)
        if !name.is_empty() && snapshot.resources.contains_key(name) {
            verdict.error(format!("'{}' already exists on the array", name));
        }

        // Rule 5: name not duplicated earlier in the batch
        if !name.is_empty() && !seen.insert(name.to_string()) {
            verdict.error(format!("duplicate name in batch: '{}'", name));
        }

        // Rule 6: unknown consumers warn; attachment can be retried later
        for consumer in &request.consumers {
            if !snapshot.hosts.contains_key(consumer.as_str()) {
                verdict.warning(format!("host '{}' not found on the array", consumer));
            }
        }

        // Rule 7: capacity overrun warns, never blocks. Free space can change
        // between validation and creation, and thin over-subscription may be
        // intentional.
        if let (Some(info), Some(bytes)) = (pool, size_bytes) {
            if let Some(free) = info.free_bytes {
                if bytes > free {
                    verdict.warning(format!(
                        "requested {} bytes exceeds free capacity {} in pool '{}'",
                        bytes, free, pool_name
                    ));
                }
            }
        }

        verdicts.push(verdict);
    }

    verdicts
}

// =============================================================================
// Size Parsing
// =============================================================================

/// Parse a size string (e.g. "10737418240", "100Gi", "2T") to bytes.
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::CapacityParse("empty size string".into()));
    }

    // Find where the number ends and unit begins
    let mut num_end = 0;
    for (i, c) in s.char_indices() {
        if !c.is_ascii_digit() && c != '.' {
            num_end = i;
            break;
        }
        num_end = i + 1;
    }

    let num_str = &s[..num_end];
    let unit_str = s[num_end..].trim();

    let num: f64 = num_str
        .parse()
        .map_err(|_| Error::CapacityParse(format!("invalid number: {}", num_str)))?;

    let multiplier: u64 = match unit_str.to_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KI" | "KIB" => 1024,
        "M" | "MB" | "MI" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GI" | "GIB" => 1024 * 1024 * 1024,
        "T" | "TB" | "TI" | "TIB" => 1024 * 1024 * 1024 * 1024,
        "P" | "PB" | "PI" | "PIB" => 1024 * 1024 * 1024 * 1024 * 1024,
        _ => {
            return Err(Error::CapacityParse(format!("unknown unit: {}", unit_str)));
        }
    };

    let bytes = (num * multiplier as f64) as u64;
    if bytes == 0 {
        return Err(Error::CapacityParse(format!(
            "size must be positive: {}",
            s
        )));
    }
    Ok(bytes)
}
