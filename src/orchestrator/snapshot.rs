//! Inventory Snapshot
//!
//! Point-in-time, read-only view of array state: allocation domains (block
//! pools and NAS containers), hosts, and existing resources, indexed by name.
//! Captured once before validation and shared by reference through the rest
//! of the pipeline; never refreshed mid-batch.

use crate::domain::ports::{ArrayGateway, HostInfo, PoolInfo, ResourceInfo};
use crate::error::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::info;

/// Immutable view of array inventory at one point in time
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    /// Allocation domains by name (block pools and NAS containers)
    pub pools: IndexMap<String, PoolInfo>,
    /// Hosts by name
    pub hosts: IndexMap<String, HostInfo>,
    /// Existing volumes and file systems by name
    pub resources: IndexMap<String, ResourceInfo>,
    /// When the three list calls completed
    pub captured_at: DateTime<Utc>,
}

impl InventorySnapshot {
    /// Capture inventory through the gateway.
    ///
    /// All-or-nothing: if any of the three list calls fails the whole capture
    /// fails; a partial snapshot is never returned. The three reads are
    /// independent, so they run concurrently.
    pub async fn capture(gateway: &dyn ArrayGateway) -> Result<Self> {
        let (pools, hosts, resources) = tokio::try_join!(
            gateway.list_pools(),
            gateway.list_hosts(),
            gateway.list_resources(),
        )?;

        let snapshot = Self::from_parts(pools, hosts, resources);
        info!(
            "Captured inventory: {} allocation domains, {} hosts, {} resources",
            snapshot.pools.len(),
            snapshot.hosts.len(),
            snapshot.resources.len()
        );
        Ok(snapshot)
    }

    /// Index already-fetched inventory.
    ///
    /// Keys are the names exactly as the array reports them: case-sensitive,
    /// no normalization, matching the array's own identity semantics.
    pub fn from_parts(
        pools: Vec<PoolInfo>,
        hosts: Vec<HostInfo>,
        resources: Vec<ResourceInfo>,
    ) -> Self {
        Self {
            pools: pools.into_iter().map(|p| (p.name.clone(), p)).collect(),
            hosts: hosts.into_iter().map(|h| (h.name.clone(), h)).collect(),
            resources: resources.into_iter().map(|r| (r.name.clone(), r)).collect(),
            captured_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ResourceKind;
    use crate::orchestrator::harness::ScriptedGateway;

    #[test]
    fn test_capture_indexes_by_exact_name() {
        let gateway = ScriptedGateway::with_inventory();

        let snapshot = tokio_test::block_on(InventorySnapshot::capture(&gateway)).unwrap();

        assert!(snapshot.pools.contains_key("perf-pool"));
        assert!(snapshot.pools.contains_key("nas-a"));
        assert!(snapshot.hosts.contains_key("esx-01"));
        assert!(snapshot.resources.contains_key("vol-existing"));

        // Case-sensitive, no normalization
        assert!(!snapshot.pools.contains_key("Perf-Pool"));
        assert!(!snapshot.hosts.contains_key("ESX-01"));
    }

    #[tokio::test]
    async fn test_capture_is_all_or_nothing() {
        let mut gateway = ScriptedGateway::with_inventory();
        gateway.fail_lists = true;

        let result = InventorySnapshot::capture(&gateway).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_from_parts_keeps_kind_split() {
        let gateway = ScriptedGateway::with_inventory();
        let snapshot = tokio_test::block_on(InventorySnapshot::capture(&gateway)).unwrap();

        assert_eq!(snapshot.pools["perf-pool"].kind, ResourceKind::Block);
        assert_eq!(snapshot.pools["nas-a"].kind, ResourceKind::File);
    }
}
