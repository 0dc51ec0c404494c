//! Scripted gateway for pipeline tests
//!
//! In-process [`ArrayGateway`] with canned inventory, per-name failure
//! injection, and a call log for the zero-gateway-call assertions.

use crate::domain::ports::{
    ArrayGateway, CreateResource, HostInfo, PoolInfo, ResourceInfo, ResourceKind,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

pub struct ScriptedGateway {
    pub pools: Vec<PoolInfo>,
    pub hosts: Vec<HostInfo>,
    pub resources: Vec<ResourceInfo>,
    /// When set, every list call fails (snapshot capture tests)
    pub fail_lists: bool,
    /// Resource names whose create call fails, with the rejection reason
    fail_create: HashMap<String, String>,
    /// Consumer ids whose attach call fails
    fail_attach: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    /// Gateway with a small fixed inventory:
    /// block pool `perf-pool` (1 TiB total, 512 GiB free), NAS container
    /// `nas-a`, hosts `esx-01`/`esx-02`, existing volume `vol-existing`.
    pub fn with_inventory() -> Self {
        Self {
            pools: vec![
                PoolInfo {
                    id: "pool-1".into(),
                    name: "perf-pool".into(),
                    kind: ResourceKind::Block,
                    total_bytes: Some(1 << 40),
                    free_bytes: Some(512 * (1 << 30)),
                    appliance_id: Some("A1".into()),
                    address: None,
                },
                PoolInfo {
                    id: "nas-1".into(),
                    name: "nas-a".into(),
                    kind: ResourceKind::File,
                    total_bytes: None,
                    free_bytes: None,
                    appliance_id: None,
                    address: Some("10.64.2.20".into()),
                },
            ],
            hosts: vec![
                HostInfo {
                    id: "h-esx-01".into(),
                    name: "esx-01".into(),
                },
                HostInfo {
                    id: "h-esx-02".into(),
                    name: "esx-02".into(),
                },
            ],
            resources: vec![ResourceInfo {
                id: "v-9".into(),
                name: "vol-existing".into(),
                kind: ResourceKind::Block,
                size_bytes: 1 << 30,
                wwn: Some("naa.68ccf098003f000900000009".into()),
            }],
            fail_lists: false,
            fail_create: HashMap::new(),
            fail_attach: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make the create call for `name` fail with `reason`.
    pub fn fail_create_for(mut self, name: &str, reason: &str) -> Self {
        self.fail_create.insert(name.to_string(), reason.to_string());
        self
    }

    /// Make attach calls for consumer id `consumer_id` fail.
    pub fn fail_attach_for(mut self, consumer_id: &str) -> Self {
        self.fail_attach.insert(consumer_id.to_string());
        self
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn log(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn list_error(&self, operation: &str) -> Error {
        Error::GatewayApi {
            operation: operation.to_string(),
            status: Some(503),
            reason: "scripted list failure".into(),
        }
    }
}

#[async_trait]
impl ArrayGateway for ScriptedGateway {
    async fn list_pools(&self) -> Result<Vec<PoolInfo>> {
        self.log("list_pools".into());
        if self.fail_lists {
            return Err(self.list_error("list pools"));
        }
        Ok(self.pools.clone())
    }

    async fn list_hosts(&self) -> Result<Vec<HostInfo>> {
        self.log("list_hosts".into());
        if self.fail_lists {
            return Err(self.list_error("list hosts"));
        }
        Ok(self.hosts.clone())
    }

    async fn list_resources(&self) -> Result<Vec<ResourceInfo>> {
        self.log("list_resources".into());
        if self.fail_lists {
            return Err(self.list_error("list resources"));
        }
        Ok(self.resources.clone())
    }

    async fn create_resource(&self, payload: &CreateResource) -> Result<String> {
        self.log(format!("create:{}", payload.name));
        if let Some(reason) = self.fail_create.get(&payload.name) {
            return Err(Error::GatewayApi {
                operation: format!("create {} '{}'", payload.kind, payload.name),
                status: Some(422),
                reason: reason.clone(),
            });
        }
        Ok(format!("id-{}", payload.name))
    }

    async fn attach_consumer(
        &self,
        _kind: ResourceKind,
        resource_id: &str,
        consumer_id: &str,
    ) -> Result<()> {
        self.log(format!("attach:{}:{}", resource_id, consumer_id));
        if self.fail_attach.contains(consumer_id) {
            return Err(Error::GatewayApi {
                operation: format!("attach {} to {}", consumer_id, resource_id),
                status: Some(422),
                reason: "scripted attach failure".into(),
            });
        }
        Ok(())
    }

    async fn resource_details(
        &self,
        kind: ResourceKind,
        resource_id: &str,
    ) -> Result<ResourceInfo> {
        self.log(format!("details:{}", resource_id));
        let name = resource_id.strip_prefix("id-").unwrap_or(resource_id);
        Ok(ResourceInfo {
            id: resource_id.to_string(),
            name: name.to_string(),
            kind,
            size_bytes: 10 * (1 << 30),
            wwn: match kind {
                ResourceKind::Block => Some(format!("naa.68ccf09800{:012x}", resource_id.len())),
                ResourceKind::File => None,
            },
        })
    }
}
