//! Domain Ports - Core types and trait definitions for the batch provisioner
//!
//! These types flow between the pipeline stages; the [`ArrayGateway`] trait
//! defines the boundary to the management API. Adapters implement the trait
//! to provide concrete transports.

use crate::error::Result;
use async_trait::async_trait;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Resource Kinds
// =============================================================================

/// Kind of resource being provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Block volume, created in a storage pool and mapped to hosts
    Block,
    /// File system, created under a NAS server and exported to clients
    File,
}

impl Default for ResourceKind {
    fn default() -> Self {
        ResourceKind::Block
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Block => write!(f, "block"),
            ResourceKind::File => write!(f, "file"),
        }
    }
}

// =============================================================================
// Resource Request
// =============================================================================

/// One row of input intent.
///
/// `size` and `quota` stay raw strings here; the validator owns parsing so a
/// malformed value surfaces as a verdict error, not a load failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Resource name; the identity key for idempotency
    pub name: String,
    /// Block volume or file system
    #[serde(default)]
    pub kind: ResourceKind,
    /// Requested size, raw ("10737418240", "100Gi", "2T")
    pub size: String,
    /// Storage pool (block) or NAS server (file) to allocate in
    pub pool: String,
    /// Free-form description stored on the array
    #[serde(default)]
    pub description: Option<String>,
    /// Hosts (block) or export clients (file) to attach, in input order
    #[serde(default)]
    pub consumers: IndexSet<String>,
    /// Thin provisioning; None leaves the array default
    #[serde(default)]
    pub thin: Option<bool>,
    /// File protocol, passed through to the array ("nfs", "smb")
    #[serde(default)]
    pub protocol: Option<String>,
    /// File quota, raw size string
    #[serde(default)]
    pub quota: Option<String>,
    /// File access policy, passed through to the array
    #[serde(default)]
    pub access_policy: Option<String>,
}

impl ResourceRequest {
    /// Create a minimal request; optional fields start empty.
    pub fn new(name: impl Into<String>, size: impl Into<String>, pool: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Block,
            size: size.into(),
            pool: pool.into(),
            description: None,
            consumers: IndexSet::new(),
            thin: None,
            protocol: None,
            quota: None,
            access_policy: None,
        }
    }

    /// Name with surrounding whitespace removed; batch identity key.
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}

// =============================================================================
// Inventory Types
// =============================================================================

/// A storage allocation domain: a block pool or a NAS server (file container)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolInfo {
    /// Opaque array identifier
    pub id: String,
    /// Pool or NAS server name
    pub name: String,
    /// Which resource kind this domain allocates
    pub kind: ResourceKind,
    /// Total capacity in bytes; None when the array does not report it
    pub total_bytes: Option<u64>,
    /// Free capacity in bytes; None when the array does not report it
    pub free_bytes: Option<u64>,
    /// Owning appliance, when the array models one
    pub appliance_id: Option<String>,
    /// NAS server address, required by file-system creation payloads
    pub address: Option<String>,
}

/// A host (or export client) known to the array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    /// Opaque array identifier used for attachment calls
    pub id: String,
    /// Host name as registered on the array
    pub name: String,
}

/// An existing resource on the array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Opaque array identifier
    pub id: String,
    /// Resource name
    pub name: String,
    /// Block volume or file system
    pub kind: ResourceKind,
    /// Current provisioned size in bytes
    pub size_bytes: u64,
    /// World-wide name, assigned by the array after creation (block only)
    pub wwn: Option<String>,
}

// =============================================================================
// Creation Payload
// =============================================================================

/// Fully resolved creation payload handed to the gateway.
///
/// `pool` is the snapshot entry the request's pool name resolved to, so the
/// gateway has the id (block) or name/address (file) without a second lookup.
#[derive(Debug, Clone, Serialize)]
pub struct CreateResource {
    pub name: String,
    pub kind: ResourceKind,
    pub size_bytes: u64,
    pub pool: PoolInfo,
    pub description: Option<String>,
    pub thin: Option<bool>,
    pub protocol: Option<String>,
    pub quota_bytes: Option<u64>,
    pub access_policy: Option<String>,
}

// =============================================================================
// Array Gateway Port
// =============================================================================

/// Port for the array management API.
///
/// Every call is a blocking I/O boundary; timeouts and read-retry policy live
/// behind this trait, never in the pipeline.
#[async_trait]
pub trait ArrayGateway: Send + Sync {
    /// List block pools and NAS containers
    async fn list_pools(&self) -> Result<Vec<PoolInfo>>;

    /// List hosts registered on the array
    async fn list_hosts(&self) -> Result<Vec<HostInfo>>;

    /// List existing volumes and file systems
    async fn list_resources(&self) -> Result<Vec<ResourceInfo>>;

    /// Create a resource, returning its array identifier
    async fn create_resource(&self, payload: &CreateResource) -> Result<String>;

    /// Attach a consumer (host or export client) to a resource
    async fn attach_consumer(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        consumer_id: &str,
    ) -> Result<()>;

    /// Fetch a single resource, including identifiers assigned after
    /// creation such as the WWN
    async fn resource_details(&self, kind: ResourceKind, resource_id: &str)
        -> Result<ResourceInfo>;
}

pub type ArrayGatewayRef = Arc<dyn ArrayGateway>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_display() {
        assert_eq!(format!("{}", ResourceKind::Block), "block");
        assert_eq!(format!("{}", ResourceKind::File), "file");
    }

    #[test]
    fn test_request_trimmed_name() {
        let req = ResourceRequest::new("  vol-01  ", "10Gi", "pool-a");
        assert_eq!(req.trimmed_name(), "vol-01");
    }

    #[test]
    fn test_consumers_preserve_order() {
        let mut req = ResourceRequest::new("vol-01", "10Gi", "pool-a");
        req.consumers.insert("esx-02".to_string());
        req.consumers.insert("esx-01".to_string());
        req.consumers.insert("esx-02".to_string());

        let ordered: Vec<&String> = req.consumers.iter().collect();
        assert_eq!(ordered, vec!["esx-02", "esx-01"]);
    }
}
