//! PowerStore Batch Provisioner
//!
//! Provisions block volumes and file systems on a Dell PowerStore array from
//! a declarative CSV batch, validating each request against live array state
//! and producing a per-item audit report.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────────┐   ┌────────────┐
//! │  Inventory   │──▶│    Request    │──▶│     Resource     │──▶│   Result   │
//! │   Snapshot   │   │   Validator   │   │   Provisioner    │   │ Aggregator │
//! └──────┬───────┘   └───────────────┘   └────────┬─────────┘   └─────┬──────┘
//!        │                pure, no I/O            │                   │
//!        ▼                                        ▼                   ▼
//! ┌─────────────────────────────────────────────────────┐     ┌──────────────┐
//! │           Array Gateway (PowerStore REST)            │     │  BatchReport │
//! └─────────────────────────────────────────────────────┘     └──────────────┘
//! ```
//!
//! The snapshot is captured once and shared read-only through the run. Every
//! per-request failure is converted into outcome data; the operator always
//! gets a complete report, even when every request failed.
//!
//! # Modules
//!
//! - [`orchestrator`]: snapshot, validation, provisioning, and aggregation
//! - [`gateway`]: the PowerStore REST adapter behind the gateway port
//! - [`domain`]: request/inventory types and the gateway trait
//! - [`input`]: batch CSV loading and sample generation
//! - [`render`]: console, CSV, and HTML views of the report
//! - [`config`]: array connection and run configuration
//! - [`error`]: error types and fatality classification

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod input;
pub mod orchestrator;
pub mod render;

// Re-export commonly used types
pub use config::{ArrayConfig, RunConfig};

pub use domain::ports::{
    ArrayGateway, ArrayGatewayRef, CreateResource, HostInfo, PoolInfo, ResourceInfo,
    ResourceKind, ResourceRequest,
};

pub use error::{Error, Result};

pub use gateway::{GatewayFactory, PowerStoreGateway};

pub use orchestrator::{
    aggregate, validate, BatchReport, InventorySnapshot, Orchestrator, OutcomeStatus,
    ProvisionOutcome, ResourceProvisioner, ValidationVerdict,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
