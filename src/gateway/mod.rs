//! Array Gateway Adapters
//!
//! Concrete transports behind the [`ArrayGateway`](crate::domain::ports::ArrayGateway)
//! port. One adapter today: the PowerStore REST API.

pub mod powerstore;

pub use powerstore::*;

use crate::config::ArrayConfig;
use crate::domain::ports::ArrayGatewayRef;
use crate::error::Result;
use std::sync::Arc;

/// Factory for array gateway adapters
pub struct GatewayFactory;

impl GatewayFactory {
    /// Connect to the array and return a ready gateway.
    ///
    /// Connecting performs the login round-trip, so a bad endpoint or bad
    /// credentials fail here, before any batch work starts.
    pub async fn connect(config: ArrayConfig) -> Result<ArrayGatewayRef> {
        let gateway = PowerStoreGateway::connect(config).await?;
        Ok(Arc::new(gateway))
    }
}
