//! Domain layer - Core request/inventory types and port definitions
//!
//! This module defines the types the pipeline passes between stages and the
//! gateway trait (port) that array adapters implement.

pub mod ports;

pub use ports::*;
