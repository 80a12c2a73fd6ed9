//! Infrastructure implementations.
//!
//! Contains port traits, the snapshot bus, the sensing worker and the
//! adapters for external dependencies.

pub mod config;
pub mod ports;
pub mod replay;
pub mod sensing;
pub mod snapshot_bus;
