//! Sink module for generated records
//!
//! This module provides the abstraction the orchestrator writes through
//! and implementations for an in-memory store and a REST data service.

mod traits;
mod memory;
mod rest;

pub use traits::*;
pub use memory::MemorySink;
pub use rest::RestSink;
