//! Storage adapters.

/// In-process storage for single-process nodes and tests.
pub mod memory;
