//! # Shard-Collator Test Suite
//!
//! Cross-crate scenarios that need several shards, the collator and
//! storage working together.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # multi-shard harness driven collation by collation
//! └── integration/
//!     ├── relay.rs       # cross-shard delivery over both topologies
//!     ├── replay.rs      # regenerating collated blocks
//!     ├── deploy.rs      # contract deployment through emitted messages
//!     └── node.rs        # the full node with schedulers and supervisor
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sc-tests
//! cargo test -p sc-tests integration::replay
//!
//! # Benchmarks
//! cargo bench -p sc-tests
//! ```

#[cfg(test)]
pub mod fixtures;
pub mod integration;
