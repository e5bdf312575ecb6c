//! # SC-02 Storage
//!
//! Transactional key-value storage as seen by collation and replay.
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  accessors / tries                           │
//! │  - last block, block-by-number, cursors      │
//! │  - in/out message tries, receipts            │
//! └──────────────────────────────────────────────┘
//!                      │
//! ┌──────────────────────────────────────────────┐
//! │  ports: Storage, RoTx, RwTx, Table            │
//! └──────────────────────────────────────────────┘
//!                      │
//! ┌──────────────────────────────────────────────┐
//! │  adapters: MemoryStorage                     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Ownership
//!
//! A read-write transaction is owned by exactly one component for one
//! attempt. Dropping it without calling [`RwTx::commit`] discards every write
//! it buffered, so each exit path (error, timeout, cancellation, panic)
//! releases it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accessors;
pub mod adapters;
pub mod errors;
pub mod ports;
pub mod tries;

pub use adapters::memory::MemoryStorage;
pub use errors::{Result, StorageError};
pub use ports::{RoTx, RwTx, Storage, Table};
