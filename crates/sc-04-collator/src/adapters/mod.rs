//! Adapters: the storage-backed block generator and the in-memory pool.

pub mod generator;
pub mod pool;

pub use generator::{StateBlockGenerator, StateBlockGeneratorFactory};
pub use pool::InMemoryMessagePool;
