//! Ports: the pool and block generator the collator drives.

pub mod outbound;

pub use outbound::{
    BlockGenerator, BlockGeneratorFactory, GeneratedBlock, GeneratorParams, MessagePool,
};
