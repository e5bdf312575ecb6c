//! Cross-crate scenario tests.

mod deploy;
mod node;
mod relay;
mod replay;
