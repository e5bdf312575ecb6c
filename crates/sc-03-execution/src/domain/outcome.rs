//! Engine outcomes.

use crate::errors::{StateError, VmError};
use shared_types::{Address, Gas, Log};

/// Result of handing a message to the execution engine.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// The message executed.
    Completed {
        /// Gas not consumed
        leftover_gas: Gas,
        /// Contract executed against (or deployed)
        contract_address: Address,
        /// Emitted logs
        logs: Vec<Log>,
    },
    /// The engine failed the message; it still gets a receipt.
    ExecutionFailed {
        /// Gas not consumed
        leftover_gas: Gas,
        /// What went wrong
        error: VmError,
    },
    /// The engine failed outside VM semantics; the batch aborts.
    EngineFatal(StateError),
}

impl ExecutionOutcome {
    /// Gas not consumed, if the outcome produces a receipt.
    #[must_use]
    pub fn leftover_gas(&self) -> Option<Gas> {
        match self {
            Self::Completed { leftover_gas, .. } | Self::ExecutionFailed { leftover_gas, .. } => {
                Some(*leftover_gas)
            }
            Self::EngineFatal(_) => None,
        }
    }
}
