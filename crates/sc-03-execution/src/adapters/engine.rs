//! # Reference Engine
//!
//! A deliberately small execution engine behind the deploy / execute entry
//! points. It charges a flat gas schedule, installs code on deployment and
//! treats a call payload that decodes as a [`Message`] as a request to emit
//! that message to its destination shard.

use crate::adapters::state::StorageState;
use crate::domain::{BalanceChangeReason, ExecutionOutcome};
use crate::errors::{StateError, VmError};
use crate::ports::ExecutionState;
use shared_types::{BlockContext, DeployMessage, Gas, Hash, Log, Message};
use tracing::debug;

/// Flat gas costs of the reference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSchedule {
    /// Charged per deployment.
    pub deploy_gas: Gas,
    /// Charged per plain execution.
    pub call_gas: Gas,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            deploy_gas: Gas(10_000),
            call_gas: Gas(1_000),
        }
    }
}

/// The reference engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEngine {
    schedule: GasSchedule,
}

impl ReferenceEngine {
    /// Creates an engine charging `schedule`.
    pub fn new(schedule: GasSchedule) -> Self {
        Self { schedule }
    }

    /// The engine's gas schedule.
    pub fn schedule(&self) -> GasSchedule {
        self.schedule
    }

    fn charge(required: Gas, limit: Gas) -> Result<Gas, VmError> {
        if limit < required {
            return Err(VmError::OutOfGas {
                required: required.0,
                limit: limit.0,
            });
        }
        Ok(limit.saturating_sub(required))
    }

    /// Installs `deploy.code` at its content address.
    pub fn deploy(
        &self,
        state: &mut StorageState,
        msg: &Message,
        deploy: &DeployMessage,
        ctx: &BlockContext,
    ) -> ExecutionOutcome {
        let leftover_gas = match Self::charge(self.schedule.deploy_gas, msg.gas_limit) {
            Ok(leftover) => leftover,
            Err(error) => {
                return ExecutionOutcome::ExecutionFailed {
                    leftover_gas: Gas::ZERO,
                    error,
                }
            }
        };

        let address = deploy.address();
        match state.account(&address) {
            Ok(Some(existing)) if existing.has_code() => {
                return ExecutionOutcome::ExecutionFailed {
                    leftover_gas,
                    error: VmError::ContractAlreadyExists(address),
                };
            }
            Ok(_) => {}
            Err(err) => return ExecutionOutcome::EngineFatal(err),
        }
        if let Err(err) = state.install_code(&address, deploy.code.clone()) {
            return ExecutionOutcome::EngineFatal(err);
        }

        debug!(
            shard = ctx.shard_id,
            block = ctx.block_number,
            %address,
            code_len = deploy.code.len(),
            "contract deployed"
        );
        ExecutionOutcome::Completed {
            leftover_gas,
            contract_address: address,
            logs: vec![Log {
                address,
                topics: vec![Hash::keccak(&deploy.code)],
                data: Vec::new(),
            }],
        }
    }

    /// Executes a plain message against `msg.to`.
    pub fn execute(
        &self,
        state: &mut StorageState,
        msg: &Message,
        ctx: &BlockContext,
    ) -> ExecutionOutcome {
        let leftover_gas = match Self::charge(self.schedule.call_gas, msg.gas_limit) {
            Ok(leftover) => leftover,
            Err(error) => {
                return ExecutionOutcome::ExecutionFailed {
                    leftover_gas: Gas::ZERO,
                    error,
                }
            }
        };

        let mut logs = Vec::new();
        if let Ok(payload) = Message::decode(&msg.data) {
            let emitted = Message {
                from: msg.to,
                internal: true,
                signature: Vec::new(),
                ..payload
            };
            match Self::fund(state, msg, &emitted) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    return ExecutionOutcome::ExecutionFailed {
                        leftover_gas,
                        error,
                    }
                }
                Err(err) => return ExecutionOutcome::EngineFatal(err),
            }
            debug!(
                shard = ctx.shard_id,
                block = ctx.block_number,
                dest = emitted.destination_shard(),
                msg = %emitted.hash(),
                "message emitted"
            );
            logs.push(Log {
                address: msg.to,
                topics: vec![emitted.hash()],
                data: Vec::new(),
            });
            state.emit(emitted);
        }

        ExecutionOutcome::Completed {
            leftover_gas,
            contract_address: msg.to,
            logs,
        }
    }

    /// Debits the value an emitted message carries from its sender.
    fn fund(
        state: &mut StorageState,
        msg: &Message,
        emitted: &Message,
    ) -> Result<Result<(), VmError>, StateError> {
        if emitted.value.is_zero() {
            return Ok(Ok(()));
        }
        let available = state
            .account(&msg.to)?
            .map(|account| account.balance)
            .unwrap_or_default();
        if available < emitted.value {
            return Ok(Err(VmError::InsufficientBalance {
                required: emitted.value,
                available,
            }));
        }
        state.sub_balance(&msg.to, emitted.value, BalanceChangeReason::Transfer)?;
        Ok(Ok(()))
    }
}
