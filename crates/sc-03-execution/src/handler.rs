//! # Message Handler
//!
//! Processes a block's in-messages strictly in order:
//!
//! ```text
//! validate ──✗──> failure receipt
//!    │
//! buy gas ──✗──> dropped (no receipt, no seqno advance)
//!    │
//! advance seqno (external only)
//!    │
//! deploy / execute ──fatal──> abort batch
//!    │
//! refund leftover, deliver message value
//!    │
//! receipt
//! ```

use crate::domain::{BalanceChangeReason, ExecutionOutcome, Payer};
use crate::errors::{HandlerError, ValidationError};
use crate::ports::{ExecutionState, OutMessageLookup};
use shared_types::{
    Address, BlockContext, DeployMessage, Gas, Hash, Message, Receipt, ShardId, MAIN_SHARD_ID,
    MAIN_WALLET_ADDRESS,
};
use tracing::{debug, info, info_span, Span};

/// Outcome counts of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandleSummary {
    /// Messages executed successfully.
    pub accepted: usize,
    /// Messages the engine failed (receipt with `success = false`).
    pub failed: usize,
    /// Messages rejected before execution (failure receipt).
    pub rejected: usize,
    /// Messages dropped because gas could not be bought.
    pub dropped: Vec<Hash>,
    /// Gas charged across the batch.
    pub gas_used: Gas,
}

impl HandleSummary {
    /// Number of dropped messages.
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    /// Number of receipts the batch produced.
    pub fn receipt_count(&self) -> usize {
        self.accepted + self.failed + self.rejected
    }
}

/// Checks a deployment descriptor carried by `msg`.
///
/// Needs no state, so callers can screen deploy messages before any block
/// attempt.
pub fn validate_deploy_message(
    msg: &Message,
    system_wallet: &Address,
) -> Result<DeployMessage, ValidationError> {
    let deploy = DeployMessage::decode(&msg.data)?;
    if deploy.shard_id == MAIN_SHARD_ID && msg.from != *system_wallet {
        return Err(ValidationError::MainShardForbidden(msg.from));
    }
    let expected = deploy.address();
    if expected != msg.to {
        return Err(ValidationError::AddressMismatch {
            expected,
            got: msg.to,
        });
    }
    Ok(deploy)
}

/// Validates, charges, executes and records a batch of messages.
pub struct MessageHandler {
    shard_id: ShardId,
    system_wallet: Address,
    span: Span,
}

impl MessageHandler {
    /// Creates a handler for `shard_id` with the default system wallet.
    pub fn new(shard_id: ShardId) -> Self {
        Self {
            shard_id,
            system_wallet: MAIN_WALLET_ADDRESS,
            span: info_span!("message_handler", shard = shard_id),
        }
    }

    /// Overrides the only sender allowed to deploy onto the main shard.
    #[must_use]
    pub fn with_system_wallet(mut self, system_wallet: Address) -> Self {
        self.system_wallet = system_wallet;
        self
    }

    /// The configured system wallet.
    pub fn system_wallet(&self) -> &Address {
        &self.system_wallet
    }

    /// Processes `messages` in order against `state`.
    ///
    /// Every message ends with exactly one receipt, except those dropped for
    /// lack of gas funds. Infrastructure failures abort the batch.
    pub fn handle_messages(
        &self,
        state: &mut dyn ExecutionState,
        lookup: &dyn OutMessageLookup,
        messages: &[Message],
        ctx: &BlockContext,
    ) -> Result<HandleSummary, HandlerError> {
        let _entered = self.span.enter();
        let mut summary = HandleSummary::default();
        for msg in messages {
            self.handle_message(state, lookup, msg, ctx, &mut summary)?;
        }
        debug!(
            block = ctx.block_number,
            accepted = summary.accepted,
            failed = summary.failed,
            rejected = summary.rejected,
            dropped = summary.dropped_count(),
            gas = %summary.gas_used,
            "batch handled"
        );
        Ok(summary)
    }

    fn handle_message(
        &self,
        state: &mut dyn ExecutionState,
        lookup: &dyn OutMessageLookup,
        msg: &Message,
        ctx: &BlockContext,
        summary: &mut HandleSummary,
    ) -> Result<(), HandlerError> {
        let hash = msg.hash();
        state.set_in_message_hash(hash);

        if let Some(reason) = self.validate(state, lookup, msg, &hash)? {
            info!(msg = %hash, %reason, "message rejected");
            state.add_receipt(Receipt::failure(hash, msg.to, Gas::ZERO));
            summary.rejected += 1;
            return Ok(());
        }

        let mut payer = Payer::for_message(msg);
        let required = msg.gas_limit.to_value(msg.gas_price);
        let affordable = match required {
            Some(amount) => payer.can_pay(state, amount)?,
            None => false,
        };
        let Some(required) = required.filter(|_| affordable) else {
            info!(
                msg = %hash,
                payer = %payer.describe(),
                gas_limit = %msg.gas_limit,
                "insufficient funds to buy gas, message dropped"
            );
            summary.dropped.push(hash);
            return Ok(());
        };
        payer.sub_balance(state, required, BalanceChangeReason::GasBuy)?;

        if !msg.internal {
            state.set_seqno(&msg.to, msg.seqno.saturating_add(1))?;
        }

        let outcome = if msg.deploy {
            match validate_deploy_message(msg, &self.system_wallet) {
                Ok(deploy) => state.deploy(msg, &deploy, ctx),
                Err(reason) => {
                    info!(msg = %hash, %reason, "deploy message rejected");
                    payer.deliver(state, &msg.to)?;
                    state.add_receipt(Receipt::failure(hash, msg.to, msg.gas_limit));
                    summary.rejected += 1;
                    summary.gas_used = summary.gas_used.saturating_add(msg.gas_limit);
                    return Ok(());
                }
            }
        } else {
            state.execute(msg, ctx)
        };

        let (leftover_gas, receipt) = match outcome {
            ExecutionOutcome::Completed {
                leftover_gas,
                contract_address,
                logs,
            } => {
                let leftover_gas = leftover_gas.min(msg.gas_limit);
                summary.accepted += 1;
                let receipt = Receipt {
                    success: true,
                    gas_used: msg.gas_limit.saturating_sub(leftover_gas),
                    msg_hash: hash,
                    contract_address,
                    logs,
                };
                (leftover_gas, receipt)
            }
            ExecutionOutcome::ExecutionFailed {
                leftover_gas,
                error,
            } => {
                let leftover_gas = leftover_gas.min(msg.gas_limit);
                debug!(msg = %hash, %error, "execution failed");
                summary.failed += 1;
                let gas_used = msg.gas_limit.saturating_sub(leftover_gas);
                (leftover_gas, Receipt::failure(hash, msg.to, gas_used))
            }
            ExecutionOutcome::EngineFatal(err) => return Err(HandlerError::EngineFatal(err)),
        };

        if let Some(refund) = leftover_gas.to_value(msg.gas_price) {
            if !refund.is_zero() {
                payer.add_balance(state, refund, BalanceChangeReason::GasRefund)?;
            }
        }
        payer.deliver(state, &msg.to)?;

        summary.gas_used = summary.gas_used.saturating_add(receipt.gas_used);
        state.add_receipt(receipt);
        Ok(())
    }

    /// `Ok(Some(reason))` rejects the message; `Err` aborts the batch.
    fn validate(
        &self,
        state: &mut dyn ExecutionState,
        lookup: &dyn OutMessageLookup,
        msg: &Message,
        hash: &Hash,
    ) -> Result<Option<ValidationError>, HandlerError> {
        if msg.destination_shard() != self.shard_id {
            return Ok(Some(ValidationError::WrongShard {
                expected: self.shard_id,
                got: msg.destination_shard(),
            }));
        }

        if msg.internal {
            let origin = msg.origin_shard();
            if lookup.find_out_message(origin, hash)?.is_none() {
                return Err(HandlerError::MissingOriginMessage {
                    shard_id: origin,
                    hash: *hash,
                });
            }
            return Ok(None);
        }

        let Some(account) = state.account(&msg.to)? else {
            return Ok(Some(ValidationError::InvalidAddress(msg.to)));
        };
        if account.has_code() {
            if !state.verify_external(msg, &account)? {
                return Ok(Some(ValidationError::SignatureRejected(msg.to)));
            }
        } else if msg.from != msg.to {
            return Ok(Some(ValidationError::SelfDeployMismatch {
                from: msg.from,
                to: msg.to,
            }));
        }
        if account.seqno != msg.seqno {
            return Ok(Some(ValidationError::SeqnoGap {
                expected: account.seqno,
                got: msg.seqno,
            }));
        }
        Ok(None)
    }
}
