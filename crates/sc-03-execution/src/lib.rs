//! # SC-03 Execution
//!
//! Turns a batch of in-messages into account state changes and receipts.
//!
//! ## Gas Economics
//!
//! | Message  | Payer                 | Refund goes to              |
//! |----------|-----------------------|-----------------------------|
//! | External | destination account   | destination account         |
//! | Internal | value it carries      | carried value, delivered to destination |
//!
//! A message whose payer cannot cover `gas_limit × gas_price` is dropped:
//! no receipt, no seqno advance. Every other message gets exactly one
//! receipt, in batch order.
//!
//! ## Error Taxonomy
//!
//! - Rejections ([`ValidationError`]) and engine failures ([`VmError`]) end
//!   in a failure receipt.
//! - Everything else ([`HandlerError`]) aborts the block attempt.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod handler;
pub mod ports;

pub use adapters::{
    read_account, revert_account_changes, write_account, FinishedState, GasSchedule,
    ReferenceEngine, StorageMessageLookup, StorageState,
};
pub use domain::{AccountState, BalanceChangeReason, ExecutionOutcome, Payer};
pub use errors::{HandlerError, StateError, ValidationError, VmError};
pub use handler::{validate_deploy_message, HandleSummary, MessageHandler};
pub use ports::{ExecutionState, OutMessageLookup};
