//! # Payer
//!
//! Who funds a message's gas.
//!
//! External messages are paid for by the destination account. Internal
//! messages arrive pre-funded: gas is carved out of the value they carry,
//! and what remains after the refund is delivered to the destination.

use crate::domain::BalanceChangeReason;
use crate::errors::StateError;
use crate::ports::ExecutionState;
use shared_types::{Address, Message, U256};

/// Source of gas funds for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payer {
    /// The value carried by an internal message.
    Message {
        /// Value not yet spent
        value: U256,
    },
    /// The destination account of an external message.
    Account {
        /// Paying account
        address: Address,
    },
}

impl Payer {
    /// Picks the payer for `msg`.
    #[must_use]
    pub fn for_message(msg: &Message) -> Self {
        if msg.internal {
            Self::Message { value: msg.value }
        } else {
            Self::Account { address: msg.to }
        }
    }

    /// Whether the payer holds at least `amount`.
    pub fn can_pay(
        &self,
        state: &mut dyn ExecutionState,
        amount: U256,
    ) -> Result<bool, StateError> {
        match self {
            Self::Message { value } => Ok(*value >= amount),
            Self::Account { address } => Ok(state
                .account(address)?
                .is_some_and(|account| account.balance >= amount)),
        }
    }

    /// Debits the payer.
    pub fn sub_balance(
        &mut self,
        state: &mut dyn ExecutionState,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), StateError> {
        match self {
            Self::Message { value } => {
                *value = value
                    .checked_sub(amount)
                    .ok_or_else(|| StateError::InsufficientFunds {
                        payer: "message value".to_string(),
                        required: amount,
                        available: *value,
                    })?;
                Ok(())
            }
            Self::Account { address } => state.sub_balance(address, amount, reason),
        }
    }

    /// Credits the payer.
    pub fn add_balance(
        &mut self,
        state: &mut dyn ExecutionState,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), StateError> {
        match self {
            Self::Message { value } => {
                *value = value.saturating_add(amount);
                Ok(())
            }
            Self::Account { address } => state.add_balance(address, amount, reason),
        }
    }

    /// Delivers what a message payer still carries to `recipient`.
    ///
    /// Account payers hold nothing in flight.
    pub fn deliver(
        self,
        state: &mut dyn ExecutionState,
        recipient: &Address,
    ) -> Result<(), StateError> {
        match self {
            Self::Message { value } if !value.is_zero() => {
                state.add_balance(recipient, value, BalanceChangeReason::MessageValue)
            }
            _ => Ok(()),
        }
    }

    /// Human-readable payer, for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Message { value } => format!("message value {value}"),
            Self::Account { address } => format!("account {address}"),
        }
    }
}
