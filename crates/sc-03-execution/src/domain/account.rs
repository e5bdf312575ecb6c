//! Account state.

use serde::{Deserialize, Serialize};
use shared_types::U256;
use std::fmt;

/// Persistent state of one account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountState {
    /// Account balance.
    pub balance: U256,
    /// Next expected external message seqno.
    pub seqno: u64,
    /// Contract code (empty for a plain wallet).
    pub code: Vec<u8>,
}

impl AccountState {
    /// A code-less account holding `balance`.
    #[must_use]
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Returns true if the account carries code.
    #[must_use]
    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }
}

/// Why a balance changed. Carried into trace logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChangeReason {
    /// Gas bought before execution.
    GasBuy,
    /// Unused gas returned after execution.
    GasRefund,
    /// Value delivered by an internal message.
    MessageValue,
    /// Value sent with an emitted message.
    Transfer,
    /// Balance assigned at genesis.
    Genesis,
}

impl fmt::Display for BalanceChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GasBuy => "gas-buy",
            Self::GasRefund => "gas-refund",
            Self::MessageValue => "message-value",
            Self::Transfer => "transfer",
            Self::Genesis => "genesis",
        };
        f.write_str(name)
    }
}
