//! Domain layer: account state, payers and engine outcomes.

pub mod account;
pub mod outcome;
pub mod payer;

pub use account::{AccountState, BalanceChangeReason};
pub use outcome::ExecutionOutcome;
pub use payer::Payer;
