//! Adapters: storage-backed execution state, the reference engine and the
//! out-message lookup.

pub mod engine;
pub mod lookup;
pub mod state;

pub use engine::{GasSchedule, ReferenceEngine};
pub use lookup::StorageMessageLookup;
pub use state::{
    read_account, revert_account_changes, write_account, FinishedState, StorageState,
};
