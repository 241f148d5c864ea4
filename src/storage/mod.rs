mod ledger_store;

pub use ledger_store::*;
pub(crate) use ledger_store::to_row;
