mod budget;
mod debt;
mod ledger;
mod money;
mod record;

pub use budget::*;
pub use debt::*;
pub use ledger::*;
pub use money::*;
pub use record::*;
