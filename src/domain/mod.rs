mod flask;
mod ledger;
mod overview;

pub use flask::*;
pub use ledger::*;
pub use overview::*;
