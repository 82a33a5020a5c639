// Application layer: the station ledger set and the commands that mutate it.
// Front ends (the CLI today) build commands and decide when to save.

mod command;
pub mod error;
mod service;

pub use command::*;
pub use error::*;
pub use service::*;
