pub mod client_ledger;
pub mod deposit;
pub mod position;
pub mod vault;
pub mod withdrawal;

pub use client_ledger::*;
pub use deposit::*;
pub use position::*;
pub use vault::*;
pub use withdrawal::*;
