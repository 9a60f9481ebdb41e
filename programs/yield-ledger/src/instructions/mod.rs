pub mod accrue_yield;
pub mod batch_complete_deposits;
pub mod batch_complete_withdrawals;
pub mod complete_deposit;
pub mod complete_withdrawal;
pub mod create_deposit;
pub mod fail_deposit;
pub mod fail_withdrawal;
pub mod get_effective_balance;
pub mod get_wallet_balances;
pub mod initialize_client;
pub mod queue_withdrawal;
pub mod request_withdrawal;
pub mod stake_idle_funds;
pub mod update_revenue_split;
pub mod update_strategy;

pub use accrue_yield::*;
pub use batch_complete_deposits::*;
pub use batch_complete_withdrawals::*;
pub use complete_deposit::*;
pub use complete_withdrawal::*;
pub use create_deposit::*;
pub use fail_deposit::*;
pub use fail_withdrawal::*;
pub use get_effective_balance::*;
pub use get_wallet_balances::*;
pub use initialize_client::*;
pub use queue_withdrawal::*;
pub use request_withdrawal::*;
pub use stake_idle_funds::*;
pub use update_revenue_split::*;
pub use update_strategy::*;
