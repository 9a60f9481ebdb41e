use anchor_lang::prelude::*;

use crate::state::{DestinationType, Environment, FailureReason, WithdrawalFees, YieldSource};

#[event]
pub struct ClientInitialized {
    pub client_id: [u8; 32],
    pub authority: Pubkey,
    pub token_mint: Pubkey,
    pub client_revenue_share_bps: u16,
    pub platform_fee_bps: u16,
    pub timestamp: i64,
}

#[event]
pub struct RevenueSplitUpdated {
    pub client_id: [u8; 32],
    pub client_revenue_share_bps: u16,
    pub platform_fee_bps: u16,
    pub end_user_share_bps: u16,
    pub timestamp: i64,
}

#[event]
pub struct VaultCreated {
    pub client_id: [u8; 32],
    pub vault: Pubkey,
    pub chain: [u8; 16],
    pub token_mint: Pubkey,
    pub token_symbol: [u8; 8],
    pub timestamp: i64,
}

#[event]
pub struct StrategyUpdated {
    pub client_id: [u8; 32],
    pub vault: Pubkey,
    pub target_bps: [u16; 3],
    pub timestamp: i64,
}

#[event]
pub struct IndexAccrued {
    pub client_id: [u8; 32],
    pub vault: Pubkey,
    pub old_index: u128,
    pub new_index: u128,
    pub daily_yield_micro_pct: u64,
    pub dominant_source: YieldSource,
    pub yield_amount: u64,
    pub cycle_day: u64,
    pub timestamp: i64,
}

#[event]
pub struct AccrualCycleCompleted {
    pub vaults_attempted: u32,
    pub vaults_succeeded: u32,
    pub cycle_day: u64,
    pub timestamp: i64,
}

#[event]
pub struct DepositCreated {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub user_id: [u8; 32],
    pub fiat_amount: u64,
    pub fiat_currency: [u8; 8],
    pub environment: Environment,
    pub timestamp: i64,
}

#[event]
pub struct DepositCompleted {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub user_id: [u8; 32],
    pub crypto_amount: u64,
    pub entry_index_after: u128,
    pub idle_balance_after: u64,
    pub external_reference: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct DepositFailed {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub error_code: u32,
    pub timestamp: i64,
}

/// A batch item skipped without aborting its siblings
#[event]
pub struct SettlementItemSkipped {
    pub order_id: [u8; 32],
    pub error_code: u32,
    pub timestamp: i64,
}

#[event]
pub struct BatchDepositsSettled {
    pub client_id: [u8; 32],
    pub environment: Environment,
    pub completed: u32,
    pub failed: u32,
    pub total_credited: u64,
    pub external_reference: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct WithdrawalRequested {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub user_id: [u8; 32],
    pub requested_amount: u64,
    pub effective_balance: u64,
    pub fees: WithdrawalFees,
    pub environment: Environment,
    pub timestamp: i64,
}

/// Transfer intent handed to the external executor; the engine never moves
/// the funds itself.
#[event]
pub struct TransferIntentQueued {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub amount: u64,
    pub destination_type: DestinationType,
    pub token_symbol: [u8; 8],
    pub timestamp: i64,
}

#[event]
pub struct WithdrawalCompleted {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub user_id: [u8; 32],
    pub actual_amount: u64,
    pub idle_balance_after: u64,
    pub external_reference: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct WithdrawalFailed {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub reason: FailureReason,
    pub retryable: bool,
    pub timestamp: i64,
}

#[event]
pub struct BatchWithdrawalsSettled {
    pub client_id: [u8; 32],
    pub environment: Environment,
    pub completed: u32,
    pub failed: u32,
    pub total_debited: u64,
    pub external_reference: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct FundsStaked {
    pub client_id: [u8; 32],
    pub vault: Pubkey,
    pub amount: u64,
    pub idle_balance_after: u64,
    pub earning_balance_after: u64,
    pub timestamp: i64,
}

#[event]
pub struct UserBalanceSnapshot {
    pub user_id: [u8; 32],
    pub client_id: [u8; 32],
    pub total_deposited: u64,
    pub effective_balance: u64,
    pub yield_earned: u64,
    pub apy_micro_pct: u64,
    pub entry_index: u128,
    pub current_index: u128,
    pub timestamp: i64,
}

#[event]
pub struct WalletBalancesSnapshot {
    pub client_id: [u8; 32],
    pub idle_balance: u64,
    pub earning_balance: u64,
    pub client_revenue: u64,
    pub platform_revenue: u64,
    pub end_user_revenue: u64,
    pub timestamp: i64,
}
