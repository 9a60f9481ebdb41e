use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;

use instructions::*;
use state::FailureReason;

declare_id!("71tCcHx2j7TnoaQFSRghNRxrPJM25LV2qnztHyLV6H7B");

#[program]
pub mod yield_ledger {
    use super::*;

    /// Register a client (product) ledger and its idle-funds treasury
    pub fn initialize_client(
        ctx: Context<InitializeClient>,
        client_id: [u8; 32],
        client_revenue_share_bps: u16,
        platform_fee_bps: u16,
    ) -> Result<()> {
        instructions::initialize_client(ctx, client_id, client_revenue_share_bps, platform_fee_bps)
    }

    /// Reconfigure the client's three-way revenue split
    pub fn update_revenue_split(
        ctx: Context<UpdateRevenueSplit>,
        client_revenue_share_bps: u16,
        platform_fee_bps: u16,
    ) -> Result<()> {
        instructions::update_revenue_split(ctx, client_revenue_share_bps, platform_fee_bps)
    }

    /// Set a vault's target allocation over the yield source set
    pub fn update_strategy(ctx: Context<UpdateStrategy>, target_bps: [u16; 3]) -> Result<()> {
        instructions::update_strategy(ctx, target_bps)
    }

    /// Daily accrual crank: advance the growth index of every vault passed
    /// in remaining accounts (once per day per vault)
    pub fn accrue_yield<'info>(
        ctx: Context<'_, '_, 'info, 'info, AccrueYield<'info>>,
        cycle_rates: Vec<SourceRate>,
    ) -> Result<()> {
        instructions::accrue_yield(ctx, cycle_rates)
    }

    /// Open a deposit order with snapshotted payment instructions
    pub fn create_deposit(ctx: Context<CreateDeposit>, args: CreateDepositArgs) -> Result<()> {
        instructions::create_deposit(ctx, args)
    }

    /// Settle one confirmed deposit: convert, deduct fees, credit balances
    pub fn complete_deposit(
        ctx: Context<CompleteDeposit>,
        args: CompleteDepositArgs,
    ) -> Result<()> {
        instructions::complete_deposit(ctx, args)
    }

    /// Mark a pending deposit failed without moving balances
    pub fn fail_deposit(ctx: Context<FailDeposit>, error_code: u32) -> Result<()> {
        instructions::fail_deposit(ctx, error_code)
    }

    /// Settle a page of deposit orders against one aggregate transfer
    pub fn batch_complete_deposits<'info>(
        ctx: Context<'_, '_, 'info, 'info, BatchCompleteDeposits<'info>>,
        args: BatchCompleteDepositsArgs,
    ) -> Result<()> {
        instructions::batch_complete_deposits(ctx, args)
    }

    /// Open a withdrawal order against the user's effective balance
    pub fn request_withdrawal(
        ctx: Context<RequestWithdrawal>,
        args: RequestWithdrawalArgs,
    ) -> Result<()> {
        instructions::request_withdrawal(ctx, args)
    }

    /// Hand the transfer intent to the external executor
    pub fn queue_withdrawal(ctx: Context<QueueWithdrawal>) -> Result<()> {
        instructions::queue_withdrawal(ctx)
    }

    /// Settle a withdrawal from the executor's transfer result
    pub fn complete_withdrawal(
        ctx: Context<CompleteWithdrawal>,
        result: TransferResult,
    ) -> Result<()> {
        instructions::complete_withdrawal(ctx, result)
    }

    /// Mark a pending or queued withdrawal failed with a reason
    pub fn fail_withdrawal(ctx: Context<FailWithdrawal>, reason: FailureReason) -> Result<()> {
        instructions::fail_withdrawal(ctx, reason)
    }

    /// Settle a page of withdrawal orders against one aggregate transfer
    pub fn batch_complete_withdrawals<'info>(
        ctx: Context<'_, '_, 'info, 'info, BatchCompleteWithdrawals<'info>>,
        args: BatchCompleteWithdrawalsArgs,
    ) -> Result<()> {
        instructions::batch_complete_withdrawals(ctx, args)
    }

    /// Deploy idle funds into the vault's earning pool
    pub fn stake_idle_funds(ctx: Context<StakeIdleFunds>, amount: u64) -> Result<()> {
        instructions::stake_idle_funds(ctx, amount)
    }

    /// Emit a user's derived balance view (read-only)
    pub fn get_effective_balance(
        ctx: Context<GetEffectiveBalance>,
        user_id: [u8; 32],
    ) -> Result<()> {
        instructions::get_effective_balance(ctx, user_id)
    }

    /// Emit the client's idle/earning/revenue wallet view (read-only)
    pub fn get_wallet_balances(ctx: Context<GetWalletBalances>) -> Result<()> {
        instructions::get_wallet_balances(ctx)
    }
}
