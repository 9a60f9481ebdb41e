use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::WithdrawalRequested,
    state::{
        ClientLedger, DestinationType, Environment, UserPosition, Vault, WithdrawalFees,
        WithdrawalRecord, WithdrawalStatus,
    },
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct RequestWithdrawalArgs {
    pub order_id: [u8; 32],
    pub user_id: [u8; 32],
    pub amount: u64,
    pub destination_type: DestinationType,
    /// When false the full yield portion pays out and the revenue split is
    /// settled out-of-band
    pub deduct_fees: bool,
    pub environment: Environment,
    pub network: [u8; 16],
}

#[derive(Accounts)]
#[instruction(args: RequestWithdrawalArgs)]
pub struct RequestWithdrawal<'info> {
    #[account(
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority
    )]
    pub client_ledger: Box<Account<'info, ClientLedger>>,

    #[account(
        seeds = [
            VAULT_SEED,
            vault.client_id.as_ref(),
            vault.chain.as_ref(),
            vault.token_mint.as_ref()
        ],
        bump = vault.bump,
        constraint = vault.client_id == client_ledger.client_id @ LedgerError::ClientMismatch
    )]
    pub vault: Box<Account<'info, Vault>>,

    #[account(
        seeds = [
            USER_POSITION_SEED,
            client_ledger.client_id.as_ref(),
            args.user_id.as_ref()
        ],
        bump = user_position.bump
    )]
    pub user_position: Box<Account<'info, UserPosition>>,

    #[account(
        init,
        payer = authority,
        space = WithdrawalRecord::LEN,
        seeds = [WITHDRAWAL_SEED, args.order_id.as_ref()],
        bump
    )]
    pub withdrawal: Box<Account<'info, WithdrawalRecord>>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Open a withdrawal order against the user's effective balance. The fee
/// breakdown is computed and frozen here; the position itself only changes
/// when the withdrawal completes.
pub fn request_withdrawal(
    ctx: Context<RequestWithdrawal>,
    args: RequestWithdrawalArgs,
) -> Result<()> {
    require!(args.amount > 0, LedgerError::InvalidAmount);

    let position = &ctx.accounts.user_position;
    require!(position.created_at != 0, LedgerError::PositionNotFound);

    let now = Clock::get()?.unix_timestamp;
    let ledger = &ctx.accounts.client_ledger;
    let current_index = ctx.accounts.vault.current_index;

    let effective = position.effective_balance(current_index)?;
    require!(args.amount <= effective, LedgerError::InsufficientBalance);

    let fees = WithdrawalFees::calculate(
        args.amount,
        effective,
        position.total_deposited,
        ledger.client_revenue_share_bps,
        ledger.platform_fee_bps,
        args.deduct_fees,
    )?;

    let withdrawal = &mut ctx.accounts.withdrawal;
    withdrawal.order_id = args.order_id;
    withdrawal.client_id = ledger.client_id;
    withdrawal.user_id = args.user_id;
    withdrawal.requested_amount = args.amount;
    withdrawal.status = WithdrawalStatus::Pending;
    withdrawal.destination_type = args.destination_type;
    withdrawal.environment = args.environment;
    withdrawal.network = args.network;
    withdrawal.fees = fees;
    withdrawal.created_at = now;
    withdrawal.bump = ctx.bumps.withdrawal;

    emit!(WithdrawalRequested {
        order_id: args.order_id,
        client_id: ledger.client_id,
        user_id: args.user_id,
        requested_amount: args.amount,
        effective_balance: effective,
        fees,
        environment: args.environment,
        timestamp: now,
    });

    Ok(())
}
