use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::WithdrawalFailed,
    state::{ClientLedger, FailureReason, WithdrawalRecord},
};

#[derive(Accounts)]
pub struct FailWithdrawal<'info> {
    #[account(
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority
    )]
    pub client_ledger: Account<'info, ClientLedger>,

    #[account(
        mut,
        seeds = [WITHDRAWAL_SEED, withdrawal.order_id.as_ref()],
        bump = withdrawal.bump,
        constraint = withdrawal.client_id == client_ledger.client_id @ LedgerError::ClientMismatch
    )]
    pub withdrawal: Account<'info, WithdrawalRecord>,

    pub authority: Signer<'info>,
}

/// Mark a pending or queued withdrawal failed. The position and balances are
/// untouched; the order never left custody. Re-delivery is a no-op.
pub fn fail_withdrawal(ctx: Context<FailWithdrawal>, reason: FailureReason) -> Result<()> {
    require!(reason != FailureReason::None, LedgerError::InvalidStatusTransition);

    let withdrawal = &mut ctx.accounts.withdrawal;
    if withdrawal.is_terminal() {
        msg!("withdrawal already settled, ignoring");
        return Ok(());
    }

    let now = Clock::get()?.unix_timestamp;
    withdrawal.mark_failed(reason, now)?;

    emit!(WithdrawalFailed {
        order_id: withdrawal.order_id,
        client_id: withdrawal.client_id,
        reason,
        retryable: reason.is_retryable(),
        timestamp: now,
    });

    Ok(())
}
