use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::{WithdrawalCompleted, WithdrawalFailed},
    state::{ClientLedger, FailureReason, UserPosition, Vault, WithdrawalRecord},
};

/// Outcome reported by the external transfer executor.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct TransferResult {
    pub success: bool,
    pub external_reference: [u8; 32],
    /// Amount the executor moved; must reconcile with the engine's payout
    pub amount_transferred: u64,
    pub failure_reason: FailureReason,
}

#[derive(Accounts)]
pub struct CompleteWithdrawal<'info> {
    #[account(
        mut,
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
        mut,
        seeds = [
            USER_POSITION_SEED,
            client_ledger.client_id.as_ref(),
            withdrawal.user_id.as_ref()
        ],
        bump = user_position.bump
    )]
    pub user_position: Box<Account<'info, UserPosition>>,

    #[account(
        mut,
        seeds = [WITHDRAWAL_SEED, withdrawal.order_id.as_ref()],
        bump = withdrawal.bump,
        constraint = withdrawal.client_id == client_ledger.client_id @ LedgerError::ClientMismatch
    )]
    pub withdrawal: Box<Account<'info, WithdrawalRecord>>,

    pub authority: Signer<'info>,
}

/// Settle a withdrawal from the executor's transfer result. On success the
/// user's principal shrinks proportionally, the idle balance is debited and
/// any deducted fees are booked as revenue. On failure the order lands in
/// failed with a reason the caller can branch on for retries. Re-delivery of
/// a result for a settled order is a no-op.
pub fn complete_withdrawal(ctx: Context<CompleteWithdrawal>, result: TransferResult) -> Result<()> {
    let withdrawal = &mut ctx.accounts.withdrawal;

    if withdrawal.is_terminal() {
        msg!("withdrawal already settled, ignoring");
        return Ok(());
    }

    let now = Clock::get()?.unix_timestamp;

    if !result.success {
        withdrawal.mark_failed(result.failure_reason, now)?;
        emit!(WithdrawalFailed {
            order_id: withdrawal.order_id,
            client_id: withdrawal.client_id,
            reason: result.failure_reason,
            retryable: result.failure_reason.is_retryable(),
            timestamp: now,
        });
        return Ok(());
    }

    let ledger = &mut ctx.accounts.client_ledger;
    let position = &mut ctx.accounts.user_position;
    let current_index = ctx.accounts.vault.current_index;

    let payout = withdrawal.fees.payout(withdrawal.requested_amount)?;
    require!(result.amount_transferred == payout, LedgerError::InvalidAmount);

    position.apply_withdrawal(withdrawal.requested_amount, current_index, now)?;
    ledger.deduct_idle(payout)?;
    ledger.total_withdrawn = ledger
        .total_withdrawn
        .checked_add(payout)
        .ok_or(LedgerError::MathOverflow)?;

    let fees = withdrawal.fees;
    if fees.fees_deducted {
        ledger.book_revenue(fees.client_fee, fees.platform_fee, fees.user_net_yield)?;
    }

    withdrawal.mark_completed(payout, result.external_reference, now)?;

    emit!(WithdrawalCompleted {
        order_id: withdrawal.order_id,
        client_id: withdrawal.client_id,
        user_id: withdrawal.user_id,
        actual_amount: payout,
        idle_balance_after: ledger.idle_balance,
        external_reference: result.external_reference,
        timestamp: now,
    });

    Ok(())
}
