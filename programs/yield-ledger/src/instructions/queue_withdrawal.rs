use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::TransferIntentQueued,
    state::{ClientLedger, Vault, WithdrawalRecord, WithdrawalStatus},
};

#[derive(Accounts)]
pub struct QueueWithdrawal<'info> {
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
        mut,
        seeds = [WITHDRAWAL_SEED, withdrawal.order_id.as_ref()],
        bump = withdrawal.bump,
        constraint = withdrawal.client_id == client_ledger.client_id @ LedgerError::ClientMismatch
    )]
    pub withdrawal: Box<Account<'info, WithdrawalRecord>>,

    pub authority: Signer<'info>,
}

/// Hand the transfer intent to the external executor and move the order to
/// queued. Funds do not move here; only `complete_withdrawal` settles them.
pub fn queue_withdrawal(ctx: Context<QueueWithdrawal>) -> Result<()> {
    let withdrawal = &mut ctx.accounts.withdrawal;

    if withdrawal.is_terminal() {
        msg!("withdrawal already settled, ignoring");
        return Ok(());
    }
    if withdrawal.status == WithdrawalStatus::Queued {
        msg!("withdrawal already queued, ignoring");
        return Ok(());
    }

    let now = Clock::get()?.unix_timestamp;
    let payout = withdrawal.fees.payout(withdrawal.requested_amount)?;
    withdrawal.mark_queued(now)?;

    emit!(TransferIntentQueued {
        order_id: withdrawal.order_id,
        client_id: withdrawal.client_id,
        amount: payout,
        destination_type: withdrawal.destination_type,
        token_symbol: ctx.accounts.vault.token_symbol,
        timestamp: now,
    });

    Ok(())
}
