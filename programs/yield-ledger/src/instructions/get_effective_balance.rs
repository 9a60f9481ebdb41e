use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::UserBalanceSnapshot,
    math,
    state::{ClientLedger, UserPosition, Vault},
};

#[derive(Accounts)]
#[instruction(user_id: [u8; 32])]
pub struct GetEffectiveBalance<'info> {
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
            user_id.as_ref()
        ],
        bump = user_position.bump
    )]
    pub user_position: Box<Account<'info, UserPosition>>,

    pub authority: Signer<'info>,
}

/// Emit the user's derived balance view: principal, index-scaled effective
/// balance, yield earned and the trailing-window APY. Nothing is mutated.
pub fn get_effective_balance(ctx: Context<GetEffectiveBalance>, user_id: [u8; 32]) -> Result<()> {
    let position = &ctx.accounts.user_position;
    require!(position.created_at != 0, LedgerError::PositionNotFound);

    let vault = &ctx.accounts.vault;
    let effective = position.effective_balance(vault.current_index)?;
    let yield_earned = position.yield_earned(vault.current_index)?;

    // 0 means no usable accrual history yet
    let apy = match vault.apy_window() {
        Some((past_index, days)) => math::trailing_apy(vault.current_index, past_index, days)?,
        None => 0,
    };

    emit!(UserBalanceSnapshot {
        user_id,
        client_id: position.client_id,
        total_deposited: position.total_deposited,
        effective_balance: effective,
        yield_earned,
        apy_micro_pct: apy,
        entry_index: position.weighted_entry_index,
        current_index: vault.current_index,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
