use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::StrategyUpdated,
    state::{ClientLedger, Vault, YieldSource},
};

#[derive(Accounts)]
pub struct UpdateStrategy<'info> {
    #[account(
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority
    )]
    pub client_ledger: Account<'info, ClientLedger>,

    #[account(
        mut,
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

    pub authority: Signer<'info>,
}

/// Set the vault's target allocation over the fixed source set. Targets must
/// sum to exactly MAX_BPS. Takes effect at the next accrual cycle.
pub fn update_strategy(ctx: Context<UpdateStrategy>, target_bps: [u16; 3]) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    require!(vault.is_initialized(), LedgerError::VaultNotInitialized);

    let total: u32 = target_bps.iter().map(|&b| b as u32).sum();
    require!(total == MAX_BPS as u32, LedgerError::InvalidAllocation);

    vault.allocations[0].source = YieldSource::Aave;
    vault.allocations[1].source = YieldSource::Compound;
    vault.allocations[2].source = YieldSource::Morpho;
    for (slot, bps) in vault.allocations.iter_mut().zip(target_bps.iter()) {
        slot.target_bps = *bps;
    }
    vault.allocation_configured = true;

    emit!(StrategyUpdated {
        client_id: vault.client_id,
        vault: vault.key(),
        target_bps,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
