use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::WalletBalancesSnapshot,
    math,
    state::{ClientLedger, Vault},
};

#[derive(Accounts)]
pub struct GetWalletBalances<'info> {
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

    pub authority: Signer<'info>,
}

/// Emit the client's wallet view: the idle/earning split plus the three-way
/// revenue split projected over the vault's lifetime yield. Nothing is
/// mutated.
pub fn get_wallet_balances(ctx: Context<GetWalletBalances>) -> Result<()> {
    let ledger = &ctx.accounts.client_ledger;
    let vault = &ctx.accounts.vault;

    let (client_revenue, platform_revenue, end_user_revenue) = math::revenue_split(
        vault.cumulative_yield,
        ledger.client_revenue_share_bps,
        ledger.platform_fee_bps,
    )?;

    emit!(WalletBalancesSnapshot {
        client_id: ledger.client_id,
        idle_balance: ledger.idle_balance,
        earning_balance: ledger.earning_balance,
        client_revenue,
        platform_revenue,
        end_user_revenue,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
