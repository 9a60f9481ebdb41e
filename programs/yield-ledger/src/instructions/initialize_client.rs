use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    constants::*,
    events::ClientInitialized,
    state::ClientLedger,
};

#[derive(Accounts)]
#[instruction(client_id: [u8; 32])]
pub struct InitializeClient<'info> {
    #[account(
        init,
        payer = authority,
        space = ClientLedger::LEN,
        seeds = [CLIENT_LEDGER_SEED, client_id.as_ref()],
        bump
    )]
    pub client_ledger: Account<'info, ClientLedger>,

    /// Settlement token for this client's custody
    pub token_mint: Account<'info, Mint>,

    /// PDA that owns the client's idle-funds treasury
    /// CHECK: derived and used as token authority only
    #[account(
        seeds = [TREASURY_AUTHORITY_SEED, client_id.as_ref()],
        bump
    )]
    pub treasury_authority: AccountInfo<'info>,

    /// Idle-funds treasury ATA
    #[account(
        init,
        payer = authority,
        associated_token::mint = token_mint,
        associated_token::authority = treasury_authority,
    )]
    pub idle_treasury: Account<'info, TokenAccount>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
}

pub fn initialize_client(
    ctx: Context<InitializeClient>,
    client_id: [u8; 32],
    client_revenue_share_bps: u16,
    platform_fee_bps: u16,
) -> Result<()> {
    let ledger = &mut ctx.accounts.client_ledger;
    let now = Clock::get()?.unix_timestamp;

    ledger.client_id = client_id;
    ledger.authority = ctx.accounts.authority.key();
    ledger.token_mint = ctx.accounts.token_mint.key();
    ledger.set_revenue_split(client_revenue_share_bps, platform_fee_bps)?;
    ledger.created_at = now;
    ledger.bump = ctx.bumps.client_ledger;
    ledger.treasury_authority_bump = ctx.bumps.treasury_authority;

    emit!(ClientInitialized {
        client_id,
        authority: ledger.authority,
        token_mint: ledger.token_mint,
        client_revenue_share_bps,
        platform_fee_bps,
        timestamp: now,
    });

    Ok(())
}
