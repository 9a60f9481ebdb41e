use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::{
    constants::*,
    errors::LedgerError,
    events::FundsStaked,
    state::{ClientLedger, Vault},
};

#[derive(Accounts)]
pub struct StakeIdleFunds<'info> {
    #[account(
        mut,
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority,
        has_one = token_mint
    )]
    pub client_ledger: Box<Account<'info, ClientLedger>>,

    pub token_mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [
            VAULT_SEED,
            vault.client_id.as_ref(),
            vault.chain.as_ref(),
            vault.token_mint.as_ref()
        ],
        bump = vault.bump,
        constraint = vault.client_id == client_ledger.client_id @ LedgerError::ClientMismatch,
        constraint = vault.token_mint == client_ledger.token_mint @ LedgerError::VaultMismatch
    )]
    pub vault: Box<Account<'info, Vault>>,

    /// CHECK: derived PDA, token authority for the idle treasury
    #[account(
        seeds = [TREASURY_AUTHORITY_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.treasury_authority_bump
    )]
    pub treasury_authority: AccountInfo<'info>,

    #[account(
        mut,
        associated_token::mint = token_mint,
        associated_token::authority = treasury_authority,
    )]
    pub idle_treasury: Box<Account<'info, TokenAccount>>,

    /// CHECK: derived PDA, token authority for the vault's staked treasury
    #[account(
        seeds = [VAULT_TREASURY_SEED, vault.key().as_ref()],
        bump
    )]
    pub vault_treasury_authority: AccountInfo<'info>,

    #[account(
        init_if_needed,
        payer = authority,
        associated_token::mint = token_mint,
        associated_token::authority = vault_treasury_authority,
    )]
    pub staked_treasury: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
}

/// Deploy idle funds into the vault's earning pool. Moves the tokens between
/// treasuries and flips the ledger's idle/earning split; the staked balance
/// starts accruing at the next cycle.
pub fn stake_idle_funds(ctx: Context<StakeIdleFunds>, amount: u64) -> Result<()> {
    require!(amount > 0, LedgerError::InvalidAmount);

    let ledger = &mut ctx.accounts.client_ledger;
    let vault = &mut ctx.accounts.vault;

    require!(vault.is_initialized(), LedgerError::VaultNotInitialized);
    require!(
        amount <= vault.pending_deposit_balance,
        LedgerError::InsufficientPendingBalance
    );

    ledger.stake(amount)?;
    vault.pending_deposit_balance -= amount;
    vault.total_staked_balance = vault
        .total_staked_balance
        .checked_add(amount)
        .ok_or(LedgerError::MathOverflow)?;

    let client_id = ledger.client_id;
    let signer_seeds: &[&[&[u8]]] = &[&[
        TREASURY_AUTHORITY_SEED,
        client_id.as_ref(),
        &[ledger.treasury_authority_bump],
    ]];

    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.idle_treasury.to_account_info(),
                to: ctx.accounts.staked_treasury.to_account_info(),
                authority: ctx.accounts.treasury_authority.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
    )?;

    emit!(FundsStaked {
        client_id,
        vault: vault.key(),
        amount,
        idle_balance_after: ledger.idle_balance,
        earning_balance_after: ledger.earning_balance,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
