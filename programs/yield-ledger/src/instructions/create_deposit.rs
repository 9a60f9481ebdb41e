use anchor_lang::prelude::*;
use anchor_spl::token::Mint;

use crate::{
    constants::*,
    errors::LedgerError,
    events::{DepositCreated, VaultCreated},
    state::{
        ClientLedger, DepositRecord, Environment, PaymentInstructions, SettlementStatus,
        UserPosition, Vault,
    },
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct CreateDepositArgs {
    pub order_id: [u8; 32],
    pub user_id: [u8; 32],
    pub fiat_amount: u64,
    pub fiat_currency: [u8; 8],
    pub chain: [u8; 16],
    pub token_symbol: [u8; 8],
    pub network: [u8; 16],
    pub environment: Environment,
    pub payment_instructions: PaymentInstructions,
}

#[derive(Accounts)]
#[instruction(args: CreateDepositArgs)]
pub struct CreateDeposit<'info> {
    #[account(
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority,
        has_one = token_mint
    )]
    pub client_ledger: Box<Account<'info, ClientLedger>>,

    pub token_mint: Account<'info, Mint>,

    /// Materialized on first use for a (client, chain, token) triple
    #[account(
        init_if_needed,
        payer = authority,
        space = Vault::LEN,
        seeds = [
            VAULT_SEED,
            client_ledger.client_id.as_ref(),
            args.chain.as_ref(),
            token_mint.key().as_ref()
        ],
        bump
    )]
    pub vault: Box<Account<'info, Vault>>,

    /// Materialized on the user's first deposit
    #[account(
        init_if_needed,
        payer = authority,
        space = UserPosition::LEN,
        seeds = [
            USER_POSITION_SEED,
            client_ledger.client_id.as_ref(),
            args.user_id.as_ref()
        ],
        bump
    )]
    pub user_position: Box<Account<'info, UserPosition>>,

    /// PDA-keyed by order id; a duplicate order id fails here at init
    #[account(
        init,
        payer = authority,
        space = DepositRecord::LEN,
        seeds = [DEPOSIT_SEED, args.order_id.as_ref()],
        bump
    )]
    pub deposit: Box<Account<'info, DepositRecord>>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Open a deposit order. Nothing is credited yet: balances only move when the
/// order completes. Payment instructions are snapshotted here and never
/// change for the life of the order.
pub fn create_deposit(ctx: Context<CreateDeposit>, args: CreateDepositArgs) -> Result<()> {
    require!(args.fiat_amount > 0, LedgerError::InvalidAmount);
    require!(is_supported_fiat(&args.fiat_currency), LedgerError::UnsupportedCurrency);

    let now = Clock::get()?.unix_timestamp;
    let client_id = ctx.accounts.client_ledger.client_id;

    let vault = &mut ctx.accounts.vault;
    if !vault.is_initialized() {
        vault.init(
            client_id,
            args.chain,
            ctx.accounts.token_mint.key(),
            args.token_symbol,
            now,
            ctx.bumps.vault,
        );
        emit!(VaultCreated {
            client_id,
            vault: vault.key(),
            chain: args.chain,
            token_mint: vault.token_mint,
            token_symbol: args.token_symbol,
            timestamp: now,
        });
    } else {
        require!(vault.token_symbol == args.token_symbol, LedgerError::VaultMismatch);
    }

    let position = &mut ctx.accounts.user_position;
    if position.created_at == 0 {
        position.user_id = args.user_id;
        position.client_id = client_id;
        position.created_at = now;
        position.bump = ctx.bumps.user_position;
    }

    let deposit = &mut ctx.accounts.deposit;
    deposit.order_id = args.order_id;
    deposit.client_id = client_id;
    deposit.user_id = args.user_id;
    deposit.fiat_amount = args.fiat_amount;
    deposit.fiat_currency = args.fiat_currency;
    deposit.token_symbol = args.token_symbol;
    deposit.status = SettlementStatus::Pending;
    deposit.environment = args.environment;
    deposit.network = args.network;
    deposit.payment_instructions = args.payment_instructions;
    deposit.created_at = now;
    deposit.bump = ctx.bumps.deposit;

    emit!(DepositCreated {
        order_id: args.order_id,
        client_id,
        user_id: args.user_id,
        fiat_amount: args.fiat_amount,
        fiat_currency: args.fiat_currency,
        environment: args.environment,
        timestamp: now,
    });

    Ok(())
}
