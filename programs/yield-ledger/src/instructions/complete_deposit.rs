use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::DepositCompleted,
    math,
    state::{ClientLedger, DepositFees, DepositRecord, UserPosition, Vault},
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct CompleteDepositArgs {
    /// Fiat to token rate, RATE_SCALE fixed-point
    pub conversion_rate: u64,
    pub fees: DepositFees,
    pub external_reference: [u8; 32],
}

#[derive(Accounts)]
pub struct CompleteDeposit<'info> {
    #[account(
        mut,
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority
    )]
    pub client_ledger: Box<Account<'info, ClientLedger>>,

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
        constraint = vault.token_symbol == deposit.token_symbol @ LedgerError::VaultMismatch
    )]
    pub vault: Box<Account<'info, Vault>>,

    #[account(
        mut,
        seeds = [
            USER_POSITION_SEED,
            client_ledger.client_id.as_ref(),
            deposit.user_id.as_ref()
        ],
        bump = user_position.bump
    )]
    pub user_position: Box<Account<'info, UserPosition>>,

    #[account(
        mut,
        seeds = [DEPOSIT_SEED, deposit.order_id.as_ref()],
        bump = deposit.bump,
        constraint = deposit.client_id == client_ledger.client_id @ LedgerError::ClientMismatch
    )]
    pub deposit: Box<Account<'info, DepositRecord>>,

    pub authority: Signer<'info>,
}

/// Settle one deposit whose fiat leg the operator confirmed. Converts at the
/// supplied rate, deducts gateway fees, credits the client's idle balance and
/// the user's position. Re-delivery of a confirmation is a no-op.
pub fn complete_deposit(ctx: Context<CompleteDeposit>, args: CompleteDepositArgs) -> Result<()> {
    let deposit = &mut ctx.accounts.deposit;

    if deposit.is_terminal() {
        msg!("deposit already settled, ignoring");
        return Ok(());
    }

    let now = Clock::get()?.unix_timestamp;
    let ledger = &mut ctx.accounts.client_ledger;
    let vault = &mut ctx.accounts.vault;
    let position = &mut ctx.accounts.user_position;

    args.fees.verify_total()?;
    let gross = math::convert_fiat(deposit.fiat_amount, args.conversion_rate)?;
    let net = gross
        .checked_sub(args.fees.total_fees)
        .ok_or(LedgerError::FeesExceedAmount)?;
    require!(net > 0, LedgerError::FeesExceedAmount);

    position.apply_deposit(net, vault.current_index, now)?;
    deposit.mark_completed(net, args.fees, args.external_reference, now)?;

    ledger.credit_idle(net)?;
    ledger.total_deposited = ledger
        .total_deposited
        .checked_add(net)
        .ok_or(LedgerError::MathOverflow)?;
    vault.pending_deposit_balance = vault
        .pending_deposit_balance
        .checked_add(net)
        .ok_or(LedgerError::MathOverflow)?;

    emit!(DepositCompleted {
        order_id: deposit.order_id,
        client_id: deposit.client_id,
        user_id: deposit.user_id,
        crypto_amount: net,
        entry_index_after: position.weighted_entry_index,
        idle_balance_after: ledger.idle_balance,
        external_reference: args.external_reference,
        timestamp: now,
    });

    Ok(())
}
