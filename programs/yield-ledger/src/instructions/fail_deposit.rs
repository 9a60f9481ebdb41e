use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::DepositFailed,
    state::{ClientLedger, DepositRecord},
};

#[derive(Accounts)]
pub struct FailDeposit<'info> {
    #[account(
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority
    )]
    pub client_ledger: Account<'info, ClientLedger>,

    #[account(
        mut,
        seeds = [DEPOSIT_SEED, deposit.order_id.as_ref()],
        bump = deposit.bump,
        constraint = deposit.client_id == client_ledger.client_id @ LedgerError::ClientMismatch
    )]
    pub deposit: Account<'info, DepositRecord>,

    pub authority: Signer<'info>,
}

/// Mark a pending deposit failed. No balance ever moved for it, so no ledger
/// mutation accompanies the transition. Re-delivery is a no-op.
pub fn fail_deposit(ctx: Context<FailDeposit>, error_code: u32) -> Result<()> {
    let deposit = &mut ctx.accounts.deposit;

    if deposit.is_terminal() {
        msg!("deposit already settled, ignoring");
        return Ok(());
    }

    let now = Clock::get()?.unix_timestamp;
    deposit.mark_failed(error_code, now)?;

    emit!(DepositFailed {
        order_id: deposit.order_id,
        client_id: deposit.client_id,
        error_code,
        timestamp: now,
    });

    Ok(())
}
