use anchor_lang::prelude::*;

use crate::{constants::CLIENT_LEDGER_SEED, events::RevenueSplitUpdated, state::ClientLedger};

#[derive(Accounts)]
pub struct UpdateRevenueSplit<'info> {
    #[account(
        mut,
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority
    )]
    pub client_ledger: Account<'info, ClientLedger>,

    pub authority: Signer<'info>,
}

/// Reconfigure the three-way revenue split. Applies to yield settled from
/// this point on; already booked revenue is untouched.
pub fn update_revenue_split(
    ctx: Context<UpdateRevenueSplit>,
    client_revenue_share_bps: u16,
    platform_fee_bps: u16,
) -> Result<()> {
    let ledger = &mut ctx.accounts.client_ledger;
    ledger.set_revenue_split(client_revenue_share_bps, platform_fee_bps)?;

    emit!(RevenueSplitUpdated {
        client_id: ledger.client_id,
        client_revenue_share_bps,
        platform_fee_bps,
        end_user_share_bps: ledger.end_user_share_bps(),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
