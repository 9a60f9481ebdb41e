use anchor_lang::prelude::*;

use crate::{constants::MAX_BPS, errors::LedgerError};

/// One ledger per client (product). Tracks the idle/earning split of the
/// client's custodial funds and the three-way revenue configuration applied
/// to accrued yield. This row is the most contention-prone shared state:
/// every settlement touches it, so all mutations go through checked
/// increment/decrement helpers.
#[account]
#[derive(Default)]
pub struct ClientLedger {
    pub client_id: [u8; 32],

    /// Operator allowed to settle on behalf of this client
    pub authority: Pubkey,

    /// Settlement token for this client's custody
    pub token_mint: Pubkey,

    /// Funds received but not yet deployed to yield sources
    pub idle_balance: u64,

    /// Funds actively deployed
    pub earning_balance: u64,

    /// Revenue split over accrued yield. The end-user share is always the
    /// implied remainder, so the three parts sum to MAX_BPS by construction.
    pub client_revenue_share_bps: u16,
    pub platform_fee_bps: u16,

    /// Cumulative realized revenue per party
    pub client_revenue: u64,
    pub platform_revenue: u64,
    pub end_user_revenue: u64,

    /// Lifetime settlement totals for reconciliation
    pub total_deposited: u64,
    pub total_withdrawn: u64,

    pub created_at: i64,

    /// Bump seeds for PDA derivation
    pub bump: u8,
    pub treasury_authority_bump: u8,

    /// Reserved space for future upgrades
    pub _reserved: [u8; 32],
}

impl ClientLedger {
    pub const LEN: usize = 8 + // discriminator
        32 + // client_id
        32 + // authority
        32 + // token_mint
        8 + // idle_balance
        8 + // earning_balance
        2 + // client_revenue_share_bps
        2 + // platform_fee_bps
        8 + // client_revenue
        8 + // platform_revenue
        8 + // end_user_revenue
        8 + // total_deposited
        8 + // total_withdrawn
        8 + // created_at
        1 + // bump
        1 + // treasury_authority_bump
        32; // _reserved

    pub fn end_user_share_bps(&self) -> u16 {
        MAX_BPS - self.client_revenue_share_bps - self.platform_fee_bps
    }

    pub fn set_revenue_split(&mut self, client_bps: u16, platform_bps: u16) -> Result<()> {
        require!(
            (client_bps as u32) + (platform_bps as u32) <= MAX_BPS as u32,
            LedgerError::InvalidRevenueSplit
        );
        self.client_revenue_share_bps = client_bps;
        self.platform_fee_bps = platform_bps;
        Ok(())
    }

    pub fn credit_idle(&mut self, amount: u64) -> Result<()> {
        self.idle_balance = self
            .idle_balance
            .checked_add(amount)
            .ok_or(LedgerError::MathOverflow)?;
        Ok(())
    }

    /// Rejects rather than floors at zero: a short idle balance means the
    /// ledger and the custody have diverged, and clamping would bury it.
    pub fn deduct_idle(&mut self, amount: u64) -> Result<()> {
        require!(amount <= self.idle_balance, LedgerError::InsufficientIdleBalance);
        self.idle_balance -= amount;
        Ok(())
    }

    /// Move funds from idle to earning when they are deployed.
    pub fn stake(&mut self, amount: u64) -> Result<()> {
        self.deduct_idle(amount)?;
        self.earning_balance = self
            .earning_balance
            .checked_add(amount)
            .ok_or(LedgerError::MathOverflow)?;
        Ok(())
    }

    pub fn book_revenue(&mut self, client: u64, platform: u64, end_user: u64) -> Result<()> {
        self.client_revenue = self
            .client_revenue
            .checked_add(client)
            .ok_or(LedgerError::MathOverflow)?;
        self.platform_revenue = self
            .platform_revenue
            .checked_add(platform)
            .ok_or(LedgerError::MathOverflow)?;
        self.end_user_revenue = self
            .end_user_revenue
            .checked_add(end_user)
            .ok_or(LedgerError::MathOverflow)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_user_share_is_the_remainder() {
        let mut ledger = ClientLedger::default();
        ledger.set_revenue_split(1_500, 500).unwrap();
        assert_eq!(ledger.end_user_share_bps(), 8_000);
    }

    #[test]
    fn revenue_split_rejects_over_allocation() {
        let mut ledger = ClientLedger::default();
        let err = ledger.set_revenue_split(7_000, 4_000).unwrap_err();
        assert_eq!(err, LedgerError::InvalidRevenueSplit.into());
    }

    #[test]
    fn deduct_rejects_rather_than_clamps() {
        let mut ledger = ClientLedger::default();
        ledger.credit_idle(100).unwrap();

        let err = ledger.deduct_idle(101).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientIdleBalance.into());
        assert_eq!(ledger.idle_balance, 100);
    }

    #[test]
    fn stake_moves_idle_to_earning() {
        let mut ledger = ClientLedger::default();
        ledger.credit_idle(1_000).unwrap();
        ledger.stake(400).unwrap();

        assert_eq!(ledger.idle_balance, 600);
        assert_eq!(ledger.earning_balance, 400);
    }
}
