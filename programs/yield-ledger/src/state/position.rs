use anchor_lang::prelude::*;

use crate::{errors::LedgerError, math};

/// One position per (user, client). Principal plus a deposit-amount-weighted
/// entry index; the effective balance is always derived at read time from the
/// vault's current growth index, never stored.
#[account]
#[derive(Default)]
pub struct UserPosition {
    pub user_id: [u8; 32],
    pub client_id: [u8; 32],

    /// Cumulative principal; reduced proportionally on withdrawal
    pub total_deposited: u64,

    /// Lifetime amount withdrawn
    pub total_withdrawn: u64,

    /// Weighted average of the growth index at each deposit,
    /// INDEX_SCALE fixed-point. Zero until the first completed deposit.
    pub weighted_entry_index: u128,

    /// False until the first completed deposit and after the balance
    /// reaches zero; the record itself persists for history
    pub is_active: bool,

    pub last_deposit_ts: i64,
    pub last_withdrawal_ts: i64,
    pub created_at: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,

    /// Reserved space for future upgrades
    pub _reserved: [u8; 32],
}

impl UserPosition {
    pub const LEN: usize = 8 + // discriminator
        32 + // user_id
        32 + // client_id
        8 + // total_deposited
        8 + // total_withdrawn
        16 + // weighted_entry_index
        1 + // is_active
        8 + // last_deposit_ts
        8 + // last_withdrawal_ts
        8 + // created_at
        1 + // bump
        32; // _reserved

    pub fn effective_balance(&self, current_index: u128) -> Result<u64> {
        math::effective_balance(self.total_deposited, self.weighted_entry_index, current_index)
    }

    pub fn yield_earned(&self, current_index: u128) -> Result<u64> {
        Ok(self
            .effective_balance(current_index)?
            .saturating_sub(self.total_deposited))
    }

    /// Apply a completed deposit. The first deposit pins the entry index to
    /// the vault's current index; later deposits shift it by the
    /// deposit-weighted average.
    pub fn apply_deposit(&mut self, amount: u64, current_index: u128, now: i64) -> Result<()> {
        require!(amount > 0, LedgerError::InvalidAmount);

        if self.total_deposited == 0 {
            self.weighted_entry_index = current_index;
            self.total_deposited = amount;
        } else {
            self.weighted_entry_index = math::weighted_entry_index(
                self.total_deposited,
                self.weighted_entry_index,
                amount,
                current_index,
            )?;
            self.total_deposited = self
                .total_deposited
                .checked_add(amount)
                .ok_or(LedgerError::MathOverflow)?;
        }

        self.is_active = true;
        self.last_deposit_ts = now;
        Ok(())
    }

    /// Apply a completed withdrawal: the principal shrinks by the withdrawn
    /// share of the effective balance, the entry index stays put.
    pub fn apply_withdrawal(&mut self, amount: u64, current_index: u128, now: i64) -> Result<()> {
        require!(amount > 0, LedgerError::InvalidAmount);

        let effective = self.effective_balance(current_index)?;
        require!(amount <= effective, LedgerError::InsufficientBalance);

        self.total_deposited =
            math::principal_after_withdrawal(self.total_deposited, amount, effective)?;
        self.total_withdrawn = self
            .total_withdrawn
            .checked_add(amount)
            .ok_or(LedgerError::MathOverflow)?;
        self.is_active = self.total_deposited > 0;
        self.last_withdrawal_ts = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INDEX_SCALE;

    fn index(pct: u128) -> u128 {
        // index at (100 + pct)% of par
        INDEX_SCALE * (100 + pct) / 100
    }

    #[test]
    fn first_deposit_pins_entry_index() {
        let mut position = UserPosition::default();
        position.apply_deposit(1_000, index(2), 10).unwrap();

        assert_eq!(position.total_deposited, 1_000);
        assert_eq!(position.weighted_entry_index, index(2));
        assert!(position.is_active);
        assert_eq!(position.last_deposit_ts, 10);
    }

    #[test]
    fn second_deposit_averages_entry_index() {
        // 1,000 at 1.0 then 1,000 at 1.02 -> entry 1.01, deposited 2,000
        let mut position = UserPosition::default();
        position.apply_deposit(1_000, INDEX_SCALE, 0).unwrap();
        position.apply_deposit(1_000, index(2), 1).unwrap();

        assert_eq!(position.total_deposited, 2_000);
        assert_eq!(position.weighted_entry_index, index(1));
    }

    #[test]
    fn effective_balance_grows_with_index() {
        let mut position = UserPosition::default();
        position.apply_deposit(1_000, INDEX_SCALE, 0).unwrap();

        assert_eq!(position.effective_balance(index(2)).unwrap(), 1_020);
        assert_eq!(position.yield_earned(index(2)).unwrap(), 20);
    }

    #[test]
    fn withdrawal_reduces_principal_proportionally() {
        let mut position = UserPosition::default();
        position.apply_deposit(1_000, INDEX_SCALE, 0).unwrap();

        // withdraw half of the 1,020 effective balance
        position.apply_withdrawal(510, index(2), 5).unwrap();
        assert_eq!(position.total_deposited, 500);
        assert_eq!(position.total_withdrawn, 510);
        assert_eq!(position.weighted_entry_index, INDEX_SCALE);
        assert!(position.is_active);
    }

    #[test]
    fn full_withdrawal_deactivates_but_keeps_record() {
        let mut position = UserPosition::default();
        position.apply_deposit(1_000, INDEX_SCALE, 0).unwrap();

        position.apply_withdrawal(1_020, index(2), 5).unwrap();
        assert_eq!(position.total_deposited, 0);
        assert!(!position.is_active);
        assert_eq!(position.total_withdrawn, 1_020);
    }

    #[test]
    fn withdrawal_rejects_overdraw_without_mutation() {
        let mut position = UserPosition::default();
        position.apply_deposit(2_000, INDEX_SCALE, 0).unwrap();

        // effective balance is 2,000; 2,100 must bounce before any change
        let err = position.apply_withdrawal(2_100, INDEX_SCALE, 5).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance.into());
        assert_eq!(position.total_deposited, 2_000);
        assert_eq!(position.total_withdrawn, 0);
    }
}
