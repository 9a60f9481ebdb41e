use anchor_lang::prelude::*;

use crate::constants::{APY_WINDOW_DAYS, DEFAULT_ALLOCATION_BPS, INDEX_SCALE, YIELD_SOURCE_COUNT};

/// Fixed yield-source set. Declaration order doubles as the tie-break
/// ordering when picking a dominant source.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum YieldSource {
    #[default]
    Aave,
    Compound,
    Morpho,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct AllocationSlot {
    pub source: YieldSource,
    pub target_bps: u16,
}

/// One vault per (client, chain, token). Tracks the aggregate pool and the
/// single monotonically non-decreasing growth index used to spread yield
/// across depositors without per-user share tokens.
#[account]
#[derive(Default)]
pub struct Vault {
    /// Owning client (product)
    pub client_id: [u8; 32],

    /// Chain identifier, zero-padded ASCII
    pub chain: [u8; 16],

    /// Settlement token
    pub token_mint: Pubkey,
    pub token_symbol: [u8; 8],

    /// Growth index, INDEX_SCALE fixed-point. Starts at 1.0 and only ever
    /// increases via accrual. Zero means the account is not yet initialized.
    pub current_index: u128,

    /// Funds deployed to yield sources
    pub total_staked_balance: u64,

    /// Completed deposits not yet staked
    pub pending_deposit_balance: u64,

    /// Lifetime yield accrued to this vault
    pub cumulative_yield: u64,

    /// Strategy allocation over the fixed source set; sums to MAX_BPS when
    /// configured. Unconfigured vaults accrue with DEFAULT_ALLOCATION_BPS.
    pub allocations: [AllocationSlot; YIELD_SOURCE_COUNT],
    pub allocation_configured: bool,

    /// Unix day of the last applied accrual; guards against double-applying
    /// a day's yield when the cycle is retried
    pub last_accrual_day: u64,

    /// Ring buffer of daily index samples for the trailing APY window
    pub index_history: [u128; APY_WINDOW_DAYS],
    pub history_len: u8,
    pub history_cursor: u8,

    pub created_at: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,

    /// Reserved space for future upgrades
    pub _reserved: [u8; 32],
}

impl Vault {
    pub const LEN: usize = 8 + // discriminator
        32 + // client_id
        16 + // chain
        32 + // token_mint
        8 + // token_symbol
        16 + // current_index
        8 + // total_staked_balance
        8 + // pending_deposit_balance
        8 + // cumulative_yield
        (1 + 2) * YIELD_SOURCE_COUNT + // allocations
        1 + // allocation_configured
        8 + // last_accrual_day
        16 * APY_WINDOW_DAYS + // index_history
        1 + // history_len
        1 + // history_cursor
        8 + // created_at
        1 + // bump
        32; // _reserved

    pub fn is_initialized(&self) -> bool {
        self.current_index != 0
    }

    /// First-touch initialization, run when `create_deposit` materializes the
    /// vault for a previously unseen (client, chain, token) triple.
    pub fn init(
        &mut self,
        client_id: [u8; 32],
        chain: [u8; 16],
        token_mint: Pubkey,
        token_symbol: [u8; 8],
        now: i64,
        bump: u8,
    ) {
        self.client_id = client_id;
        self.chain = chain;
        self.token_mint = token_mint;
        self.token_symbol = token_symbol;
        self.current_index = INDEX_SCALE;
        self.allocations = Self::default_allocations();
        self.allocation_configured = false;
        self.created_at = now;
        self.bump = bump;
    }

    pub fn default_allocations() -> [AllocationSlot; YIELD_SOURCE_COUNT] {
        [
            AllocationSlot { source: YieldSource::Aave, target_bps: DEFAULT_ALLOCATION_BPS[0] },
            AllocationSlot { source: YieldSource::Compound, target_bps: DEFAULT_ALLOCATION_BPS[1] },
            AllocationSlot { source: YieldSource::Morpho, target_bps: DEFAULT_ALLOCATION_BPS[2] },
        ]
    }

    /// Allocation used by accrual: the configured strategy, or the named
    /// equal-split default when none has been set.
    pub fn active_allocations(&self) -> [AllocationSlot; YIELD_SOURCE_COUNT] {
        if self.allocation_configured {
            self.allocations
        } else {
            Self::default_allocations()
        }
    }

    /// Push today's index into the trailing window.
    pub fn record_index_sample(&mut self, index: u128) {
        self.index_history[self.history_cursor as usize] = index;
        self.history_cursor = ((self.history_cursor as usize + 1) % APY_WINDOW_DAYS) as u8;
        if (self.history_len as usize) < APY_WINDOW_DAYS {
            self.history_len += 1;
        }
    }

    /// Oldest sample in the window plus the number of days the window spans.
    /// Samples are recorded after each accrual, so N samples span N - 1 days
    /// of growth; None until two samples exist.
    pub fn apy_window(&self) -> Option<(u128, u64)> {
        if self.history_len < 2 {
            return None;
        }
        let oldest = if (self.history_len as usize) < APY_WINDOW_DAYS {
            self.index_history[0]
        } else {
            self.index_history[self.history_cursor as usize]
        };
        Some((oldest, self.history_len as u64 - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math;

    #[test]
    fn default_allocation_sums_to_full() {
        let total: u16 = Vault::default_allocations().iter().map(|s| s.target_bps).sum();
        assert_eq!(total, crate::constants::MAX_BPS);
    }

    #[test]
    fn unconfigured_vault_falls_back_to_equal_split() {
        let vault = Vault::default();
        assert!(!vault.allocation_configured);
        assert_eq!(vault.active_allocations(), Vault::default_allocations());
    }

    #[test]
    fn apy_window_tracks_oldest_sample() {
        let mut vault = Vault::default();
        assert_eq!(vault.apy_window(), None);

        // a single sample spans zero days, not enough to annualize
        vault.record_index_sample(INDEX_SCALE);
        assert_eq!(vault.apy_window(), None);

        vault.record_index_sample(INDEX_SCALE + 1);
        assert_eq!(vault.apy_window(), Some((INDEX_SCALE, 1)));

        // fill past the window; the oldest sample rolls forward
        for day in 2..=APY_WINDOW_DAYS as u128 + 1 {
            vault.record_index_sample(INDEX_SCALE + day);
        }
        let (oldest, days) = vault.apy_window().unwrap();
        assert_eq!(days, APY_WINDOW_DAYS as u64 - 1);
        assert_eq!(oldest, INDEX_SCALE + 2);
    }

    #[test]
    fn window_apy_matches_steady_daily_rate() {
        let mut vault = Vault::default();
        vault.current_index = INDEX_SCALE;

        // two accrual days at 0.05% daily
        for _ in 0..2 {
            vault.current_index = math::advance_index(vault.current_index, 50_000).unwrap();
            vault.record_index_sample(vault.current_index);
        }

        let (past, days) = vault.apy_window().unwrap();
        assert_eq!(days, 1);
        // 0.05% per day annualizes back to 18.25%
        assert_eq!(math::trailing_apy(vault.current_index, past, days).unwrap(), 18_250_000);
    }
}
