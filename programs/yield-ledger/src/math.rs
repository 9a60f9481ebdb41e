//! Fixed-point accrual and position arithmetic.
//!
//! All amounts are u64 token base units, the growth index is u128 scaled by
//! `INDEX_SCALE`, and rates are micro-percent (`HUNDRED_PERCENT` == 100%).
//! Intermediate products are widened to u128 and every step is checked.

use anchor_lang::prelude::*;

use crate::{
    constants::{DAYS_PER_YEAR, HUNDRED_PERCENT, MAX_BPS, RATE_SCALE, YIELD_SOURCE_COUNT},
    errors::LedgerError,
    state::{AllocationSlot, YieldSource},
};

/// Advance the growth index by one day's yield.
/// new_index = index * (1 + daily / 100%), floored.
pub fn advance_index(current_index: u128, daily_yield_micro_pct: u64) -> Result<u128> {
    require!(
        daily_yield_micro_pct < HUNDRED_PERCENT,
        LedgerError::IndexGrowthTooLarge
    );

    let multiplier = (HUNDRED_PERCENT as u128)
        .checked_add(daily_yield_micro_pct as u128)
        .ok_or(LedgerError::MathOverflow)?;

    let new_index = current_index
        .checked_mul(multiplier)
        .ok_or(LedgerError::MathOverflow)?
        .checked_div(HUNDRED_PERCENT as u128)
        .ok_or(LedgerError::MathOverflow)?;

    require!(new_index >= current_index, LedgerError::IndexRegression);
    Ok(new_index)
}

/// Token-unit yield produced by one day's rate on the staked balance, floored.
pub fn cycle_yield_amount(total_staked: u64, daily_yield_micro_pct: u64) -> Result<u64> {
    let amount = (total_staked as u128)
        .checked_mul(daily_yield_micro_pct as u128)
        .ok_or(LedgerError::MathOverflow)?
        .checked_div(HUNDRED_PERCENT as u128)
        .ok_or(LedgerError::MathOverflow)?;
    u64::try_from(amount).map_err(|_| LedgerError::MathOverflow.into())
}

/// Allocation-weighted annual yield over the fixed source set.
/// Every slot with a non-zero target must have a rate in the cycle feed.
pub fn weighted_annual_yield(
    rates: &[Option<u64>; YIELD_SOURCE_COUNT],
    allocations: &[AllocationSlot; YIELD_SOURCE_COUNT],
) -> Result<u64> {
    let mut weighted: u128 = 0;

    for slot in allocations.iter() {
        if slot.target_bps == 0 {
            continue;
        }
        let apy = rates[slot.source as usize].ok_or(LedgerError::SourceRateUnavailable)?;
        let contribution = (apy as u128)
            .checked_mul(slot.target_bps as u128)
            .ok_or(LedgerError::MathOverflow)?
            .checked_div(MAX_BPS as u128)
            .ok_or(LedgerError::MathOverflow)?;
        weighted = weighted
            .checked_add(contribution)
            .ok_or(LedgerError::MathOverflow)?;
    }

    u64::try_from(weighted).map_err(|_| LedgerError::MathOverflow.into())
}

/// Annual rate to daily rate, linear division by 365.
///
/// Deliberately not the compounding inverse `(1+apy)^(1/365)-1`: the platform's
/// historical yield figures were produced with the linear form, and switching
/// would silently restate them. Compounding still happens across days through
/// repeated index multiplication.
pub fn daily_rate(weighted_annual_micro_pct: u64) -> u64 {
    weighted_annual_micro_pct / DAYS_PER_YEAR
}

/// Source carrying the largest target allocation.
/// Ties resolve to the first source in declaration order.
pub fn dominant_source(allocations: &[AllocationSlot; YIELD_SOURCE_COUNT]) -> YieldSource {
    let mut dominant = allocations[0];
    for slot in allocations.iter().skip(1) {
        if slot.target_bps > dominant.target_bps {
            dominant = *slot;
        }
    }
    dominant.source
}

/// effective = deposited * current_index / entry_index, floored.
/// An entry index of zero means no completed deposit yet; the principal is
/// returned untouched rather than dividing by zero.
pub fn effective_balance(
    total_deposited: u64,
    weighted_entry_index: u128,
    current_index: u128,
) -> Result<u64> {
    if weighted_entry_index == 0 {
        return Ok(total_deposited);
    }

    let effective = (total_deposited as u128)
        .checked_mul(current_index)
        .ok_or(LedgerError::MathOverflow)?
        .checked_div(weighted_entry_index)
        .ok_or(LedgerError::MathOverflow)?;
    u64::try_from(effective).map_err(|_| LedgerError::MathOverflow.into())
}

/// Deposit-amount-weighted average of entry indices:
/// (old_dep * old_entry + amount * current) / (old_dep + amount), floored.
pub fn weighted_entry_index(
    old_deposited: u64,
    old_entry_index: u128,
    amount: u64,
    current_index: u128,
) -> Result<u128> {
    let total = (old_deposited as u128)
        .checked_add(amount as u128)
        .ok_or(LedgerError::MathOverflow)?;
    if total == 0 {
        return Ok(current_index);
    }

    let numerator = (old_deposited as u128)
        .checked_mul(old_entry_index)
        .ok_or(LedgerError::MathOverflow)?
        .checked_add(
            (amount as u128)
                .checked_mul(current_index)
                .ok_or(LedgerError::MathOverflow)?,
        )
        .ok_or(LedgerError::MathOverflow)?;

    numerator
        .checked_div(total)
        .ok_or(LedgerError::MathOverflow.into())
}

/// Principal left after withdrawing `amount` of an `effective` balance:
/// new = old * (effective - amount) / effective. The entry index is untouched
/// by withdrawals; only deposits shift it.
pub fn principal_after_withdrawal(
    old_deposited: u64,
    amount: u64,
    effective: u64,
) -> Result<u64> {
    require!(effective > 0, LedgerError::InsufficientBalance);
    require!(amount <= effective, LedgerError::InsufficientBalance);

    let remaining = (old_deposited as u128)
        .checked_mul((effective - amount) as u128)
        .ok_or(LedgerError::MathOverflow)?
        .checked_div(effective as u128)
        .ok_or(LedgerError::MathOverflow)?;
    u64::try_from(remaining).map_err(|_| LedgerError::MathOverflow.into())
}

/// Three-way revenue split over accrued yield.
/// The end-user part is the remainder, never a third rounded multiplication,
/// so the three parts always sum exactly to the input.
pub fn revenue_split(
    raw_yield: u64,
    client_share_bps: u16,
    platform_fee_bps: u16,
) -> Result<(u64, u64, u64)> {
    require!(
        (client_share_bps as u32) + (platform_fee_bps as u32) <= MAX_BPS as u32,
        LedgerError::InvalidRevenueSplit
    );

    let part = |bps: u16| -> Result<u64> {
        let v = (raw_yield as u128)
            .checked_mul(bps as u128)
            .ok_or(LedgerError::MathOverflow)?
            .checked_div(MAX_BPS as u128)
            .ok_or(LedgerError::MathOverflow)?;
        u64::try_from(v).map_err(|_| LedgerError::MathOverflow.into())
    };

    let client_revenue = part(client_share_bps)?;
    let platform_revenue = part(platform_fee_bps)?;
    let end_user_revenue = raw_yield
        .checked_sub(client_revenue)
        .and_then(|v| v.checked_sub(platform_revenue))
        .ok_or(LedgerError::MathOverflow)?;

    Ok((client_revenue, platform_revenue, end_user_revenue))
}

/// Annualized rate from index growth over a trailing window of `days` samples:
/// ((current / past) - 1) * 365 / days, in micro-percent.
/// Returns the 0 sentinel when no usable history exists.
pub fn trailing_apy(current_index: u128, past_index: u128, days: u64) -> Result<u64> {
    if past_index == 0 || days == 0 {
        return Ok(0);
    }

    let scaled = current_index
        .checked_mul(HUNDRED_PERCENT as u128)
        .ok_or(LedgerError::MathOverflow)?
        .checked_div(past_index)
        .ok_or(LedgerError::MathOverflow)?;
    let growth = scaled.saturating_sub(HUNDRED_PERCENT as u128);

    let apy = growth
        .checked_mul(DAYS_PER_YEAR as u128)
        .ok_or(LedgerError::MathOverflow)?
        .checked_div(days as u128)
        .ok_or(LedgerError::MathOverflow)?;
    u64::try_from(apy).map_err(|_| LedgerError::MathOverflow.into())
}

/// Fiat to token units at a RATE_SCALE-scaled conversion rate, floored.
pub fn convert_fiat(fiat_amount: u64, rate: u64) -> Result<u64> {
    require!(rate > 0, LedgerError::InvalidConversionRate);

    let converted = (fiat_amount as u128)
        .checked_mul(rate as u128)
        .ok_or(LedgerError::MathOverflow)?
        .checked_div(RATE_SCALE as u128)
        .ok_or(LedgerError::MathOverflow)?;
    u64::try_from(converted).map_err(|_| LedgerError::MathOverflow.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_ALLOCATION_BPS, INDEX_SCALE};

    fn slots(bps: [u16; 3]) -> [AllocationSlot; 3] {
        [
            AllocationSlot { source: YieldSource::Aave, target_bps: bps[0] },
            AllocationSlot { source: YieldSource::Compound, target_bps: bps[1] },
            AllocationSlot { source: YieldSource::Morpho, target_bps: bps[2] },
        ]
    }

    #[test]
    fn index_advances_by_daily_yield() {
        // 0.05% daily on an index of 1.0 -> 1.0005
        let new_index = advance_index(INDEX_SCALE, 50_000).unwrap();
        assert_eq!(new_index, 1_000_500_000_000);
    }

    #[test]
    fn index_unchanged_at_zero_yield() {
        let new_index = advance_index(INDEX_SCALE, 0).unwrap();
        assert_eq!(new_index, INDEX_SCALE);
    }

    #[test]
    fn index_rejects_runaway_daily_rate() {
        let err = advance_index(INDEX_SCALE, HUNDRED_PERCENT).unwrap_err();
        assert_eq!(err, LedgerError::IndexGrowthTooLarge.into());
    }

    #[test]
    fn cycle_yield_floors() {
        // 1,000,000 staked at 0.05% daily -> exactly 500
        assert_eq!(cycle_yield_amount(1_000_000, 50_000).unwrap(), 500);
        // 999 at 0.05% -> floor(0.4995) == 0
        assert_eq!(cycle_yield_amount(999, 50_000).unwrap(), 0);
    }

    #[test]
    fn weighted_yield_over_allocation() {
        // 60% at 5%, 40% at 4% -> 4.6%
        let rates = [Some(5_000_000), Some(4_000_000), None];
        let allocations = slots([6000, 4000, 0]);
        assert_eq!(weighted_annual_yield(&rates, &allocations).unwrap(), 4_600_000);
    }

    #[test]
    fn weighted_yield_requires_rates_for_allocated_sources() {
        let rates = [Some(5_000_000), None, None];
        let allocations = slots([6000, 4000, 0]);
        let err = weighted_annual_yield(&rates, &allocations).unwrap_err();
        assert_eq!(err, LedgerError::SourceRateUnavailable.into());
    }

    #[test]
    fn daily_rate_is_linear_365th() {
        // 7.3% annual -> 0.02% daily
        assert_eq!(daily_rate(7_300_000), 20_000);
    }

    #[test]
    fn dominant_source_prefers_largest_then_first() {
        assert_eq!(dominant_source(&slots([6000, 3000, 1000])), YieldSource::Aave);
        assert_eq!(dominant_source(&slots(DEFAULT_ALLOCATION_BPS)), YieldSource::Morpho);
        // exact tie resolves to declaration order
        assert_eq!(dominant_source(&slots([5000, 5000, 0])), YieldSource::Aave);
    }

    #[test]
    fn effective_balance_scales_with_index_ratio() {
        // 1,000 deposited at entry 1.0, index now 1.02 -> 1,020
        let index_102 = INDEX_SCALE * 102 / 100;
        assert_eq!(effective_balance(1_000, INDEX_SCALE, index_102).unwrap(), 1_020);
    }

    #[test]
    fn effective_balance_never_below_principal() {
        let index_102 = INDEX_SCALE * 102 / 100;
        for deposited in [1u64, 999, 1_000_000] {
            let eff = effective_balance(deposited, INDEX_SCALE, index_102).unwrap();
            assert!(eff >= deposited);
        }
    }

    #[test]
    fn entry_index_is_deposit_weighted_average() {
        // 1,000 at 1.0 then 1,000 at 1.02 -> entry 1.01
        let index_102 = INDEX_SCALE * 102 / 100;
        let entry = weighted_entry_index(1_000, INDEX_SCALE, 1_000, index_102).unwrap();
        assert_eq!(entry, INDEX_SCALE * 101 / 100);
    }

    #[test]
    fn entry_index_pulls_toward_larger_deposit() {
        let index_102 = INDEX_SCALE * 102 / 100;
        // 1,000 at 1.0 then 3,000 at 1.02 -> (1000*1.0 + 3000*1.02) / 4000 = 1.015
        let entry = weighted_entry_index(1_000, INDEX_SCALE, 3_000, index_102).unwrap();
        assert_eq!(entry, INDEX_SCALE * 1015 / 1000);
    }

    #[test]
    fn principal_reduces_proportionally_on_withdrawal() {
        // withdraw 510 of an effective 1,020 on 1,000 principal -> 500 left
        assert_eq!(principal_after_withdrawal(1_000, 510, 1_020).unwrap(), 500);
        // full withdrawal zeroes the principal
        assert_eq!(principal_after_withdrawal(1_000, 1_020, 1_020).unwrap(), 0);
    }

    #[test]
    fn principal_rejects_overdraw() {
        let err = principal_after_withdrawal(1_000, 2_100, 2_000).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance.into());
    }

    #[test]
    fn revenue_split_sums_exactly() {
        // 1000 bps + 500 bps on an amount that rounds both parts down
        let (client, platform, end_user) = revenue_split(1_003, 1_000, 500).unwrap();
        assert_eq!(client, 100);
        assert_eq!(platform, 50);
        assert_eq!(end_user, 853);
        assert_eq!(client + platform + end_user, 1_003);
    }

    #[test]
    fn revenue_split_rejects_over_100_percent() {
        let err = revenue_split(1_000, 6_000, 5_000).unwrap_err();
        assert_eq!(err, LedgerError::InvalidRevenueSplit.into());
    }

    #[test]
    fn trailing_apy_annualizes_window_growth() {
        // 0.05% growth over one day -> 18.25% annualized
        assert_eq!(trailing_apy(1_000_500_000_000, INDEX_SCALE, 1).unwrap(), 18_250_000);
        // 1.5% growth over 30 days -> 18.25% annualized
        let past = INDEX_SCALE;
        let current = INDEX_SCALE * 1015 / 1000;
        assert_eq!(trailing_apy(current, past, 30).unwrap(), 18_250_000);
    }

    #[test]
    fn trailing_apy_sentinel_without_history() {
        assert_eq!(trailing_apy(INDEX_SCALE, 0, 30).unwrap(), 0);
        assert_eq!(trailing_apy(INDEX_SCALE, INDEX_SCALE, 0).unwrap(), 0);
    }

    #[test]
    fn fiat_conversion_floors() {
        // 1,000 fiat at rate 0.999850 -> 999
        assert_eq!(convert_fiat(1_000, 999_850).unwrap(), 999);
        assert_eq!(convert_fiat(1_000, RATE_SCALE).unwrap(), 1_000);
        assert!(convert_fiat(1_000, 0).is_err());
    }
}
