use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::LedgerError,
    events::{AccrualCycleCompleted, IndexAccrued},
    math,
    state::{Vault, YieldSource},
};

/// One source's annual yield for this cycle, micro-percent.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct SourceRate {
    pub source: YieldSource,
    pub annual_yield_micro_pct: u64,
}

#[derive(Accounts)]
pub struct AccrueYield<'info> {
    pub operator: Signer<'info>,
    // Remaining accounts: the cycle's vaults, each mut and program-owned.
}

#[derive(Debug)]
struct CycleOutcome {
    old_index: u128,
    new_index: u128,
    daily_yield_micro_pct: u64,
    dominant_source: YieldSource,
    yield_amount: u64,
}

/// Daily accrual crank. Applies one day of allocation-weighted yield to every
/// vault passed in remaining accounts: advances the growth index, books the
/// cycle's yield into the staked balance, and records the index sample for
/// the trailing APY window.
///
/// Per-vault failures skip the vault and keep the cycle going; a vault whose
/// day is already applied is skipped the same way, which makes retrying a
/// partially failed cycle safe.
pub fn accrue_yield<'info>(
    ctx: Context<'_, '_, 'info, 'info, AccrueYield<'info>>,
    cycle_rates: Vec<SourceRate>,
) -> Result<()> {
    require!(!ctx.remaining_accounts.is_empty(), LedgerError::EmptyAccrualCycle);

    let now = Clock::get()?.unix_timestamp;
    let cycle_day = (now / SECONDS_PER_DAY) as u64;

    let mut rates: [Option<u64>; YIELD_SOURCE_COUNT] = [None; YIELD_SOURCE_COUNT];
    for rate in cycle_rates.iter() {
        rates[rate.source as usize] = Some(rate.annual_yield_micro_pct);
    }

    let mut attempted: u32 = 0;
    let mut succeeded: u32 = 0;

    for vault_info in ctx.remaining_accounts.iter() {
        attempted += 1;
        match accrue_vault(vault_info, &rates, cycle_day, now) {
            Ok(()) => succeeded += 1,
            Err(err) => {
                msg!("accrual skipped for vault {}: {:?}", vault_info.key(), err);
            }
        }
    }

    emit!(AccrualCycleCompleted {
        vaults_attempted: attempted,
        vaults_succeeded: succeeded,
        cycle_day,
        timestamp: now,
    });

    Ok(())
}

fn accrue_vault<'info>(
    vault_info: &'info AccountInfo<'info>,
    rates: &[Option<u64>; YIELD_SOURCE_COUNT],
    cycle_day: u64,
    now: i64,
) -> Result<()> {
    let mut vault: Account<Vault> = Account::try_from(vault_info)?;

    match apply_cycle(&mut vault, rates, cycle_day)? {
        Some(outcome) => {
            vault.exit(&crate::ID)?;
            emit!(IndexAccrued {
                client_id: vault.client_id,
                vault: vault_info.key(),
                old_index: outcome.old_index,
                new_index: outcome.new_index,
                daily_yield_micro_pct: outcome.daily_yield_micro_pct,
                dominant_source: outcome.dominant_source,
                yield_amount: outcome.yield_amount,
                cycle_day,
                timestamp: now,
            });
        }
        None => {
            msg!("vault {} has no staked balance, index unchanged", vault_info.key());
        }
    }

    Ok(())
}

/// Apply one cycle's yield to a vault, or return None for an empty vault
/// (nothing staked means nothing to grow, so the index stays put and the day
/// stays open).
fn apply_cycle(
    vault: &mut Vault,
    rates: &[Option<u64>; YIELD_SOURCE_COUNT],
    cycle_day: u64,
) -> Result<Option<CycleOutcome>> {
    require!(vault.is_initialized(), LedgerError::VaultNotInitialized);
    require!(vault.last_accrual_day < cycle_day, LedgerError::AccrualAlreadyApplied);

    if vault.total_staked_balance == 0 {
        return Ok(None);
    }

    let allocations = vault.active_allocations();
    let annual = math::weighted_annual_yield(rates, &allocations)?;
    let daily = math::daily_rate(annual);
    let dominant = math::dominant_source(&allocations);

    let old_index = vault.current_index;
    let new_index = math::advance_index(old_index, daily)?;
    let yield_amount = math::cycle_yield_amount(vault.total_staked_balance, daily)?;

    vault.current_index = new_index;
    // accrued yield compounds: it joins the staked balance it was earned on
    vault.total_staked_balance = vault
        .total_staked_balance
        .checked_add(yield_amount)
        .ok_or(LedgerError::MathOverflow)?;
    vault.cumulative_yield = vault
        .cumulative_yield
        .checked_add(yield_amount)
        .ok_or(LedgerError::MathOverflow)?;
    vault.last_accrual_day = cycle_day;
    vault.record_index_sample(new_index);

    Ok(Some(CycleOutcome {
        old_index,
        new_index,
        daily_yield_micro_pct: daily,
        dominant_source: dominant,
        yield_amount,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INDEX_SCALE;

    fn staked_vault(staked: u64) -> Vault {
        let mut vault = Vault::default();
        vault.current_index = INDEX_SCALE;
        vault.total_staked_balance = staked;
        vault
    }

    // 18.25% annual from every source -> 0.05% daily regardless of allocation
    const STEADY_RATES: [Option<u64>; YIELD_SOURCE_COUNT] =
        [Some(18_250_000), Some(18_250_000), Some(18_250_000)];

    #[test]
    fn cycle_advances_index_and_books_yield() {
        let mut vault = staked_vault(1_000_000);
        let outcome = apply_cycle(&mut vault, &STEADY_RATES, 1).unwrap().unwrap();

        assert_eq!(outcome.old_index, INDEX_SCALE);
        assert_eq!(outcome.new_index, 1_000_500_000_000);
        assert_eq!(outcome.yield_amount, 500);
        assert_eq!(vault.total_staked_balance, 1_000_500);
        assert_eq!(vault.cumulative_yield, 500);
        assert_eq!(vault.last_accrual_day, 1);
        assert_eq!(vault.history_len, 1);
    }

    #[test]
    fn same_day_rerun_is_rejected() {
        let mut vault = staked_vault(1_000_000);
        apply_cycle(&mut vault, &STEADY_RATES, 1).unwrap();

        let err = apply_cycle(&mut vault, &STEADY_RATES, 1).unwrap_err();
        assert_eq!(err, LedgerError::AccrualAlreadyApplied.into());
        assert_eq!(vault.current_index, 1_000_500_000_000);
    }

    #[test]
    fn empty_vault_is_left_unchanged() {
        let mut vault = staked_vault(0);
        assert!(apply_cycle(&mut vault, &STEADY_RATES, 1).unwrap().is_none());

        assert_eq!(vault.current_index, INDEX_SCALE);
        assert_eq!(vault.last_accrual_day, 0);
        assert_eq!(vault.history_len, 0);
    }

    #[test]
    fn uninitialized_vault_is_rejected() {
        let mut vault = Vault::default();
        let err = apply_cycle(&mut vault, &STEADY_RATES, 1).unwrap_err();
        assert_eq!(err, LedgerError::VaultNotInitialized.into());
    }
}
