use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::{error_code_of, LedgerError},
    events::{BatchWithdrawalsSettled, SettlementItemSkipped, WithdrawalCompleted},
    state::{ClientLedger, Environment, UserPosition, Vault, WithdrawalRecord, WithdrawalStatus},
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct BatchCompleteWithdrawalsArgs {
    /// Aggregate external transfer backing the whole batch
    pub external_reference: [u8; 32],
}

#[derive(Accounts)]
pub struct BatchCompleteWithdrawals<'info> {
    #[account(
        mut,
        seeds = [CLIENT_LEDGER_SEED, client_ledger.client_id.as_ref()],
        bump = client_ledger.bump,
        has_one = authority
    )]
    pub client_ledger: Box<Account<'info, ClientLedger>>,

    #[account(
        seeds = [
            VAULT_SEED,
            vault.client_id.as_ref(),
            vault.chain.as_ref(),
            vault.token_mint.as_ref()
        ],
        bump = vault.bump,
        constraint = vault.client_id == client_ledger.client_id @ LedgerError::ClientMismatch
    )]
    pub vault: Box<Account<'info, Vault>>,

    pub authority: Signer<'info>,
    // Remaining accounts: [WithdrawalRecord, UserPosition] pairs, all mut.
}

enum SettleOutcome {
    Debited(u64),
    AlreadyCompleted,
}

#[derive(Debug, PartialEq, Eq)]
enum OrderDisposition {
    Settle,
    AlreadyCompleted,
}

/// All balance figures for one order, computed up front so the item either
/// fully lands or leaves the ledger untouched.
#[derive(Debug)]
struct WithdrawalDebit {
    payout: u64,
    idle_after: u64,
    total_withdrawn_after: u64,
    client_revenue_after: u64,
    platform_revenue_after: u64,
    end_user_revenue_after: u64,
}

/// Settle a page of withdrawal orders against one aggregate external
/// transfer. Orders settle independently, a bad one is skipped and reported
/// while the rest land. The first order fixes the batch environment.
pub fn batch_complete_withdrawals<'info>(
    ctx: Context<'_, '_, 'info, 'info, BatchCompleteWithdrawals<'info>>,
    args: BatchCompleteWithdrawalsArgs,
) -> Result<()> {
    let accounts = ctx.remaining_accounts;
    require!(!accounts.is_empty(), LedgerError::EmptyBatch);
    require!(accounts.len() % 2 == 0, LedgerError::MalformedBatch);
    require!(accounts.len() / 2 <= MAX_BATCH_ORDERS, LedgerError::MalformedBatch);

    let now = Clock::get()?.unix_timestamp;
    let ledger = &mut ctx.accounts.client_ledger;
    let current_index = ctx.accounts.vault.current_index;

    let mut batch_env: Option<Environment> = None;
    let mut completed: u32 = 0;
    let mut failed: u32 = 0;
    let mut total_debited: u64 = 0;

    for pair in accounts.chunks(2) {
        let withdrawal_info = &pair[0];
        let position_info = &pair[1];

        match settle_order(
            withdrawal_info,
            position_info,
            ledger,
            current_index,
            &args,
            &mut batch_env,
            now,
        ) {
            Ok(SettleOutcome::Debited(amount)) => {
                completed += 1;
                total_debited = total_debited
                    .checked_add(amount)
                    .ok_or(LedgerError::MathOverflow)?;
            }
            Ok(SettleOutcome::AlreadyCompleted) => completed += 1,
            Err(err) => {
                failed += 1;
                msg!("withdrawal order {} skipped: {:?}", withdrawal_info.key(), err);
                emit!(SettlementItemSkipped {
                    order_id: order_id_of(withdrawal_info),
                    error_code: error_code_of(&err),
                    timestamp: now,
                });
            }
        }
    }

    emit!(BatchWithdrawalsSettled {
        client_id: ledger.client_id,
        environment: batch_env.unwrap_or_default(),
        completed,
        failed,
        total_debited,
        external_reference: args.external_reference,
        timestamp: now,
    });

    Ok(())
}

fn settle_order<'info>(
    withdrawal_info: &'info AccountInfo<'info>,
    position_info: &'info AccountInfo<'info>,
    ledger: &mut Account<'info, ClientLedger>,
    current_index: u128,
    args: &BatchCompleteWithdrawalsArgs,
    batch_env: &mut Option<Environment>,
    now: i64,
) -> Result<SettleOutcome> {
    let mut withdrawal: Account<WithdrawalRecord> = Account::try_from(withdrawal_info)?;

    match triage_order(&withdrawal, ledger.client_id, batch_env)? {
        OrderDisposition::AlreadyCompleted => return Ok(SettleOutcome::AlreadyCompleted),
        OrderDisposition::Settle => {}
    }

    let mut position: Account<UserPosition> = Account::try_from(position_info)?;
    require!(position.user_id == withdrawal.user_id, LedgerError::UserMismatch);
    require!(position.client_id == withdrawal.client_id, LedgerError::ClientMismatch);

    let debit = compute_debit(&withdrawal, ledger)?;

    position.apply_withdrawal(withdrawal.requested_amount, current_index, now)?;
    withdrawal.mark_completed(debit.payout, args.external_reference, now)?;

    withdrawal.exit(&crate::ID)?;
    position.exit(&crate::ID)?;

    // nothing fallible below: the ledger only moves once the records are
    // committed
    ledger.idle_balance = debit.idle_after;
    ledger.total_withdrawn = debit.total_withdrawn_after;
    ledger.client_revenue = debit.client_revenue_after;
    ledger.platform_revenue = debit.platform_revenue_after;
    ledger.end_user_revenue = debit.end_user_revenue_after;

    emit!(WithdrawalCompleted {
        order_id: withdrawal.order_id,
        client_id: withdrawal.client_id,
        user_id: withdrawal.user_id,
        actual_amount: debit.payout,
        idle_balance_after: debit.idle_after,
        external_reference: args.external_reference,
        timestamp: now,
    });

    Ok(SettleOutcome::Debited(debit.payout))
}

/// Per-order admission: ownership, environment pinning, status.
fn triage_order(
    withdrawal: &WithdrawalRecord,
    ledger_client_id: [u8; 32],
    batch_env: &mut Option<Environment>,
) -> Result<OrderDisposition> {
    require!(withdrawal.client_id == ledger_client_id, LedgerError::ClientMismatch);

    match batch_env {
        None => *batch_env = Some(withdrawal.environment),
        Some(env) => require!(withdrawal.environment == *env, LedgerError::EnvironmentMismatch),
    }

    match withdrawal.status {
        WithdrawalStatus::Completed => Ok(OrderDisposition::AlreadyCompleted),
        WithdrawalStatus::Failed => Err(LedgerError::InvalidStatusTransition.into()),
        WithdrawalStatus::Pending | WithdrawalStatus::Queued => Ok(OrderDisposition::Settle),
    }
}

/// Pre-check every balance the order will touch, revenue booking included.
fn compute_debit(withdrawal: &WithdrawalRecord, ledger: &ClientLedger) -> Result<WithdrawalDebit> {
    let payout = withdrawal.fees.payout(withdrawal.requested_amount)?;
    require!(payout <= ledger.idle_balance, LedgerError::InsufficientIdleBalance);

    let total_withdrawn_after = ledger
        .total_withdrawn
        .checked_add(payout)
        .ok_or(LedgerError::MathOverflow)?;

    let fees = withdrawal.fees;
    let (client, platform, end_user) = if fees.fees_deducted {
        (fees.client_fee, fees.platform_fee, fees.user_net_yield)
    } else {
        (0, 0, 0)
    };
    let client_revenue_after = ledger
        .client_revenue
        .checked_add(client)
        .ok_or(LedgerError::MathOverflow)?;
    let platform_revenue_after = ledger
        .platform_revenue
        .checked_add(platform)
        .ok_or(LedgerError::MathOverflow)?;
    let end_user_revenue_after = ledger
        .end_user_revenue
        .checked_add(end_user)
        .ok_or(LedgerError::MathOverflow)?;

    Ok(WithdrawalDebit {
        payout,
        idle_after: ledger.idle_balance - payout,
        total_withdrawn_after,
        client_revenue_after,
        platform_revenue_after,
        end_user_revenue_after,
    })
}

fn order_id_of<'info>(withdrawal_info: &'info AccountInfo<'info>) -> [u8; 32] {
    Account::<WithdrawalRecord>::try_from(withdrawal_info)
        .map(|w| w.order_id)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WithdrawalFees;

    const CLIENT: [u8; 32] = [1u8; 32];

    fn queued_order(environment: Environment) -> WithdrawalRecord {
        let mut withdrawal = WithdrawalRecord::default();
        withdrawal.client_id = CLIENT;
        withdrawal.user_id = [2u8; 32];
        withdrawal.requested_amount = 510;
        withdrawal.fees = WithdrawalFees::calculate(510, 1_020, 1_000, 1_500, 500, true).unwrap();
        withdrawal.environment = environment;
        withdrawal.mark_queued(1).unwrap();
        withdrawal
    }

    #[test]
    fn mixed_status_batch_settles_queued_and_skips_failed() {
        let mut batch_env = None;
        let queued = queued_order(Environment::Production);
        let mut dead = queued_order(Environment::Production);
        dead.mark_failed(crate::state::FailureReason::DestinationRejected, 2).unwrap();

        assert_eq!(
            triage_order(&queued, CLIENT, &mut batch_env).unwrap(),
            OrderDisposition::Settle
        );
        let err = triage_order(&dead, CLIENT, &mut batch_env).unwrap_err();
        assert_eq!(err, LedgerError::InvalidStatusTransition.into());
    }

    #[test]
    fn redelivered_completed_order_reports_without_redebit() {
        let mut batch_env = None;
        let mut order = queued_order(Environment::Production);
        order.mark_completed(509, [9u8; 32], 2).unwrap();

        assert_eq!(
            triage_order(&order, CLIENT, &mut batch_env).unwrap(),
            OrderDisposition::AlreadyCompleted
        );
    }

    #[test]
    fn first_order_pins_batch_environment() {
        let mut batch_env = None;
        let sandbox = queued_order(Environment::Sandbox);
        let production = queued_order(Environment::Production);

        triage_order(&sandbox, CLIENT, &mut batch_env).unwrap();
        assert_eq!(batch_env, Some(Environment::Sandbox));

        let err = triage_order(&production, CLIENT, &mut batch_env).unwrap_err();
        assert_eq!(err, LedgerError::EnvironmentMismatch.into());
    }

    #[test]
    fn debit_covers_payout_and_books_revenue() {
        let mut ledger = ClientLedger::default();
        ledger.client_id = CLIENT;
        ledger.credit_idle(10_000).unwrap();
        let order = queued_order(Environment::Production);

        // requested 510 on 1,020 effective: yield portion 10, client 1,
        // platform 0, user 9, payout 509
        let debit = compute_debit(&order, &ledger).unwrap();
        assert_eq!(debit.payout, 509);
        assert_eq!(debit.idle_after, 9_491);
        assert_eq!(debit.total_withdrawn_after, 509);
        assert_eq!(debit.client_revenue_after, 1);
        assert_eq!(debit.platform_revenue_after, 0);
        assert_eq!(debit.end_user_revenue_after, 9);
    }

    #[test]
    fn debit_rejects_short_idle_before_any_mutation() {
        let mut ledger = ClientLedger::default();
        ledger.client_id = CLIENT;
        ledger.credit_idle(100).unwrap();
        let order = queued_order(Environment::Production);

        let err = compute_debit(&order, &ledger).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientIdleBalance.into());
        assert_eq!(ledger.idle_balance, 100);
        assert_eq!(ledger.total_withdrawn, 0);
    }
}
