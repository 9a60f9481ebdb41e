use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::{error_code_of, LedgerError},
    events::{BatchDepositsSettled, DepositCompleted, SettlementItemSkipped},
    math,
    state::{
        ClientLedger, DepositFees, DepositRecord, Environment, SettlementStatus, UserPosition,
        Vault,
    },
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct BatchCompleteDepositsArgs {
    /// Fiat to token rate applied to every order in the batch
    pub conversion_rate: u64,
    /// Aggregate external transfer backing the whole batch
    pub external_reference: [u8; 32],
}

#[derive(Accounts)]
pub struct BatchCompleteDeposits<'info> {
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
        constraint = vault.client_id == client_ledger.client_id @ LedgerError::ClientMismatch
    )]
    pub vault: Box<Account<'info, Vault>>,

    pub authority: Signer<'info>,
    // Remaining accounts: [DepositRecord, UserPosition] pairs, all mut.
}

enum SettleOutcome {
    Credited(u64),
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
struct DepositCredit {
    net: u64,
    idle_after: u64,
    total_deposited_after: u64,
    pending_after: u64,
}

/// Settle a page of deposit orders against one aggregate external transfer.
/// Each order settles independently: a bad order is skipped and reported, the
/// rest of the batch still lands. The first order fixes the batch environment
/// and every later order must match it.
pub fn batch_complete_deposits<'info>(
    ctx: Context<'_, '_, 'info, 'info, BatchCompleteDeposits<'info>>,
    args: BatchCompleteDepositsArgs,
) -> Result<()> {
    let accounts = ctx.remaining_accounts;
    require!(!accounts.is_empty(), LedgerError::EmptyBatch);
    require!(accounts.len() % 2 == 0, LedgerError::MalformedBatch);
    require!(accounts.len() / 2 <= MAX_BATCH_ORDERS, LedgerError::MalformedBatch);

    let now = Clock::get()?.unix_timestamp;
    let ledger = &mut ctx.accounts.client_ledger;
    let vault = &mut ctx.accounts.vault;

    let mut batch_env: Option<Environment> = None;
    let mut completed: u32 = 0;
    let mut failed: u32 = 0;
    let mut total_credited: u64 = 0;

    for pair in accounts.chunks(2) {
        let deposit_info = &pair[0];
        let position_info = &pair[1];

        match settle_order(
            deposit_info,
            position_info,
            ledger,
            vault,
            &args,
            &mut batch_env,
            now,
        ) {
            Ok(SettleOutcome::Credited(net)) => {
                completed += 1;
                total_credited = total_credited
                    .checked_add(net)
                    .ok_or(LedgerError::MathOverflow)?;
            }
            Ok(SettleOutcome::AlreadyCompleted) => completed += 1,
            Err(err) => {
                failed += 1;
                msg!("deposit order {} skipped: {:?}", deposit_info.key(), err);
                emit!(SettlementItemSkipped {
                    order_id: order_id_of(deposit_info),
                    error_code: error_code_of(&err),
                    timestamp: now,
                });
            }
        }
    }

    emit!(BatchDepositsSettled {
        client_id: ledger.client_id,
        environment: batch_env.unwrap_or_default(),
        completed,
        failed,
        total_credited,
        external_reference: args.external_reference,
        timestamp: now,
    });

    Ok(())
}

fn settle_order<'info>(
    deposit_info: &'info AccountInfo<'info>,
    position_info: &'info AccountInfo<'info>,
    ledger: &mut Account<'info, ClientLedger>,
    vault: &mut Account<'info, Vault>,
    args: &BatchCompleteDepositsArgs,
    batch_env: &mut Option<Environment>,
    now: i64,
) -> Result<SettleOutcome> {
    let mut deposit: Account<DepositRecord> = Account::try_from(deposit_info)?;

    match triage_order(&deposit, ledger.client_id, vault.token_symbol, batch_env)? {
        // redelivered confirmation, report success without re-crediting
        OrderDisposition::AlreadyCompleted => return Ok(SettleOutcome::AlreadyCompleted),
        OrderDisposition::Settle => {}
    }

    let mut position: Account<UserPosition> = Account::try_from(position_info)?;
    require!(position.user_id == deposit.user_id, LedgerError::UserMismatch);
    require!(position.client_id == deposit.client_id, LedgerError::ClientMismatch);

    let credit = compute_credit(deposit.fiat_amount, args.conversion_rate, ledger, vault)?;

    position.apply_deposit(credit.net, vault.current_index, now)?;
    // gateway fees are settled inside the aggregate transfer, per-order fees
    // are zero on the batch path
    deposit.mark_completed(credit.net, DepositFees::default(), args.external_reference, now)?;

    deposit.exit(&crate::ID)?;
    position.exit(&crate::ID)?;

    // nothing fallible below: the ledger only moves once the records are
    // committed
    ledger.idle_balance = credit.idle_after;
    ledger.total_deposited = credit.total_deposited_after;
    vault.pending_deposit_balance = credit.pending_after;

    emit!(DepositCompleted {
        order_id: deposit.order_id,
        client_id: deposit.client_id,
        user_id: deposit.user_id,
        crypto_amount: credit.net,
        entry_index_after: position.weighted_entry_index,
        idle_balance_after: credit.idle_after,
        external_reference: args.external_reference,
        timestamp: now,
    });

    Ok(SettleOutcome::Credited(credit.net))
}

/// Per-order admission: ownership, environment pinning, status.
fn triage_order(
    deposit: &DepositRecord,
    ledger_client_id: [u8; 32],
    vault_token_symbol: [u8; 8],
    batch_env: &mut Option<Environment>,
) -> Result<OrderDisposition> {
    require!(deposit.client_id == ledger_client_id, LedgerError::ClientMismatch);

    match batch_env {
        None => *batch_env = Some(deposit.environment),
        Some(env) => require!(deposit.environment == *env, LedgerError::EnvironmentMismatch),
    }

    match deposit.status {
        SettlementStatus::Completed => return Ok(OrderDisposition::AlreadyCompleted),
        SettlementStatus::Failed => return Err(LedgerError::InvalidStatusTransition.into()),
        SettlementStatus::Pending => {}
    }

    require!(deposit.token_symbol == vault_token_symbol, LedgerError::VaultMismatch);
    Ok(OrderDisposition::Settle)
}

/// Convert and pre-check every balance the order will touch.
fn compute_credit(
    fiat_amount: u64,
    conversion_rate: u64,
    ledger: &ClientLedger,
    vault: &Vault,
) -> Result<DepositCredit> {
    let net = math::convert_fiat(fiat_amount, conversion_rate)?;
    require!(net > 0, LedgerError::InvalidAmount);

    let idle_after = ledger
        .idle_balance
        .checked_add(net)
        .ok_or(LedgerError::MathOverflow)?;
    let total_deposited_after = ledger
        .total_deposited
        .checked_add(net)
        .ok_or(LedgerError::MathOverflow)?;
    let pending_after = vault
        .pending_deposit_balance
        .checked_add(net)
        .ok_or(LedgerError::MathOverflow)?;

    Ok(DepositCredit { net, idle_after, total_deposited_after, pending_after })
}

/// Best-effort order id for skip reporting; zeroed when the account does not
/// even deserialize.
fn order_id_of<'info>(deposit_info: &'info AccountInfo<'info>) -> [u8; 32] {
    Account::<DepositRecord>::try_from(deposit_info)
        .map(|d| d.order_id)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RATE_SCALE;

    const CLIENT: [u8; 32] = [1u8; 32];
    const TOKEN: [u8; 8] = *b"USDC\0\0\0\0";

    fn pending_order(environment: Environment) -> DepositRecord {
        let mut deposit = DepositRecord::default();
        deposit.client_id = CLIENT;
        deposit.user_id = [2u8; 32];
        deposit.fiat_amount = 1_000;
        deposit.token_symbol = TOKEN;
        deposit.environment = environment;
        deposit
    }

    #[test]
    fn mixed_status_batch_settles_pending_and_skips_failed() {
        let mut batch_env = None;
        let pending = pending_order(Environment::Production);
        let mut dead = pending_order(Environment::Production);
        dead.mark_failed(7, 1).unwrap();

        assert_eq!(
            triage_order(&pending, CLIENT, TOKEN, &mut batch_env).unwrap(),
            OrderDisposition::Settle
        );
        let err = triage_order(&dead, CLIENT, TOKEN, &mut batch_env).unwrap_err();
        assert_eq!(err, LedgerError::InvalidStatusTransition.into());
    }

    #[test]
    fn redelivered_completed_order_reports_without_recredit() {
        let mut batch_env = None;
        let mut order = pending_order(Environment::Production);
        order
            .mark_completed(999, DepositFees::default(), [9u8; 32], 1)
            .unwrap();

        assert_eq!(
            triage_order(&order, CLIENT, TOKEN, &mut batch_env).unwrap(),
            OrderDisposition::AlreadyCompleted
        );
    }

    #[test]
    fn first_order_pins_batch_environment() {
        let mut batch_env = None;
        let sandbox = pending_order(Environment::Sandbox);
        let production = pending_order(Environment::Production);

        triage_order(&sandbox, CLIENT, TOKEN, &mut batch_env).unwrap();
        assert_eq!(batch_env, Some(Environment::Sandbox));

        let err = triage_order(&production, CLIENT, TOKEN, &mut batch_env).unwrap_err();
        assert_eq!(err, LedgerError::EnvironmentMismatch.into());
    }

    #[test]
    fn foreign_client_order_is_rejected() {
        let mut batch_env = None;
        let order = pending_order(Environment::Production);

        let err = triage_order(&order, [8u8; 32], TOKEN, &mut batch_env).unwrap_err();
        assert_eq!(err, LedgerError::ClientMismatch.into());
    }

    #[test]
    fn credit_overflow_rejects_before_any_mutation() {
        let mut ledger = ClientLedger::default();
        ledger.client_id = CLIENT;
        ledger.total_deposited = u64::MAX - 10;
        let vault = Vault::default();

        let err = compute_credit(1_000, RATE_SCALE, &ledger, &vault).unwrap_err();
        assert_eq!(err, LedgerError::MathOverflow.into());
        // the credit is only applied from a fully computed result
        assert_eq!(ledger.idle_balance, 0);
    }

    #[test]
    fn credit_touches_ledger_and_vault_symmetrically() {
        let mut ledger = ClientLedger::default();
        ledger.credit_idle(500).unwrap();
        let vault = Vault::default();

        let credit = compute_credit(1_000, RATE_SCALE, &ledger, &vault).unwrap();
        assert_eq!(credit.net, 1_000);
        assert_eq!(credit.idle_after, 1_500);
        assert_eq!(credit.total_deposited_after, 1_000);
        assert_eq!(credit.pending_after, 1_000);
    }
}
