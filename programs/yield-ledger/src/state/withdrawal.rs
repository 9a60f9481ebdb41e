use anchor_lang::prelude::*;

use crate::{errors::LedgerError, math, state::Environment};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    /// Transfer intent emitted, waiting on the external executor
    Queued,
    Completed,
    Failed,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DestinationType {
    #[default]
    BankAccount,
    CryptoWallet,
}

/// Why a withdrawal failed. Callers branch on `is_retryable`: a short
/// external balance or a timeout can be retried after funding, a rejected
/// destination cannot.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FailureReason {
    #[default]
    None,
    DestinationRejected,
    InsufficientExternalBalance,
    Timeout,
    Other,
}

impl FailureReason {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureReason::InsufficientExternalBalance | FailureReason::Timeout)
    }
}

/// Fee breakdown computed at request time by the default fee calculator:
/// the revenue split applied to the yield portion of the requested amount,
/// end-user part as the remainder.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct WithdrawalFees {
    /// Yield portion of the requested amount
    pub total_yield: u64,
    pub client_fee: u64,
    pub platform_fee: u64,
    pub user_net_yield: u64,
    pub fees_deducted: bool,
}

impl WithdrawalFees {
    /// Default calculator. `requested` draws down principal and yield in the
    /// same proportion as the whole position, so the fee base is
    /// `requested * yield_earned / effective`.
    pub fn calculate(
        requested: u64,
        effective: u64,
        total_deposited: u64,
        client_share_bps: u16,
        platform_fee_bps: u16,
        deduct_fees: bool,
    ) -> Result<Self> {
        let yield_earned = effective.saturating_sub(total_deposited);
        if yield_earned == 0 || effective == 0 {
            return Ok(Self { fees_deducted: deduct_fees, ..Self::default() });
        }

        let yield_portion = (requested as u128)
            .checked_mul(yield_earned as u128)
            .ok_or(LedgerError::MathOverflow)?
            .checked_div(effective as u128)
            .ok_or(LedgerError::MathOverflow)?;
        let yield_portion = u64::try_from(yield_portion).map_err(|_| LedgerError::MathOverflow)?;

        if !deduct_fees {
            // fees deferred: the whole yield portion pays out now, the split
            // is settled out-of-band
            return Ok(Self {
                total_yield: yield_portion,
                user_net_yield: yield_portion,
                fees_deducted: false,
                ..Self::default()
            });
        }

        let (client_fee, platform_fee, user_net_yield) =
            math::revenue_split(yield_portion, client_share_bps, platform_fee_bps)?;

        Ok(Self {
            total_yield: yield_portion,
            client_fee,
            platform_fee,
            user_net_yield,
            fees_deducted: true,
        })
    }

    /// Amount leaving custody toward the user.
    pub fn payout(&self, requested: u64) -> Result<u64> {
        if !self.fees_deducted {
            return Ok(requested);
        }
        requested
            .checked_sub(self.client_fee)
            .and_then(|v| v.checked_sub(self.platform_fee))
            .ok_or(LedgerError::MathOverflow.into())
    }
}

/// One record per withdrawal request, PDA-keyed by order id.
#[account]
#[derive(Default)]
pub struct WithdrawalRecord {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub user_id: [u8; 32],

    pub requested_amount: u64,
    /// Amount actually transferred, set on completion
    pub actual_amount: u64,

    pub status: WithdrawalStatus,
    pub destination_type: DestinationType,
    pub environment: Environment,
    pub network: [u8; 16],

    pub fees: WithdrawalFees,
    pub failure_reason: FailureReason,

    pub external_reference: [u8; 32],

    pub created_at: i64,
    pub queued_at: i64,
    pub completed_at: i64,
    pub failed_at: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,

    /// Reserved space for future upgrades
    pub _reserved: [u8; 32],
}

impl WithdrawalRecord {
    pub const LEN: usize = 8 + // discriminator
        32 + // order_id
        32 + // client_id
        32 + // user_id
        8 + // requested_amount
        8 + // actual_amount
        1 + // status
        1 + // destination_type
        1 + // environment
        16 + // network
        (8 + 8 + 8 + 8 + 1) + // fees
        1 + // failure_reason
        32 + // external_reference
        8 + // created_at
        8 + // queued_at
        8 + // completed_at
        8 + // failed_at
        1 + // bump
        32; // _reserved

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, WithdrawalStatus::Completed | WithdrawalStatus::Failed)
    }

    pub fn is_settleable(&self) -> bool {
        matches!(self.status, WithdrawalStatus::Pending | WithdrawalStatus::Queued)
    }

    /// pending -> queued, once the transfer intent has been handed to the
    /// external executor.
    pub fn mark_queued(&mut self, now: i64) -> Result<()> {
        require!(
            self.status == WithdrawalStatus::Pending,
            LedgerError::InvalidStatusTransition
        );
        self.status = WithdrawalStatus::Queued;
        self.queued_at = now;
        Ok(())
    }

    pub fn mark_completed(
        &mut self,
        actual_amount: u64,
        external_reference: [u8; 32],
        now: i64,
    ) -> Result<()> {
        require!(self.is_settleable(), LedgerError::InvalidStatusTransition);
        self.status = WithdrawalStatus::Completed;
        self.actual_amount = actual_amount;
        self.external_reference = external_reference;
        self.completed_at = now;
        Ok(())
    }

    pub fn mark_failed(&mut self, reason: FailureReason, now: i64) -> Result<()> {
        require!(self.is_settleable(), LedgerError::InvalidStatusTransition);
        self.status = WithdrawalStatus::Failed;
        self.failure_reason = reason;
        self.failed_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_pending_queued_completed() {
        let mut withdrawal = WithdrawalRecord::default();
        withdrawal.mark_queued(1).unwrap();
        assert_eq!(withdrawal.status, WithdrawalStatus::Queued);

        withdrawal.mark_completed(990, [3u8; 32], 2).unwrap();
        assert_eq!(withdrawal.status, WithdrawalStatus::Completed);
        assert_eq!(withdrawal.actual_amount, 990);

        // terminal is final
        let err = withdrawal.mark_failed(FailureReason::Timeout, 3).unwrap_err();
        assert_eq!(err, LedgerError::InvalidStatusTransition.into());
    }

    #[test]
    fn pending_can_complete_without_queueing() {
        let mut withdrawal = WithdrawalRecord::default();
        withdrawal.mark_completed(500, [0u8; 32], 1).unwrap();
        assert_eq!(withdrawal.status, WithdrawalStatus::Completed);
    }

    #[test]
    fn retryable_failure_reasons() {
        assert!(FailureReason::InsufficientExternalBalance.is_retryable());
        assert!(FailureReason::Timeout.is_retryable());
        assert!(!FailureReason::DestinationRejected.is_retryable());
        assert!(!FailureReason::Other.is_retryable());
    }

    #[test]
    fn fee_calculator_splits_yield_portion() {
        // effective 1,020 on 1,000 principal; withdraw half (510)
        // yield portion = 510 * 20 / 1020 = 10
        let fees = WithdrawalFees::calculate(510, 1_020, 1_000, 1_500, 500, true).unwrap();
        assert_eq!(fees.total_yield, 10);
        assert_eq!(fees.client_fee, 1); // floor(10 * 15%)
        assert_eq!(fees.platform_fee, 0); // floor(10 * 5%)
        assert_eq!(fees.user_net_yield, 9); // remainder
        assert_eq!(fees.client_fee + fees.platform_fee + fees.user_net_yield, fees.total_yield);
        assert_eq!(fees.payout(510).unwrap(), 509);
    }

    #[test]
    fn fee_calculator_defers_when_asked() {
        let fees = WithdrawalFees::calculate(510, 1_020, 1_000, 1_500, 500, false).unwrap();
        assert_eq!(fees.total_yield, 10);
        assert_eq!(fees.client_fee, 0);
        assert_eq!(fees.user_net_yield, 10);
        assert_eq!(fees.payout(510).unwrap(), 510);
    }

    #[test]
    fn no_fees_without_yield() {
        let fees = WithdrawalFees::calculate(500, 1_000, 1_000, 1_500, 500, true).unwrap();
        assert_eq!(fees.total_yield, 0);
        assert_eq!(fees.payout(500).unwrap(), 500);
    }
}
