use anchor_lang::prelude::*;

use crate::errors::LedgerError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SettlementStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

/// Bank details snapshotted at deposit creation. Directory changes after the
/// order is open never alter these.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PaymentInstructions {
    pub bank_name: [u8; 32],
    pub account_reference: [u8; 32],
    pub payment_reference: [u8; 32],
    pub expires_at: i64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DepositFees {
    pub gateway_fee: u64,
    pub platform_fee: u64,
    pub network_fee: u64,
    pub total_fees: u64,
}

impl DepositFees {
    /// The caller-supplied breakdown must reconcile with its own total before
    /// anything is deducted from a converted amount.
    pub fn verify_total(&self) -> Result<()> {
        let sum = self
            .gateway_fee
            .checked_add(self.platform_fee)
            .and_then(|v| v.checked_add(self.network_fee))
            .ok_or(LedgerError::MathOverflow)?;
        require!(sum == self.total_fees, LedgerError::InconsistentFees);
        Ok(())
    }
}

/// One record per deposit attempt, PDA-keyed by order id so duplicate order
/// ids fail at creation.
#[account]
#[derive(Default)]
pub struct DepositRecord {
    pub order_id: [u8; 32],
    pub client_id: [u8; 32],
    pub user_id: [u8; 32],

    pub fiat_amount: u64,
    pub fiat_currency: [u8; 8],
    pub token_symbol: [u8; 8],

    /// Converted token amount, set on completion
    pub crypto_amount: u64,

    pub status: SettlementStatus,
    pub environment: Environment,
    pub network: [u8; 16],

    pub payment_instructions: PaymentInstructions,
    pub fees: DepositFees,

    /// Aggregate external transfer reference from batch settlement
    pub external_reference: [u8; 32],

    /// Failure code, LedgerError ordinal; zero when not failed
    pub error_code: u32,

    pub created_at: i64,
    pub completed_at: i64,
    pub failed_at: i64,

    /// Bump seed for PDA derivation
    pub bump: u8,

    /// Reserved space for future upgrades
    pub _reserved: [u8; 32],
}

impl DepositRecord {
    pub const LEN: usize = 8 + // discriminator
        32 + // order_id
        32 + // client_id
        32 + // user_id
        8 + // fiat_amount
        8 + // fiat_currency
        8 + // token_symbol
        8 + // crypto_amount
        1 + // status
        1 + // environment
        16 + // network
        (32 + 32 + 32 + 8) + // payment_instructions
        (8 + 8 + 8 + 8) + // fees
        32 + // external_reference
        4 + // error_code
        8 + // created_at
        8 + // completed_at
        8 + // failed_at
        1 + // bump
        32; // _reserved

    pub fn is_terminal(&self) -> bool {
        self.status != SettlementStatus::Pending
    }

    /// pending -> completed. Terminal records are the caller's idempotency
    /// concern; the transition itself is strictly one-directional.
    pub fn mark_completed(
        &mut self,
        crypto_amount: u64,
        fees: DepositFees,
        external_reference: [u8; 32],
        now: i64,
    ) -> Result<()> {
        require!(
            self.status == SettlementStatus::Pending,
            LedgerError::InvalidStatusTransition
        );
        self.status = SettlementStatus::Completed;
        self.crypto_amount = crypto_amount;
        self.fees = fees;
        self.external_reference = external_reference;
        self.completed_at = now;
        Ok(())
    }

    /// pending -> failed. No ledger mutation accompanies a failure.
    pub fn mark_failed(&mut self, error_code: u32, now: i64) -> Result<()> {
        require!(
            self.status == SettlementStatus::Pending,
            LedgerError::InvalidStatusTransition
        );
        self.status = SettlementStatus::Failed;
        self.error_code = error_code;
        self.failed_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_is_one_directional() {
        let mut deposit = DepositRecord::default();
        assert!(!deposit.is_terminal());

        deposit
            .mark_completed(1_000, DepositFees::default(), [7u8; 32], 100)
            .unwrap();
        assert_eq!(deposit.status, SettlementStatus::Completed);
        assert!(deposit.is_terminal());

        // no transition out of a terminal state
        let err = deposit
            .mark_completed(2_000, DepositFees::default(), [8u8; 32], 101)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidStatusTransition.into());
        assert_eq!(deposit.crypto_amount, 1_000);

        let err = deposit.mark_failed(1, 102).unwrap_err();
        assert_eq!(err, LedgerError::InvalidStatusTransition.into());
    }

    #[test]
    fn fee_breakdown_must_reconcile_with_total() {
        let fees = DepositFees { gateway_fee: 5, platform_fee: 3, network_fee: 2, total_fees: 10 };
        assert!(fees.verify_total().is_ok());

        let skewed = DepositFees { total_fees: 11, ..fees };
        assert_eq!(skewed.verify_total().unwrap_err(), LedgerError::InconsistentFees.into());
    }

    #[test]
    fn failure_records_code_without_amounts() {
        let mut deposit = DepositRecord::default();
        deposit.mark_failed(42, 100).unwrap();

        assert_eq!(deposit.status, SettlementStatus::Failed);
        assert_eq!(deposit.error_code, 42);
        assert_eq!(deposit.crypto_amount, 0);
        assert!(deposit.is_terminal());
    }
}
