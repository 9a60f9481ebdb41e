use anchor_lang::prelude::*;

#[error_code]
pub enum LedgerError {
    #[msg("Fiat currency is not supported")]
    UnsupportedCurrency,

    #[msg("Amount must be greater than zero")]
    InvalidAmount,

    #[msg("Strategy allocation must sum to exactly 10000 bps")]
    InvalidAllocation,

    #[msg("Client and platform revenue shares must not exceed 10000 bps")]
    InvalidRevenueSplit,

    #[msg("Vault has not been initialized")]
    VaultNotInitialized,

    #[msg("User position has no deposit history")]
    PositionNotFound,

    #[msg("Record is not in a state that allows this transition")]
    InvalidStatusTransition,

    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Growth index cannot decrease")]
    IndexRegression,

    #[msg("Daily index growth exceeds the sanity bound")]
    IndexGrowthTooLarge,

    #[msg("Requested amount exceeds the user's effective balance")]
    InsufficientBalance,

    #[msg("Deduction exceeds the client's idle balance")]
    InsufficientIdleBalance,

    #[msg("Amount exceeds the vault's pending deposit balance")]
    InsufficientPendingBalance,

    #[msg("No yield rate supplied for an allocated source")]
    SourceRateUnavailable,

    #[msg("Vault index already accrued for this day")]
    AccrualAlreadyApplied,

    #[msg("Accrual cycle contains no vaults")]
    EmptyAccrualCycle,

    #[msg("Batch contains no settlement items")]
    EmptyBatch,

    #[msg("Batch remaining accounts must come in [record, position] pairs")]
    MalformedBatch,

    #[msg("Order environment does not match the batch environment")]
    EnvironmentMismatch,

    #[msg("External balance insufficient to execute transfer (retryable)")]
    InsufficientExternalBalance,

    #[msg("External transfer timed out (retryable)")]
    TransferTimeout,

    #[msg("Record does not belong to this client")]
    ClientMismatch,

    #[msg("Record does not belong to this vault")]
    VaultMismatch,

    #[msg("Position does not belong to the order's user")]
    UserMismatch,

    #[msg("Conversion rate must be greater than zero")]
    InvalidConversionRate,

    #[msg("Fees exceed the converted amount")]
    FeesExceedAmount,

    #[msg("Unauthorized authority for this operation")]
    Unauthorized,

    #[msg("Fee breakdown does not sum to its total")]
    InconsistentFees,
}

/// Numeric code carried in skip events and failed records.
pub fn error_code_of(err: &Error) -> u32 {
    match err {
        Error::AnchorError(e) => e.error_code_number,
        Error::ProgramError(_) => 0,
    }
}
