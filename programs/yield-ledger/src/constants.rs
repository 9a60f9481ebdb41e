use anchor_lang::prelude::*;

/// PDA seeds
pub const CLIENT_LEDGER_SEED: &[u8] = b"client_ledger";
pub const VAULT_SEED: &[u8] = b"vault";
pub const USER_POSITION_SEED: &[u8] = b"user_position";
pub const DEPOSIT_SEED: &[u8] = b"deposit";
pub const WITHDRAWAL_SEED: &[u8] = b"withdrawal";
/// Authority over the client's idle-funds treasury ATA
pub const TREASURY_AUTHORITY_SEED: &[u8] = b"treasury_authority";
/// Authority over a vault's staked-funds treasury ATA
pub const VAULT_TREASURY_SEED: &[u8] = b"vault_treasury";

/// Time constants
pub const SECONDS_PER_DAY: i64 = 86400;
pub const DAYS_PER_YEAR: u64 = 365;

/// Fixed-point scales.
/// Growth index: 1.0 == INDEX_SCALE. Rates: micro-percent, so 1% == 1_000_000
/// and 100% == HUNDRED_PERCENT. Fiat conversion rates: 1.0 == RATE_SCALE.
pub const INDEX_SCALE: u128 = 1_000_000_000_000;
pub const HUNDRED_PERCENT: u64 = 100_000_000;
pub const RATE_SCALE: u64 = 1_000_000;

/// Share splits
pub const MAX_BPS: u16 = 10_000;

/// Fixed yield-source set for strategy allocation.
/// Equal three-way split applied when a vault has no configured strategy;
/// named constant so the fallback stays auditable.
pub const YIELD_SOURCE_COUNT: usize = 3;
pub const DEFAULT_ALLOCATION_BPS: [u16; YIELD_SOURCE_COUNT] = [3333, 3333, 3334];

/// Trailing window for the index-derived APY estimate
pub const APY_WINDOW_DAYS: usize = 30;

/// Fiat currencies accepted on the deposit path, zero-padded to 8 bytes
pub const SUPPORTED_FIAT: [[u8; 8]; 3] = [
    *b"USD\0\0\0\0\0",
    *b"EUR\0\0\0\0\0",
    *b"GBP\0\0\0\0\0",
];

/// Batch settlement limit (remaining accounts come in [record, position] pairs)
pub const MAX_BATCH_ORDERS: usize = 16;

pub fn is_supported_fiat(currency: &[u8; 8]) -> bool {
    SUPPORTED_FIAT.iter().any(|c| c == currency)
}
