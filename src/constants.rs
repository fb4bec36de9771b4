//! Shared constants for the bonding-curve ledger

/// Shared denominator for the inflation-rate and spread-fee numerators
/// (18 decimal places, i.e. a numerator of 10^16 is 1%)
pub const RATE_DENOMINATOR: u128 = 1_000_000_000_000_000_000;

/// Largest collateral argument the inverse solvers accept (1e26)
pub const MAX_COLLATERAL_DOMAIN: u128 = 100_000_000_000_000_000_000_000_000;

/// Upper bound of the buy-side inverse search, in token units (2e25 - 1)
pub const MAX_BUY_SEARCH: u128 = 20_000_000_000_000_000_000_000_000 - 1;
