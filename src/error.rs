//! Error types for the bonding-curve ledger
//!
//! Every error is terminal for the current operation: nothing retries, and a
//! failed operation leaves the ledger exactly as it was before the call.

use thiserror::Error;

/// Failure of a buy/sell/deflate operation or of one of its pricing steps.
#[derive(Error, Debug)]
pub enum CurveError {
    #[error("collateral argument exceeds the bounded search domain")]
    ExceedsMaxDomain,

    #[error("computed price {actual} violates caller limit {limit}")]
    PriceLimitViolated { limit: u128, actual: u128 },

    #[error("amount {requested} exceeds minted supply {supply}")]
    InsufficientSupply { requested: u128, supply: u128 },

    #[error("computation yielded zero where a positive amount is required")]
    ZeroAmountResult,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("curve evaluation failed: {0}")]
    CurveEvaluation(String),

    #[error("settlement failed: {0}")]
    Settlement(anyhow::Error),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

/// Result type for all ledger operations
pub type CurveResult<T> = Result<T, CurveError>;
