//! The single mutable state of record for one bonding-curve instance

use serde::{Deserialize, Serialize};

/// Ledger state: minted supply, actual collateral held, and the timestamp of
/// the last inflation accrual.
///
/// Exclusively owned by the transaction processor; every other component
/// only reads or derives from it. Mutated only as part of an atomic
/// buy/sell/deflate/inflation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub minted_supply: u128,
    pub held_collateral: u128,
    /// Seconds; advanced by inflation accrual, never by deflate
    pub last_inflation_at: u64,
}

impl Ledger {
    /// Fresh ledger with zero supply and collateral, created at `now`
    pub fn new(now: u64) -> Self {
        Self {
            minted_supply: 0,
            held_collateral: 0,
            last_inflation_at: now,
        }
    }
}
