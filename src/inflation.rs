//! Lazy continuous-time inflation accrual
//!
//! Inflation dilutes existing holders by minting new supply to the
//! beneficiary without adding collateral. It accrues linearly with elapsed
//! time and current supply, and is applied once at the start of every buy
//! and sell. Deflate deliberately never accrues.

use crate::constants::RATE_DENOMINATOR;
use crate::error::{CurveError, CurveResult};
use crate::ledger::Ledger;
use crate::math;

pub struct InflationScheduler;

impl InflationScheduler {
    /// Accrues inflation onto a staged ledger and returns the amount owed to
    /// the beneficiary. The actual beneficiary mint is the transaction
    /// layer's reward-minting step; this only stages the supply change.
    ///
    /// `last_inflation_at` always advances to `now`, so a second call within
    /// the same timestamp accrues nothing. Accrual is linear in elapsed time
    /// and supply, not compounding within a call.
    pub fn accrue(stage: &mut Ledger, rate_numerator: u128, now: u64) -> CurveResult<u128> {
        let elapsed = now.saturating_sub(stage.last_inflation_at);
        stage.last_inflation_at = stage.last_inflation_at.max(now);
        if elapsed == 0 || rate_numerator == 0 || stage.minted_supply == 0 {
            return Ok(0);
        }
        let rate_over_elapsed = rate_numerator
            .checked_mul(u128::from(elapsed))
            .ok_or(CurveError::ArithmeticOverflow)?;
        let accrued =
            math::scale_by_fraction(rate_over_elapsed, stage.minted_supply, RATE_DENOMINATOR)?;
        stage.minted_supply = stage
            .minted_supply
            .checked_add(accrued)
            .ok_or(CurveError::ArithmeticOverflow)?;
        if accrued > 0 {
            tracing::debug!(accrued, elapsed, "inflation accrued");
        }
        Ok(accrued)
    }
}
