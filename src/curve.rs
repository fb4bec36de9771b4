//! Curve shapes and the curve-scaling model
//!
//! This module contains:
//! - The `CurveExpression` trait every pluggable curve shape implements
//! - Concrete linear, polynomial and square-root shapes
//! - `CurveModel`, which ties an abstract shape to the ledger's actual
//!   collateral reserve
//!
//! The shape defines only the *relative* pricing behavior; the ledger defines
//! the absolute scale. This lets the held collateral diverge from what the
//! raw curve equation would produce (inflation dilution, external capital)
//! while prices still track the curve's shape.

use crate::error::{CurveError, CurveResult};
use crate::ledger::Ledger;
use crate::math::{self, U256};

/// A pure, deterministic, monotonically non-decreasing function from a
/// supply value to an unscaled raw value.
///
/// Monotonicity over the supported supply domain is a contract the
/// implementation must uphold; the inversion search relies on it and does
/// not verify it.
pub trait CurveExpression: Send + Sync {
    fn evaluate(&self, supply: u128) -> CurveResult<U256>;
}

/// `raw = slope * supply`
#[derive(Debug, Clone, Copy)]
pub struct LinearCurve {
    pub slope: u128,
}

impl LinearCurve {
    pub fn new(slope: u128) -> Self {
        Self { slope }
    }
}

impl Default for LinearCurve {
    fn default() -> Self {
        Self { slope: 1 }
    }
}

impl CurveExpression for LinearCurve {
    fn evaluate(&self, supply: u128) -> CurveResult<U256> {
        Ok(U256::from(self.slope) * U256::from(supply))
    }
}

/// `raw = coefficient * supply^exponent`
#[derive(Debug, Clone, Copy)]
pub struct PolynomialCurve {
    pub coefficient: u128,
    pub exponent: u32,
}

impl PolynomialCurve {
    pub fn new(coefficient: u128, exponent: u32) -> Self {
        Self {
            coefficient,
            exponent,
        }
    }
}

impl CurveExpression for PolynomialCurve {
    fn evaluate(&self, supply: u128) -> CurveResult<U256> {
        let mut raw = U256::from(self.coefficient);
        for _ in 0..self.exponent {
            raw = math::mul_u256(raw, U256::from(supply))
                .map_err(|_| CurveError::CurveEvaluation("polynomial raw value overflow".into()))?;
        }
        Ok(raw)
    }
}

/// `raw = coefficient * supply * floor(sqrt(supply))`, i.e. supply^1.5
#[derive(Debug, Clone, Copy)]
pub struct SquareRootCurve {
    pub coefficient: u128,
}

impl SquareRootCurve {
    pub fn new(coefficient: u128) -> Self {
        Self { coefficient }
    }
}

impl CurveExpression for SquareRootCurve {
    fn evaluate(&self, supply: u128) -> CurveResult<U256> {
        // supply * isqrt(supply) stays below 2^192 and always fits
        let scaled = U256::from(supply) * U256::from(isqrt(supply));
        math::mul_u256(U256::from(self.coefficient), scaled)
            .map_err(|_| CurveError::CurveEvaluation("square-root raw value overflow".into()))
    }
}

/// Integer square root via Newton's method
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    // Initial guess is a power of two at least sqrt(n)
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Converts a curve shape into an actual-collateral-at-supply function
/// consistent with the ledger's current state.
pub struct CurveModel<'a> {
    ledger: &'a Ledger,
    curve: &'a dyn CurveExpression,
}

impl<'a> CurveModel<'a> {
    pub fn new(ledger: &'a Ledger, curve: &'a dyn CurveExpression) -> Self {
        Self { ledger, curve }
    }

    /// Collateral the reserve would hold at `hypothetical_supply`.
    ///
    /// While the curve has not been scaled to any real reserve (raw value at
    /// the current supply is zero), the raw value is returned directly.
    /// Afterwards the raw value is rescaled by the ratio between held
    /// collateral and the raw value at the current supply.
    ///
    /// The evaluator carries no memoized state, so it is invoked twice per
    /// call; callers own any caching.
    pub fn collateral_at_supply(&self, hypothetical_supply: u128) -> CurveResult<u128> {
        let raw_current = self.curve.evaluate(self.ledger.minted_supply)?;
        let raw_hypothetical = self.curve.evaluate(hypothetical_supply)?;
        if raw_current.is_zero() {
            return math::narrow(raw_hypothetical);
        }
        let scaled = math::mul_u256(raw_hypothetical, U256::from(self.ledger.held_collateral))?
            / raw_current;
        math::narrow(scaled)
    }
}
