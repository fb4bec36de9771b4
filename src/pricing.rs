//! Forward pricing and exact inverse pricing
//!
//! `PriceEngine` answers "what does minting N more tokens cost" and "what
//! does burning N tokens refund". `InverseSolver` answers the inverse
//! questions by bounded binary search over the engine, with rounding chosen
//! so that any sub-unit remainder stays with the reserve, never with the
//! caller.

use crate::constants::{MAX_BUY_SEARCH, MAX_COLLATERAL_DOMAIN};
use crate::curve::{CurveExpression, CurveModel};
use crate::error::{CurveError, CurveResult};
use crate::ledger::Ledger;

/// Forward pricing against a ledger snapshot
pub struct PriceEngine<'a> {
    ledger: &'a Ledger,
    model: CurveModel<'a>,
}

impl<'a> PriceEngine<'a> {
    pub fn new(ledger: &'a Ledger, curve: &'a dyn CurveExpression) -> Self {
        Self {
            ledger,
            model: CurveModel::new(ledger, curve),
        }
    }

    /// Marginal cost, in collateral units, to mint `amount` additional
    /// tokens from the current state.
    pub fn buy_price(&self, amount: u128) -> CurveResult<u128> {
        let target_supply = self
            .ledger
            .minted_supply
            .checked_add(amount)
            .ok_or(CurveError::ArithmeticOverflow)?;
        let at_target = self.model.collateral_at_supply(target_supply)?;
        // Floor rescaling can leave the model a unit below the held reserve
        Ok(at_target.saturating_sub(self.ledger.held_collateral))
    }

    /// Refund, in collateral units, for burning `amount` tokens.
    pub fn sell_price(&self, amount: u128) -> CurveResult<u128> {
        let remaining_supply = self.ledger.minted_supply.checked_sub(amount).ok_or(
            CurveError::InsufficientSupply {
                requested: amount,
                supply: self.ledger.minted_supply,
            },
        )?;
        let at_remaining = self.model.collateral_at_supply(remaining_supply)?;
        Ok(self.ledger.held_collateral.saturating_sub(at_remaining))
    }
}

/// Bounded binary search over a `PriceEngine`
pub struct InverseSolver<'a> {
    engine: PriceEngine<'a>,
}

impl<'a> InverseSolver<'a> {
    pub fn new(engine: PriceEngine<'a>) -> Self {
        Self { engine }
    }

    /// Largest token amount whose buy price does not exceed
    /// `collateral_budget`.
    ///
    /// The caller never receives more tokens than the budget buys at the
    /// curve's true marginal price; any remainder is refunded to the caller
    /// by the transaction layer, not absorbed by the curve.
    pub fn buy_price_inv(&self, collateral_budget: u128) -> CurveResult<u128> {
        if collateral_budget > MAX_COLLATERAL_DOMAIN {
            return Err(CurveError::ExceedsMaxDomain);
        }
        let mut low = 0u128;
        let mut high = MAX_BUY_SEARCH;
        while low < high {
            // Upper midpoint: the floor search keeps the last amount that fits
            let mid = low + (high - low + 1) / 2;
            if self.affordable(mid, collateral_budget)? {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        Ok(low)
    }

    /// Whether `amount` is affordable within `budget`.
    ///
    /// Super-linear curves overflow the raw value at midpoints near the
    /// search bound. The accepted budget is capped below u128::MAX and
    /// prices are monotone, so a price too wide to represent exceeds any
    /// budget the solver accepts and counts as unaffordable.
    fn affordable(&self, amount: u128, budget: u128) -> CurveResult<bool> {
        match self.engine.buy_price(amount) {
            Ok(price) => Ok(price <= budget),
            Err(CurveError::ArithmeticOverflow) | Err(CurveError::CurveEvaluation(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Smallest token amount whose sell price reaches `collateral_target`.
    ///
    /// The caller burns at least enough tokens to justify the collateral
    /// they receive, never less. If even burning the whole supply cannot
    /// reach the target, the supply bound is returned and the transaction
    /// layer's proceeds floor rejects the operation.
    pub fn sell_price_inv(&self, collateral_target: u128) -> CurveResult<u128> {
        if collateral_target > MAX_COLLATERAL_DOMAIN {
            return Err(CurveError::ExceedsMaxDomain);
        }
        let mut low = 0u128;
        let mut high = self.engine.ledger.minted_supply;
        while low < high {
            // Lower midpoint: the ceiling search keeps the first amount that reaches
            let mid = low + (high - low) / 2;
            if self.engine.sell_price(mid)? >= collateral_target {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        Ok(low)
    }
}
