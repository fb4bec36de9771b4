//! Bonding-Curve Ledger
//!
//! A bonding-curve ledger that prices creation ("buy") and redemption
//! ("sell") of a synthetic token against a collateral reserve, following a
//! pluggable monotonic curve shape, with continuous supply inflation and a
//! one-way burn ("deflate") path.
//!
//! This crate provides:
//! - A curve-scaling model that decouples curve shape from reserve scale
//! - Forward pricing and exact inverse pricing via bounded binary search
//! - Lazy continuous-time auto-inflation minted to a beneficiary
//! - Buy/sell/deflate orchestration with slippage limits and fee extraction
//!
//! Token balances, escrow custody, configuration storage and the clock are
//! external collaborators injected through traits; the crate owns only the
//! pricing, inversion, accrual and orchestration logic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod constants;
pub mod curve;
pub mod error;
pub mod inflation;
pub mod ledger;
pub mod math;
pub mod pricing;
pub mod processor;


pub use constants::{MAX_BUY_SEARCH, MAX_COLLATERAL_DOMAIN, RATE_DENOMINATOR};
pub use curve::{CurveExpression, CurveModel, LinearCurve, PolynomialCurve, SquareRootCurve};
pub use error::{CurveError, CurveResult};
pub use inflation::InflationScheduler;
pub use ledger::Ledger;
pub use math::U256;
pub use pricing::{InverseSolver, PriceEngine};
pub use processor::{
    BuyOutcome, Clock, Event, ParameterStore, SellOutcome, SystemClock, TokenLedger,
    TransactionProcessor,
};

/// Opaque account identifier understood by the token collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u128);

/// Curve configuration supplied by the external parameter store.
///
/// Both rate numerators are expressed over [`RATE_DENOMINATOR`]. The
/// beneficiary may stay unset until an operation actually owes it a reward
/// mint (inflation accrual or a nonzero spread fee).
#[derive(Clone)]
pub struct CurveParameters {
    pub beneficiary: Option<AccountId>,
    pub inflation_rate_numerator: u128,
    pub spread_fee_numerator: u128,
    pub curve: Arc<dyn CurveExpression>,
}

impl CurveParameters {
    pub fn validate(&self) -> CurveResult<()> {
        if self.inflation_rate_numerator > RATE_DENOMINATOR {
            return Err(CurveError::Configuration(
                "inflation rate numerator exceeds denominator".into(),
            ));
        }
        if self.spread_fee_numerator > RATE_DENOMINATOR {
            return Err(CurveError::Configuration(
                "spread fee numerator exceeds denominator".into(),
            ));
        }
        Ok(())
    }
}
