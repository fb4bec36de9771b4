//! Fixed-point multiply-then-divide arithmetic
//!
//! Every place money is scaled by a rate (fees, inflation, curve rescaling)
//! routes through this module. Multiplication happens before division, in a
//! 256-bit intermediate, so no precision is lost and no intermediate wraps.

use uint::construct_uint;

use crate::error::{CurveError, CurveResult};

construct_uint! {
    /// Fixed-width 256-bit integer used for precise intermediate math.
    pub struct U256(4);
}

/// Computes `floor(value * numerator / denominator)` without intermediate
/// overflow. Fails with `ArithmeticOverflow` if the denominator is zero or
/// the result does not fit in a u128.
pub fn scale_by_fraction(value: u128, numerator: u128, denominator: u128) -> CurveResult<u128> {
    if denominator == 0 {
        return Err(CurveError::ArithmeticOverflow);
    }
    // A 128x128 product always fits in 256 bits
    let wide = U256::from(value) * U256::from(numerator);
    narrow(wide / U256::from(denominator))
}

/// 256-bit multiplication that reports overflow instead of wrapping
pub(crate) fn mul_u256(a: U256, b: U256) -> CurveResult<U256> {
    let (result, overflowed) = a.overflowing_mul(b);
    if overflowed {
        Err(CurveError::ArithmeticOverflow)
    } else {
        Ok(result)
    }
}

/// Narrows a 256-bit value back to u128, failing if the high half is set
pub(crate) fn narrow(value: U256) -> CurveResult<u128> {
    if value > U256::from(u128::MAX) {
        Err(CurveError::ArithmeticOverflow)
    } else {
        Ok(value.low_u128())
    }
}
