//! Hardware floating point bridge (§4.F).
//!
//! Wraps a native `f64` so the arithmetic dispatcher can offer a fast,
//! non-exact numeric path alongside the decimal kigit representation.
//! A hardware float never silently becomes the "truth" for a
//! computation that started exact: promotion from [`crate::decimal::Decimal`]
//! to `HwFp` only happens when `settings.hardware_floating_point()` is set
//! and the operands are already inexact, mirroring the "acceleration
//! only" note in the Design Notes.

use crate::decimal::Decimal;
use crate::error::{EvalError, EvalResult};
use crate::fraction::Rational;
use crate::settings::Settings;
use core::cmp::Ordering;

/// A hardware double-precision float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HwFp(f64);

impl HwFp {
    /// Wrap a native `f64` verbatim.
    pub fn new(value: f64) -> Self {
        HwFp(value)
    }

    /// The wrapped value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Promote a [`Decimal`] to hardware float.
    pub fn from_decimal(value: &Decimal) -> Self {
        HwFp(value.to_f64())
    }

    /// Demote back to a [`Decimal`] at `settings`'s precision (§4.F:
    /// "converting back to decimal re-enters the arena at the caller's
    /// configured precision, never at `f64`'s native ~17 digits").
    pub fn to_decimal(self, settings: &Settings) -> Decimal {
        Decimal::from_f64(self.0, settings)
    }

    /// Whether hardware float should be used for this pair of operands,
    /// per `settings.hardware_floating_point()`.
    pub fn promotion_applies(settings: &Settings, a_is_exact: bool, b_is_exact: bool) -> bool {
        settings.hardware_floating_point() && !(a_is_exact && b_is_exact)
    }

    /// Addition.
    pub fn add(self, other: HwFp) -> HwFp {
        HwFp(self.0 + other.0)
    }
    /// Subtraction.
    pub fn sub(self, other: HwFp) -> HwFp {
        HwFp(self.0 - other.0)
    }
    /// Multiplication.
    pub fn mul(self, other: HwFp) -> HwFp {
        HwFp(self.0 * other.0)
    }
    /// Division, `±inf` on division by zero (IEEE 754 semantics, matching
    /// the hardware path rather than [`EvalError::ZeroDivideError`]).
    pub fn div(self, other: HwFp) -> HwFp {
        HwFp(self.0 / other.0)
    }
    /// Negation.
    pub fn neg(self) -> HwFp {
        HwFp(-self.0)
    }
    /// Absolute value.
    pub fn abs(self) -> HwFp {
        HwFp(libm::fabs(self.0))
    }

    /// Whether the value is NaN.
    pub fn is_nan(self) -> bool {
        self.0.is_nan()
    }
    /// Whether the value is infinite.
    pub fn is_infinite(self) -> bool {
        self.0.is_infinite()
    }

    /// Total ordering (NaN sorts as undefined; callers should check
    /// [`HwFp::is_nan`] first, matching IEEE comparison semantics where a
    /// NaN comparison is never true).
    pub fn partial_cmp(self, other: HwFp) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }

    /// Continued-fraction conversion to an exact rational, same algorithm
    /// and termination rule as [`Decimal::to_fraction`] but starting from
    /// the native float directly (cheaper when the value already lives in
    /// the hardware path).
    pub fn to_fraction(self, max_iterations: u32, digits: u32) -> EvalResult<Rational> {
        if self.is_nan() || self.is_infinite() {
            return Err(EvalError::DomainError.into())
        }
        Decimal::from_f64(self.0, &Settings::default()).to_fraction(max_iterations, digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_matches_native_f64() {
        let a = HwFp::new(1.5);
        let b = HwFp::new(2.25);
        assert_eq!(a.add(b).value(), 3.75);
        assert_eq!(a.mul(b).value(), 3.375);
    }

    #[test]
    fn round_trip_through_decimal_preserves_precision() {
        let settings = Settings::default();
        let hw = HwFp::new(core::f64::consts::PI);
        let dec = hw.to_decimal(&settings);
        let back = HwFp::from_decimal(&dec);
        assert!((back.value() - core::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn division_by_zero_is_infinite_not_an_error() {
        let a = HwFp::new(1.0);
        let zero = HwFp::new(0.0);
        assert!(a.div(zero).is_infinite());
    }
}
