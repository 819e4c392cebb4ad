//! Exact rationals over integers or bignums (§4.D).
//!
//! A fraction is always stored reduced, with a strictly positive
//! denominator; the constructor canonicalizes a unit denominator down to
//! a plain [`Integer`], exactly as the arena-level object model does by
//! picking the `integer`/`fraction` tag at construction time.

use crate::error::{EvalError, EvalResult};
use crate::integer::Integer;
use core::cmp::Ordering;

/// Either an integer (denominator reduced to 1) or a proper reduced
/// fraction. Constructors return this instead of a bare `Fraction` so
/// that the "denominator 1 becomes an integer" invariant cannot be
/// bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rational {
    /// Denominator reduced to 1.
    Integer(Integer),
    /// A proper reduced fraction.
    Fraction(Fraction),
}

/// A reduced fraction: `numerator / denominator` with `denominator > 0`
/// and `gcd(|numerator|, denominator) = 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fraction {
    numerator: Integer,
    denominator: Integer,
}

impl Fraction {
    /// Build a reduced rational from a numerator and a non-zero
    /// denominator of any sign. Divides by `gcd(|num|, |den|)`, forces
    /// `den > 0`, and collapses to [`Rational::Integer`] when the reduced
    /// denominator is 1.
    pub fn new(numerator: Integer, denominator: Integer) -> EvalResult<Rational> {
        if denominator.is_zero() {
            return Err(EvalError::ZeroDivideError.into())
        }
        if numerator.is_zero() {
            return Ok(Rational::Integer(Integer::zero()))
        }
        let negative = numerator.is_negative() != denominator.is_negative();
        let num_abs = abs(&numerator);
        let den_abs = abs(&denominator);
        let g = num_abs.gcd(&den_abs);
        let (reduced_num, _) = num_abs.quorem(&g)?;
        let (reduced_den, _) = den_abs.quorem(&g)?;
        if reduced_den.to_i64() == Some(1) {
            return Ok(Rational::Integer(reduced_num.with_sign(negative)))
        }
        Ok(Rational::Fraction(Fraction {
            numerator: reduced_num.with_sign(negative),
            denominator: reduced_den,
        }))
    }

    /// The numerator (carries the fraction's sign).
    pub fn numerator(&self) -> &Integer {
        &self.numerator
    }

    /// The denominator (always positive).
    pub fn denominator(&self) -> &Integer {
        &self.denominator
    }

    fn cross(a: &Fraction, b: &Fraction) -> (Integer, Integer) {
        (a.numerator.mul(&b.denominator), b.numerator.mul(&a.denominator))
    }

    /// Add two fractions.
    pub fn add(&self, other: &Fraction) -> EvalResult<Rational> {
        let (an, bn) = Self::cross(self, other);
        let num = an.add(&bn);
        let den = self.denominator.mul(&other.denominator);
        Fraction::new(num, den)
    }

    /// Subtract `other` from `self`.
    pub fn sub(&self, other: &Fraction) -> EvalResult<Rational> {
        let (an, bn) = Self::cross(self, other);
        let num = an.sub(&bn);
        let den = self.denominator.mul(&other.denominator);
        Fraction::new(num, den)
    }

    /// Multiply two fractions.
    pub fn mul(&self, other: &Fraction) -> EvalResult<Rational> {
        let num = self.numerator.mul(&other.numerator);
        let den = self.denominator.mul(&other.denominator);
        Fraction::new(num, den)
    }

    /// Divide `self` by `other`.
    pub fn div(&self, other: &Fraction) -> EvalResult<Rational> {
        if other.numerator.is_zero() {
            return Err(EvalError::ZeroDivideError.into())
        }
        let num = self.numerator.mul(&other.denominator);
        let den = self.denominator.mul(&other.numerator);
        Fraction::new(num, den)
    }

    /// Modulo: returns a non-negative representative when the divisor is
    /// positive (§4.D). The exact sign convention for a negative divisor
    /// is an Open Question in the source; see `DESIGN.md` — this
    /// implementation uses floor division, so the result always carries
    /// the sign of `other`.
    pub fn modulo(&self, other: &Fraction) -> EvalResult<Rational> {
        // self/other as an exact fraction num/den, then floor-divide.
        let num = self.numerator.mul(other.denominator());
        let den = self.denominator.mul(other.numerator());
        let (q, r) = num.quorem(&den)?;
        let floor_q = if !r.is_zero() && (num.is_negative() != den.is_negative()) {
            q.sub(&Integer::new(false, 1))
        } else {
            q
        };
        let product = floor_q.mul(other.numerator());
        let product_den = other.denominator();
        let lhs_num = self.numerator.mul(product_den);
        let lhs_den = self.denominator.mul(product_den);
        let rhs_num = product.mul(&self.denominator);
        Fraction::new(lhs_num.sub(&rhs_num), lhs_den)
    }

    /// Compare two fractions by cross-multiplication.
    pub fn cmp(&self, other: &Fraction) -> Ordering {
        let (an, bn) = Self::cross(self, other);
        an.cmp(&bn)
    }
}

fn abs(value: &Integer) -> Integer {
    if value.is_negative() {
        value.neg()
    } else {
        value.clone()
    }
}

/// Convenience: build a [`Rational`] from native `i64`s.
pub fn from_i64(num: i64, den: i64) -> EvalResult<Rational> {
    let n = Integer::new(num < 0, num.unsigned_abs());
    let d = Integer::new(den < 0, den.unsigned_abs());
    Fraction::new(n, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_six_eighths() {
        let r = from_i64(6, 8).unwrap();
        match r {
            Rational::Fraction(f) => {
                assert_eq!(f.numerator().to_i64(), Some(3));
                assert_eq!(f.denominator().to_i64(), Some(4));
            }
            Rational::Integer(_) => panic!("expected a fraction"),
        }
    }

    #[test]
    fn negative_over_negative_is_positive() {
        let r = from_i64(-10, -25).unwrap();
        match r {
            Rational::Fraction(f) => {
                assert_eq!(f.numerator().to_i64(), Some(2));
                assert_eq!(f.denominator().to_i64(), Some(5));
            }
            Rational::Integer(_) => panic!("expected a fraction"),
        }
    }

    #[test]
    fn unit_denominator_collapses_to_integer() {
        let r = from_i64(4, 2).unwrap();
        assert!(matches!(r, Rational::Integer(_)));
    }

    #[test]
    fn addition_example() {
        let a = from_i64(1, 2).unwrap();
        let b = from_i64(1, 3).unwrap();
        if let (Rational::Fraction(a), Rational::Fraction(b)) = (a, b) {
            let sum = a.add(&b).unwrap();
            if let Rational::Fraction(f) = sum {
                assert_eq!(f.numerator().to_i64(), Some(5));
                assert_eq!(f.denominator().to_i64(), Some(6));
            } else {
                panic!("expected fraction");
            }
        }
    }
}
