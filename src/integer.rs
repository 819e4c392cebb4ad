//! Small (native) integers and arbitrary-precision bignums, plus based
//! (non-decimal radix) integers (§4.C).
//!
//! An [`Integer`] transparently promotes from a native `u64` magnitude to
//! a [`BigUint`] on overflow, mirroring "any integer becomes a bignum on
//! overflow; bignum+integer operations auto-widen the integer to bignum."

use crate::bigint::BigUint;
use crate::error::{EvalError, EvalResult};
use crate::fraction::{Fraction, Rational};
use alloc::{format, string::String, vec::Vec};
use core::cmp::Ordering;

/// The magnitude of an integer: either a native fast-path word or an
/// arbitrary-precision bignum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Magnitude {
    /// Fits in a native word; the common, fast case.
    Small(u64),
    /// Overflowed the native word; computed via [`BigUint`].
    Big(BigUint),
}

impl Magnitude {
    fn to_big(&self) -> BigUint {
        match self {
            Magnitude::Small(v) => BigUint::from_u64(*v),
            Magnitude::Big(b) => b.clone(),
        }
    }

    fn normalize(big: BigUint) -> Magnitude {
        match big.to_u64() {
            Some(v) => Magnitude::Small(v),
            None => Magnitude::Big(big),
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Magnitude::Small(v) => *v == 0,
            Magnitude::Big(b) => b.is_zero(),
        }
    }

    fn cmp(&self, other: &Magnitude) -> Ordering {
        match (self, other) {
            (Magnitude::Small(a), Magnitude::Small(b)) => a.cmp(b),
            _ => self.to_big().cmp(&other.to_big()),
        }
    }
}

/// A sign-magnitude arbitrary-precision integer. Zero is always
/// represented with `negative = false` (§3: "a negative variant never
/// holds the value zero").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integer {
    negative: bool,
    magnitude: Magnitude,
}

impl Integer {
    /// Build from a native `u64` with an explicit sign.
    pub fn new(negative: bool, magnitude: u64) -> Self {
        let negative = negative && magnitude != 0;
        Integer { negative, magnitude: Magnitude::Small(magnitude) }
    }

    /// Build from a `BigUint` magnitude, demoting to the native path when
    /// it fits.
    pub fn from_big(negative: bool, magnitude: BigUint) -> Self {
        let is_zero = magnitude.is_zero();
        Integer { negative: negative && !is_zero, magnitude: Magnitude::normalize(magnitude) }
    }

    /// Zero.
    pub fn zero() -> Self {
        Integer::new(false, 0)
    }

    /// Whether the value is zero.
    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    /// Whether the value is negative.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whether this integer's magnitude fits the native fast path (i.e.
    /// no promotion to bignum has occurred).
    pub fn is_small(&self) -> bool {
        matches!(self.magnitude, Magnitude::Small(_))
    }

    /// The magnitude as a `BigUint`, promoting if necessary.
    pub fn magnitude_big(&self) -> BigUint {
        self.magnitude.to_big()
    }

    /// Convert to `i64` if it fits.
    pub fn to_i64(&self) -> Option<i64> {
        match &self.magnitude {
            Magnitude::Small(v) => {
                if self.negative {
                    i64::try_from(*v).ok().and_then(i64::checked_neg)
                } else {
                    i64::try_from(*v).ok()
                }
            }
            Magnitude::Big(_) => None,
        }
    }

    fn from_magnitude_sign(negative: bool, magnitude: Magnitude) -> Integer {
        let is_zero = magnitude.is_zero();
        Integer { negative: negative && !is_zero, magnitude }
    }

    /// Negate.
    pub fn neg(&self) -> Integer {
        Integer::from_magnitude_sign(!self.negative, self.magnitude.clone())
    }

    /// Return a copy of this integer's magnitude with a chosen sign,
    /// canonicalizing zero to positive.
    pub fn with_sign(&self, negative: bool) -> Integer {
        Integer::from_magnitude_sign(negative, self.magnitude.clone())
    }

    /// Add two integers.
    pub fn add(&self, other: &Integer) -> Integer {
        if self.negative == other.negative {
            let sum = match (&self.magnitude, &other.magnitude) {
                (Magnitude::Small(a), Magnitude::Small(b)) => match a.checked_add(*b) {
                    Some(v) => Magnitude::Small(v),
                    None => Magnitude::normalize(self.magnitude.to_big().add(&other.magnitude.to_big())),
                },
                _ => Magnitude::normalize(self.magnitude.to_big().add(&other.magnitude.to_big())),
            };
            Integer::from_magnitude_sign(self.negative, sum)
        } else {
            // Opposite signs: subtract the smaller magnitude from the larger.
            match self.magnitude.cmp(&other.magnitude) {
                Ordering::Equal => Integer::zero(),
                Ordering::Greater => {
                    let diff = self.magnitude.to_big().sub(&other.magnitude.to_big());
                    Integer::from_magnitude_sign(self.negative, Magnitude::normalize(diff))
                }
                Ordering::Less => {
                    let diff = other.magnitude.to_big().sub(&self.magnitude.to_big());
                    Integer::from_magnitude_sign(other.negative, Magnitude::normalize(diff))
                }
            }
        }
    }

    /// Subtract `other` from `self`.
    pub fn sub(&self, other: &Integer) -> Integer {
        self.add(&other.neg())
    }

    /// Multiply two integers.
    pub fn mul(&self, other: &Integer) -> Integer {
        let negative = self.negative != other.negative;
        let product = match (&self.magnitude, &other.magnitude) {
            (Magnitude::Small(a), Magnitude::Small(b)) => match a.checked_mul(*b) {
                Some(v) => Magnitude::Small(v),
                None => Magnitude::normalize(self.magnitude.to_big().mul(&other.magnitude.to_big())),
            },
            _ => Magnitude::normalize(self.magnitude.to_big().mul(&other.magnitude.to_big())),
        };
        Integer::from_magnitude_sign(negative, product)
    }

    /// Euclidean quotient and remainder: `remainder` has the sign of the
    /// divisor's magnitude convention (always non-negative), matching the
    /// textbook rational `quorem` the fraction and polynomial layers rely
    /// on. Returns [`EvalError::ZeroDivideError`] for division by zero.
    pub fn quorem(&self, other: &Integer) -> EvalResult<(Integer, Integer)> {
        if other.is_zero() {
            return Err(EvalError::ZeroDivideError.into())
        }
        let (q_mag, r_mag) = self
            .magnitude
            .to_big()
            .div_rem(&other.magnitude.to_big())
            .expect("divisor checked non-zero above");
        let q_negative = self.negative != other.negative;
        let quotient = Integer::from_magnitude_sign(q_negative, Magnitude::normalize(q_mag));
        let remainder = Integer::from_magnitude_sign(self.negative, Magnitude::normalize(r_mag));
        Ok((quotient, remainder))
    }

    /// Exponentiation by squaring, `self^exp`.
    pub fn pow(&self, exp: u64) -> Integer {
        let negative = self.negative && exp % 2 == 1;
        let magnitude = Magnitude::normalize(self.magnitude.to_big().pow(exp));
        Integer::from_magnitude_sign(negative, magnitude)
    }

    /// Factorial, `self!`. Defined for non-negative integers only.
    pub fn factorial(&self) -> EvalResult<Integer> {
        if self.negative {
            return Err(EvalError::DomainError.into())
        }
        let n = self.magnitude.to_big().to_u64().ok_or(EvalError::ValueError)?;
        let mut acc = Integer::new(false, 1);
        for i in 1..=n {
            acc = acc.mul(&Integer::new(false, i));
        }
        Ok(acc)
    }

    /// Greatest common divisor of the magnitudes (always non-negative).
    pub fn gcd(&self, other: &Integer) -> Integer {
        let g = self.magnitude.to_big().gcd(&other.magnitude.to_big());
        Integer::from_magnitude_sign(false, Magnitude::normalize(g))
    }

    /// Compare two integers.
    pub fn cmp(&self, other: &Integer) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
        }
    }

    /// Left shift, masked to `word_size` bits via the native path when the
    /// value fits; bignums shift without a word-size ceiling.
    pub fn shl(&self, amount: u32, word_size: u32) -> EvalResult<Integer> {
        if amount as u64 > u64::from(word_size) && self.is_small() {
            return Err(EvalError::DomainError.into())
        }
        match &self.magnitude {
            Magnitude::Small(v) if word_size <= 64 => {
                let mask = if word_size == 64 { u64::MAX } else { (1u64 << word_size) - 1 };
                let shifted = v.checked_shl(amount).unwrap_or(0) & mask;
                Ok(Integer::from_magnitude_sign(self.negative, Magnitude::Small(shifted)))
            }
            _ => {
                let shifted = self.magnitude.to_big().shl(amount);
                Ok(Integer::from_magnitude_sign(self.negative, Magnitude::normalize(shifted)))
            }
        }
    }

    /// Right shift (logical, on the magnitude).
    pub fn shr(&self, amount: u32) -> Integer {
        match &self.magnitude {
            Magnitude::Small(v) => {
                let shifted = if amount >= 64 { 0 } else { v >> amount };
                Integer::from_magnitude_sign(self.negative, Magnitude::Small(shifted))
            }
            Magnitude::Big(b) => Integer::from_magnitude_sign(self.negative, Magnitude::normalize(b.shr(amount))),
        }
    }

    /// Bitwise rotate left by `amount` bits within `word_size` bits
    /// (§4.C: "bitwise shift/rotate ... in both native and bignum
    /// flavours"). Rotation is only meaningful within a fixed bit width,
    /// so both flavours are folded to their low `word_size` bits (at
    /// most 64, matching [`crate::settings::Settings::mask_to_word_size`])
    /// before rotating.
    pub fn rotl(&self, amount: u32, word_size: u32) -> Integer {
        self.rotate(amount, word_size, true)
    }

    /// Bitwise rotate right by `amount` bits within `word_size` bits.
    pub fn rotr(&self, amount: u32, word_size: u32) -> Integer {
        self.rotate(amount, word_size, false)
    }

    fn rotate(&self, amount: u32, word_size: u32, left: bool) -> Integer {
        let bits = word_size.min(64);
        let v = match &self.magnitude {
            Magnitude::Small(v) => *v,
            Magnitude::Big(b) => b.low_u64(),
        };
        let rotated = rotate_u64(v, amount, bits, left);
        Integer::from_magnitude_sign(self.negative, Magnitude::Small(rotated))
    }
}

fn rotate_u64(v: u64, amount: u32, bits: u32, left: bool) -> u64 {
    if bits == 0 {
        return 0
    }
    let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let v = v & mask;
    let shift = amount % bits;
    if shift == 0 {
        return v
    }
    if left {
        ((v << shift) | (v >> (bits - shift))) & mask
    } else {
        ((v >> shift) | (v << (bits - shift))) & mask
    }
}

fn take_digits(text: &str) -> EvalResult<(Integer, &str)> {
    let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    if end == 0 {
        return Err(EvalError::SyntaxError.into())
    }
    let ten = Integer::new(false, 10);
    let mut value = Integer::zero();
    for c in text[..end].chars() {
        let digit = c.to_digit(10).expect("ascii digit checked above");
        value = value.mul(&ten).add(&Integer::new(false, u64::from(digit)));
    }
    Ok((value, &text[end..]))
}

/// Parse a degree-minute-second literal `d°m′s″` into a single
/// [`Rational`] value in degrees: `d + m/60 + s/3600` (§4.C, §6). The
/// minute and second components are optional — `d°` and `d°m′` are also
/// accepted — and the seconds component may itself carry a trailing
/// `/denominator` fraction, e.g. `1°2′3/4″`. Each component folds into
/// the running total as `existing + current * (1/60 or 1/3600)`.
pub fn parse_dms(text: &str) -> EvalResult<Rational> {
    let (degrees, rest) = take_digits(text)?;
    let rest = rest.strip_prefix('°').ok_or(EvalError::SyntaxError)?;
    let mut num = degrees;
    let mut den = Integer::new(false, 1);
    if rest.is_empty() {
        return Fraction::new(num, den)
    }

    let (minutes, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix('′').ok_or(EvalError::SyntaxError)?;
    num = num.mul(&Integer::new(false, 60)).add(&minutes);
    den = den.mul(&Integer::new(false, 60));
    if rest.is_empty() {
        return Fraction::new(num, den)
    }

    let (seconds, rest) = take_digits(rest)?;
    let (sec_num, sec_den, rest) = match rest.strip_prefix('/') {
        Some(after_slash) => {
            let (denom, rest) = take_digits(after_slash)?;
            (seconds, denom, rest)
        }
        None => (seconds, Integer::new(false, 1), rest),
    };
    let rest = rest.strip_prefix('″').ok_or(EvalError::SyntaxError)?;
    if !rest.is_empty() {
        return Err(EvalError::SyntaxError.into())
    }

    let seconds_den = sec_den.mul(&Integer::new(false, 3600));
    let new_num = num.mul(&seconds_den).add(&sec_num.mul(&den));
    let new_den = den.mul(&seconds_den);
    Fraction::new(new_num, new_den)
}

/// A "based" integer: an unsigned magnitude rendered/parsed in a
/// non-decimal radix and computed masked to the configured word size
/// (§4.C: "otherwise compute as unsigned integers masked to the current
/// word size").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasedInteger {
    /// The magnitude, already masked to the word size.
    pub magnitude: u64,
    /// The radix used for rendering/parsing (2..=36).
    pub radix: u32,
}

impl BasedInteger {
    /// Build a based integer, masking to `word_size` bits.
    pub fn new(magnitude: u64, radix: u32, word_size: u32) -> EvalResult<Self> {
        if !(2..=36).contains(&radix) {
            return Err(EvalError::InvalidBaseError.into())
        }
        let mask = if word_size >= 64 { u64::MAX } else { (1u64 << word_size) - 1 };
        Ok(BasedInteger { magnitude: magnitude & mask, radix })
    }

    /// Render in the configured radix, most significant digit first, with
    /// an optional digit-group separator every 4 digits (§4.C: "digit-group
    /// spacing ... based separators").
    pub fn render(&self, group_separator: Option<char>) -> String {
        if self.magnitude == 0 {
            return String::from("0")
        }
        let mut digits = Vec::new();
        let mut value = self.magnitude;
        while value > 0 {
            let digit = (value % u64::from(self.radix)) as u32;
            digits.push(core::char::from_digit(digit, self.radix).unwrap().to_ascii_uppercase());
            value /= u64::from(self.radix);
        }
        digits.reverse();
        match group_separator {
            None => digits.into_iter().collect(),
            Some(sep) => {
                let mut out = String::new();
                let len = digits.len();
                for (i, d) in digits.into_iter().enumerate() {
                    if i > 0 && (len - i) % 4 == 0 {
                        out.push(sep);
                    }
                    out.push(d);
                }
                out
            }
        }
    }

    /// Parse `#<digits><suffix>` where `suffix` is one of `b/o/d/h`
    /// selecting radix 2/8/10/16, or an explicit radix given by the
    /// caller (a leading `#` with no suffix uses the `base` setting).
    pub fn parse(text: &str, default_radix: u32, word_size: u32) -> EvalResult<Self> {
        let body = text.strip_prefix('#').ok_or(EvalError::BasedNumberError)?;
        let (digits, radix) = if let Some(rest) = body.strip_suffix(['b', 'B']) {
            (rest, 2)
        } else if let Some(rest) = body.strip_suffix(['o', 'O']) {
            (rest, 8)
        } else if let Some(rest) = body.strip_suffix(['d', 'D']) {
            (rest, 10)
        } else if let Some(rest) = body.strip_suffix(['h', 'H']) {
            (rest, 16)
        } else {
            (body, default_radix)
        };
        if digits.is_empty() {
            return Err(EvalError::BasedNumberError.into())
        }
        let mut value: u64 = 0;
        for c in digits.chars() {
            if c == '_' {
                continue
            }
            let digit = c.to_digit(radix).ok_or(EvalError::BasedDigitError)?;
            value = value
                .checked_mul(u64::from(radix))
                .and_then(|v| v.checked_add(u64::from(digit)))
                .ok_or(EvalError::BasedNumberError)?;
        }
        BasedInteger::new(value, radix, word_size)
    }
}

/// Render an integer with optional decimal digit-group separator.
pub fn render_decimal(value: &Integer, group_separator: Option<char>) -> String {
    let digits = value.magnitude.to_big().to_decimal_string();
    let grouped = match group_separator {
        None => digits,
        Some(sep) => {
            let len = digits.len();
            let mut out = String::new();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (len - i) % 3 == 0 {
                    out.push(sep);
                }
                out.push(c);
            }
            out
        }
    };
    if value.is_negative() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorial_of_25_is_a_bignum() {
        let n = Integer::new(false, 25);
        let result = n.factorial().unwrap();
        assert!(!result.is_small());
        assert_eq!(render_decimal(&result, None), "15511210043330985984000000");
    }

    #[test]
    fn addition_promotes_on_overflow() {
        let a = Integer::new(false, u64::MAX);
        let b = Integer::new(false, 1);
        let sum = a.add(&b);
        assert!(!sum.is_small());
    }

    #[test]
    fn negative_zero_is_canonical_positive() {
        let a = Integer::new(true, 5);
        let b = Integer::new(false, 5);
        assert!(!a.add(&b).is_negative());
        assert!(a.add(&b).is_zero());
    }

    #[test]
    fn based_render_and_parse_round_trip() {
        let based = BasedInteger::new(0xdead, 16, 64).unwrap();
        assert_eq!(based.render(None), "DEAD");
        let parsed = BasedInteger::parse("#DEADh", 10, 64).unwrap();
        assert_eq!(parsed.magnitude, 0xdead);
    }

    #[test]
    fn quorem_is_euclidean() {
        let a = Integer::new(true, 7);
        let b = Integer::new(false, 3);
        let (q, r) = a.quorem(&b).unwrap();
        assert_eq!(q.to_i64(), Some(-2));
        assert_eq!(r.to_i64(), Some(-1));
    }

    #[test]
    fn rotl_wraps_the_high_bit_around() {
        let byte = Integer::new(false, 0b1000_0001);
        let rotated = byte.rotl(1, 8);
        assert_eq!(rotated.to_i64(), Some(0b0000_0011));
    }

    #[test]
    fn rotr_wraps_the_low_bit_around() {
        let byte = Integer::new(false, 0b1000_0001);
        let rotated = byte.rotr(1, 8);
        assert_eq!(rotated.to_i64(), Some(0b1100_0000));
    }

    #[test]
    fn rotl_by_the_full_word_is_identity() {
        let value = Integer::new(false, 0x1234);
        assert_eq!(value.rotl(16, 16).to_i64(), Some(0x1234));
    }

    #[test]
    fn dms_degree_only() {
        let value = parse_dms("45°").unwrap();
        assert!(matches!(value, Rational::Integer(ref i) if i.to_i64() == Some(45)));
    }

    #[test]
    fn dms_degree_and_minutes() {
        let value = parse_dms("10°30′").unwrap();
        let Rational::Fraction(f) = value else { panic!("expected a fraction") };
        assert_eq!(f.numerator().to_i64(), Some(21));
        assert_eq!(f.denominator().to_i64(), Some(2));
    }

    #[test]
    fn dms_full_triple() {
        let value = parse_dms("30°15′20″").unwrap();
        let Rational::Fraction(f) = value else { panic!("expected a fraction") };
        assert_eq!(f.numerator().to_i64(), Some(2723));
        assert_eq!(f.denominator().to_i64(), Some(90));
    }

    #[test]
    fn dms_fractional_seconds() {
        let value = parse_dms("1°2′3/4″").unwrap();
        let Rational::Fraction(f) = value else { panic!("expected a fraction") };
        assert_eq!(f.numerator().to_i64(), Some(4961));
        assert_eq!(f.denominator().to_i64(), Some(4800));
    }

    #[test]
    fn dms_rejects_out_of_order_glyphs() {
        assert!(parse_dms("10′20°").is_err());
    }
}
