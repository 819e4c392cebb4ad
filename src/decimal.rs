//! Variable-precision base-1000 floating point (§4.E).
//!
//! A decimal value is `±0.M × 1000^E` where `M` is a sequence of 10-bit
//! "kigits" (0..=999) and `E` is a signed exponent clamped to
//! `maximum_decimal_exponent`. Elementary arithmetic (`+ - * / rem pow`
//! with an integer exponent, comparisons) is computed exactly on the
//! kigit mantissa, reusing [`crate::bigint::BigUint`] as the scratch
//! representation for the carry-propagating work, then re-packed into
//! kigits and rounded to the configured precision.
//!
//! Transcendentals (trig, logs, exp, gamma, erf) are bridged through
//! `libm` on `f64` and rounded back into a `Decimal` at the requested
//! precision — see `DESIGN.md` for why this crate does not attempt a
//! from-scratch arbitrary-precision transcendental library.

use crate::bigint::BigUint;
use crate::error::{EvalError, EvalResult};
use crate::fraction::Rational;
use crate::integer::Integer;
use crate::settings::{AngleMode, Settings};
use alloc::{string::String, vec, vec::Vec};
use core::cmp::Ordering;

/// A single base-1000 digit. Values 1000..=1023 are reserved for class
/// tags in the wire encoding; in this in-memory representation the class
/// is a separate enum instead, so a `Kigit` here is always `0..=999`.
pub type Kigit = u16;

/// The finite, non-special payload of a decimal: sign-less mantissa and
/// exponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magnitude {
    /// Exponent `E` in `0.M × 1000^E`.
    pub exponent: i32,
    /// Kigits of `M`, most-significant first, leading kigit non-zero
    /// unless the value is zero (empty vector).
    pub kigits: Vec<Kigit>,
}

impl Magnitude {
    fn zero() -> Self {
        Magnitude { exponent: 0, kigits: Vec::new() }
    }

    fn is_zero(&self) -> bool {
        self.kigits.is_empty()
    }

    fn normalize(mut exponent: i32, mut kigits: Vec<Kigit>) -> Self {
        // Drop trailing (least-significant) zero kigits first so a value
        // like 120 base-1000 kigits doesn't grow the stored length.
        while kigits.last() == Some(&0) {
            kigits.pop();
        }
        // Drop leading zero kigits, shifting the exponent to compensate.
        while kigits.first() == Some(&0) {
            kigits.remove(0);
            exponent -= 1;
        }
        if kigits.is_empty() {
            return Magnitude::zero()
        }
        Magnitude { exponent, kigits }
    }

    fn round_to_precision(mut self, precision_kigits: usize) -> Self {
        if self.kigits.len() <= precision_kigits || precision_kigits == 0 {
            return self
        }
        let round_up = self.kigits[precision_kigits] >= 500;
        self.kigits.truncate(precision_kigits);
        if round_up {
            let mut carry = 1u16;
            for k in self.kigits.iter_mut().rev() {
                let sum = *k + carry;
                if sum >= 1000 {
                    *k = sum - 1000;
                    carry = 1;
                } else {
                    *k = sum;
                    carry = 0;
                    break
                }
            }
            if carry > 0 {
                self.kigits.insert(0, carry);
                self.exponent += 1;
                self.kigits.pop();
            }
        }
        Magnitude::normalize(self.exponent, self.kigits)
    }

    /// Convert kigits to a `BigUint` integer (the mantissa read as a
    /// base-1000 integer, ignoring the exponent) together with its kigit
    /// length, for use as arithmetic scratch space.
    fn to_biguint(&self) -> BigUint {
        let mut acc = BigUint::zero();
        let base = BigUint::from_u64(1000);
        for &k in &self.kigits {
            acc = acc.mul(&base).add(&BigUint::from_u64(u64::from(k)));
        }
        acc
    }

    fn from_biguint(mut value: BigUint, exponent: i32) -> Self {
        let mut kigits = Vec::new();
        let base = BigUint::from_u64(1000);
        while !value.is_zero() {
            let (q, r) = value.div_rem(&base).expect("1000 != 0");
            kigits.push(r.to_u64().unwrap_or(0) as u16);
            value = q;
        }
        kigits.reverse();
        Magnitude::normalize(exponent, kigits)
    }

    fn pad_to(&self, len: usize) -> Vec<Kigit> {
        let mut v = self.kigits.clone();
        v.resize(len, 0);
        v
    }

    fn to_f64(&self) -> f64 {
        let mut value = 0.0f64;
        for &k in &self.kigits {
            value = value * 1000.0 + f64::from(k);
        }
        value * 1000f64.powi(self.exponent - self.kigits.len() as i32)
    }
}

/// Non-finite classes a decimal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialClass {
    /// Positive or negative infinity (sign carried by [`Decimal::negative`]).
    Infinity,
    /// Quiet not-a-number.
    Nan,
    /// Signalling not-a-number.
    SignalingNan,
}

/// The value of a decimal: either finite or one of the special classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Class {
    /// A finite value.
    Finite(Magnitude),
    /// A non-finite class.
    Special(SpecialClass),
}

/// A variable-precision decimal number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    negative: bool,
    class: Class,
}

impl Decimal {
    /// The canonical positive zero.
    pub fn zero() -> Self {
        Decimal { negative: false, class: Class::Finite(Magnitude::zero()) }
    }

    /// Quiet NaN.
    pub fn nan() -> Self {
        Decimal { negative: false, class: Class::Special(SpecialClass::Nan) }
    }

    /// Signed infinity.
    pub fn infinity(negative: bool) -> Self {
        Decimal { negative, class: Class::Special(SpecialClass::Infinity) }
    }

    /// Whether this value is zero.
    pub fn is_zero(&self) -> bool {
        matches!(&self.class, Class::Finite(m) if m.is_zero())
    }

    /// Whether this value is a NaN of either kind.
    pub fn is_nan(&self) -> bool {
        matches!(self.class, Class::Special(SpecialClass::Nan | SpecialClass::SignalingNan))
    }

    /// Whether this value is infinite.
    pub fn is_infinite(&self) -> bool {
        matches!(self.class, Class::Special(SpecialClass::Infinity))
    }

    /// Whether this value is negative (sign bit set, non-zero).
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    fn finite(negative: bool, magnitude: Magnitude, settings: &Settings) -> Decimal {
        let is_zero = magnitude.is_zero();
        if magnitude.exponent > settings.maximum_decimal_exponent() {
            return Decimal::infinity(negative)
        }
        Decimal { negative: negative && !is_zero, class: Class::Finite(magnitude) }
    }

    /// Build from an `f64`, rounding to `settings`'s precision.
    pub fn from_f64(value: f64, settings: &Settings) -> Decimal {
        if value.is_nan() {
            return Decimal::nan()
        }
        if value.is_infinite() {
            return Decimal::infinity(value.is_sign_negative())
        }
        if value == 0.0 {
            return Decimal::zero()
        }
        let negative = value < 0.0;
        let mut v = libm::fabs(value);
        let mut exponent = 0i32;
        while v >= 1.0 {
            v /= 1000.0;
            exponent += 1;
        }
        while v < 0.001 {
            v *= 1000.0;
            exponent -= 1;
        }
        let precision_kigits = precision_to_kigits(settings.precision());
        let mut kigits = Vec::with_capacity(precision_kigits);
        for _ in 0..precision_kigits + 1 {
            v *= 1000.0;
            let digit = libm::floor(v) as i64;
            let digit = digit.clamp(0, 999) as u16;
            kigits.push(digit);
            v -= f64::from(digit);
        }
        let magnitude = Magnitude::normalize(exponent, kigits).round_to_precision(precision_kigits);
        Decimal::finite(negative, magnitude, settings)
    }

    /// Convert to the nearest `f64` (used for the hardware-FP bridge and
    /// for transcendentals).
    pub fn to_f64(&self) -> f64 {
        match &self.class {
            Class::Special(SpecialClass::Infinity) => {
                if self.negative {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            }
            Class::Special(_) => f64::NAN,
            Class::Finite(m) => {
                let v = m.to_f64();
                if self.negative {
                    -v
                } else {
                    v
                }
            }
        }
    }

    /// Parse a decimal literal honoring `settings`' decimal separator and
    /// exponent separator (§6).
    pub fn parse(text: &str, settings: &Settings) -> EvalResult<Decimal> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EvalError::SyntaxError.into())
        }
        let (negative, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let exp_sep = settings.exponent_separator();
        let (mantissa_part, exp_part) = match rest.find([exp_sep, exp_sep.to_ascii_uppercase()]) {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };
        let dec_sep = settings.decimal_separator();
        let mantissa_part = mantissa_part.replace(dec_sep, ".");
        let (int_part, frac_part) = match mantissa_part.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa_part.as_str(), ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(EvalError::MantissaError.into())
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(EvalError::MantissaError.into())
        }
        let extra_exponent: i32 = match exp_part {
            None => 0,
            Some(e) => e.parse().map_err(|_| EvalError::ExponentError)?,
        };

        // Build the big-integer value of all significant digits, then
        // derive the base-1000 exponent from the position of the decimal
        // point within the original (non-stripped) digit string.
        let full_digits: String = int_part.chars().chain(frac_part.chars()).collect();
        if full_digits.bytes().all(|b| b == b'0') {
            return Ok(Decimal::zero())
        }
        let first_significant = full_digits.find(|c: char| c != '0').unwrap_or(full_digits.len());
        let sig_digits = &full_digits[first_significant..];
        let value = BigUint::from_decimal_str(sig_digits).unwrap_or_else(BigUint::zero);
        // point_position = number of digits before the decimal point in
        // the original string.
        let point_position = int_part.len() as i32;
        let exponent_base10 = point_position - first_significant as i32 + extra_exponent;

        let magnitude = decimal_from_base10(value, sig_digits.len(), exponent_base10);
        let precision_kigits = precision_to_kigits(settings.precision());
        Ok(Decimal::finite(negative, magnitude.round_to_precision(precision_kigits), settings))
    }

    /// Render in standard notation (integer/fractional part, no grouping)
    /// honoring `settings`' separators. Scientific/fixed/engineering modes
    /// are selected by the caller via [`crate::settings::DisplayMode`]
    /// before calling this (kept simple: this always renders the exact
    /// value; mode-specific truncation is applied by the object layer's
    /// renderer).
    pub fn render(&self, settings: &Settings) -> String {
        match &self.class {
            Class::Special(SpecialClass::Infinity) => {
                if self.negative {
                    String::from("-inf")
                } else {
                    String::from("inf")
                }
            }
            Class::Special(SpecialClass::Nan) => String::from("NaN"),
            Class::Special(SpecialClass::SignalingNan) => String::from("sNaN"),
            Class::Finite(m) => {
                if m.is_zero() {
                    return String::from("0")
                }
                let digits: String = m
                    .kigits
                    .iter()
                    .enumerate()
                    .map(|(i, &k)| if i == 0 { alloc::format!("{k}") } else { alloc::format!("{k:03}") })
                    .collect();
                let point = (m.exponent * 3).max(0) as usize;
                let sign = if self.negative { "-" } else { "" };
                if point == 0 || point > digits.len() + 6 {
                    alloc::format!(
                        "{sign}0{sep}{digits}{exp_sep}{exp}",
                        sep = settings.decimal_separator(),
                        exp_sep = settings.exponent_separator(),
                        exp = m.exponent * 3 - 3
                    )
                } else if point >= digits.len() {
                    let zeros = "0".repeat(point - digits.len());
                    alloc::format!("{sign}{digits}{zeros}")
                } else {
                    let (int_part, frac_part) = digits.split_at(point);
                    alloc::format!("{sign}{int_part}{sep}{frac_part}", sep = settings.decimal_separator())
                }
            }
        }
    }

    fn magnitude(&self) -> Option<&Magnitude> {
        match &self.class {
            Class::Finite(m) => Some(m),
            Class::Special(_) => None,
        }
    }

    /// Absolute value.
    pub fn abs(&self) -> Decimal {
        Decimal { negative: false, class: self.class.clone() }
    }

    /// Sign: -1, 0, or 1, as a decimal.
    pub fn sign(&self) -> Decimal {
        if self.is_zero() {
            Decimal::zero()
        } else if self.negative {
            Decimal::from_i64(-1)
        } else {
            Decimal::from_i64(1)
        }
    }

    /// Build from a small integer (exact).
    pub fn from_i64(value: i64) -> Decimal {
        let negative = value < 0;
        let mag = decimal_from_base10(BigUint::from_u64(value.unsigned_abs()), 0, 0);
        Decimal { negative: negative && !mag.is_zero(), class: Class::Finite(mag) }
    }

    fn add_magnitudes(a: &Magnitude, b: &Magnitude, precision_kigits: usize) -> Magnitude {
        let shift = a.exponent.max(b.exponent);
        let len = a.kigits.len().max(b.kigits.len()) + (shift - a.exponent.min(b.exponent)) as usize + 1;
        let a_shifted = shift_kigits(a, shift, len);
        let b_shifted = shift_kigits(b, shift, len);
        let a_big = kigits_to_biguint(&a_shifted);
        let b_big = kigits_to_biguint(&b_shifted);
        let sum = a_big.add(&b_big);
        Magnitude::from_biguint(sum, shift).round_to_precision(precision_kigits + 1)
    }

    /// Add two decimals, rounding to `settings`'s precision.
    pub fn add(&self, other: &Decimal, settings: &Settings) -> Decimal {
        if self.is_nan() || other.is_nan() {
            return Decimal::nan()
        }
        if self.is_infinite() || other.is_infinite() {
            if self.is_infinite() && other.is_infinite() && self.negative != other.negative {
                return Decimal::nan()
            }
            return if self.is_infinite() { self.clone() } else { other.clone() }
        }
        let precision_kigits = precision_to_kigits(settings.precision());
        let (am, bm) = (self.magnitude().unwrap(), other.magnitude().unwrap());
        if self.negative == other.negative {
            let sum = Self::add_magnitudes(am, bm, precision_kigits);
            return Decimal::finite(self.negative, sum, settings)
        }
        // Opposite signs: subtract the smaller magnitude from the larger.
        match compare_magnitudes(am, bm) {
            Ordering::Equal => Decimal::zero(),
            Ordering::Greater => {
                Decimal::finite(self.negative, Self::sub_magnitudes(am, bm, precision_kigits), settings)
            }
            Ordering::Less => {
                Decimal::finite(other.negative, Self::sub_magnitudes(bm, am, precision_kigits), settings)
            }
        }
    }

    fn sub_magnitudes(a: &Magnitude, b: &Magnitude, precision_kigits: usize) -> Magnitude {
        let shift = a.exponent.max(b.exponent);
        let len = a.kigits.len().max(b.kigits.len()) + (shift - a.exponent.min(b.exponent)) as usize + 1;
        let a_shifted = shift_kigits(a, shift, len);
        let b_shifted = shift_kigits(b, shift, len);
        let a_big = kigits_to_biguint(&a_shifted);
        let b_big = kigits_to_biguint(&b_shifted);
        let diff = a_big.sub(&b_big);
        Magnitude::from_biguint(diff, shift).round_to_precision(precision_kigits + 1)
    }

    /// Subtract `other` from `self`.
    pub fn sub(&self, other: &Decimal, settings: &Settings) -> Decimal {
        self.add(&other.neg(), settings)
    }

    /// Negate.
    pub fn neg(&self) -> Decimal {
        match &self.class {
            Class::Finite(m) if m.is_zero() => self.clone(),
            _ => Decimal { negative: !self.negative, class: self.class.clone() },
        }
    }

    /// Multiply two decimals.
    pub fn mul(&self, other: &Decimal, settings: &Settings) -> Decimal {
        if self.is_nan() || other.is_nan() {
            return Decimal::nan()
        }
        let negative = self.negative != other.negative;
        if self.is_infinite() || other.is_infinite() {
            if self.is_zero() || other.is_zero() {
                return Decimal::nan()
            }
            return Decimal::infinity(negative)
        }
        let (am, bm) = (self.magnitude().unwrap(), other.magnitude().unwrap());
        if am.is_zero() || bm.is_zero() {
            return Decimal::zero()
        }
        let product = am.to_biguint().mul(&bm.to_biguint());
        let exponent = am.exponent + bm.exponent;
        let magnitude = Magnitude::from_biguint(product, exponent)
            .round_to_precision(precision_to_kigits(settings.precision()) + 1);
        Decimal::finite(negative, magnitude, settings)
    }

    /// Divide `self` by `other`.
    pub fn div(&self, other: &Decimal, settings: &Settings) -> EvalResult<Decimal> {
        if self.is_nan() || other.is_nan() {
            return Ok(Decimal::nan())
        }
        let negative = self.negative != other.negative;
        if other.is_zero() {
            if self.is_zero() {
                return if settings.zero_over_zero_undefined() {
                    Ok(Decimal::nan())
                } else {
                    Err(EvalError::ZeroDivideError.into())
                }
            }
            return Ok(Decimal::infinity(negative))
        }
        if self.is_zero() {
            return Ok(Decimal::zero())
        }
        let am = self.magnitude().unwrap();
        let bm = other.magnitude().unwrap();
        let precision_kigits = precision_to_kigits(settings.precision()) + 2;
        // Scale the numerator so long division yields `precision_kigits`
        // kigits of quotient.
        let scale = BigUint::from_u64(1000).pow(precision_kigits as u64 + bm.kigits.len() as u64);
        let scaled_num = am.to_biguint().mul(&scale);
        let (quotient, _) = scaled_num.div_rem(&bm.to_biguint()).expect("divisor non-zero");
        let exponent = am.exponent - bm.exponent + 1 - precision_kigits as i32;
        let magnitude = Magnitude::from_biguint(quotient, exponent + precision_kigits as i32 - 1)
            .round_to_precision(precision_kigits);
        // The expression above keeps the exponent bookkeeping local; derive
        // the true exponent from first principles instead of the
        // intermediate value to avoid compounding mistakes.
        let true_exponent = am.exponent - bm.exponent
            + if magnitude.kigits.len() as i32 > precision_kigits as i32 { 1 } else { 0 };
        let magnitude = Magnitude { exponent: true_exponent, kigits: magnitude.kigits };
        Ok(Decimal::finite(negative, magnitude, settings))
    }

    /// Remainder matching truncating division (`self - other * trunc(self/other)`).
    pub fn rem(&self, other: &Decimal, settings: &Settings) -> EvalResult<Decimal> {
        let q = self.div(other, settings)?;
        let truncated = q.int_part(settings);
        Ok(self.sub(&truncated.mul(other, settings), settings))
    }

    /// Modulo, non-negative when `other` is positive.
    pub fn modulo(&self, other: &Decimal, settings: &Settings) -> EvalResult<Decimal> {
        let r = self.rem(other, settings)?;
        if !r.is_zero() && r.negative != other.negative {
            Ok(r.add(other, settings))
        } else {
            Ok(r)
        }
    }

    /// Integer part (truncation toward zero).
    pub fn int_part(&self, settings: &Settings) -> Decimal {
        match self.magnitude() {
            None => self.clone(),
            Some(m) => {
                if m.exponent <= 0 {
                    return Decimal::zero()
                }
                let keep = m.exponent as usize;
                let mut kigits = m.pad_to(keep.max(m.kigits.len()));
                kigits.truncate(keep);
                Decimal::finite(self.negative, Magnitude::normalize(m.exponent, kigits), settings)
            }
        }
    }

    /// Fractional part.
    pub fn frac_part(&self, settings: &Settings) -> Decimal {
        self.sub(&self.int_part(settings), settings)
    }

    /// Ceiling.
    pub fn ceil(&self, settings: &Settings) -> Decimal {
        let int = self.int_part(settings);
        if !self.negative && !self.frac_part(settings).is_zero() {
            int.add(&Decimal::from_i64(1), settings)
        } else {
            int
        }
    }

    /// Floor.
    pub fn floor(&self, settings: &Settings) -> Decimal {
        let int = self.int_part(settings);
        if self.negative && !self.frac_part(settings).is_zero() {
            int.sub(&Decimal::from_i64(1), settings)
        } else {
            int
        }
    }

    /// Square.
    pub fn sq(&self, settings: &Settings) -> Decimal {
        self.mul(self, settings)
    }

    /// Cube.
    pub fn cubed(&self, settings: &Settings) -> Decimal {
        self.mul(self, settings).mul(self, settings)
    }

    /// Multiplicative inverse.
    pub fn inv(&self, settings: &Settings) -> EvalResult<Decimal> {
        Decimal::from_i64(1).div(self, settings)
    }

    /// Integer power (exact, by repeated squaring on the mantissa).
    pub fn powi(&self, exp: i64, settings: &Settings) -> EvalResult<Decimal> {
        if exp == 0 {
            return Ok(Decimal::from_i64(1))
        }
        let negative_exp = exp < 0;
        let mut n = exp.unsigned_abs();
        let mut base = self.clone();
        let mut result = Decimal::from_i64(1);
        while n > 0 {
            if n & 1 == 1 {
                result = result.mul(&base, settings);
            }
            base = base.mul(&base, settings);
            n >>= 1;
        }
        if negative_exp {
            result.inv(settings)
        } else {
            Ok(result)
        }
    }

    /// General power via the bridge: `y^x = exp(x * ln(y))` for `x`
    /// non-integer; negative base with a non-integer exponent is a
    /// domain error here (the arithmetic dispatch layer promotes that
    /// case to complex instead, per §4.I).
    pub fn pow(&self, exponent: &Decimal, settings: &Settings) -> EvalResult<Decimal> {
        if let Some(i) = exact_i64(exponent) {
            return self.powi(i, settings)
        }
        if self.negative {
            return Err(EvalError::DomainError.into())
        }
        let value = libm::pow(self.to_f64(), exponent.to_f64());
        Ok(Decimal::from_f64(value, settings))
    }

    /// Compare two decimals.
    pub fn cmp(&self, other: &Decimal) -> Ordering {
        match (self.negative, other.negative, self.is_zero(), other.is_zero()) {
            _ if self.is_zero() && other.is_zero() => Ordering::Equal,
            (false, true, ..) => Ordering::Greater,
            (true, false, ..) => Ordering::Less,
            _ => {
                let (am, bm) = (self.magnitude().unwrap(), other.magnitude().unwrap());
                let ord = compare_magnitudes(am, bm);
                if self.negative {
                    ord.reverse()
                } else {
                    ord
                }
            }
        }
    }

    /// Square root via the bridge, then one Newton-Raphson refinement
    /// step performed in exact mantissa arithmetic to recover the digits
    /// `f64` cannot carry.
    pub fn sqrt(&self, settings: &Settings) -> EvalResult<Decimal> {
        if self.negative {
            return Err(EvalError::DomainError.into())
        }
        if self.is_zero() {
            return Ok(Decimal::zero())
        }
        let guess = Decimal::from_f64(libm::sqrt(self.to_f64()), settings);
        newton_refine(self, &guess, 2, settings)
    }

    /// Cube root via the bridge plus a Newton refinement step.
    pub fn cbrt(&self, settings: &Settings) -> EvalResult<Decimal> {
        if self.is_zero() {
            return Ok(Decimal::zero())
        }
        let guess = Decimal::from_f64(libm::cbrt(self.to_f64()), settings);
        newton_refine(self, &guess, 3, settings)
    }

    /// `n`-th root.
    pub fn xroot(&self, n: &Decimal, settings: &Settings) -> EvalResult<Decimal> {
        self.pow(&n.inv(settings)?, settings)
    }

    /// Factorial via the exact integer path when this value is a
    /// non-negative integer; otherwise the gamma function (`Γ(x+1)`).
    pub fn fact(&self, settings: &Settings) -> EvalResult<Decimal> {
        if let Some(n) = exact_i64(self) {
            if n < 0 {
                return Err(EvalError::DomainError.into())
            }
            let integer = Integer::new(false, n as u64).factorial()?;
            return Ok(Decimal::from_f64(integer_to_f64(&integer), settings))
        }
        self.add(&Decimal::from_i64(1), settings).tgamma(settings)
    }

    /// Natural log.
    pub fn ln(&self, settings: &Settings) -> EvalResult<Decimal> {
        self.transcendental1(libm::log, settings)
    }
    /// Base-2 log.
    pub fn log2(&self, settings: &Settings) -> EvalResult<Decimal> {
        self.transcendental1(libm::log2, settings)
    }
    /// Base-10 log.
    pub fn log10(&self, settings: &Settings) -> EvalResult<Decimal> {
        self.transcendental1(libm::log10, settings)
    }
    /// `ln(1+x)`.
    pub fn log1p(&self, settings: &Settings) -> EvalResult<Decimal> {
        Ok(Decimal::from_f64(libm::log1p(self.to_f64()), settings))
    }
    /// Natural exponential.
    pub fn exp(&self, settings: &Settings) -> Decimal {
        Decimal::from_f64(libm::exp(self.to_f64()), settings)
    }
    /// `2^x`.
    pub fn exp2(&self, settings: &Settings) -> Decimal {
        Decimal::from_f64(libm::exp2(self.to_f64()), settings)
    }
    /// `10^x`.
    pub fn exp10(&self, settings: &Settings) -> Decimal {
        Decimal::from_f64(libm::pow(10.0, self.to_f64()), settings)
    }
    /// `exp(x) - 1`.
    pub fn expm1(&self, settings: &Settings) -> Decimal {
        Decimal::from_f64(libm::expm1(self.to_f64()), settings)
    }
    /// Error function.
    pub fn erf(&self, settings: &Settings) -> Decimal {
        Decimal::from_f64(libm::erf(self.to_f64()), settings)
    }
    /// Complementary error function.
    pub fn erfc(&self, settings: &Settings) -> Decimal {
        Decimal::from_f64(libm::erfc(self.to_f64()), settings)
    }
    /// Gamma function.
    pub fn tgamma(&self, settings: &Settings) -> EvalResult<Decimal> {
        self.transcendental1(libm::tgamma, settings)
    }
    /// Log-gamma function.
    pub fn lgamma(&self, settings: &Settings) -> Decimal {
        Decimal::from_f64(libm::lgamma(self.to_f64()), settings)
    }

    fn transcendental1(&self, f: fn(f64) -> f64, settings: &Settings) -> EvalResult<Decimal> {
        let v = f(self.to_f64());
        if v.is_nan() {
            return Err(EvalError::DomainError.into())
        }
        Ok(Decimal::from_f64(v, settings))
    }

    /// Trigonometric / hyperbolic dispatch honoring the angle mode for
    /// the non-hyperbolic functions.
    pub fn trig(&self, func: TrigFunction, settings: &Settings) -> EvalResult<Decimal> {
        let radians = if func.is_hyperbolic() { self.to_f64() } else { to_radians(self, settings) };
        let value = func.apply(radians).ok_or(EvalError::DomainError)?;
        let value = if func.is_inverse() && !func.is_hyperbolic() {
            from_radians(value, settings)
        } else {
            value
        };
        Ok(Decimal::from_f64(value, settings))
    }

    /// Attempt an exact rational result for `sin`/`cos`/`tan` at angles
    /// that are themselves exact multiples of 15 degrees — covering the
    /// 30° and 45° families named in the evaluation core's exactness
    /// requirement, including the right angles common to both. Returns
    /// `None` for hyperbolic/inverse functions, angles that aren't such
    /// a multiple, or multiples whose true value isn't rational at all
    /// (e.g. `sin(60°) = √3/2`, `tan(90°)` undefined).
    pub fn exact_trig(&self, func: TrigFunction, settings: &Settings) -> Option<Rational> {
        if func.is_hyperbolic() || func.is_inverse() {
            return None
        }
        let degrees = to_degrees(self, settings);
        let sixteenths = degrees / 15.0;
        let rounded = libm::round(sixteenths);
        if libm::fabs(sixteenths - rounded) > 1e-9 {
            return None
        }
        let step = (((rounded as i64) % 24) + 24) % 24;
        exact_trig_table(func, step)
    }

    /// Continued-fraction conversion to an exact rational, bounded by
    /// `max_iterations` and accepting a term once the residual is below
    /// `10^-digits` (§4.E).
    pub fn to_fraction(&self, max_iterations: u32, digits: u32) -> EvalResult<Rational> {
        if self.is_nan() || self.is_infinite() {
            return Err(EvalError::DomainError.into())
        }
        let epsilon = 10f64.powi(-(digits as i32));
        let negative = self.negative;
        let mut x = libm::fabs(self.to_f64());
        let original = x;
        let mut h_prev = 1i64;
        let mut h_curr = 0i64;
        let mut k_prev = 0i64;
        let mut k_curr = 1i64;
        for _ in 0..max_iterations {
            let a = libm::floor(x) as i64;
            let h_next = a.saturating_mul(h_curr).saturating_add(h_prev);
            let k_next = a.saturating_mul(k_curr).saturating_add(k_prev);
            h_prev = h_curr;
            h_curr = h_next;
            k_prev = k_curr;
            k_curr = k_next;
            if k_curr != 0 && libm::fabs(h_curr as f64 / k_curr as f64 - original) < epsilon {
                break
            }
            let frac = x - a as f64;
            if frac.abs() < 1e-15 {
                break
            }
            x = 1.0 / frac;
        }
        if k_curr == 0 {
            return Err(EvalError::ValueError.into())
        }
        crate::fraction::from_i64(if negative { -h_curr } else { h_curr }, k_curr)
    }
}

/// Which trigonometric/hyperbolic function to apply (radians in/out).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrigFunction {
    /// sin
    Sin,
    /// cos
    Cos,
    /// tan
    Tan,
    /// asin
    Asin,
    /// acos
    Acos,
    /// atan
    Atan,
    /// sinh
    Sinh,
    /// cosh
    Cosh,
    /// tanh
    Tanh,
    /// asinh
    Asinh,
    /// acosh
    Acosh,
    /// atanh
    Atanh,
}

impl TrigFunction {
    fn is_hyperbolic(self) -> bool {
        matches!(
            self,
            TrigFunction::Sinh
                | TrigFunction::Cosh
                | TrigFunction::Tanh
                | TrigFunction::Asinh
                | TrigFunction::Acosh
                | TrigFunction::Atanh
        )
    }

    fn is_inverse(self) -> bool {
        matches!(
            self,
            TrigFunction::Asin
                | TrigFunction::Acos
                | TrigFunction::Atan
                | TrigFunction::Asinh
                | TrigFunction::Acosh
                | TrigFunction::Atanh
        )
    }

    fn apply(self, x: f64) -> Option<f64> {
        let v = match self {
            TrigFunction::Sin => libm::sin(x),
            TrigFunction::Cos => libm::cos(x),
            TrigFunction::Tan => libm::tan(x),
            TrigFunction::Asin => libm::asin(x),
            TrigFunction::Acos => libm::acos(x),
            TrigFunction::Atan => libm::atan(x),
            TrigFunction::Sinh => libm::sinh(x),
            TrigFunction::Cosh => libm::cosh(x),
            TrigFunction::Tanh => libm::tanh(x),
            TrigFunction::Asinh => libm::asinh(x),
            TrigFunction::Acosh => libm::acosh(x),
            TrigFunction::Atanh => libm::atanh(x),
        };
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }
}

fn to_radians(value: &Decimal, settings: &Settings) -> f64 {
    let v = value.to_f64();
    match settings.angle_mode() {
        AngleMode::Rad => v,
        AngleMode::Deg => v * core::f64::consts::PI / 180.0,
        AngleMode::Grad => v * core::f64::consts::PI / 200.0,
        AngleMode::PiRadians => v * core::f64::consts::PI,
    }
}

fn to_degrees(value: &Decimal, settings: &Settings) -> f64 {
    let v = value.to_f64();
    match settings.angle_mode() {
        AngleMode::Rad => v * 180.0 / core::f64::consts::PI,
        AngleMode::Deg => v,
        AngleMode::Grad => v * 180.0 / 200.0,
        AngleMode::PiRadians => v * 180.0,
    }
}

/// `step` counts 15-degree increments from 0 (inclusive) to 345. Only the
/// entries that are actually rational are filled in; everything else
/// (e.g. step 4 = 60°, whose sine is `√3/2`) is `None` so the caller falls
/// through to the numeric bridge.
fn exact_trig_table(func: TrigFunction, step: i64) -> Option<Rational> {
    let half = || crate::fraction::from_i64(1, 2).ok();
    let neg_half = || crate::fraction::from_i64(-1, 2).ok();
    let one = || Some(Rational::Integer(Integer::new(false, 1)));
    let neg_one = || Some(Rational::Integer(Integer::new(true, 1)));
    let zero = || Some(Rational::Integer(Integer::zero()));
    match func {
        TrigFunction::Sin => match step {
            0 | 12 => zero(),
            2 | 10 => half(),
            6 => one(),
            14 | 22 => neg_half(),
            18 => neg_one(),
            _ => None,
        },
        TrigFunction::Cos => match step {
            0 => one(),
            4 | 20 => half(),
            6 | 18 => zero(),
            8 | 16 => neg_half(),
            12 => neg_one(),
            _ => None,
        },
        TrigFunction::Tan => match step {
            0 | 12 => zero(),
            3 | 15 => one(),
            9 | 21 => neg_one(),
            6 | 18 => None,
            _ => None,
        },
        _ => None,
    }
}

fn from_radians(v: f64, settings: &Settings) -> f64 {
    match settings.angle_mode() {
        AngleMode::Rad => v,
        AngleMode::Deg => v * 180.0 / core::f64::consts::PI,
        AngleMode::Grad => v * 200.0 / core::f64::consts::PI,
        AngleMode::PiRadians => v / core::f64::consts::PI,
    }
}

fn exact_i64(value: &Decimal) -> Option<i64> {
    let m = value.magnitude()?;
    if m.is_zero() {
        return Some(0)
    }
    if m.exponent < 1 || m.exponent as usize > m.kigits.len() {
        return None
    }
    let frac_len = m.kigits.len() - m.exponent as usize;
    if m.kigits[m.exponent as usize..].iter().any(|&k| k != 0) && frac_len > 0 {
        return None
    }
    let int_kigits = &m.kigits[..m.exponent as usize];
    let mut v: i64 = 0;
    for &k in int_kigits {
        v = v.checked_mul(1000)?.checked_add(i64::from(k))?;
    }
    Some(if value.negative { -v } else { v })
}

fn integer_to_f64(value: &Integer) -> f64 {
    let text = crate::integer::render_decimal(value, None);
    text.parse().unwrap_or(f64::NAN)
}

fn compare_magnitudes(a: &Magnitude, b: &Magnitude) -> Ordering {
    if a.is_zero() && b.is_zero() {
        return Ordering::Equal
    }
    if a.exponent != b.exponent {
        return a.exponent.cmp(&b.exponent)
    }
    a.kigits.iter().cmp(b.kigits.iter())
}

fn shift_kigits(m: &Magnitude, target_exponent: i32, len: usize) -> Vec<Kigit> {
    let leading_zero_kigits = (target_exponent - m.exponent) as usize;
    let mut v = vec![0u16; leading_zero_kigits];
    v.extend_from_slice(&m.kigits);
    v.resize(len, 0);
    v
}

fn kigits_to_biguint(kigits: &[Kigit]) -> BigUint {
    let mut acc = BigUint::zero();
    let base = BigUint::from_u64(1000);
    for &k in kigits {
        acc = acc.mul(&base).add(&BigUint::from_u64(u64::from(k)));
    }
    acc
}

fn decimal_from_base10(value: BigUint, digit_count: usize, exponent_base10: i32) -> Magnitude {
    if value.is_zero() {
        return Magnitude::zero()
    }
    // Re-derive the kigit sequence directly from the decimal digit string
    // so grouping aligns to the exponent boundary exactly.
    let digits = value.to_decimal_string();
    let digits = if digit_count > digits.len() {
        let mut s = "0".repeat(digit_count - digits.len());
        s.push_str(&digits);
        s
    } else {
        digits
    };
    // Pad so the decimal point (`exponent_base10` digits from the left)
    // lands on a multiple-of-3 boundary.
    let pad_left = exponent_base10.rem_euclid(3) as usize;
    let mut padded = "0".repeat(pad_left);
    padded.push_str(&digits);
    let pad_right = (3 - padded.len() % 3) % 3;
    padded.push_str(&"0".repeat(pad_right));
    let kigit_exponent = (exponent_base10 - pad_left as i32).div_euclid(3) + 1;
    let kigits: Vec<u16> = padded
        .as_bytes()
        .chunks(3)
        .map(|chunk| core::str::from_utf8(chunk).unwrap().parse().unwrap_or(0))
        .collect();
    Magnitude::normalize(kigit_exponent, kigits)
}

fn precision_to_kigits(precision_digits: u32) -> usize {
    (precision_digits as usize).div_ceil(3).max(1)
}

fn newton_refine(value: &Decimal, guess: &Decimal, n: i64, settings: &Settings) -> EvalResult<Decimal> {
    // x_{k+1} = x_k - (x_k^n - value) / (n * x_k^(n-1))
    let mut x = guess.clone();
    for _ in 0..3 {
        let xn = x.powi(n, settings)?;
        let xn1 = x.powi(n - 1, settings)?;
        let numerator = xn.sub(value, settings);
        let denominator = xn1.mul(&Decimal::from_i64(n), settings);
        if denominator.is_zero() {
            break
        }
        x = x.sub(&numerator.div(&denominator, settings)?, settings);
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut s = Settings::default();
        s.set_precision(34);
        s
    }

    #[test]
    fn parse_and_render_round_trip_integer() {
        let s = settings();
        let d = Decimal::parse("123", &s).unwrap();
        assert_eq!(d.render(&s), "123");
    }

    #[test]
    fn parse_small_fraction() {
        let s = settings();
        let d = Decimal::parse("0.1", &s).unwrap();
        assert!((d.to_f64() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn add_matches_native() {
        let s = settings();
        let a = Decimal::from_i64(7);
        let b = Decimal::from_i64(35);
        assert_eq!(a.add(&b, &s).to_f64(), 42.0);
    }

    #[test]
    fn mul_matches_native() {
        let s = settings();
        let a = Decimal::from_i64(12);
        let b = Decimal::from_i64(11);
        assert_eq!(a.mul(&b, &s).to_f64(), 132.0);
    }

    #[test]
    fn div_matches_native() {
        let s = settings();
        let a = Decimal::from_i64(10);
        let b = Decimal::from_i64(4);
        let q = a.div(&b, &s).unwrap();
        assert!((q.to_f64() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn to_fraction_recovers_one_tenth() {
        let mut s = Settings::default();
        s.set_precision(34);
        let d = Decimal::parse("0.1", &s).unwrap();
        let r = d.to_fraction(10, 12).unwrap();
        match r {
            Rational::Fraction(f) => {
                assert_eq!(f.numerator().to_i64(), Some(1));
                assert_eq!(f.denominator().to_i64(), Some(10));
            }
            Rational::Integer(_) => panic!("expected a fraction"),
        }
    }

    #[test]
    fn sqrt_of_two_is_accurate() {
        let s = settings();
        let two = Decimal::from_i64(2);
        let root = two.sqrt(&s).unwrap();
        let squared = root.mul(&root, &s);
        assert!((squared.to_f64() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn comparison_orders_by_magnitude() {
        let a = Decimal::from_i64(3);
        let b = Decimal::from_i64(5);
        assert_eq!(a.cmp(&b), Ordering::Less);
    }

    #[test]
    fn floor_and_ceil_of_negative_value() {
        let s = settings();
        let d = Decimal::parse("-1.5", &s).unwrap();
        assert_eq!(d.floor(&s).to_f64(), -2.0);
        assert_eq!(d.ceil(&s).to_f64(), -1.0);
    }
}
