//! Complex numbers, rectangular and polar (§4.G).
//!
//! Polar form stores its argument as a [`Rational`] multiple of pi rather
//! than a decimal angle, so that exact angles (the output of the exact
//! trig detection in [`crate::decimal`]) survive a rectangular/polar
//! round trip without rounding. Rectangular form stores real and
//! imaginary parts as [`Decimal`]; that is the numeric tower's common
//! denominator once a value needs to carry an imaginary component at all.
//! Arithmetic is always performed in rectangular form and then
//! re-expressed in whichever form the caller asked for — this crate does
//! not attempt to keep a product of two polar values exact, since doing
//! so only pays off for angles that are themselves already exact
//! multiples of pi (see `DESIGN.md`).

use crate::decimal::Decimal;
use crate::error::EvalResult;
use crate::fraction::Rational;
use crate::integer::Integer;
use crate::settings::{AngleMode, Settings};

/// A complex number in either rectangular or polar representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Complex {
    /// `re + im*i`.
    Rectangular {
        /// Real part.
        re: Decimal,
        /// Imaginary part.
        im: Decimal,
    },
    /// `modulus * exp(i * argument_over_pi * pi)`.
    Polar {
        /// Non-negative modulus.
        modulus: Decimal,
        /// Argument as an exact multiple of pi, e.g. `1/2` for `pi/2`.
        argument_over_pi: Rational,
    },
}

impl Complex {
    /// The canonical complex zero (rectangular `0 + 0i`).
    pub fn zero() -> Self {
        Complex::Rectangular { re: Decimal::zero(), im: Decimal::zero() }
    }

    /// Build a rectangular complex number.
    pub fn rectangular(re: Decimal, im: Decimal) -> Self {
        Complex::Rectangular { re, im }
    }

    /// Build a polar complex number from a modulus and an exact
    /// pi-fraction argument.
    pub fn polar(modulus: Decimal, argument_over_pi: Rational) -> Self {
        Complex::Polar { modulus, argument_over_pi }
    }

    fn argument_as_f64(argument_over_pi: &Rational) -> f64 {
        match argument_over_pi {
            Rational::Integer(i) => i.to_i64().unwrap_or(0) as f64,
            Rational::Fraction(f) => {
                f.numerator().to_i64().unwrap_or(0) as f64 / f.denominator().to_i64().unwrap_or(1) as f64
            }
        }
    }

    /// Convert to rectangular form.
    pub fn to_rectangular(&self, settings: &Settings) -> EvalResult<(Decimal, Decimal)> {
        match self {
            Complex::Rectangular { re, im } => Ok((re.clone(), im.clone())),
            Complex::Polar { modulus, argument_over_pi } => {
                let angle_radians =
                    Decimal::from_f64(Self::argument_as_f64(argument_over_pi) * core::f64::consts::PI, settings);
                let re = modulus.mul(&angle_radians.trig(crate::decimal::TrigFunction::Cos, settings)?, settings);
                let im = modulus.mul(&angle_radians.trig(crate::decimal::TrigFunction::Sin, settings)?, settings);
                Ok((re, im))
            }
        }
    }

    /// Convert to polar form. The argument is computed numerically via
    /// `atan2` and then snapped to the nearest exact multiple of pi/12
    /// when within `settings`'s precision tolerance, recovering exactness
    /// for the common "nice" angles (§4.G, extending §4.E's exact-angle
    /// detection to the complex plane).
    pub fn to_polar(&self, settings: &Settings) -> EvalResult<(Decimal, Rational)> {
        match self {
            Complex::Polar { modulus, argument_over_pi } => Ok((modulus.clone(), argument_over_pi.clone())),
            Complex::Rectangular { re, im } => {
                let modulus = re.mul(re, settings).add(&im.mul(im, settings), settings).sqrt(settings)?;
                let angle_radians = libm::atan2(im.to_f64(), re.to_f64());
                let over_pi = angle_radians / core::f64::consts::PI;
                Ok((modulus, snap_to_twelfths(over_pi, settings.precision())))
            }
        }
    }

    /// Render the stored polar argument in a target angle unit.
    pub fn convert_angle(argument_over_pi: &Rational, mode: AngleMode, settings: &Settings) -> Decimal {
        let over_pi = Self::argument_as_f64(argument_over_pi);
        let radians = over_pi * core::f64::consts::PI;
        let value = match mode {
            AngleMode::Rad => radians,
            AngleMode::Deg => radians * 180.0 / core::f64::consts::PI,
            AngleMode::Grad => radians * 200.0 / core::f64::consts::PI,
            AngleMode::PiRadians => over_pi,
        };
        Decimal::from_f64(value, settings)
    }

    /// Addition (always via rectangular form).
    pub fn add(&self, other: &Complex, settings: &Settings) -> EvalResult<Complex> {
        let (a_re, a_im) = self.to_rectangular(settings)?;
        let (b_re, b_im) = other.to_rectangular(settings)?;
        Ok(Complex::rectangular(a_re.add(&b_re, settings), a_im.add(&b_im, settings)))
    }

    /// Subtraction.
    pub fn sub(&self, other: &Complex, settings: &Settings) -> EvalResult<Complex> {
        let (a_re, a_im) = self.to_rectangular(settings)?;
        let (b_re, b_im) = other.to_rectangular(settings)?;
        Ok(Complex::rectangular(a_re.sub(&b_re, settings), a_im.sub(&b_im, settings)))
    }

    /// Multiplication.
    pub fn mul(&self, other: &Complex, settings: &Settings) -> EvalResult<Complex> {
        let (a_re, a_im) = self.to_rectangular(settings)?;
        let (b_re, b_im) = other.to_rectangular(settings)?;
        let re = a_re.mul(&b_re, settings).sub(&a_im.mul(&b_im, settings), settings);
        let im = a_re.mul(&b_im, settings).add(&a_im.mul(&b_re, settings), settings);
        Ok(Complex::rectangular(re, im))
    }

    /// Division.
    pub fn div(&self, other: &Complex, settings: &Settings) -> EvalResult<Complex> {
        let (a_re, a_im) = self.to_rectangular(settings)?;
        let (b_re, b_im) = other.to_rectangular(settings)?;
        let denom = b_re.mul(&b_re, settings).add(&b_im.mul(&b_im, settings), settings);
        let re = a_re.mul(&b_re, settings).add(&a_im.mul(&b_im, settings), settings).div(&denom, settings)?;
        let im = a_im.mul(&b_re, settings).sub(&a_re.mul(&b_im, settings), settings).div(&denom, settings)?;
        Ok(Complex::rectangular(re, im))
    }

    /// Complex conjugate.
    pub fn conj(&self, settings: &Settings) -> EvalResult<Complex> {
        let (re, im) = self.to_rectangular(settings)?;
        Ok(Complex::rectangular(re, im.neg()))
    }

    /// Modulus (absolute value).
    pub fn abs(&self, settings: &Settings) -> EvalResult<Decimal> {
        let (modulus, _) = self.to_polar(settings)?;
        Ok(modulus)
    }

    /// Whether both parts are (canonically) zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Complex::Rectangular { re, im } => re.is_zero() && im.is_zero(),
            Complex::Polar { modulus, .. } => modulus.is_zero(),
        }
    }
}

/// Snap `over_pi` to the nearest twelfth when it is within tolerance,
/// otherwise keep it as a high-denominator rational approximation (the
/// renderer displays these via [`Complex::convert_angle`] instead of
/// attempting to show the raw fraction).
fn snap_to_twelfths(over_pi: f64, precision_digits: u32) -> Rational {
    let twelfths = libm::round(over_pi * 12.0);
    let tolerance = 10f64.powi(-((precision_digits as i32).clamp(1, 15)));
    let numerator;
    let denominator;
    if libm::fabs(over_pi * 12.0 - twelfths) < tolerance.max(1e-9) {
        numerator = twelfths as i64;
        denominator = 12i64;
    } else {
        denominator = 1_000_000_000i64;
        numerator = libm::round(over_pi * denominator as f64) as i64;
    }
    crate::fraction::from_i64(numerator, denominator).unwrap_or(Rational::Integer(Integer::zero()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut s = Settings::default();
        s.set_precision(20);
        s
    }

    #[test]
    fn rectangular_addition() {
        let s = settings();
        let a = Complex::rectangular(Decimal::from_i64(1), Decimal::from_i64(2));
        let b = Complex::rectangular(Decimal::from_i64(3), Decimal::from_i64(-1));
        let sum = a.add(&b, &s).unwrap();
        if let Complex::Rectangular { re, im } = sum {
            assert_eq!(re.to_f64(), 4.0);
            assert_eq!(im.to_f64(), 1.0);
        } else {
            panic!("expected rectangular");
        }
    }

    #[test]
    fn modulus_of_three_four_five_triangle() {
        let s = settings();
        let c = Complex::rectangular(Decimal::from_i64(3), Decimal::from_i64(4));
        let m = c.abs(&s).unwrap();
        assert!((m.to_f64() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn conjugate_negates_imaginary_part() {
        let s = settings();
        let c = Complex::rectangular(Decimal::from_i64(2), Decimal::from_i64(5));
        let conj = c.conj(&s).unwrap();
        if let Complex::Rectangular { re, im } = conj {
            assert_eq!(re.to_f64(), 2.0);
            assert_eq!(im.to_f64(), -5.0);
        } else {
            panic!("expected rectangular");
        }
    }

    #[test]
    fn rectangular_to_polar_recovers_right_angle() {
        let s = settings();
        let c = Complex::rectangular(Decimal::zero(), Decimal::from_i64(1));
        let (modulus, argument) = c.to_polar(&s).unwrap();
        assert!((modulus.to_f64() - 1.0).abs() < 1e-9);
        match argument {
            Rational::Fraction(f) => {
                assert_eq!(f.numerator().to_i64(), Some(1));
                assert_eq!(f.denominator().to_i64(), Some(2));
            }
            Rational::Integer(_) => panic!("expected pi/2"),
        }
    }
}
