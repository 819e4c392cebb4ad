//! Arithmetic dispatch: the numeric tower promotion rules that decide,
//! for any pair of operands, which representation the operation is
//! actually carried out in (§4.I).
//!
//! Promotion is narrowest-first: two exact integers/fractions stay
//! exact; a decimal or hardware float on either side promotes both
//! operands to that representation; a complex operand on either side
//! promotes both to complex. Division and power have their own
//! exactness-breaking rules (division that doesn't divide evenly drops
//! to a fraction rather than silently truncating; a non-integer exponent
//! always leaves the exact tower). A negative base raised to a
//! non-integer exponent promotes further still, out of the reals and
//! into [`Complex`], rather than raising a domain error.
//!
//! [`evaluate_unary`] applies the same promotion philosophy to the
//! single-operand functions (`sqrt`, the trig/hyperbolic set, the log
//! and gamma families, `IntPart`/`FracPart`/`ceil`/`floor`, ...), adding
//! exact-angle trig detection and the negative-argument-`sqrt`-to-complex
//! promotion named in §4.E/§4.I.

use crate::complex::Complex;
use crate::decimal::Decimal;
use crate::error::{EvalError, EvalResult};
use crate::fraction::{Fraction, Rational};
use crate::hwfp::HwFp;
use crate::integer::Integer;
use crate::settings::Settings;

/// Any leaf numeric value the dispatcher knows how to combine. Symbolic
/// expressions and polynomials are handled one layer up, by
/// [`crate::rewrite`] and [`crate::polynomial`] respectively (§4.I:
/// "non-numeric operands delegate to the symbolic layer").
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    /// Exact integer.
    Integer(Integer),
    /// Exact reduced fraction.
    Fraction(Fraction),
    /// Variable-precision decimal.
    Decimal(Decimal),
    /// Hardware double.
    HwFp(HwFp),
    /// Complex number.
    Complex(Complex),
}

impl NumericValue {
    /// Whether this value belongs to the exact (integer/fraction) tier.
    pub fn is_exact(&self) -> bool {
        matches!(self, NumericValue::Integer(_) | NumericValue::Fraction(_))
    }

    fn as_rational(&self) -> Option<Rational> {
        match self {
            NumericValue::Integer(i) => Some(Rational::Integer(i.clone())),
            NumericValue::Fraction(f) => Some(Rational::Fraction(f.clone())),
            _ => None,
        }
    }

    fn to_decimal(&self, settings: &Settings) -> Decimal {
        match self {
            NumericValue::Integer(i) => Decimal::from_f64(crate::integer::render_decimal(i, None).parse().unwrap_or(0.0), settings),
            NumericValue::Fraction(f) => Decimal::from_f64(
                f.numerator().to_i64().unwrap_or(0) as f64 / f.denominator().to_i64().unwrap_or(1) as f64,
                settings,
            ),
            NumericValue::Decimal(d) => d.clone(),
            NumericValue::HwFp(h) => h.to_decimal(settings),
            NumericValue::Complex(_) => Decimal::nan(),
        }
    }

    fn to_complex(&self, settings: &Settings) -> Complex {
        match self {
            NumericValue::Complex(c) => c.clone(),
            other => Complex::rectangular(other.to_decimal(settings), Decimal::zero()),
        }
    }

    fn rational(r: Rational) -> NumericValue {
        match r {
            Rational::Integer(i) => NumericValue::Integer(i),
            Rational::Fraction(f) => NumericValue::Fraction(f),
        }
    }
}

fn rank(value: &NumericValue) -> u8 {
    match value {
        NumericValue::Integer(_) => 0,
        NumericValue::Fraction(_) => 1,
        NumericValue::Decimal(_) => 2,
        NumericValue::HwFp(_) => 3,
        NumericValue::Complex(_) => 4,
    }
}

/// A binary arithmetic operator dispatched across the numeric tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
    /// `mod`
    Modulo,
}

/// Evaluate `op(x, y)`, promoting to the higher-ranked operand's
/// representation when the two operands differ in kind.
pub fn evaluate(op: BinaryOp, x: NumericValue, y: NumericValue, settings: &Settings) -> EvalResult<NumericValue> {
    if rank(&x) <= 1 && rank(&y) <= 1 {
        let xr = x.as_rational().expect("rank <= 1 is exact");
        let yr = y.as_rational().expect("rank <= 1 is exact");
        return Ok(NumericValue::rational(match op {
            BinaryOp::Add => rational_add(xr, yr)?,
            BinaryOp::Sub => rational_sub(xr, yr)?,
            BinaryOp::Mul => rational_mul(xr, yr)?,
            BinaryOp::Div => rational_div(xr, yr)?,
            BinaryOp::Modulo => rational_modulo(xr, yr)?,
            BinaryOp::Pow => {
                let exp = match &yr {
                    Rational::Integer(i) => i.to_i64(),
                    Rational::Fraction(_) => None,
                };
                match exp {
                    Some(exp) => rational_pow(xr, exp)?,
                    None => {
                        // A non-integer exponent breaks exactness: drop to
                        // the decimal path directly rather than recursing.
                        let xd = x_to_decimal(&xr, settings);
                        let yd = x_to_decimal(&yr, settings);
                        return Ok(match decimal_pow(&xd, &yd, settings)? {
                            DecimalOrComplex::Decimal(d) => NumericValue::Decimal(d),
                            DecimalOrComplex::Complex(c) => NumericValue::Complex(c),
                        })
                    }
                }
            }
        }))
    }
    let highest = rank(&x).max(rank(&y));
    if highest == 4 {
        let xc = x.to_complex(settings);
        let yc = y.to_complex(settings);
        return Ok(NumericValue::Complex(match op {
            BinaryOp::Add => xc.add(&yc, settings)?,
            BinaryOp::Sub => xc.sub(&yc, settings)?,
            BinaryOp::Mul => xc.mul(&yc, settings)?,
            BinaryOp::Div => xc.div(&yc, settings)?,
            BinaryOp::Pow | BinaryOp::Modulo => return Err(EvalError::TypeError.into()),
        }))
    }
    let xd = x.to_decimal(settings);
    let yd = y.to_decimal(settings);
    if let BinaryOp::Pow = op {
        if let DecimalOrComplex::Complex(c) = decimal_pow(&xd, &yd, settings)? {
            return Ok(NumericValue::Complex(c))
        }
    }
    let result = match op {
        BinaryOp::Add => xd.add(&yd, settings),
        BinaryOp::Sub => xd.sub(&yd, settings),
        BinaryOp::Mul => xd.mul(&yd, settings),
        BinaryOp::Div => xd.div(&yd, settings)?,
        BinaryOp::Modulo => xd.modulo(&yd, settings)?,
        BinaryOp::Pow => xd.pow(&yd, settings)?,
    };
    if highest == 3 {
        Ok(NumericValue::HwFp(HwFp::from_decimal(&result)))
    } else {
        Ok(NumericValue::Decimal(result))
    }
}

fn x_to_decimal(r: &Rational, settings: &Settings) -> Decimal {
    NumericValue::rational(r.clone()).to_decimal(settings)
}

enum DecimalOrComplex {
    Decimal(Decimal),
    Complex(Complex),
}

/// `base.pow(exponent)`, promoting to a complex result when `base` is
/// negative and `exponent` isn't an integer — [`Decimal::pow`] raises
/// [`EvalError::DomainError`] in exactly that case, which is the signal
/// this promotes on rather than re-deriving "is the exponent an integer"
/// here too. The complex value is `|base|^exponent * (cos(exponent*pi) +
/// i*sin(exponent*pi))`, the principal value for a negative real base
/// (whose argument is pi) raised to a real power (§4.I).
fn decimal_pow(base: &Decimal, exponent: &Decimal, settings: &Settings) -> EvalResult<DecimalOrComplex> {
    match base.pow(exponent, settings) {
        Ok(d) => Ok(DecimalOrComplex::Decimal(d)),
        Err(err) if base.is_negative() && !base.is_zero() && err.kind == EvalError::DomainError => {
            let magnitude = base.abs().pow(exponent, settings)?;
            let angle = exponent.to_f64() * core::f64::consts::PI;
            let re = Decimal::from_f64(libm::cos(angle), settings).mul(&magnitude, settings);
            let im = Decimal::from_f64(libm::sin(angle), settings).mul(&magnitude, settings);
            Ok(DecimalOrComplex::Complex(Complex::rectangular(re, im)))
        }
        Err(err) => Err(err),
    }
}

/// Add two exact rationals.
pub fn rational_add(a: Rational, b: Rational) -> EvalResult<Rational> {
    rational_binary(a, b, |x, y| x.add(&y), |x, y| Ok(Rational::Integer(x.add(&y))))
}
/// Subtract two exact rationals.
pub fn rational_sub(a: Rational, b: Rational) -> EvalResult<Rational> {
    rational_binary(a, b, |x, y| x.sub(&y), |x, y| Ok(Rational::Integer(x.sub(&y))))
}
/// Multiply two exact rationals.
pub fn rational_mul(a: Rational, b: Rational) -> EvalResult<Rational> {
    rational_binary(a, b, |x, y| x.mul(&y), |x, y| Ok(Rational::Integer(x.mul(&y))))
}
/// Divide two exact rationals.
pub fn rational_div(a: Rational, b: Rational) -> EvalResult<Rational> {
    match (a, b) {
        (Rational::Integer(x), Rational::Integer(y)) => {
            if y.is_zero() {
                return Err(EvalError::ZeroDivideError.into())
            }
            Fraction::new(x, y)
        }
        (a, b) => {
            let af = promote_to_fraction(a)?;
            let bf = promote_to_fraction(b)?;
            af.div(&bf)
        }
    }
}
/// Modulo of two exact rationals (see [`Fraction::modulo`] for the
/// fraction case; integers use the existing Euclidean `quorem`).
pub fn rational_modulo(a: Rational, b: Rational) -> EvalResult<Rational> {
    match (a, b) {
        (Rational::Integer(x), Rational::Integer(y)) => {
            let (_, r) = x.quorem(&y)?;
            Ok(Rational::Integer(if r.is_negative() != y.is_negative() && !r.is_zero() {
                r.add(&y)
            } else {
                r
            }))
        }
        (a, b) => {
            let af = promote_to_fraction(a)?;
            let bf = promote_to_fraction(b)?;
            af.modulo(&bf)
        }
    }
}
/// Raise an exact rational to an integer power (negative exponents
/// invert).
pub fn rational_pow(a: Rational, exp: i64) -> EvalResult<Rational> {
    match a {
        Rational::Integer(i) => {
            if exp >= 0 {
                Ok(Rational::Integer(i.pow(exp as u64)))
            } else {
                Fraction::new(Integer::new(false, 1), i.pow((-exp) as u64))
            }
        }
        Rational::Fraction(f) => {
            if exp >= 0 {
                Fraction::new(f.numerator().pow(exp as u64), f.denominator().pow(exp as u64))
            } else {
                Fraction::new(f.denominator().pow((-exp) as u64), f.numerator().pow((-exp) as u64))
            }
        }
    }
}

/// A unary numeric function dispatched across the tower the same way
/// [`evaluate`] dispatches binary operators: try the exact path first,
/// fall back to the decimal bridge, and to complex where a real
/// operation would otherwise fail (§4.I point 4, §4.E's public operation
/// list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Abs,
    Sign,
    Inv,
    Sq,
    Cubed,
    IntPart,
    FracPart,
    Ceil,
    Floor,
    Fact,
    Sqrt,
    Cbrt,
    Ln,
    Log2,
    Log10,
    Log1p,
    Exp,
    Exp2,
    Exp10,
    Expm1,
    Erf,
    Erfc,
    Tgamma,
    Lgamma,
    Trig(crate::decimal::TrigFunction),
}

/// Evaluate a unary function over the numeric tower, honoring exact-angle
/// trig detection and exact rational results wherever the operand and
/// operator both stay within the exact tier.
pub fn evaluate_unary(op: UnaryOp, x: NumericValue, settings: &Settings) -> EvalResult<NumericValue> {
    if x.is_exact() {
        if let Some(result) = exact_unary(op, &x)? {
            return Ok(NumericValue::rational(result))
        }
    }
    if let UnaryOp::Trig(func) = op {
        if !matches!(x, NumericValue::Complex(_)) {
            let d = x.to_decimal(settings);
            if let Some(exact) = d.exact_trig(func, settings) {
                return Ok(NumericValue::rational(exact))
            }
        }
    }
    match &x {
        NumericValue::Complex(c) => evaluate_unary_complex(op, c, settings).map(NumericValue::Complex),
        _ => {
            let d = x.to_decimal(settings);
            if matches!(op, UnaryOp::Sqrt) && d.is_negative() && !d.is_zero() {
                let im = d.neg().sqrt(settings)?;
                return Ok(NumericValue::Complex(Complex::rectangular(Decimal::zero(), im)))
            }
            let result = evaluate_unary_decimal(op, &d, settings)?;
            let promote_hw = matches!(x, NumericValue::HwFp(_));
            Ok(if promote_hw { NumericValue::HwFp(HwFp::from_decimal(&result)) } else { NumericValue::Decimal(result) })
        }
    }
}

/// Exact rational results for operators that never need to leave the
/// integer/fraction tier when the operand doesn't.
fn exact_unary(op: UnaryOp, x: &NumericValue) -> EvalResult<Option<Rational>> {
    let r = x.as_rational().expect("caller checked is_exact");
    Ok(match op {
        UnaryOp::Neg => Some(rational_neg(r)),
        UnaryOp::Sq => Some(rational_mul(r.clone(), r)?),
        UnaryOp::Cubed => {
            let sq = rational_mul(r.clone(), r.clone())?;
            Some(rational_mul(sq, r)?)
        }
        UnaryOp::Inv => Some(rational_div(Rational::Integer(Integer::new(false, 1)), r)?),
        UnaryOp::Abs => Some(match r {
            Rational::Integer(i) => Rational::Integer(i.with_sign(false)),
            Rational::Fraction(f) => {
                Fraction::new(f.numerator().with_sign(false), f.denominator().clone())?
            }
        }),
        UnaryOp::Sign => Some(Rational::Integer(match r {
            Rational::Integer(i) if i.is_zero() => Integer::zero(),
            Rational::Integer(i) => Integer::new(i.is_negative(), 1),
            Rational::Fraction(f) => Integer::new(f.numerator().is_negative(), 1),
        })),
        UnaryOp::Fact => {
            let Rational::Integer(i) = r else { return Err(EvalError::TypeError.into()) };
            Some(Rational::Integer(i.factorial()?))
        }
        UnaryOp::IntPart | UnaryOp::Floor | UnaryOp::Ceil if matches!(r, Rational::Integer(_)) => Some(r),
        UnaryOp::FracPart if matches!(r, Rational::Integer(_)) => Some(Rational::Integer(Integer::zero())),
        UnaryOp::IntPart => {
            let Rational::Fraction(f) = r else { unreachable!() };
            let (q, _) = f.numerator().quorem(f.denominator())?;
            Some(Rational::Integer(q))
        }
        UnaryOp::FracPart => {
            let Rational::Fraction(f) = r else { unreachable!() };
            let (q, _) = f.numerator().quorem(f.denominator())?;
            let whole = Fraction::new(q, Integer::new(false, 1))?;
            Some(rational_sub(Rational::Fraction(f), whole)?)
        }
        UnaryOp::Floor => {
            let Rational::Fraction(f) = r else { unreachable!() };
            let (q, rem) = f.numerator().quorem(f.denominator())?;
            Some(Rational::Integer(if !rem.is_zero() && f.numerator().is_negative() {
                q.sub(&Integer::new(false, 1))
            } else {
                q
            }))
        }
        UnaryOp::Ceil => {
            let Rational::Fraction(f) = r else { unreachable!() };
            let (q, rem) = f.numerator().quorem(f.denominator())?;
            Some(Rational::Integer(if !rem.is_zero() && !f.numerator().is_negative() {
                q.add(&Integer::new(false, 1))
            } else {
                q
            }))
        }
        _ => None,
    })
}

fn rational_neg(r: Rational) -> Rational {
    match r {
        Rational::Integer(i) => Rational::Integer(i.neg()),
        Rational::Fraction(f) => {
            Rational::Fraction(match Fraction::new(f.numerator().neg(), f.denominator().clone()) {
                Ok(Rational::Fraction(f)) => f,
                _ => unreachable!("negating a reduced fraction's numerator keeps it reduced"),
            })
        }
    }
}

fn evaluate_unary_decimal(op: UnaryOp, d: &Decimal, settings: &Settings) -> EvalResult<Decimal> {
    Ok(match op {
        UnaryOp::Neg => d.neg(),
        UnaryOp::Abs => d.abs(),
        UnaryOp::Sign => d.sign(),
        UnaryOp::Inv => d.inv(settings)?,
        UnaryOp::Sq => d.sq(settings),
        UnaryOp::Cubed => d.cubed(settings),
        UnaryOp::IntPart => d.int_part(settings),
        UnaryOp::FracPart => d.frac_part(settings),
        UnaryOp::Ceil => d.ceil(settings),
        UnaryOp::Floor => d.floor(settings),
        UnaryOp::Fact => d.fact(settings)?,
        UnaryOp::Sqrt => d.sqrt(settings)?,
        UnaryOp::Cbrt => d.cbrt(settings)?,
        UnaryOp::Ln => d.ln(settings)?,
        UnaryOp::Log2 => d.log2(settings)?,
        UnaryOp::Log10 => d.log10(settings)?,
        UnaryOp::Log1p => d.log1p(settings)?,
        UnaryOp::Exp => d.exp(settings),
        UnaryOp::Exp2 => d.exp2(settings),
        UnaryOp::Exp10 => d.exp10(settings),
        UnaryOp::Expm1 => d.expm1(settings),
        UnaryOp::Erf => d.erf(settings),
        UnaryOp::Erfc => d.erfc(settings),
        UnaryOp::Tgamma => d.tgamma(settings)?,
        UnaryOp::Lgamma => d.lgamma(settings),
        UnaryOp::Trig(func) => d.trig(func, settings)?,
    })
}

fn evaluate_unary_complex(op: UnaryOp, c: &Complex, settings: &Settings) -> EvalResult<Complex> {
    match op {
        UnaryOp::Neg => {
            let (re, im) = c.to_rectangular(settings)?;
            Ok(Complex::rectangular(re.neg(), im.neg()))
        }
        UnaryOp::Inv => {
            let one = Complex::rectangular(Decimal::from_i64(1), Decimal::zero());
            one.div(c, settings)
        }
        UnaryOp::Sq => c.mul(c, settings),
        UnaryOp::Cubed => c.mul(c, settings)?.mul(c, settings),
        _ => Err(EvalError::TypeError.into()),
    }
}

fn promote_to_fraction(r: Rational) -> EvalResult<Fraction> {
    match r {
        Rational::Fraction(f) => Ok(f),
        Rational::Integer(i) => match Fraction::new(i, Integer::new(false, 1))? {
            Rational::Fraction(f) => Ok(f),
            Rational::Integer(_) => unreachable!("denominator 1 with non-zero numerator cannot collapse further"),
        },
    }
}

fn rational_binary(
    a: Rational,
    b: Rational,
    frac_op: fn(&Fraction, &Fraction) -> EvalResult<Rational>,
    int_op: fn(&Integer, &Integer) -> EvalResult<Rational>,
) -> EvalResult<Rational> {
    match (a, b) {
        (Rational::Integer(x), Rational::Integer(y)) => int_op(&x, &y),
        (a, b) => {
            let af = promote_to_fraction(a)?;
            let bf = promote_to_fraction(b)?;
            frac_op(&af, &bf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn exact_plus_exact_stays_exact() {
        let a = NumericValue::Integer(Integer::new(false, 1));
        let b = NumericValue::Fraction(match Fraction::new(Integer::new(false, 1), Integer::new(false, 2)).unwrap() {
            Rational::Fraction(f) => f,
            _ => panic!(),
        });
        let result = evaluate(BinaryOp::Add, a, b, &settings()).unwrap();
        match result {
            NumericValue::Fraction(f) => {
                assert_eq!(f.numerator().to_i64(), Some(3));
                assert_eq!(f.denominator().to_i64(), Some(2));
            }
            _ => panic!("expected exact fraction"),
        }
    }

    #[test]
    fn decimal_operand_promotes_integer() {
        let a = NumericValue::Integer(Integer::new(false, 2));
        let b = NumericValue::Decimal(Decimal::from_i64(3));
        let result = evaluate(BinaryOp::Mul, a, b, &settings()).unwrap();
        assert!(matches!(result, NumericValue::Decimal(_)));
    }

    #[test]
    fn division_by_zero_errors() {
        let a = NumericValue::Integer(Integer::new(false, 1));
        let b = NumericValue::Integer(Integer::new(false, 0));
        assert!(evaluate(BinaryOp::Div, a, b, &settings()).is_err());
    }

    #[test]
    fn sin_of_thirty_degrees_is_exact_one_half() {
        let thirty = NumericValue::Integer(Integer::new(false, 30));
        let result = evaluate_unary(UnaryOp::Trig(crate::decimal::TrigFunction::Sin), thirty, &settings()).unwrap();
        match result {
            NumericValue::Fraction(f) => {
                assert_eq!(f.numerator().to_i64(), Some(1));
                assert_eq!(f.denominator().to_i64(), Some(2));
            }
            other => panic!("expected exact 1/2, got {other:?}"),
        }
    }

    #[test]
    fn sin_of_sixty_degrees_falls_back_to_decimal() {
        let sixty = NumericValue::Integer(Integer::new(false, 60));
        let result = evaluate_unary(UnaryOp::Trig(crate::decimal::TrigFunction::Sin), sixty, &settings()).unwrap();
        assert!(matches!(result, NumericValue::Decimal(_)));
    }

    #[test]
    fn sqrt_of_negative_promotes_to_complex() {
        let x = NumericValue::Integer(Integer::new(true, 4));
        let result = evaluate_unary(UnaryOp::Sqrt, x, &settings()).unwrap();
        match result {
            NumericValue::Complex(c) => {
                let (re, im) = c.to_rectangular(&settings()).unwrap();
                assert!(re.is_zero());
                assert!((im.to_f64() - 2.0).abs() < 1e-9);
            }
            other => panic!("expected complex result, got {other:?}"),
        }
    }

    #[test]
    fn negative_base_fractional_power_promotes_to_complex() {
        let base = NumericValue::Integer(Integer::new(true, 4));
        let exponent = NumericValue::Fraction(match Fraction::new(Integer::new(false, 1), Integer::new(false, 2)).unwrap() {
            Rational::Fraction(f) => f,
            _ => panic!(),
        });
        let result = evaluate(BinaryOp::Pow, base, exponent, &settings()).unwrap();
        match result {
            NumericValue::Complex(c) => {
                let (re, im) = c.to_rectangular(&settings()).unwrap();
                assert!(re.to_f64().abs() < 1e-9);
                assert!((im.to_f64() - 2.0).abs() < 1e-9);
            }
            other => panic!("expected complex result, got {other:?}"),
        }
    }

    #[test]
    fn negative_decimal_base_fractional_power_promotes_to_complex() {
        let base = NumericValue::Decimal(Decimal::from_f64(-4.0, &settings()));
        let exponent = NumericValue::Decimal(Decimal::from_f64(0.5, &settings()));
        let result = evaluate(BinaryOp::Pow, base, exponent, &settings()).unwrap();
        match result {
            NumericValue::Complex(c) => {
                let (re, im) = c.to_rectangular(&settings()).unwrap();
                assert!(re.to_f64().abs() < 1e-9);
                assert!((im.to_f64() - 2.0).abs() < 1e-9);
            }
            other => panic!("expected complex result, got {other:?}"),
        }
    }

    #[test]
    fn negative_base_integer_power_stays_exact() {
        let base = NumericValue::Integer(Integer::new(true, 2));
        let exponent = NumericValue::Integer(Integer::new(false, 3));
        let result = evaluate(BinaryOp::Pow, base, exponent, &settings()).unwrap();
        match result {
            NumericValue::Integer(i) => assert_eq!(i.to_i64(), Some(-8)),
            other => panic!("expected exact -8, got {other:?}"),
        }
    }

    #[test]
    fn floor_and_ceil_of_negative_fraction_stay_exact() {
        let half = NumericValue::Fraction(match Fraction::new(Integer::new(true, 7), Integer::new(false, 2)).unwrap() {
            Rational::Fraction(f) => f,
            _ => panic!(),
        });
        let floor = evaluate_unary(UnaryOp::Floor, half.clone(), &settings()).unwrap();
        let ceil = evaluate_unary(UnaryOp::Ceil, half, &settings()).unwrap();
        match (floor, ceil) {
            (NumericValue::Integer(f), NumericValue::Integer(c)) => {
                assert_eq!(f.to_i64(), Some(-4));
                assert_eq!(c.to_i64(), Some(-3));
            }
            other => panic!("expected exact integers, got {other:?}"),
        }
    }

    #[test]
    fn factorial_of_fraction_is_type_error() {
        let half = NumericValue::Fraction(match Fraction::new(Integer::new(false, 1), Integer::new(false, 2)).unwrap() {
            Rational::Fraction(f) => f,
            _ => panic!(),
        });
        assert!(evaluate_unary(UnaryOp::Fact, half, &settings()).is_err());
    }
}
