//! The arena object model: a closed, self-describing tagged union of
//! every value the kernel can hold on its stack or in its arena (§3,
//! §4.B, §6).
//!
//! Every object begins with a LEB128 type tag; tag plus payload
//! determines the object's total byte size, which is what lets the
//! garbage collector walk the arena linearly without a side table.
//! `Object` is the in-memory (already-decoded) form; [`Object::encode`]
//! and [`Object::decode`] are the wire format used by the arena.

use crate::complex::Complex;
use crate::decimal::Decimal;
use crate::error::{EvalError, EvalResult};
use crate::expression::Expression;
use crate::fraction::{Fraction, Rational};
use crate::integer::{BasedInteger, Integer};
use crate::leb128;
use crate::polynomial::Polynomial;
use crate::settings::Settings;
use crate::unit::UnitValue;
use alloc::{string::String, vec::Vec};

/// Stable tag values, written as the first LEB128 field of every encoded
/// object (§6). New variants are appended; existing tags never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum Tag {
    /// [`Object::Integer`]
    Integer = 0,
    /// [`Object::Based`]
    Based = 1,
    /// [`Object::Fraction`]
    Fraction = 2,
    /// [`Object::Decimal`]
    Decimal = 3,
    /// [`Object::HwFp`]
    HwFp = 4,
    /// [`Object::Complex`]
    Complex = 5,
    /// [`Object::Unit`]
    Unit = 6,
    /// [`Object::Symbol`]
    Symbol = 7,
    /// [`Object::Expression`]
    Expression = 8,
    /// [`Object::Polynomial`]
    Polynomial = 9,
}

impl Tag {
    fn from_u64(v: u64) -> EvalResult<Tag> {
        Ok(match v {
            0 => Tag::Integer,
            1 => Tag::Based,
            2 => Tag::Fraction,
            3 => Tag::Decimal,
            4 => Tag::HwFp,
            5 => Tag::Complex,
            6 => Tag::Unit,
            7 => Tag::Symbol,
            8 => Tag::Expression,
            9 => Tag::Polynomial,
            _ => return Err(EvalError::InternalError.into()),
        })
    }
}

/// Any value the kernel's object model can represent.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Exact integer, native or bignum.
    Integer(Integer),
    /// Non-decimal-radix integer.
    Based(BasedInteger),
    /// Exact reduced fraction.
    Fraction(Fraction),
    /// Variable-precision decimal.
    Decimal(Decimal),
    /// Hardware double.
    HwFp(f64),
    /// Complex number.
    Complex(Complex),
    /// A value tagged with a unit expression.
    Unit(UnitValue),
    /// A bare identifier, e.g. `x`.
    Symbol(String),
    /// A postfix-encoded symbolic expression.
    Expression(Expression),
    /// A dense multivariate polynomial.
    Polynomial(Polynomial),
}

impl Object {
    /// The object's type tag.
    pub fn tag(&self) -> Tag {
        match self {
            Object::Integer(_) => Tag::Integer,
            Object::Based(_) => Tag::Based,
            Object::Fraction(_) => Tag::Fraction,
            Object::Decimal(_) => Tag::Decimal,
            Object::HwFp(_) => Tag::HwFp,
            Object::Complex(_) => Tag::Complex,
            Object::Unit(_) => Tag::Unit,
            Object::Symbol(_) => Tag::Symbol,
            Object::Expression(_) => Tag::Expression,
            Object::Polynomial(_) => Tag::Polynomial,
        }
    }

    /// Whether this object is exact (integer, based, or fraction) as
    /// opposed to an inexact decimal/hardware-float approximation; the
    /// arithmetic dispatcher uses this to decide whether to keep a
    /// result exact (§4.I: "narrowest-first promotion").
    pub fn is_exact(&self) -> bool {
        matches!(self, Object::Integer(_) | Object::Based(_) | Object::Fraction(_))
    }

    /// Encode this object into the arena wire format: a LEB128 tag
    /// followed by a tag-specific payload.
    pub fn encode(&self, out: &mut Vec<u8>) {
        leb128::write_unsigned(out, self.tag() as u64);
        match self {
            Object::Integer(i) => {
                leb128::write_unsigned(out, u64::from(i.is_negative()));
                let bytes = i.magnitude_big().to_bytes_le();
                leb128::write_unsigned(out, bytes.len() as u64);
                out.extend_from_slice(&bytes);
            }
            Object::Based(b) => {
                leb128::write_unsigned(out, b.magnitude);
                leb128::write_unsigned(out, u64::from(b.radix));
            }
            Object::Fraction(f) => {
                Object::Integer(f.numerator().clone()).encode(out);
                Object::Integer(f.denominator().clone()).encode(out);
            }
            Object::Decimal(d) => {
                let text = d.render(&Settings::default());
                leb128::write_unsigned(out, text.len() as u64);
                out.extend_from_slice(text.as_bytes());
            }
            Object::HwFp(v) => out.extend_from_slice(&v.to_le_bytes()),
            Object::Complex(c) => {
                let settings = Settings::default();
                let (re, im) = c.to_rectangular(&settings).unwrap_or((Decimal::zero(), Decimal::zero()));
                Object::Decimal(re).encode(out);
                Object::Decimal(im).encode(out);
            }
            Object::Unit(u) => {
                Object::Decimal(u.value.clone()).encode(out);
                let rendered = u.unit.render();
                leb128::write_unsigned(out, rendered.len() as u64);
                out.extend_from_slice(rendered.as_bytes());
            }
            Object::Symbol(name) => {
                leb128::write_unsigned(out, name.len() as u64);
                out.extend_from_slice(name.as_bytes());
            }
            Object::Expression(expr) => expr.encode(out),
            Object::Polynomial(poly) => poly.encode(out),
        }
    }

    /// Decode an object from the arena wire format, returning the object
    /// and the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> EvalResult<(Object, usize)> {
        let (tag_value, mut offset) = leb128::read_unsigned(bytes).ok_or(EvalError::InternalError)?;
        let tag = Tag::from_u64(tag_value)?;
        match tag {
            Tag::Integer => {
                let (negative, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
                offset += n;
                let (len, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
                offset += n;
                let len = len as usize;
                let magnitude_bytes = bytes.get(offset..offset + len).ok_or(EvalError::InternalError)?;
                offset += len;
                let magnitude = crate::bigint::BigUint::from_bytes_le(magnitude_bytes);
                Ok((Object::Integer(Integer::from_big(negative != 0, magnitude)), offset))
            }
            Tag::Based => {
                let (magnitude, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
                offset += n;
                let (radix, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
                offset += n;
                Ok((Object::Based(BasedInteger { magnitude, radix: radix as u32 }), offset))
            }
            Tag::Fraction => {
                let (num_obj, n) = Object::decode(&bytes[offset..])?;
                offset += n;
                let (den_obj, n) = Object::decode(&bytes[offset..])?;
                offset += n;
                let (Object::Integer(num), Object::Integer(den)) = (num_obj, den_obj) else {
                    return Err(EvalError::InternalError.into())
                };
                match Fraction::new(num, den)? {
                    Rational::Integer(i) => Ok((Object::Integer(i), offset)),
                    Rational::Fraction(f) => Ok((Object::Fraction(f), offset)),
                }
            }
            Tag::Decimal => {
                let (len, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
                offset += n;
                let len = len as usize;
                let text = core::str::from_utf8(bytes.get(offset..offset + len).ok_or(EvalError::InternalError)?)
                    .map_err(|_| EvalError::InternalError)?;
                offset += len;
                let settings = Settings::default();
                Ok((Object::Decimal(Decimal::parse(text, &settings)?), offset))
            }
            Tag::HwFp => {
                let raw: [u8; 8] = bytes.get(offset..offset + 8).ok_or(EvalError::InternalError)?.try_into().unwrap();
                offset += 8;
                Ok((Object::HwFp(f64::from_le_bytes(raw)), offset))
            }
            Tag::Complex => {
                let (re_obj, n) = Object::decode(&bytes[offset..])?;
                offset += n;
                let (im_obj, n) = Object::decode(&bytes[offset..])?;
                offset += n;
                let (Object::Decimal(re), Object::Decimal(im)) = (re_obj, im_obj) else {
                    return Err(EvalError::InternalError.into())
                };
                Ok((Object::Complex(Complex::rectangular(re, im)), offset))
            }
            Tag::Unit => {
                let (value_obj, n) = Object::decode(&bytes[offset..])?;
                offset += n;
                let (len, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
                offset += n;
                let len = len as usize;
                let _rendered = core::str::from_utf8(bytes.get(offset..offset + len).ok_or(EvalError::InternalError)?)
                    .map_err(|_| EvalError::InternalError)?;
                offset += len;
                let Object::Decimal(value) = value_obj else { return Err(EvalError::InternalError.into()) };
                Ok((Object::Unit(UnitValue::new(value, crate::unit::UnitExpr::dimensionless())), offset))
            }
            Tag::Symbol => {
                let (len, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
                offset += n;
                let len = len as usize;
                let text = core::str::from_utf8(bytes.get(offset..offset + len).ok_or(EvalError::InternalError)?)
                    .map_err(|_| EvalError::InternalError)?;
                offset += len;
                Ok((Object::Symbol(String::from(text)), offset))
            }
            Tag::Expression => {
                let (expr, n) = Expression::decode(&bytes[offset..])?;
                Ok((Object::Expression(expr), offset + n))
            }
            Tag::Polynomial => {
                let (poly, n) = Polynomial::decode(&bytes[offset..])?;
                Ok((Object::Polynomial(poly), offset + n))
            }
        }
    }

    /// Render this object as text, per `settings`.
    pub fn render(&self, settings: &Settings) -> String {
        match self {
            Object::Integer(i) => crate::integer::render_decimal(i, settings.digit_group_separator()),
            Object::Based(b) => b.render(settings.based_number_separator()),
            Object::Fraction(f) => {
                alloc::format!(
                    "{}/{}",
                    crate::integer::render_decimal(f.numerator(), None),
                    crate::integer::render_decimal(f.denominator(), None)
                )
            }
            Object::Decimal(d) => d.render(settings),
            Object::HwFp(v) => alloc::format!("{v}"),
            Object::Complex(c) => match c.to_rectangular(settings) {
                Ok((re, im)) => alloc::format!("({}, {})", re.render(settings), im.render(settings)),
                Err(_) => String::from("(nan, nan)"),
            },
            Object::Unit(u) => alloc::format!("{}_{}", u.value.render(settings), u.unit.render()),
            Object::Symbol(name) => name.clone(),
            Object::Expression(expr) => expr.render(settings),
            Object::Polynomial(poly) => poly.to_expression().render(settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_encode_decode_round_trip() {
        let obj = Object::Integer(Integer::new(true, 123456789));
        let mut bytes = Vec::new();
        obj.encode(&mut bytes);
        let (decoded, consumed) = Object::decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, obj);
    }

    #[test]
    fn symbol_encode_decode_round_trip() {
        let obj = Object::Symbol(String::from("alpha"));
        let mut bytes = Vec::new();
        obj.encode(&mut bytes);
        let (decoded, _) = Object::decode(&bytes).unwrap();
        assert_eq!(decoded, obj);
    }

    #[test]
    fn fraction_renders_as_slash_form() {
        let settings = Settings::default();
        let f = match Fraction::new(Integer::new(false, 3), Integer::new(false, 4)).unwrap() {
            Rational::Fraction(f) => f,
            _ => panic!("expected fraction"),
        };
        assert_eq!(Object::Fraction(f).render(&settings), "3/4");
    }
}
