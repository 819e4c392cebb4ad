//! Dense multivariate polynomials with sorted exponent-vector term
//! ordering and Euclidean division (§4.K).
//!
//! A polynomial is a sum of terms, each an exponent vector (one exponent
//! per variable, in the polynomial's fixed variable order) paired with a
//! rational coefficient. Terms are kept sorted by exponent vector
//! (graded lexicographic, leading term first) so that addition,
//! equality, and the leading-term extraction `quorem` needs are all
//! simple linear scans.

use crate::error::{EvalError, EvalResult};
use crate::expression::{Expression, ExprOp};
use crate::fraction::Rational;
use crate::integer::Integer;
use crate::leb128;
use alloc::{string::String, string::ToString, vec, vec::Vec};
use itertools::Itertools;

/// One term: an exponent per variable (graded-lex ordered) and a
/// rational coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Exponents, one per variable in [`Polynomial::variables`] order.
    pub exponents: Vec<u32>,
    /// Coefficient (never zero; zero-coefficient terms are dropped).
    pub coefficient: Rational,
}

/// A dense multivariate polynomial over a fixed ordered variable list.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Variable names, in the order exponent vectors index them.
    pub variables: Vec<String>,
    /// Non-zero terms, sorted by descending graded-lex exponent vector.
    pub terms: Vec<Term>,
}

fn graded_lex_cmp(a: &[u32], b: &[u32]) -> core::cmp::Ordering {
    let deg_a: u32 = a.iter().sum();
    let deg_b: u32 = b.iter().sum();
    deg_a.cmp(&deg_b).then_with(|| a.cmp(b))
}

impl Polynomial {
    /// The zero polynomial over `variables`.
    pub fn zero(variables: Vec<String>) -> Self {
        Polynomial { variables, terms: Vec::new() }
    }

    /// Whether this is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Total degree of the leading term, or `None` for the zero
    /// polynomial.
    pub fn degree(&self) -> Option<u32> {
        self.terms.first().map(|t| t.exponents.iter().sum())
    }

    fn with_terms(variables: Vec<String>, terms: Vec<Term>) -> Polynomial {
        let terms = terms
            .into_iter()
            .filter(|t| !is_zero_rational(&t.coefficient))
            .sorted_by(|a, b| graded_lex_cmp(&b.exponents, &a.exponents))
            .collect();
        Polynomial { variables, terms }
    }

    /// Build a polynomial from a symbolic expression, interpreting `+`,
    /// `-`, `*`, integer `^`, and leaf symbols/integers/fractions as
    /// polynomial operations. Errors with
    /// [`EvalError::InvalidPolynomialError`] if the expression contains
    /// anything else (function calls, non-integer exponents, division by
    /// a non-constant).
    pub fn make(expr: &Expression, variables: &[String]) -> EvalResult<Polynomial> {
        let mut stack: Vec<Polynomial> = Vec::new();
        for op in expr.ops() {
            match op {
                ExprOp::Integer(i) => stack.push(Polynomial::constant(variables, Rational::Integer(i.clone()))),
                ExprOp::Fraction(f) => stack.push(Polynomial::constant(variables, Rational::Fraction(f.clone()))),
                ExprOp::Symbol(name) => {
                    let idx = variables.iter().position(|v| v == name).ok_or(EvalError::InvalidPolynomialError)?;
                    let mut exponents = vec![0u32; variables.len()];
                    exponents[idx] = 1;
                    stack.push(Polynomial::with_terms(
                        variables.to_vec(),
                        alloc::vec![Term { exponents, coefficient: Rational::Integer(Integer::new(false, 1)) }],
                    ));
                }
                ExprOp::Neg => {
                    let a = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    stack.push(a.neg()?);
                }
                ExprOp::Add => {
                    let b = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    let a = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    stack.push(a.add(&b)?);
                }
                ExprOp::Sub => {
                    let b = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    let a = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    stack.push(a.sub(&b)?);
                }
                ExprOp::Mul => {
                    let b = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    let a = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    stack.push(a.mul(&b)?);
                }
                ExprOp::Sq => {
                    let a = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    stack.push(a.mul(&a.clone())?);
                }
                ExprOp::Cubed => {
                    let a = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    let sq = a.mul(&a)?;
                    stack.push(sq.mul(&a)?);
                }
                ExprOp::Pow => {
                    let b = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    let a = stack.pop().ok_or(EvalError::InvalidPolynomialError)?;
                    let exp = b.as_constant().and_then(|r| match r {
                        Rational::Integer(i) => i.to_i64(),
                        Rational::Fraction(_) => None,
                    });
                    let exp = exp.filter(|e| *e >= 0).ok_or(EvalError::InvalidPolynomialError)?;
                    stack.push(a.pow(exp as u32)?);
                }
                ExprOp::Decimal(_) | ExprOp::Div | ExprOp::Inv | ExprOp::Factorial | ExprOp::FunCall { .. } => {
                    return Err(EvalError::InvalidPolynomialError.into())
                }
            }
        }
        stack.pop().ok_or(EvalError::InvalidPolynomialError.into())
    }

    fn constant(variables: &[String], value: Rational) -> Polynomial {
        if is_zero_rational(&value) {
            return Polynomial::zero(variables.to_vec())
        }
        Polynomial::with_terms(
            variables.to_vec(),
            alloc::vec![Term { exponents: vec![0; variables.len()], coefficient: value }],
        )
    }

    fn as_constant(&self) -> Option<Rational> {
        if self.terms.is_empty() {
            return Some(Rational::Integer(Integer::zero()))
        }
        if self.terms.len() == 1 && self.terms[0].exponents.iter().all(|e| *e == 0) {
            return Some(self.terms[0].coefficient.clone())
        }
        None
    }

    fn coefficient_expression(coefficient: &Rational) -> Expression {
        match coefficient {
            Rational::Integer(i) => Expression::integer(i.clone()),
            Rational::Fraction(f) => Expression::from_ops(alloc::vec![ExprOp::Fraction(f.clone())]),
        }
    }

    /// Convert back to a symbolic expression (sum of `coeff * x^e * ...`
    /// terms, coefficient `1` elided whenever the term has at least one
    /// variable factor to carry it).
    pub fn to_expression(&self) -> Expression {
        if self.terms.is_empty() {
            return Expression::integer(Integer::zero())
        }
        let mut result: Option<Expression> = None;
        for term in &self.terms {
            let mut variable_factor: Option<Expression> = None;
            for (var, &exp) in self.variables.iter().zip(term.exponents.iter()) {
                if exp == 0 {
                    continue
                }
                let var_expr = Expression::symbol(var);
                let var_pow = if exp == 1 {
                    var_expr
                } else {
                    Expression::pow(var_expr, Expression::integer(Integer::new(false, u64::from(exp))))
                };
                variable_factor = Some(match variable_factor {
                    None => var_pow,
                    Some(acc) => Expression::mul(acc, var_pow),
                });
            }
            let term_expr = match variable_factor {
                Some(vf) if is_one(&term.coefficient) => vf,
                Some(vf) => Expression::mul(Self::coefficient_expression(&term.coefficient), vf),
                None => Self::coefficient_expression(&term.coefficient),
            };
            result = Some(match result {
                None => term_expr,
                Some(acc) => Expression::add(acc, term_expr),
            });
        }
        result.unwrap_or_else(|| Expression::integer(Integer::zero()))
    }

    /// Negate.
    pub fn neg(&self) -> EvalResult<Polynomial> {
        let terms = self
            .terms
            .iter()
            .map(|t| Ok(Term { exponents: t.exponents.clone(), coefficient: negate_rational(&t.coefficient)? }))
            .collect::<EvalResult<Vec<_>>>()?;
        Ok(Polynomial::with_terms(self.variables.clone(), terms))
    }

    /// Add two polynomials (must share the same variable list).
    pub fn add(&self, other: &Polynomial) -> EvalResult<Polynomial> {
        let mut terms = self.terms.clone();
        for other_term in &other.terms {
            match terms.iter_mut().find(|t| t.exponents == other_term.exponents) {
                Some(t) => t.coefficient = crate::arith::rational_add(t.coefficient.clone(), other_term.coefficient.clone())?,
                None => terms.push(other_term.clone()),
            }
        }
        Ok(Polynomial::with_terms(self.variables.clone(), terms))
    }

    /// Subtract `other` from `self`.
    pub fn sub(&self, other: &Polynomial) -> EvalResult<Polynomial> {
        self.add(&other.neg()?)
    }

    /// Multiply two polynomials.
    pub fn mul(&self, other: &Polynomial) -> EvalResult<Polynomial> {
        let mut terms: Vec<Term> = Vec::new();
        for a in &self.terms {
            for b in &other.terms {
                let exponents: Vec<u32> = a.exponents.iter().zip(&b.exponents).map(|(x, y)| x + y).collect();
                let coefficient = crate::arith::rational_mul(a.coefficient.clone(), b.coefficient.clone())?;
                match terms.iter_mut().find(|t| t.exponents == exponents) {
                    Some(t) => t.coefficient = crate::arith::rational_add(t.coefficient.clone(), coefficient)?,
                    None => terms.push(Term { exponents, coefficient }),
                }
            }
        }
        Ok(Polynomial::with_terms(self.variables.clone(), terms))
    }

    /// Raise to a non-negative integer power by repeated multiplication.
    pub fn pow(&self, exp: u32) -> EvalResult<Polynomial> {
        let mut result = Polynomial::constant(&self.variables, Rational::Integer(Integer::new(false, 1)));
        for _ in 0..exp {
            result = result.mul(self)?;
        }
        Ok(result)
    }

    /// Degree of `main` (one of `self.variables`) across all terms, or
    /// `None` if `self` is zero.
    fn degree_in(&self, main_idx: usize) -> Option<u32> {
        self.terms.iter().map(|t| t.exponents[main_idx]).max()
    }

    /// The coefficient of `main^degree`, itself a polynomial in the
    /// remaining variables (with `main`'s exponent zeroed out so it
    /// keeps `self.variables`'s shape).
    fn leading_coefficient_in(&self, main_idx: usize, degree: u32) -> Polynomial {
        let terms = self
            .terms
            .iter()
            .filter(|t| t.exponents[main_idx] == degree)
            .map(|t| {
                let mut exponents = t.exponents.clone();
                exponents[main_idx] = 0;
                Term { exponents, coefficient: t.coefficient.clone() }
            })
            .collect();
        Polynomial::with_terms(self.variables.clone(), terms)
    }

    /// Euclidean division treating `main` as the variable division
    /// proceeds in and every other variable as part of the coefficient
    /// ring: `self = q*divisor + r` with `deg(r, main) < deg(divisor,
    /// main)`. The divisor's leading coefficient in `main` must itself
    /// be a plain rational constant (no dependence on the remaining
    /// variables) so that dividing by it is exact; a divisor whose
    /// leading coefficient is itself a non-constant polynomial would
    /// need pseudo-division, which is out of scope (§4.K Non-goals:
    /// "Gröbner bases and multivariate division are out of scope").
    pub fn quorem(&self, divisor: &Polynomial, main: &str) -> EvalResult<(Polynomial, Polynomial)> {
        if divisor.is_zero() {
            return Err(EvalError::ZeroDivideError.into())
        }
        if self.variables != divisor.variables {
            return Err(EvalError::InvalidPolynomialError.into())
        }
        let main_idx = self.variables.iter().position(|v| v == main).ok_or(EvalError::InvalidPolynomialError)?;

        let divisor_degree = divisor.degree_in(main_idx).unwrap_or(0);
        let divisor_leading = divisor
            .leading_coefficient_in(main_idx, divisor_degree)
            .as_constant()
            .ok_or(EvalError::InvalidPolynomialError)?;

        let mut remainder = self.clone();
        let mut quotient = Polynomial::zero(self.variables.clone());
        while !remainder.is_zero() && remainder.degree_in(main_idx).unwrap_or(0) >= divisor_degree {
            let remainder_degree = remainder.degree_in(main_idx).unwrap_or(0);
            let remainder_leading = remainder.leading_coefficient_in(main_idx, remainder_degree);
            let shift = remainder_degree - divisor_degree;
            let scaled_terms = remainder_leading
                .terms
                .iter()
                .map(|t| {
                    let mut exponents = t.exponents.clone();
                    exponents[main_idx] = shift;
                    let coefficient = crate::arith::rational_div(t.coefficient.clone(), divisor_leading.clone())?;
                    Ok(Term { exponents, coefficient })
                })
                .collect::<EvalResult<Vec<_>>>()?;
            let term = Polynomial::with_terms(self.variables.clone(), scaled_terms);
            quotient = quotient.add(&term)?;
            remainder = remainder.sub(&term.mul(divisor)?)?;
        }
        Ok((quotient, remainder))
    }

    /// Encode into the arena wire format.
    pub fn encode(&self, out: &mut Vec<u8>) {
        leb128::write_unsigned(out, self.variables.len() as u64);
        for v in &self.variables {
            leb128::write_unsigned(out, v.len() as u64);
            out.extend_from_slice(v.as_bytes());
        }
        leb128::write_unsigned(out, self.terms.len() as u64);
        for term in &self.terms {
            for &e in &term.exponents {
                leb128::write_unsigned(out, u64::from(e));
            }
            match &term.coefficient {
                Rational::Integer(i) => crate::object::Object::Integer(i.clone()).encode(out),
                Rational::Fraction(f) => crate::object::Object::Fraction(f.clone()).encode(out),
            }
        }
    }

    /// Decode from the arena wire format.
    pub fn decode(bytes: &[u8]) -> EvalResult<(Polynomial, usize)> {
        let (var_count, mut offset) = leb128::read_unsigned(bytes).ok_or(EvalError::InternalError)?;
        let mut variables = Vec::with_capacity(var_count as usize);
        for _ in 0..var_count {
            let (len, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
            offset += n;
            let len = len as usize;
            let text = core::str::from_utf8(bytes.get(offset..offset + len).ok_or(EvalError::InternalError)?)
                .map_err(|_| EvalError::InternalError)?;
            offset += len;
            variables.push(text.to_string());
        }
        let (term_count, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
        offset += n;
        let mut terms = Vec::with_capacity(term_count as usize);
        for _ in 0..term_count {
            let mut exponents = Vec::with_capacity(variables.len());
            for _ in 0..variables.len() {
                let (e, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
                offset += n;
                exponents.push(e as u32);
            }
            let (obj, n) = crate::object::Object::decode(&bytes[offset..])?;
            offset += n;
            let coefficient = match obj {
                crate::object::Object::Integer(i) => Rational::Integer(i),
                crate::object::Object::Fraction(f) => Rational::Fraction(f),
                _ => return Err(EvalError::InternalError.into()),
            };
            terms.push(Term { exponents, coefficient });
        }
        Ok((Polynomial { variables, terms }, offset))
    }
}

fn is_zero_rational(r: &Rational) -> bool {
    match r {
        Rational::Integer(i) => i.is_zero(),
        Rational::Fraction(_) => false,
    }
}

fn is_one(r: &Rational) -> bool {
    matches!(r, Rational::Integer(i) if i.to_i64() == Some(1))
}

fn negate_rational(r: &Rational) -> EvalResult<Rational> {
    crate::arith::rational_mul(r.clone(), Rational::Integer(Integer::new(true, 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Vec<String> {
        alloc::vec![String::from("x")]
    }

    fn expr_poly(text: &str) -> Polynomial {
        Polynomial::make(&Expression::parse(text).unwrap(), &vars()).unwrap()
    }

    #[test]
    fn builds_from_expression() {
        let p = expr_poly("x^2+2*x+1");
        assert_eq!(p.degree(), Some(2));
        assert_eq!(p.terms.len(), 3);
    }

    #[test]
    fn addition_combines_like_terms() {
        let a = expr_poly("x^2+x");
        let b = expr_poly("x^2-x");
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.terms.len(), 1);
        assert_eq!(sum.terms[0].exponents, alloc::vec![2]);
    }

    #[test]
    fn euclidean_division_matches_expected_quotient_and_remainder() {
        // (x^2 - 1) / (x - 1) = x + 1, remainder 0
        let dividend = expr_poly("x^2-1");
        let divisor = expr_poly("x-1");
        let (q, r) = dividend.quorem(&divisor, "x").unwrap();
        assert!(r.is_zero());
        assert_eq!(q.to_expression().render(&crate::settings::Settings::default()), "x+1");
    }

    #[test]
    fn division_in_main_variable_treats_other_variables_as_coefficients() {
        // (X^3 - Y^3) / (X - Y), main variable X: quotient X^2+X*Y+Y^2, remainder 0.
        let vars = alloc::vec![String::from("X"), String::from("Y")];
        let dividend = Polynomial::make(&Expression::parse("X^3-Y^3").unwrap(), &vars).unwrap();
        let divisor = Polynomial::make(&Expression::parse("X-Y").unwrap(), &vars).unwrap();
        let (q, r) = dividend.quorem(&divisor, "X").unwrap();
        assert!(r.is_zero());
        assert_eq!(q.to_expression().render(&crate::settings::Settings::default()), "X^2+X*Y+Y^2");
    }

    #[test]
    fn division_leaves_nonzero_remainder_when_not_a_factor() {
        // (x^2 + 1) / (x - 1) = x + 1 remainder 2
        let dividend = expr_poly("x^2+1");
        let divisor = expr_poly("x-1");
        let (_, r) = dividend.quorem(&divisor, "x").unwrap();
        assert!(!r.is_zero());
        assert!(r.degree().unwrap() < divisor.degree().unwrap());
    }
}
