//! Symbolic expressions: postfix-encoded tree, infix parser, and infix
//! renderer with classical precedence (§4.J).
//!
//! An [`Expression`] is a flat postfix (reverse-Polish) instruction
//! sequence rather than a boxed tree; this mirrors the arena's own
//! preference for linear, GC-traversable storage, and makes `evaluate`
//! a simple operand-stack walk. [`Expression::parse`] builds this
//! sequence directly from infix text via precedence climbing (no
//! intermediate AST), and [`Expression::render`] walks the sequence with
//! an explicit stack of `(text, precedence)` pairs to decide where
//! parentheses are required.

use crate::decimal::Decimal;
use crate::error::{EvalError, EvalResult};
use crate::fraction::{Fraction, Rational};
use crate::integer::Integer;
use crate::leb128;
use crate::settings::Settings;
use alloc::{boxed::Box, string::String, string::ToString, vec::Vec};

/// One instruction in an expression's postfix sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprOp {
    /// Push an exact integer literal.
    Integer(Integer),
    /// Push an exact fraction literal.
    Fraction(Fraction),
    /// Push a decimal literal.
    Decimal(Decimal),
    /// Push a symbol (free variable or constant name).
    Symbol(String),
    /// Pop one operand, negate it, push the result.
    Neg,
    /// Pop two operands `(a, b)`, push `a + b`.
    Add,
    /// Pop two operands `(a, b)`, push `a - b`.
    Sub,
    /// Pop two operands `(a, b)`, push `a * b`.
    Mul,
    /// Pop two operands `(a, b)`, push `a / b`.
    Div,
    /// Pop two operands `(a, b)`, push `a ^ b`.
    Pow,
    /// Pop one operand, push its square (`sq`, §4.J special form).
    Sq,
    /// Pop one operand, push its cube (`cubed`).
    Cubed,
    /// Pop one operand, push its reciprocal (`inv`).
    Inv,
    /// Pop one operand, push its factorial.
    Factorial,
    /// Pop `arity` operands, push `name(args...)`.
    FunCall {
        /// Function name.
        name: String,
        /// Argument count.
        arity: u8,
    },
}

/// A postfix-encoded symbolic expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    ops: Vec<ExprOp>,
}

impl Expression {
    /// A bare symbol expression.
    pub fn symbol(name: &str) -> Self {
        Expression { ops: alloc::vec![ExprOp::Symbol(name.to_string())] }
    }

    /// An integer literal expression.
    pub fn integer(value: Integer) -> Self {
        Expression { ops: alloc::vec![ExprOp::Integer(value)] }
    }

    /// The postfix instruction sequence.
    pub fn ops(&self) -> &[ExprOp] {
        &self.ops
    }

    /// Build an expression directly from a postfix instruction sequence.
    /// Used by callers (such as the rewriter) that slice and reassemble
    /// `ops()` themselves.
    pub fn from_ops(ops: Vec<ExprOp>) -> Expression {
        Expression { ops }
    }

    /// Consume the expression, returning its postfix instruction sequence.
    pub fn into_ops(self) -> Vec<ExprOp> {
        self.ops
    }

    fn binary(op: ExprOp, a: Expression, b: Expression) -> Expression {
        let mut ops = a.ops;
        ops.extend(b.ops);
        ops.push(op);
        Expression { ops }
    }

    fn unary(op: ExprOp, a: Expression) -> Expression {
        let mut ops = a.ops;
        ops.push(op);
        Expression { ops }
    }

    /// Build `a + b`.
    pub fn add(a: Expression, b: Expression) -> Expression {
        Self::binary(ExprOp::Add, a, b)
    }
    /// Build `a - b`.
    pub fn sub(a: Expression, b: Expression) -> Expression {
        Self::binary(ExprOp::Sub, a, b)
    }
    /// Build `a * b`.
    pub fn mul(a: Expression, b: Expression) -> Expression {
        Self::binary(ExprOp::Mul, a, b)
    }
    /// Build `a / b`.
    pub fn div(a: Expression, b: Expression) -> Expression {
        Self::binary(ExprOp::Div, a, b)
    }
    /// Build `a ^ b`.
    pub fn pow(a: Expression, b: Expression) -> Expression {
        Self::binary(ExprOp::Pow, a, b)
    }
    /// Build `-a`.
    pub fn neg(a: Expression) -> Expression {
        Self::unary(ExprOp::Neg, a)
    }

    /// Parse an infix expression string via precedence climbing. Honors
    /// the classical precedence `^` > unary `-` > `* /` > `+ -`, `^`
    /// right-associative, the rest left-associative.
    pub fn parse(text: &str) -> EvalResult<Expression> {
        let tokens = tokenize(text)?;
        let mut pos = 0;
        let expr = parse_binary(&tokens, &mut pos, 0)?;
        if pos != tokens.len() {
            return Err(EvalError::SyntaxError.into())
        }
        Ok(expr)
    }

    /// Render in infix notation with minimal parenthesization.
    pub fn render(&self, settings: &Settings) -> String {
        let mut stack: Vec<(String, u8)> = Vec::new();
        for op in &self.ops {
            match op {
                ExprOp::Integer(i) => stack.push((crate::integer::render_decimal(i, None), 100)),
                ExprOp::Fraction(f) => stack.push((
                    alloc::format!(
                        "{}/{}",
                        crate::integer::render_decimal(f.numerator(), None),
                        crate::integer::render_decimal(f.denominator(), None)
                    ),
                    4,
                )),
                ExprOp::Decimal(d) => stack.push((d.render(settings), 100)),
                ExprOp::Symbol(name) => stack.push((name.clone(), 100)),
                ExprOp::Neg => {
                    let (a, prec) = stack.pop().unwrap_or_default_pair();
                    let text = if prec < 3 { alloc::format!("-({a})") } else { alloc::format!("-{a}") };
                    stack.push((text, 3));
                }
                ExprOp::Add => binary_render(&mut stack, "+", 1, false),
                ExprOp::Sub => binary_render(&mut stack, "-", 1, true),
                ExprOp::Mul => binary_render(&mut stack, "*", 2, false),
                ExprOp::Div => binary_render(&mut stack, "/", 2, true),
                ExprOp::Pow => binary_render(&mut stack, "^", 5, true),
                ExprOp::Sq => {
                    let (a, prec) = stack.pop().unwrap_or_default_pair();
                    let a = parenthesize_if(a, prec < 100);
                    stack.push((alloc::format!("{a}^2"), 5));
                }
                ExprOp::Cubed => {
                    let (a, prec) = stack.pop().unwrap_or_default_pair();
                    let a = parenthesize_if(a, prec < 100);
                    stack.push((alloc::format!("{a}^3"), 5));
                }
                ExprOp::Inv => {
                    let (a, _) = stack.pop().unwrap_or_default_pair();
                    stack.push((alloc::format!("1/{a}"), 4));
                }
                ExprOp::Factorial => {
                    let (a, prec) = stack.pop().unwrap_or_default_pair();
                    let a = parenthesize_if(a, prec < 100);
                    stack.push((alloc::format!("{a}!"), 6));
                }
                ExprOp::FunCall { name, arity } => {
                    let mut args = Vec::with_capacity(*arity as usize);
                    for _ in 0..*arity {
                        args.push(stack.pop().unwrap_or_default_pair().0);
                    }
                    args.reverse();
                    stack.push((alloc::format!("{name}({})", args.join(", ")), 100));
                }
            }
        }
        stack.pop().map(|(s, _)| s).unwrap_or_default()
    }

    /// Encode into the arena wire format.
    pub fn encode(&self, out: &mut Vec<u8>) {
        leb128::write_unsigned(out, self.ops.len() as u64);
        for op in &self.ops {
            encode_op(op, out);
        }
    }

    /// Decode from the arena wire format.
    pub fn decode(bytes: &[u8]) -> EvalResult<(Expression, usize)> {
        let (count, mut offset) = leb128::read_unsigned(bytes).ok_or(EvalError::InternalError)?;
        let mut ops = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (op, n) = decode_op(&bytes[offset..])?;
            ops.push(op);
            offset += n;
        }
        Ok((Expression { ops }, offset))
    }

    /// Evaluate by substituting symbol values from `lookup`, folding all
    /// exact operations. Returns the original expression unevaluated if
    /// any free symbol remains unbound (the rewriter, not this function,
    /// is responsible for partial symbolic simplification).
    pub fn evaluate_numeric(&self, lookup: &dyn Fn(&str) -> Option<Rational>) -> EvalResult<Rational> {
        let mut stack: Vec<Rational> = Vec::new();
        for op in &self.ops {
            match op {
                ExprOp::Integer(i) => stack.push(Rational::Integer(i.clone())),
                ExprOp::Fraction(f) => stack.push(Rational::Fraction(f.clone())),
                ExprOp::Decimal(_) => return Err(EvalError::TypeError.into()),
                ExprOp::Symbol(name) => stack.push(lookup(name).ok_or(EvalError::ValueError)?),
                ExprOp::Neg => {
                    let a = stack.pop().ok_or(EvalError::InternalError)?;
                    stack.push(rational_neg(a));
                }
                ExprOp::Add => binary_fold(&mut stack, crate::arith::rational_add)?,
                ExprOp::Sub => binary_fold(&mut stack, crate::arith::rational_sub)?,
                ExprOp::Mul => binary_fold(&mut stack, crate::arith::rational_mul)?,
                ExprOp::Div => binary_fold(&mut stack, crate::arith::rational_div)?,
                ExprOp::Pow => {
                    let b = stack.pop().ok_or(EvalError::InternalError)?;
                    let a = stack.pop().ok_or(EvalError::InternalError)?;
                    let Rational::Integer(exp) = b else { return Err(EvalError::TypeError.into()) };
                    let exp = exp.to_i64().ok_or(EvalError::ValueError)?;
                    stack.push(crate::arith::rational_pow(a, exp)?);
                }
                ExprOp::Sq => {
                    let a = stack.pop().ok_or(EvalError::InternalError)?;
                    stack.push(crate::arith::rational_mul(a.clone(), a)?);
                }
                ExprOp::Cubed => {
                    let a = stack.pop().ok_or(EvalError::InternalError)?;
                    let sq = crate::arith::rational_mul(a.clone(), a.clone())?;
                    stack.push(crate::arith::rational_mul(sq, a)?);
                }
                ExprOp::Inv => {
                    let a = stack.pop().ok_or(EvalError::InternalError)?;
                    stack.push(crate::arith::rational_div(Rational::Integer(Integer::new(false, 1)), a)?);
                }
                ExprOp::Factorial => {
                    let a = stack.pop().ok_or(EvalError::InternalError)?;
                    let Rational::Integer(i) = a else { return Err(EvalError::TypeError.into()) };
                    stack.push(Rational::Integer(i.factorial()?));
                }
                ExprOp::FunCall { arity, .. } => {
                    // Transcendental function calls require the decimal
                    // bridge and are not foldable as exact rationals.
                    for _ in 0..*arity {
                        stack.pop();
                    }
                    return Err(EvalError::TypeError.into())
                }
            }
        }
        stack.pop().ok_or(EvalError::InternalError.into())
    }
}

fn rational_neg(value: Rational) -> Rational {
    match value {
        Rational::Integer(i) => Rational::Integer(i.neg()),
        Rational::Fraction(f) => {
            Rational::Fraction(Fraction::new(f.numerator().neg(), f.denominator().clone()).ok().and_then(as_fraction).unwrap_or(f))
        }
    }
}

fn as_fraction(r: Rational) -> Option<Fraction> {
    match r {
        Rational::Fraction(f) => Some(f),
        Rational::Integer(_) => None,
    }
}

fn binary_fold(stack: &mut Vec<Rational>, f: fn(Rational, Rational) -> EvalResult<Rational>) -> EvalResult<()> {
    let b = stack.pop().ok_or(EvalError::InternalError)?;
    let a = stack.pop().ok_or(EvalError::InternalError)?;
    stack.push(f(a, b)?);
    Ok(())
}

trait PopOrDefault {
    fn unwrap_or_default_pair(self) -> (String, u8);
}
impl PopOrDefault for Option<(String, u8)> {
    fn unwrap_or_default_pair(self) -> (String, u8) {
        self.unwrap_or((String::from("?"), 0))
    }
}

fn parenthesize_if(text: String, condition: bool) -> String {
    if condition {
        alloc::format!("({text})")
    } else {
        text
    }
}

fn binary_render(stack: &mut Vec<(String, u8)>, symbol: &str, precedence: u8, right_needs_parens_if_equal: bool) {
    let (b, bp) = stack.pop().unwrap_or_default_pair();
    let (a, ap) = stack.pop().unwrap_or_default_pair();
    let a = parenthesize_if(a, ap < precedence);
    let b = parenthesize_if(b, bp < precedence || (right_needs_parens_if_equal && bp == precedence));
    stack.push((alloc::format!("{a}{symbol}{b}"), precedence));
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    Symbol(String),
    Op(char),
    LParen,
    RParen,
    Comma,
    Bang,
}

fn tokenize(text: &str) -> EvalResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let bytes: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_whitespace() {
            i += 1;
            continue
        }
        if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == '.') {
                i += 1;
            }
            tokens.push(Token::Number(bytes[start..i].iter().collect()));
            continue
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_alphanumeric() || bytes[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Symbol(bytes[start..i].iter().collect()));
            continue
        }
        match c {
            '+' | '-' | '*' | '/' | '^' => tokens.push(Token::Op(c)),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            ',' => tokens.push(Token::Comma),
            '!' => tokens.push(Token::Bang),
            _ => return Err(EvalError::SyntaxError.into()),
        }
        i += 1;
    }
    Ok(tokens)
}

fn parse_binary(tokens: &[Token], pos: &mut usize, min_precedence: u8) -> EvalResult<Expression> {
    let mut left = parse_unary(tokens, pos)?;
    loop {
        let (op, precedence, right_assoc) = match tokens.get(*pos) {
            Some(Token::Op('+')) => (ExprOp::Add, 1, false),
            Some(Token::Op('-')) => (ExprOp::Sub, 1, false),
            Some(Token::Op('*')) => (ExprOp::Mul, 2, false),
            Some(Token::Op('/')) => (ExprOp::Div, 2, false),
            Some(Token::Op('^')) => (ExprOp::Pow, 5, true),
            _ => break,
        };
        if precedence < min_precedence {
            break
        }
        *pos += 1;
        let next_min = if right_assoc { precedence } else { precedence + 1 };
        let right = parse_binary(tokens, pos, next_min)?;
        left = Expression::binary(op, left, right);
    }
    Ok(left)
}

fn parse_unary(tokens: &[Token], pos: &mut usize) -> EvalResult<Expression> {
    if let Some(Token::Op('-')) = tokens.get(*pos) {
        *pos += 1;
        let operand = parse_unary(tokens, pos)?;
        return Ok(Expression::unary(ExprOp::Neg, operand))
    }
    parse_postfix(tokens, pos)
}

fn parse_postfix(tokens: &[Token], pos: &mut usize) -> EvalResult<Expression> {
    let mut expr = parse_primary(tokens, pos)?;
    while let Some(Token::Bang) = tokens.get(*pos) {
        *pos += 1;
        expr = Expression::unary(ExprOp::Factorial, expr);
    }
    Ok(expr)
}

fn parse_primary(tokens: &[Token], pos: &mut usize) -> EvalResult<Expression> {
    match tokens.get(*pos) {
        Some(Token::Number(text)) => {
            *pos += 1;
            if text.contains('.') {
                Ok(Expression { ops: alloc::vec![ExprOp::Decimal(Decimal::parse(text, &Settings::default())?)] })
            } else {
                let magnitude: u64 = text.parse().map_err(|_| EvalError::SyntaxError)?;
                Ok(Expression::integer(Integer::new(false, magnitude)))
            }
        }
        Some(Token::Symbol(name)) => {
            let name = name.clone();
            *pos += 1;
            if let Some(Token::LParen) = tokens.get(*pos) {
                *pos += 1;
                let mut args = Vec::new();
                if !matches!(tokens.get(*pos), Some(Token::RParen)) {
                    loop {
                        args.push(parse_binary(tokens, pos, 0)?);
                        match tokens.get(*pos) {
                            Some(Token::Comma) => {
                                *pos += 1;
                            }
                            _ => break,
                        }
                    }
                }
                match tokens.get(*pos) {
                    Some(Token::RParen) => *pos += 1,
                    _ => return Err(EvalError::UnterminatedError.into()),
                }
                let arity = args.len() as u8;
                let mut ops = Vec::new();
                for arg in args {
                    ops.extend(arg.ops);
                }
                ops.push(ExprOp::FunCall { name, arity });
                return Ok(Expression { ops })
            }
            Ok(Expression::symbol(&name))
        }
        Some(Token::LParen) => {
            *pos += 1;
            let expr = parse_binary(tokens, pos, 0)?;
            match tokens.get(*pos) {
                Some(Token::RParen) => *pos += 1,
                _ => return Err(EvalError::UnterminatedError.into()),
            }
            Ok(expr)
        }
        _ => Err(EvalError::SyntaxError.into()),
    }
}

fn encode_op(op: &ExprOp, out: &mut Vec<u8>) {
    match op {
        ExprOp::Integer(i) => {
            leb128::write_unsigned(out, 0);
            crate::object::Object::Integer(i.clone()).encode(out);
        }
        ExprOp::Fraction(f) => {
            leb128::write_unsigned(out, 1);
            crate::object::Object::Fraction(f.clone()).encode(out);
        }
        ExprOp::Decimal(d) => {
            leb128::write_unsigned(out, 2);
            crate::object::Object::Decimal(d.clone()).encode(out);
        }
        ExprOp::Symbol(name) => {
            leb128::write_unsigned(out, 3);
            leb128::write_unsigned(out, name.len() as u64);
            out.extend_from_slice(name.as_bytes());
        }
        ExprOp::Neg => leb128::write_unsigned(out, 4),
        ExprOp::Add => leb128::write_unsigned(out, 5),
        ExprOp::Sub => leb128::write_unsigned(out, 6),
        ExprOp::Mul => leb128::write_unsigned(out, 7),
        ExprOp::Div => leb128::write_unsigned(out, 8),
        ExprOp::Pow => leb128::write_unsigned(out, 9),
        ExprOp::Sq => leb128::write_unsigned(out, 10),
        ExprOp::Cubed => leb128::write_unsigned(out, 11),
        ExprOp::Inv => leb128::write_unsigned(out, 12),
        ExprOp::Factorial => leb128::write_unsigned(out, 13),
        ExprOp::FunCall { name, arity } => {
            leb128::write_unsigned(out, 14);
            leb128::write_unsigned(out, name.len() as u64);
            out.extend_from_slice(name.as_bytes());
            leb128::write_unsigned(out, u64::from(*arity));
        }
    }
}

fn decode_op(bytes: &[u8]) -> EvalResult<(ExprOp, usize)> {
    let (kind, mut offset) = leb128::read_unsigned(bytes).ok_or(EvalError::InternalError)?;
    let op = match kind {
        0 => {
            let (obj, n) = crate::object::Object::decode(&bytes[offset..])?;
            offset += n;
            let crate::object::Object::Integer(i) = obj else { return Err(EvalError::InternalError.into()) };
            ExprOp::Integer(i)
        }
        1 => {
            let (obj, n) = crate::object::Object::decode(&bytes[offset..])?;
            offset += n;
            let crate::object::Object::Fraction(f) = obj else { return Err(EvalError::InternalError.into()) };
            ExprOp::Fraction(f)
        }
        2 => {
            let (obj, n) = crate::object::Object::decode(&bytes[offset..])?;
            offset += n;
            let crate::object::Object::Decimal(d) = obj else { return Err(EvalError::InternalError.into()) };
            ExprOp::Decimal(d)
        }
        3 => {
            let (len, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
            offset += n;
            let len = len as usize;
            let text = core::str::from_utf8(bytes.get(offset..offset + len).ok_or(EvalError::InternalError)?)
                .map_err(|_| EvalError::InternalError)?;
            offset += len;
            ExprOp::Symbol(String::from(text))
        }
        4 => ExprOp::Neg,
        5 => ExprOp::Add,
        6 => ExprOp::Sub,
        7 => ExprOp::Mul,
        8 => ExprOp::Div,
        9 => ExprOp::Pow,
        10 => ExprOp::Sq,
        11 => ExprOp::Cubed,
        12 => ExprOp::Inv,
        13 => ExprOp::Factorial,
        14 => {
            let (len, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
            offset += n;
            let len = len as usize;
            let text = core::str::from_utf8(bytes.get(offset..offset + len).ok_or(EvalError::InternalError)?)
                .map_err(|_| EvalError::InternalError)?;
            offset += len;
            let (arity, n) = leb128::read_unsigned(&bytes[offset..]).ok_or(EvalError::InternalError)?;
            offset += n;
            ExprOp::FunCall { name: String::from(text), arity: arity as u8 }
        }
        _ => return Err(EvalError::InternalError.into()),
    };
    Ok((op, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_renders_simple_sum() {
        let expr = Expression::parse("1+2*3").unwrap();
        assert_eq!(expr.render(&Settings::default()), "1+2*3");
    }

    #[test]
    fn precedence_requires_parens_for_mixed_groups() {
        let expr = Expression::parse("(1+2)*3").unwrap();
        assert_eq!(expr.render(&Settings::default()), "(1+2)*3");
    }

    #[test]
    fn evaluates_exact_arithmetic() {
        let expr = Expression::parse("2+3*4").unwrap();
        let result = expr.evaluate_numeric(&|_| None).unwrap();
        match result {
            Rational::Integer(i) => assert_eq!(i.to_i64(), Some(14)),
            Rational::Fraction(_) => panic!("expected an integer"),
        }
    }

    #[test]
    fn substitutes_symbol_values() {
        let expr = Expression::parse("x+1").unwrap();
        let result = expr.evaluate_numeric(&|name| {
            if name == "x" {
                Some(Rational::Integer(Integer::new(false, 41)))
            } else {
                None
            }
        });
        match result.unwrap() {
            Rational::Integer(i) => assert_eq!(i.to_i64(), Some(42)),
            Rational::Fraction(_) => panic!("expected an integer"),
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let expr = Expression::parse("1+2*x").unwrap();
        let mut bytes = Vec::new();
        expr.encode(&mut bytes);
        let (decoded, consumed) = Expression::decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, expr);
    }
}
