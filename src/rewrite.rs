//! Pattern-matching term rewriter: wildcard bindings, DOWN/UP traversal,
//! and a fixpoint driver bounded by `settings.maximum_rewrites()` (§4.L).
//!
//! A [`Rule`] is a `(pattern, replacement)` pair of expressions where a
//! symbol whose name starts with `_` is a wildcard that binds to
//! whatever subexpression occupies its position, and the same wildcard
//! name occurring twice must bind to structurally equal subexpressions
//! (a non-linear pattern). [`simplify`] repeatedly applies every rule to
//! every subexpression, innermost first (`DOWN` then `UP`, i.e.
//! post-order), until a full pass makes no change or the rewrite budget
//! is exhausted.

use crate::error::{EvalError, EvalResult};
use crate::expression::{ExprOp, Expression};
use crate::settings::Settings;
use alloc::{collections::BTreeMap, string::String, vec::Vec};

/// A rewrite rule: replace `pattern` with `replacement`, substituting
/// wildcard bindings captured from the match.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Left-hand side to match against a subexpression.
    pub pattern: Expression,
    /// Right-hand side, with wildcard symbols replaced by their bindings.
    pub replacement: Expression,
}

impl Rule {
    /// Build a rule from infix pattern/replacement text.
    pub fn parse(pattern: &str, replacement: &str) -> EvalResult<Rule> {
        Ok(Rule { pattern: Expression::parse(pattern)?, replacement: Expression::parse(replacement)? })
    }
}

fn is_wildcard(name: &str) -> bool {
    name.starts_with('_')
}

type Bindings = BTreeMap<String, Expression>;

/// Attempt to match `pattern` against `subject`, returning the wildcard
/// bindings on success. Non-linear patterns (the same wildcard appearing
/// twice) require both occurrences to bind structurally equal
/// subexpressions.
fn match_expr(pattern: &Expression, subject: &Expression, bindings: &mut Bindings) -> bool {
    match (single_op(pattern), single_op(subject)) {
        (Some(ExprOp::Symbol(name)), _) if is_wildcard(name) => {
            match bindings.get(name) {
                Some(existing) => existing == subject,
                None => {
                    bindings.insert(name.clone(), subject.clone());
                    true
                }
            }
        }
        _ => {
            if pattern.ops().len() != subject.ops().len() {
                return structural_match(pattern, subject, bindings)
            }
            pattern == subject || structural_match(pattern, subject, bindings)
        }
    }
}

/// When pattern and subject are themselves compound expressions built
/// from the same top-level operator, recurse into matching operands;
/// this is a structural (syntactic) match, not a semantic one — `a+b`
/// only matches `x+y`, never `y+x` (commutative rules must be written
/// explicitly, per §4.L's "no built-in commutativity normalization").
fn structural_match(pattern: &Expression, subject: &Expression, bindings: &mut Bindings) -> bool {
    let (p_op, p_args) = match top_level(pattern) {
        Some(v) => v,
        None => return false,
    };
    let (s_op, s_args) = match top_level(subject) {
        Some(v) => v,
        None => return false,
    };
    if p_op != s_op || p_args.len() != s_args.len() {
        return false
    }
    for (p, s) in p_args.iter().zip(s_args.iter()) {
        if !match_expr(p, s, bindings) {
            return false
        }
    }
    true
}

/// If `expr`'s postfix sequence is exactly one leaf op, return it.
fn single_op(expr: &Expression) -> Option<&ExprOp> {
    if expr.ops().len() == 1 {
        Some(&expr.ops()[0])
    } else {
        None
    }
}

/// Split a compound expression into its root operator and operand
/// subexpressions, by finding the operator's arity and slicing the
/// postfix sequence backward from the end.
fn top_level(expr: &Expression) -> Option<(TopOp, Vec<Expression>)> {
    let ops = expr.ops();
    let (op, arity) = match ops.last()? {
        ExprOp::Neg | ExprOp::Sq | ExprOp::Cubed | ExprOp::Inv | ExprOp::Factorial => (op_key(ops.last()?), 1),
        ExprOp::Add | ExprOp::Sub | ExprOp::Mul | ExprOp::Div | ExprOp::Pow => (op_key(ops.last()?), 2),
        ExprOp::FunCall { arity, .. } => (op_key(ops.last()?), *arity as usize),
        _ => return None,
    };
    let body = &ops[..ops.len() - 1];
    let mut operand_slices = Vec::with_capacity(arity);
    let mut remaining = body;
    for _ in 0..arity {
        let split = find_operand_boundary(remaining)?;
        let (rest, operand) = remaining.split_at(split);
        operand_slices.push(Expression::from_ops(operand.to_vec()));
        remaining = rest;
    }
    operand_slices.reverse();
    Some((op, operand_slices))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TopOp {
    Neg,
    Sq,
    Cubed,
    Inv,
    Factorial,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    FunCall(String),
}

fn op_key(op: &ExprOp) -> TopOp {
    match op {
        ExprOp::Neg => TopOp::Neg,
        ExprOp::Sq => TopOp::Sq,
        ExprOp::Cubed => TopOp::Cubed,
        ExprOp::Inv => TopOp::Inv,
        ExprOp::Factorial => TopOp::Factorial,
        ExprOp::Add => TopOp::Add,
        ExprOp::Sub => TopOp::Sub,
        ExprOp::Mul => TopOp::Mul,
        ExprOp::Div => TopOp::Div,
        ExprOp::Pow => TopOp::Pow,
        ExprOp::FunCall { name, .. } => TopOp::FunCall(name.clone()),
        _ => unreachable!("only called for operator ops"),
    }
}

/// Walk backward from the end of a postfix slice, tracking the running
/// stack depth, to find where the last complete sub-expression starts.
fn find_operand_boundary(ops: &[ExprOp]) -> Option<usize> {
    let mut depth: i32 = 0;
    for i in (0..ops.len()).rev() {
        depth += arity_delta(&ops[i]);
        if depth == 1 {
            return Some(i)
        }
    }
    None
}

fn arity_delta(op: &ExprOp) -> i32 {
    match op {
        ExprOp::Integer(_) | ExprOp::Fraction(_) | ExprOp::Decimal(_) | ExprOp::Symbol(_) => 1,
        ExprOp::Neg | ExprOp::Sq | ExprOp::Cubed | ExprOp::Inv | ExprOp::Factorial => 0,
        ExprOp::Add | ExprOp::Sub | ExprOp::Mul | ExprOp::Div | ExprOp::Pow => -1,
        ExprOp::FunCall { arity, .. } => 1 - i32::from(*arity),
    }
}

fn substitute(expr: &Expression, bindings: &Bindings) -> Expression {
    if let Some(ExprOp::Symbol(name)) = single_op(expr) {
        if let Some(bound) = bindings.get(name) {
            return bound.clone()
        }
    }
    match top_level(expr) {
        None => expr.clone(),
        Some((op, args)) => {
            let substituted: Vec<Expression> = args.iter().map(|a| substitute(a, bindings)).collect();
            rebuild(op, substituted)
        }
    }
}

fn rebuild(op: TopOp, mut args: Vec<Expression>) -> Expression {
    match op {
        TopOp::Neg => Expression::neg(args.remove(0)),
        TopOp::Sq => unary_op(ExprOp::Sq, args.remove(0)),
        TopOp::Cubed => unary_op(ExprOp::Cubed, args.remove(0)),
        TopOp::Inv => unary_op(ExprOp::Inv, args.remove(0)),
        TopOp::Factorial => unary_op(ExprOp::Factorial, args.remove(0)),
        TopOp::Add => Expression::add(args.remove(0), args.remove(0)),
        TopOp::Sub => Expression::sub(args.remove(0), args.remove(0)),
        TopOp::Mul => Expression::mul(args.remove(0), args.remove(0)),
        TopOp::Div => Expression::div(args.remove(0), args.remove(0)),
        TopOp::Pow => Expression::pow(args.remove(0), args.remove(0)),
        TopOp::FunCall(name) => {
            let arity = args.len() as u8;
            let mut ops = Vec::new();
            for arg in args {
                ops.extend(arg.into_ops());
            }
            ops.push(ExprOp::FunCall { name, arity });
            Expression::from_ops(ops)
        }
    }
}

fn unary_op(op: ExprOp, a: Expression) -> Expression {
    let mut ops = a.into_ops();
    ops.push(op);
    Expression::from_ops(ops)
}

/// Apply every rule once to `expr`'s top level, returning the first
/// match's substituted replacement.
fn apply_rules_once(expr: &Expression, rules: &[Rule]) -> Option<Expression> {
    for rule in rules {
        let mut bindings = Bindings::new();
        if match_expr(&rule.pattern, expr, &mut bindings) {
            return Some(substitute(&rule.replacement, &bindings))
        }
    }
    None
}

/// Rewrite `expr` bottom-up (`DOWN` into subexpressions first, then
/// `UP` applying rules to the resulting node), repeating until a full
/// pass changes nothing or `settings.maximum_rewrites()` substitutions
/// have been made.
pub fn simplify(expr: &Expression, rules: &[Rule], settings: &Settings) -> EvalResult<Expression> {
    let mut current = expr.clone();
    let mut rewrites = 0u32;
    loop {
        let (next, changed) = rewrite_pass(&current, rules, &mut rewrites, settings.maximum_rewrites())?;
        if !changed {
            return Ok(next)
        }
        current = next;
    }
}

fn rewrite_pass(expr: &Expression, rules: &[Rule], rewrites: &mut u32, budget: u32) -> EvalResult<(Expression, bool)> {
    if *rewrites >= budget {
        return Err(EvalError::TooManyRewritesError.into())
    }
    let (down, mut changed) = match top_level(expr) {
        None => (expr.clone(), false),
        Some((op, args)) => {
            let mut new_args = Vec::with_capacity(args.len());
            let mut any_changed = false;
            for arg in &args {
                let (rewritten, c) = rewrite_pass(arg, rules, rewrites, budget)?;
                any_changed |= c;
                new_args.push(rewritten);
            }
            (rebuild(op, new_args), any_changed)
        }
    };
    match apply_rules_once(&down, rules) {
        Some(replaced) => {
            *rewrites += 1;
            Ok((replaced, true))
        }
        None => Ok((down, changed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn rewrites_add_zero_to_identity() {
        let rules = alloc::vec![Rule::parse("_a+0", "_a").unwrap()];
        let expr = Expression::parse("x+0").unwrap();
        let result = simplify(&expr, &rules, &settings()).unwrap();
        assert_eq!(result.render(&settings()), "x");
    }

    #[test]
    fn rewrites_reach_fixpoint_nested() {
        let rules = alloc::vec![Rule::parse("_a+0", "_a").unwrap()];
        let expr = Expression::parse("(x+0)+0").unwrap();
        let result = simplify(&expr, &rules, &settings()).unwrap();
        assert_eq!(result.render(&settings()), "x");
    }

    #[test]
    fn non_linear_pattern_requires_equal_bindings() {
        let rules = alloc::vec![Rule::parse("_a-_a", "0").unwrap()];
        let matches = Expression::parse("x-x").unwrap();
        let no_match = Expression::parse("x-y").unwrap();
        let s = settings();
        assert_eq!(simplify(&matches, &rules, &s).unwrap().render(&s), "0");
        assert_eq!(simplify(&no_match, &rules, &s).unwrap().render(&s), "x-y");
    }

    #[test]
    fn exceeding_rewrite_budget_errors() {
        let rules = alloc::vec![Rule::parse("_a", "_a+0-0").unwrap()];
        let mut tight = settings();
        tight.set_maximum_rewrites(3);
        let expr = Expression::parse("x").unwrap();
        assert!(simplify(&expr, &rules, &tight).is_err());
    }
}
