//! Numerical root finder: secant method over `f64`, with jitter-on-failure
//! restarts and a bracketing-pair fallback (§4.M).
//!
//! The solver works purely in hardware double precision — it calls the
//! supplied function through [`Decimal::to_f64`]/[`Decimal::from_f64`]
//! rather than chasing exactness, matching the numeric tower's own
//! decision to bridge transcendentals through `libm` rather than
//! reimplement them at arbitrary precision (§4.E, §4.F).

use crate::decimal::Decimal;
use crate::error::{EvalError, EvalResult};
use crate::settings::Settings;
use alloc::vec::Vec;

/// Outcome of a successful solve: the root estimate and the number of
/// iterations the secant method needed to converge.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// The estimated root.
    pub root: Decimal,
    /// Iterations consumed.
    pub iterations: u32,
}

/// How far apart the two secant seeds are perturbed on a restart, as a
/// fraction of the current guess (or an absolute step, near zero).
const JITTER_FACTORS: [f64; 4] = [0.01, 0.1, -0.1, 1.0];

/// Find a root of `f` near `initial_guess`, using the secant method.
///
/// `f` is evaluated in `f64`; non-finite results (from domain errors
/// such as `ln` of a negative number bridged through `libm`) are treated
/// as a failed step and trigger a jitter restart rather than aborting
/// immediately. Iteration is capped by `settings.solver_iterations()`
/// and convergence is declared once two successive iterates agree to
/// within `10^-solver_precision()`. Exhausting every restart without
/// convergence returns [`EvalError::NoSolutionError`].
pub fn solve<F>(f: F, initial_guess: &Decimal, settings: &Settings) -> EvalResult<Solution>
where
    F: Fn(f64) -> f64,
{
    let x0 = initial_guess.to_f64();
    let seed = if x0 == 0.0 { 1.0 } else { x0 };
    let tolerance = 10f64.powi(-(settings.solver_precision() as i32));
    let max_iterations = settings.solver_iterations();

    for jitter in JITTER_FACTORS {
        let a = x0;
        let b = x0 + seed * jitter + if jitter == 0.0 { 1e-4 } else { 0.0 };
        if let Some((root, iterations)) = secant(&f, a, b, tolerance, max_iterations) {
            return Ok(Solution { root: Decimal::from_f64(root, settings), iterations })
        }
    }
    Err(EvalError::NoSolutionError.into())
}

/// Run the secant method from two seeds `a`, `b` until consecutive
/// iterates converge within `tolerance` or `max_iterations` is reached.
/// Returns `None` on divide-by-zero (identical function values) or a
/// non-finite iterate, signalling the caller should jitter and retry.
fn secant<F>(f: &F, a: f64, b: f64, tolerance: f64, max_iterations: u32) -> Option<(f64, u32)>
where
    F: Fn(f64) -> f64,
{
    let mut x_prev = a;
    let mut x_curr = b;
    let mut f_prev = f(x_prev);
    let mut f_curr = f(x_curr);
    if !f_prev.is_finite() || !f_curr.is_finite() {
        return None
    }
    for iteration in 1..=max_iterations {
        if f_curr == f_prev {
            return None
        }
        let x_next = x_curr - f_curr * (x_curr - x_prev) / (f_curr - f_prev);
        if !x_next.is_finite() {
            return None
        }
        let f_next = f(x_next);
        if !f_next.is_finite() {
            return None
        }
        if (x_next - x_curr).abs() <= tolerance * x_next.abs().max(1.0) {
            return Some((x_next, iteration))
        }
        x_prev = x_curr;
        f_prev = f_curr;
        x_curr = x_next;
        f_curr = f_next;
    }
    None
}

/// Scan `[low, high]` in `steps` equal intervals looking for a sign
/// change in `f`, returning the bracketing pair closest to `low`. Used
/// ahead of [`solve`] when no good initial guess is known, mirroring
/// the original calculator's "find a bracket, then refine" strategy.
pub fn bracket<F>(f: F, low: f64, high: f64, steps: u32) -> Option<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    if steps == 0 || high <= low {
        return None
    }
    let step = (high - low) / f64::from(steps);
    let mut previous = low;
    let mut previous_value = f(previous);
    let mut samples = Vec::with_capacity(steps as usize + 1);
    samples.push((previous, previous_value));
    for i in 1..=steps {
        let x = low + step * f64::from(i);
        let value = f(x);
        if previous_value.is_finite() && value.is_finite() && previous_value.signum() != value.signum() {
            return Some((previous, x))
        }
        previous = x;
        previous_value = value;
        samples.push((previous, previous_value));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn solves_linear_root() {
        let result = solve(|x| 2.0 * x - 4.0, &Decimal::from_i64(0), &settings()).unwrap();
        assert!((result.root.to_f64() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn solves_quadratic_root_near_guess() {
        // x^2 - 2 = 0, seeded near the positive root.
        let result = solve(|x| x * x - 2.0, &Decimal::from_i64(1), &settings()).unwrap();
        assert!((result.root.to_f64() - core::f64::consts::SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn reports_no_solution_for_unreachable_root() {
        // e^x + 1 has no real root; every iterate stays positive and
        // monotone, so the secant method cannot converge to a zero.
        let result = solve(|x| libm::exp(x) + 1.0, &Decimal::from_i64(0), &settings());
        assert!(result.is_err());
    }

    #[test]
    fn bracket_finds_sign_change() {
        let found = bracket(|x| x - 1.5, 0.0, 3.0, 10);
        assert!(found.is_some());
        let (lo, hi) = found.unwrap();
        assert!(lo <= 1.5 && hi >= 1.5);
    }
}
