//! Units: a `(value, unit-expression)` pair with a symbolic unit algebra
//! and dimensional-consistency checking (§4.H).
//!
//! A unit expression is a product of `(name, exponent)` factors, e.g.
//! `m^1 * s^-2` for acceleration. Two quantities can be added or
//! compared only when their unit expressions reduce to the same base
//! factors (after SI-prefix and conversion-factor normalization);
//! otherwise the operation raises [`EvalError::InconsistentUnitsError`].

use crate::decimal::Decimal;
use crate::error::{EvalError, EvalResult};
use crate::settings::Settings;
use alloc::{string::String, string::ToString, vec::Vec};

/// A single named unit factor raised to an integer power, e.g. `m^1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFactor {
    /// Base unit name, e.g. `"m"`, `"s"`, `"kg"`.
    pub name: String,
    /// Integer exponent (may be negative).
    pub exponent: i32,
}

/// A unit expression: a product of [`UnitFactor`]s plus a scalar
/// conversion factor relative to the base SI-like units the table below
/// knows about.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitExpr {
    /// Non-base-unit factors as named by the user, sorted by name so two
    /// structurally equal expressions compare equal.
    pub factors: Vec<UnitFactor>,
}

impl UnitExpr {
    /// The dimensionless unit (empty product).
    pub fn dimensionless() -> Self {
        UnitExpr { factors: Vec::new() }
    }

    /// Build a single-factor unit expression, e.g. `unit::make("m", 1)`.
    pub fn make(name: &str, exponent: i32) -> Self {
        if exponent == 0 {
            return UnitExpr::dimensionless()
        }
        UnitExpr { factors: alloc::vec![UnitFactor { name: name.to_string(), exponent }] }
    }

    /// Whether this is the dimensionless unit.
    pub fn is_dimensionless(&self) -> bool {
        self.factors.is_empty()
    }

    fn base_dimension_vector(&self) -> Vec<(String, i32)> {
        let mut dims: Vec<(String, i32)> = Vec::new();
        for factor in &self.factors {
            let (base_name, base_exp_scale) = base_unit_of(&factor.name);
            let exponent = factor.exponent * base_exp_scale;
            if exponent == 0 {
                continue
            }
            match dims.iter_mut().find(|(n, _)| *n == base_name) {
                Some((_, e)) => *e += exponent,
                None => dims.push((base_name, exponent)),
            }
        }
        dims.retain(|(_, e)| *e != 0);
        dims.sort();
        dims
    }

    /// Multiply two unit expressions (adds exponents of shared factors,
    /// then collapses any factor whose exponent sums to zero).
    pub fn mul(&self, other: &UnitExpr) -> UnitExpr {
        let mut factors = self.factors.clone();
        for other_factor in &other.factors {
            match factors.iter_mut().find(|f| f.name == other_factor.name) {
                Some(f) => f.exponent += other_factor.exponent,
                None => factors.push(other_factor.clone()),
            }
        }
        factors.retain(|f| f.exponent != 0);
        factors.sort_by(|a, b| a.name.cmp(&b.name));
        UnitExpr { factors }
    }

    /// Divide: multiply by the reciprocal.
    pub fn div(&self, other: &UnitExpr) -> UnitExpr {
        self.mul(&other.inv())
    }

    /// Reciprocal (negate every exponent).
    pub fn inv(&self) -> UnitExpr {
        UnitExpr {
            factors: self.factors.iter().map(|f| UnitFactor { name: f.name.clone(), exponent: -f.exponent }).collect(),
        }
    }

    /// Raise to an integer power.
    pub fn pow(&self, exp: i32) -> UnitExpr {
        UnitExpr {
            factors: self.factors.iter().map(|f| UnitFactor { name: f.name.clone(), exponent: f.exponent * exp }).collect(),
        }
    }

    /// Whether `self` and `other` describe the same physical dimension
    /// (same base-unit exponent vector, ignoring which named unit was
    /// used to express it — e.g. `ft` and `m` are both length).
    pub fn is_dimensionally_consistent(&self, other: &UnitExpr) -> bool {
        self.base_dimension_vector() == other.base_dimension_vector()
    }

    /// "Simple" collapse: if every factor's exponent is zero after
    /// reduction, return the dimensionless unit; otherwise return an
    /// equivalent expression with zero-exponent factors removed (§4.H:
    /// "collapse a fully-cancelled unit expression back to a bare
    /// number").
    pub fn simple(&self) -> UnitExpr {
        UnitExpr { factors: self.factors.iter().filter(|f| f.exponent != 0).cloned().collect() }
    }

    /// Render using `*` between factors and `^` for a non-unit exponent,
    /// e.g. `m*s^-1`.
    pub fn render(&self) -> String {
        if self.factors.is_empty() {
            return String::new()
        }
        self.factors
            .iter()
            .map(|f| if f.exponent == 1 { f.name.clone() } else { alloc::format!("{}^{}", f.name, f.exponent) })
            .collect::<Vec<_>>()
            .join("*")
    }
}

/// A value tagged with a unit expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitValue {
    /// The numeric value, expressed in terms of `unit`.
    pub value: Decimal,
    /// The unit expression.
    pub unit: UnitExpr,
}

impl UnitValue {
    /// Build a unit value.
    pub fn new(value: Decimal, unit: UnitExpr) -> Self {
        UnitValue { value, unit }
    }

    /// Add two unit values; both must be dimensionally consistent, and
    /// `other` is converted into `self`'s unit before the numeric
    /// addition.
    pub fn add(&self, other: &UnitValue, settings: &Settings) -> EvalResult<UnitValue> {
        let converted = other.convert(&self.unit, settings)?;
        Ok(UnitValue::new(self.value.add(&converted.value, settings), self.unit.clone()))
    }

    /// Subtract.
    pub fn sub(&self, other: &UnitValue, settings: &Settings) -> EvalResult<UnitValue> {
        let converted = other.convert(&self.unit, settings)?;
        Ok(UnitValue::new(self.value.sub(&converted.value, settings), self.unit.clone()))
    }

    /// Multiply: units multiply, values multiply.
    pub fn mul(&self, other: &UnitValue, settings: &Settings) -> UnitValue {
        UnitValue::new(self.value.mul(&other.value, settings), self.unit.mul(&other.unit))
    }

    /// Divide: units divide, values divide.
    pub fn div(&self, other: &UnitValue, settings: &Settings) -> EvalResult<UnitValue> {
        Ok(UnitValue::new(self.value.div(&other.value, settings)?, self.unit.div(&other.unit)))
    }

    /// Convert this value into an equivalent expressed in `target_unit`.
    /// Requires `self.unit` and `target_unit` to be dimensionally
    /// consistent.
    pub fn convert(&self, target_unit: &UnitExpr, settings: &Settings) -> EvalResult<UnitValue> {
        if !self.unit.is_dimensionally_consistent(target_unit) {
            return Err(inconsistent_units_error())
        }
        let self_factor = self.unit.factors.iter().fold(1.0f64, |acc, f| acc * conversion_scale(f));
        let target_factor = target_unit.factors.iter().fold(1.0f64, |acc, f| acc * conversion_scale(f));
        let converted = self.value.to_f64() * self_factor / target_factor;
        Ok(UnitValue::new(Decimal::from_f64(converted, settings), target_unit.clone()))
    }
}

/// A dimensional-consistency violation (§4.H, §7).
pub fn inconsistent_units_error() -> crate::error::RuntimeError {
    EvalError::InconsistentUnitsError.into()
}

/// Map a named unit to its base SI-like unit name and the exponent scale
/// (`1` for units already in base form). Only a small illustrative table
/// is provided; an application embedding this crate is expected to
/// extend it.
fn base_unit_of(name: &str) -> (String, i32) {
    match name {
        "m" | "ft" | "in" | "mi" | "km" | "cm" | "mm" => (String::from("m"), 1),
        "s" | "min" | "hr" => (String::from("s"), 1),
        "kg" | "g" | "lb" | "oz" => (String::from("kg"), 1),
        other => (other.to_string(), 1),
    }
}

fn conversion_scale(factor: &UnitFactor) -> f64 {
    let per_unit = match factor.name.as_str() {
        "m" => 1.0,
        "km" => 1000.0,
        "cm" => 0.01,
        "mm" => 0.001,
        "ft" => 0.3048,
        "in" => 0.0254,
        "mi" => 1609.344,
        "s" => 1.0,
        "min" => 60.0,
        "hr" => 3600.0,
        "kg" => 1.0,
        "g" => 0.001,
        "lb" => 0.45359237,
        "oz" => 0.028349523125,
        _ => 1.0,
    };
    libm::pow(per_unit, f64::from(factor.exponent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn feet_and_meters_are_dimensionally_consistent() {
        let m = UnitExpr::make("m", 1);
        let ft = UnitExpr::make("ft", 1);
        assert!(m.is_dimensionally_consistent(&ft));
    }

    #[test]
    fn meters_and_seconds_are_not_consistent() {
        let m = UnitExpr::make("m", 1);
        let s = UnitExpr::make("s", 1);
        assert!(!m.is_dimensionally_consistent(&s));
    }

    #[test]
    fn convert_one_meter_to_centimeters() {
        let s = settings();
        let one_meter = UnitValue::new(Decimal::from_i64(1), UnitExpr::make("m", 1));
        let in_cm = one_meter.convert(&UnitExpr::make("cm", 1), &s).unwrap();
        assert!((in_cm.value.to_f64() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn adding_incompatible_units_errors() {
        let s = settings();
        let length = UnitValue::new(Decimal::from_i64(1), UnitExpr::make("m", 1));
        let time = UnitValue::new(Decimal::from_i64(1), UnitExpr::make("s", 1));
        assert!(length.add(&time, &s).is_err());
    }

    #[test]
    fn velocity_unit_multiplies_and_divides() {
        let s = settings();
        let distance = UnitValue::new(Decimal::from_i64(10), UnitExpr::make("m", 1));
        let time = UnitValue::new(Decimal::from_i64(2), UnitExpr::make("s", 1));
        let velocity = distance.div(&time, &s).unwrap();
        assert_eq!(velocity.unit.render(), "m*s^-1");
    }
}
