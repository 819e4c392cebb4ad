//! End-to-end scenarios over the public API, independent of any single
//! module's internals: object wire round-trips, the numeric tower's
//! promotion rules, the symbolic/polynomial layer, the root finder, and
//! the runtime's GC.

use rpl_calc_core::arith::{self, BinaryOp, NumericValue, UnaryOp};
use rpl_calc_core::decimal::{Decimal, TrigFunction};
use rpl_calc_core::error::EvalError;
use rpl_calc_core::expression::Expression;
use rpl_calc_core::fraction::{Fraction, Rational};
use rpl_calc_core::integer::Integer;
use rpl_calc_core::object::{Object, Tag};
use rpl_calc_core::polynomial::Polynomial;
use rpl_calc_core::runtime::Runtime;
use rpl_calc_core::settings::Settings;
use rpl_calc_core::solve;

fn settings() -> Settings {
    Settings::default()
}

// ---- concrete scenarios from the testable-properties list ----------------

#[test]
fn big_factorial_through_tower() {
    let twenty_five = NumericValue::Integer(Integer::new(false, 25));
    let result = arith::evaluate_unary(UnaryOp::Fact, twenty_five, &settings()).unwrap();
    let NumericValue::Integer(i) = result else { panic!("expected an exact integer result") };
    assert_eq!(rpl_calc_core::integer::render_decimal(&i, None), "15511210043330985984000000");
}

#[test]
fn fraction_normalization() {
    let six_eighths = Fraction::new(Integer::new(false, 6), Integer::new(false, 8)).unwrap();
    let Rational::Fraction(f) = &six_eighths else { panic!("expected a fraction") };
    assert_eq!(f.numerator().to_i64(), Some(3));
    assert_eq!(f.denominator().to_i64(), Some(4));
    assert_eq!(Object::Fraction(f.clone()).tag(), Tag::Fraction);

    let minus_ten_over_minus_25 = Fraction::new(Integer::new(true, 10), Integer::new(true, 25)).unwrap();
    let Rational::Fraction(f) = &minus_ten_over_minus_25 else { panic!("expected a fraction") };
    assert_eq!(f.numerator().to_i64(), Some(2));
    assert_eq!(f.denominator().to_i64(), Some(5));
    assert_eq!(Object::Fraction(f.clone()).tag(), Tag::Fraction);
}

#[test]
fn exact_angle_trig_in_degree_mode() {
    let mut s = settings();
    s.set_auto_simplify(true);
    let thirty = NumericValue::Integer(Integer::new(false, 30));
    let result = arith::evaluate_unary(UnaryOp::Trig(TrigFunction::Sin), thirty, &s).unwrap();
    match result {
        NumericValue::Fraction(f) => {
            assert_eq!(f.numerator().to_i64(), Some(1));
            assert_eq!(f.denominator().to_i64(), Some(2));
        }
        other => panic!("expected an exact fraction 1/2, got {other:?}"),
    }
}

#[test]
fn decimal_precision_round_trip_through_fraction() {
    let mut s = settings();
    s.set_precision(34);
    let tenth = Decimal::parse("0.1", &s).unwrap();
    let recovered = tenth.to_fraction(10, 12).unwrap();
    let Rational::Fraction(f) = recovered else { panic!("expected a fraction") };
    assert_eq!(f.numerator().to_i64(), Some(1));
    assert_eq!(f.denominator().to_i64(), Some(10));
}

#[test]
fn root_finder_secant_converges_on_sqrt_two() {
    let mut s = settings();
    s.set_solver_iterations(50);
    s.set_solver_precision(9);
    let guess = Decimal::from_f64(1.0, &s);
    let solution = solve::solve(|x| x * x - 2.0, &guess, &s).unwrap();
    let x = solution.root.to_f64();
    assert!((x * x - 2.0).abs() < 1e-9, "x = {x}");
}

#[test]
fn polynomial_euclidean_division_difference_of_cubes() {
    let vars = vec![String::from("X"), String::from("Y")];
    let dividend = Polynomial::make(&Expression::parse("X^3-Y^3").unwrap(), &vars).unwrap();
    let divisor = Polynomial::make(&Expression::parse("X-Y").unwrap(), &vars).unwrap();
    let (quotient, remainder) = dividend.quorem(&divisor, "X").unwrap();
    assert!(remainder.is_zero());
    assert_eq!(quotient.to_expression().render(&settings()), "X^2+X*Y+Y^2");
}

// ---- quantified invariants, spot-checked ----------------------------------

#[test]
fn object_encode_decode_round_trips_every_exact_tag() {
    let settings = settings();
    let samples = vec![
        Object::Integer(Integer::new(true, 42)),
        Object::Fraction(match Fraction::new(Integer::new(false, 3), Integer::new(false, 4)).unwrap() {
            Rational::Fraction(f) => f,
            Rational::Integer(_) => unreachable!(),
        }),
        Object::Decimal(Decimal::from_f64(3.25, &settings)),
        Object::Symbol(String::from("hello world")),
    ];
    for object in samples {
        let mut bytes = Vec::new();
        object.encode(&mut bytes);
        let (decoded, consumed) = Object::decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, object);
    }
}

#[test]
fn expression_parse_render_round_trips() {
    for text in ["x+1", "x^2+2*x+1", "-(x+1)", "a*b+c/d"] {
        let expr = Expression::parse(text).unwrap();
        assert_eq!(expr.render(&settings()), text);
    }
}

#[test]
fn gc_preserves_root_pointer_tags_and_payloads() {
    let mut rt = Runtime::with_default_heap();
    let kept = rt.make(Object::Integer(Integer::new(false, 7))).unwrap();
    rt.push(kept);
    for i in 0..16 {
        let _garbage = rt.make(Object::Integer(Integer::new(false, i))).unwrap();
    }
    rt.gc();
    let survivor = rt.top().unwrap();
    match rt.object(survivor).unwrap() {
        Object::Integer(i) => assert_eq!(i.to_i64(), Some(7)),
        other => panic!("expected an integer, got {other:?}"),
    }
}

#[test]
fn sqrt_of_negative_one_promotes_out_of_the_real_tower() {
    let minus_one = NumericValue::Integer(Integer::new(true, 1));
    let result = arith::evaluate_unary(UnaryOp::Sqrt, minus_one, &settings()).unwrap();
    assert!(matches!(result, NumericValue::Complex(_)));
}

#[test]
fn negative_base_square_root_power_yields_two_i() {
    let minus_four = NumericValue::Integer(Integer::new(true, 4));
    let one_half = NumericValue::Fraction(match Fraction::new(Integer::new(false, 1), Integer::new(false, 2)).unwrap() {
        Rational::Fraction(f) => f,
        Rational::Integer(_) => unreachable!(),
    });
    let result = arith::evaluate(BinaryOp::Pow, minus_four, one_half, &settings()).unwrap();
    let NumericValue::Complex(c) = result else { panic!("expected a complex result") };
    let (re, im) = c.to_rectangular(&settings()).unwrap();
    assert!(re.to_f64().abs() < 1e-9);
    assert!((im.to_f64() - 2.0).abs() < 1e-9);
}

#[test]
fn factorial_requires_an_integer_operand() {
    let half = NumericValue::Fraction(match Fraction::new(Integer::new(false, 1), Integer::new(false, 2)).unwrap() {
        Rational::Fraction(f) => f,
        Rational::Integer(_) => unreachable!(),
    });
    let err = arith::evaluate_unary(UnaryOp::Fact, half, &settings()).unwrap_err();
    assert!(matches!(err.kind, EvalError::TypeError));
}
