// File: src/interpreter/operators.rs
//
// Binary and unary operator rules.
//
// Dispatch is by operator and by the kinds of both operands. Mismatched
// kinds produce Void without complaint; the only reported failures are
// division/modulo by zero and string operators that have no meaning.

use super::diagnostics::Fault;
use super::value::Value;
use crate::ast::{BinaryOperator, UnaryOperator};
use crate::errors::ErrorKind;

pub(crate) fn binary(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, Fault> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => numeric(op, *a, *b),
        (Value::String(a), Value::String(b)) => textual(op, a, b),
        _ => Ok(Value::Void),
    }
}

fn numeric(op: BinaryOperator, a: f64, b: f64) -> Result<Value, Fault> {
    let value = match op {
        BinaryOperator::Add => Value::Number(a + b),
        BinaryOperator::Sub => Value::Number(a - b),
        BinaryOperator::Mul => Value::Number(a * b),
        BinaryOperator::Div => {
            if b == 0.0 {
                return Err(zero_divisor("Division by zero"));
            }
            Value::Number(a / b)
        }
        BinaryOperator::Mod => {
            if b == 0.0 {
                return Err(zero_divisor("Modulo by zero"));
            }
            // Truncated remainder, same as C's fmod
            Value::Number(a % b)
        }
        BinaryOperator::Eq => Value::bool(a == b),
        BinaryOperator::Ne => Value::bool(a != b),
        BinaryOperator::Lt => Value::bool(a < b),
        BinaryOperator::Gt => Value::bool(a > b),
        BinaryOperator::Le => Value::bool(a <= b),
        BinaryOperator::Ge => Value::bool(a >= b),
    };
    Ok(value)
}

fn zero_divisor(message: &str) -> Fault {
    Fault::new(ErrorKind::ArithmeticError, message, Value::Number(0.0))
}

fn textual(op: BinaryOperator, a: &str, b: &str) -> Result<Value, Fault> {
    match op {
        BinaryOperator::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::String(joined))
        }
        BinaryOperator::Eq => Ok(Value::bool(a == b)),
        BinaryOperator::Ne => Ok(Value::bool(a != b)),
        other => Err(Fault::new(
            ErrorKind::InvalidOperator,
            format!("Operator '{}' is not defined for strings", other),
            Value::string(""),
        )),
    }
}

pub(crate) fn unary(op: UnaryOperator, operand: &Value) -> Value {
    match (op, operand) {
        (UnaryOperator::Neg, Value::Number(n)) => Value::Number(-n),
        (UnaryOperator::Not, Value::Number(n)) => Value::bool(*n == 0.0),
        (UnaryOperator::Not, Value::String(s)) => Value::bool(s.is_empty()),
        _ => Value::Void,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BinaryOperator::*;

    fn n(value: f64) -> Value {
        Value::Number(value)
    }

    #[test]
    fn test_number_arithmetic_matches_real_arithmetic() {
        let pairs = [(3.0, 4.0), (-2.5, 10.0), (0.0, 7.25), (1e10, -3.0)];
        for (a, b) in pairs {
            assert_eq!(binary(Add, &n(a), &n(b)), Ok(n(a + b)));
            assert_eq!(binary(Sub, &n(a), &n(b)), Ok(n(a - b)));
            assert_eq!(binary(Mul, &n(a), &n(b)), Ok(n(a * b)));
        }
        assert_eq!(binary(Div, &n(7.0), &n(2.0)), Ok(n(3.5)));
        assert_eq!(binary(Mod, &n(7.0), &n(3.0)), Ok(n(1.0)));
        assert_eq!(binary(Mod, &n(-7.0), &n(3.0)), Ok(n(-1.0)));
    }

    #[test]
    fn test_division_and_modulo_by_zero_fall_back_to_zero() {
        for op in [Div, Mod] {
            let error = binary(op, &n(5.0), &n(0.0)).unwrap_err();
            assert_eq!(error.kind, ErrorKind::ArithmeticError);
            assert_eq!(error.fallback, n(0.0));
        }
    }

    #[test]
    fn test_comparisons_yield_one_or_zero() {
        assert_eq!(binary(Lt, &n(1.0), &n(2.0)), Ok(n(1.0)));
        assert_eq!(binary(Gt, &n(1.0), &n(2.0)), Ok(n(0.0)));
        assert_eq!(binary(Le, &n(2.0), &n(2.0)), Ok(n(1.0)));
        assert_eq!(binary(Ge, &n(1.0), &n(2.0)), Ok(n(0.0)));
        assert_eq!(binary(Eq, &n(2.0), &n(2.0)), Ok(n(1.0)));
        assert_eq!(binary(Ne, &n(2.0), &n(2.0)), Ok(n(0.0)));
    }

    #[test]
    fn test_string_operators() {
        let ab = Value::string("ab");
        let cd = Value::string("cd");
        assert_eq!(binary(Add, &ab, &cd), Ok(Value::string("abcd")));
        assert_eq!(binary(Eq, &ab, &Value::string("ab")), Ok(n(1.0)));
        assert_eq!(binary(Ne, &ab, &cd), Ok(n(1.0)));

        let error = binary(Lt, &ab, &cd).unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidOperator);
        assert_eq!(error.fallback, Value::string(""));
    }

    #[test]
    fn test_mismatched_kinds_yield_void_silently() {
        assert_eq!(binary(Add, &n(1.0), &Value::string("x")), Ok(Value::Void));
        assert_eq!(binary(Eq, &Value::Void, &Value::Void), Ok(Value::Void));
        assert_eq!(binary(Div, &Value::string("x"), &n(0.0)), Ok(Value::Void));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(unary(UnaryOperator::Neg, &n(4.0)), n(-4.0));
        assert_eq!(unary(UnaryOperator::Neg, &Value::string("x")), Value::Void);
        assert_eq!(unary(UnaryOperator::Not, &n(0.0)), n(1.0));
        assert_eq!(unary(UnaryOperator::Not, &n(3.0)), n(0.0));
        assert_eq!(unary(UnaryOperator::Not, &Value::string("")), n(1.0));
        assert_eq!(unary(UnaryOperator::Not, &Value::string("x")), n(0.0));
        assert_eq!(unary(UnaryOperator::Not, &Value::Void), Value::Void);
    }
}
