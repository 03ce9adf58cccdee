// File: src/interpreter/native_functions/strings.rs
//
// String manipulation and conversion native functions

use crate::ast::Node;
use crate::errors::SourceLocation;
use crate::interpreter::diagnostics::Fault;
use crate::interpreter::{Interpreter, Value};

pub const NAMES: &[&str] = &["len", "upper", "lower", "trim", "str", "num"];

/// Handle string-related function calls
/// Returns Some(value) if the function was handled, None if not recognized
pub fn handle(
    interp: &mut Interpreter,
    name: &str,
    args: &[Node],
    location: &SourceLocation,
) -> Option<Value> {
    if !NAMES.contains(&name) {
        return None;
    }
    let values = interp.evaluate_arguments(args);
    let result = apply(name, &values);
    Some(interp.settle(result, location.clone()))
}

fn apply(name: &str, values: &[Value]) -> Result<Value, Fault> {
    let fallback = match name {
        "len" | "num" => Value::Number(0.0),
        _ => Value::string(""),
    };
    let [value] = values else {
        return Err(Fault::arity(name, "1", values.len(), fallback));
    };

    match (name, value) {
        ("str", value) => Ok(Value::String(value.to_string())),
        ("num", Value::Number(n)) => Ok(Value::Number(*n)),
        ("num", Value::String(text)) => parse_number(text).map(Value::Number).ok_or_else(|| {
            Fault::type_error(format!("num cannot convert \"{}\" to a number", text), fallback)
        }),
        ("len", Value::String(text)) => Ok(Value::Number(text.chars().count() as f64)),
        ("upper", Value::String(text)) => Ok(Value::String(text.to_uppercase())),
        ("lower", Value::String(text)) => Ok(Value::String(text.to_lowercase())),
        ("trim", Value::String(text)) => Ok(Value::String(text.trim().to_string())),
        (_, other) => Err(Fault::type_error(
            format!("{} expects a string but received {}", name, other.kind_name()),
            fallback,
        )),
    }
}

/// Parses text that is entirely a decimal number, surrounding whitespace allowed
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let looks_numeric = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if text.is_empty() || !looks_numeric {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(apply("len", &[s("héllo")]), Ok(Value::Number(5.0)));
        assert_eq!(apply("upper", &[s("abc")]), Ok(s("ABC")));
        assert_eq!(apply("lower", &[s("AbC")]), Ok(s("abc")));
        assert_eq!(apply("trim", &[s("  x y  ")]), Ok(s("x y")));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(apply("str", &[Value::Number(2.5)]), Ok(s("2.5")));
        assert_eq!(apply("str", &[Value::Void]), Ok(s("void")));
        assert_eq!(apply("num", &[s(" 12.5 ")]), Ok(Value::Number(12.5)));
        assert_eq!(apply("num", &[Value::Number(3.0)]), Ok(Value::Number(3.0)));

        let fault = apply("num", &[s("twelve")]).unwrap_err();
        assert_eq!(fault.kind, ErrorKind::TypeError);
        assert_eq!(fault.fallback, Value::Number(0.0));
    }

    #[test]
    fn test_wrong_kind_and_count() {
        let fault = apply("upper", &[Value::Number(1.0)]).unwrap_err();
        assert_eq!(fault.kind, ErrorKind::TypeError);
        assert_eq!(fault.fallback, s(""));

        let fault = apply("len", &[s("a"), s("b")]).unwrap_err();
        assert_eq!(fault.kind, ErrorKind::ArityError);
        assert_eq!(fault.fallback, Value::Number(0.0));
    }

    #[test]
    fn test_parse_number_rejects_words() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("-1.5e3"), Some(-1500.0));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number(""), None);
    }
}
