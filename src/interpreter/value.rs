// File: src/interpreter/value.rs
//
// Runtime value types for the DMO language.
// Values are by-value: cloning a string duplicates its text, so no two
// bindings ever alias the same storage.

use std::fmt;

/// A runtime value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Number(f64),
    String(String),
    #[default]
    Void,
}

impl Value {
    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    /// Numeric boolean result used by comparisons and `!`
    pub fn bool(flag: bool) -> Self {
        Value::Number(if flag { 1.0 } else { 0.0 })
    }

    /// Value of a declaration with no initializer
    pub fn default_for_type(type_name: &str) -> Self {
        match type_name {
            "int" => Value::Number(0.0),
            "string" | "char" => Value::String(String::new()),
            _ => Value::Void,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Truthiness used by `if`: non-zero numbers and non-empty strings
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Void => false,
        }
    }

    /// Truthiness used by loop conditions: only numbers can be true
    pub fn is_loop_truthy(&self) -> bool {
        matches!(self, Value::Number(n) if *n != 0.0)
    }

    /// Name of the value's kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Void => "void",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Void => f.write_str("void"),
        }
    }
}

/// Formats a number the way C's `%.6g` does: six significant digits,
/// trailing zeros removed, exponent notation outside `1e-4 ..< 1e6`.
pub fn format_number(n: f64) -> String {
    const PRECISION: i32 = 6;

    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; the exponent may change (9.999995 -> 10)
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let mantissa = strip_trailing_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent).max(0) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn strip_trailing_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_matches_percent_g() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(123456.0), "123456");
        assert_eq!(format_number(1234567.0), "1.23457e+06");
        assert_eq!(format_number(1000000.0), "1e+06");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.00001234), "1.234e-05");
        assert_eq!(format_number(12.3456789), "12.3457");
        assert_eq!(format_number(f64::INFINITY), "inf");
        assert_eq!(format_number(f64::NAN), "nan");
    }

    #[test]
    fn test_display_renders_each_kind() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(Value::Void.to_string(), "void");
    }

    #[test]
    fn test_truthiness_rules() {
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::string("x").is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(!Value::Void.is_truthy());

        assert!(Value::Number(2.0).is_loop_truthy());
        assert!(!Value::string("x").is_loop_truthy());
        assert!(!Value::Void.is_loop_truthy());
    }

    #[test]
    fn test_clone_duplicates_string_text() {
        let original = Value::string("abc");
        let mut copy = original.clone();
        if let Value::String(text) = &mut copy {
            text.push('d');
        }
        assert_eq!(original, Value::string("abc"));
        assert_eq!(copy, Value::string("abcd"));
    }

    #[test]
    fn test_declaration_defaults_by_type_name() {
        assert_eq!(Value::default_for_type("int"), Value::Number(0.0));
        assert_eq!(Value::default_for_type("string"), Value::string(""));
        assert_eq!(Value::default_for_type("char"), Value::string(""));
        assert_eq!(Value::default_for_type("float"), Value::Void);
    }
}
