// File: src/interpreter/native_functions/math.rs
//
// Math-related native functions

use crate::ast::Node;
use crate::errors::SourceLocation;
use crate::interpreter::diagnostics::Fault;
use crate::interpreter::{Interpreter, Value};

pub const NAMES: &[&str] = &["abs", "sqrt", "floor", "ceil", "round", "pow", "min", "max"];

/// Handle math-related function calls
/// Returns Some(value) if the function was handled, None if not recognized
pub fn handle(
    interp: &mut Interpreter,
    name: &str,
    args: &[Node],
    location: &SourceLocation,
) -> Option<Value> {
    let result = match name {
        // Single argument
        "abs" | "sqrt" | "floor" | "ceil" | "round" => {
            let values = interp.evaluate_arguments(args);
            numbers::<1>(name, &values).map(|[x]| {
                let result = match name {
                    "abs" => x.abs(),
                    "sqrt" => x.sqrt(),
                    "floor" => x.floor(),
                    "ceil" => x.ceil(),
                    _ => x.round(),
                };
                Value::Number(result)
            })
        }

        // Two arguments
        "pow" | "min" | "max" => {
            let values = interp.evaluate_arguments(args);
            numbers::<2>(name, &values).map(|[a, b]| {
                let result = match name {
                    "pow" => a.powf(b),
                    "min" => a.min(b),
                    _ => a.max(b),
                };
                Value::Number(result)
            })
        }

        _ => return None,
    };

    Some(interp.settle(result, location.clone()))
}

/// Exactly N number arguments
fn numbers<const N: usize>(name: &str, values: &[Value]) -> Result<[f64; N], Fault> {
    if values.len() != N {
        return Err(Fault::arity(name, &N.to_string(), values.len(), Value::Number(0.0)));
    }
    let mut numbers = [0.0; N];
    for (slot, value) in numbers.iter_mut().zip(values) {
        *slot = value.as_number().ok_or_else(|| {
            Fault::type_error(
                format!("{} expects numbers but received {}", name, value.kind_name()),
                Value::Number(0.0),
            )
        })?;
    }
    Ok(numbers)
}
