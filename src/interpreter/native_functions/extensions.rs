// File: src/interpreter/native_functions/extensions.rs
//
// Native extension modules.
//
// An extension is activated by `use <name>` and registers native callables
// on the interpreter. Registered callables are consulted after the built-in
// categories, so they can shadow user functions but not builtins.

use crate::ast::Node;
use crate::errors::SourceLocation;
use crate::interpreter::diagnostics::Fault;
use crate::interpreter::{Interpreter, Value};
use tracing::debug;

/// Signature of a registered native callable
pub type NativeFunction = fn(&mut Interpreter, &[Node]) -> Result<Value, Fault>;

/// Extension modules known by name, with the callables each registers
const EXTENSIONS: &[(&str, &[(&str, NativeFunction)])] = &[(
    "stringutils",
    &[("reverse", string_reverse as NativeFunction), ("uppercase", string_uppercase as NativeFunction)],
)];

/// Activates the extension called `module`; false if there is none
pub fn activate(interp: &mut Interpreter, module: &str) -> bool {
    let Some((_, functions)) = EXTENSIONS.iter().find(|(name, _)| *name == module) else {
        return false;
    };
    for (name, function) in functions.iter() {
        interp.register_function(name, *function);
    }
    debug!(module, functions = functions.len(), "extension activated");
    true
}

/// Handle calls to registered extension callables
/// Returns Some(value) if the function was handled, None if not recognized
pub fn handle(
    interp: &mut Interpreter,
    name: &str,
    args: &[Node],
    location: &SourceLocation,
) -> Option<Value> {
    let function = interp.native(name)?;
    let result = function(interp, args);
    Some(interp.settle(result, location.clone()))
}

fn single_string(interp: &mut Interpreter, name: &str, args: &[Node]) -> Result<String, Fault> {
    let [arg] = args else {
        return Err(Fault::arity(name, "1", args.len(), Value::string("")));
    };
    match interp.eval_value(arg) {
        Value::String(text) => Ok(text),
        other => Err(Fault::type_error(
            format!("{} requires a string, found {}", name, other.kind_name()),
            Value::string(""),
        )),
    }
}

fn string_reverse(interp: &mut Interpreter, args: &[Node]) -> Result<Value, Fault> {
    let text = single_string(interp, "reverse", args)?;
    Ok(Value::String(text.chars().rev().collect()))
}

fn string_uppercase(interp: &mut Interpreter, args: &[Node]) -> Result<Value, Fault> {
    let text = single_string(interp, "uppercase", args)?;
    Ok(Value::String(text.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_callables_exist_only_after_activation() {
        let mut interp = Interpreter::new();
        assert_eq!(interp.eval_value(&call("reverse", vec![string("abc")])), Value::Void);
        assert_eq!(interp.diagnostics().kinds(), vec![ErrorKind::UndefinedFunction]);

        assert!(activate(&mut interp, "stringutils"));
        assert_eq!(interp.eval_value(&call("reverse", vec![string("abc")])), Value::string("cba"));
        assert_eq!(interp.eval_value(&call("uppercase", vec![string("abc")])), Value::string("ABC"));
    }

    #[test]
    fn test_unknown_extension_is_not_activated() {
        let mut interp = Interpreter::new();
        assert!(!activate(&mut interp, "graphics_pro"));
    }

    #[test]
    fn test_extension_argument_errors_yield_empty_string() {
        let mut interp = Interpreter::new();
        activate(&mut interp, "stringutils");

        assert_eq!(interp.eval_value(&call("reverse", vec![])), Value::string(""));
        assert_eq!(interp.eval_value(&call("reverse", vec![num(1.0)])), Value::string(""));
        assert_eq!(
            interp.diagnostics().kinds(),
            vec![ErrorKind::ArityError, ErrorKind::TypeError]
        );
    }
}
