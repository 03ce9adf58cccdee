// File: src/interpreter/native_functions/io.rs
//
// I/O-related native functions: printing, reading input lines, reading files.
//
// `scanf` and `fget` store into a variable named by their target argument, so
// that argument is taken as an identifier node and never evaluated.

use super::strings::parse_number;
use crate::ast::Node;
use crate::errors::{DmoError, ErrorKind, SourceLocation};
use crate::interpreter::diagnostics::Fault;
use crate::interpreter::{Interpreter, Value};
use std::fs;

pub const NAMES: &[&str] = &["show.txt", "scanf", "fget"];

/// Handle I/O-related function calls
/// Returns Some(value) if the function was handled, None if not recognized
pub fn handle(
    interp: &mut Interpreter,
    name: &str,
    args: &[Node],
    location: &SourceLocation,
) -> Option<Value> {
    match name {
        "show.txt" => {
            let parts: Vec<String> =
                interp.evaluate_arguments(args).iter().map(Value::to_string).collect();
            interp.write_output(&parts.join(" "));
        }
        "scanf" => scanf(interp, args, location),
        "fget" => fget(interp, args, location),
        _ => return None,
    }
    Some(Value::Void)
}

fn scanf(interp: &mut Interpreter, args: &[Node], location: &SourceLocation) {
    let target = match target_name("scanf", args, 1, 0) {
        Ok(target) => target,
        Err(fault) => {
            interp.settle(Err(fault), location.clone());
            return;
        }
    };

    let value = match interp.read_line() {
        Ok(Some(line)) => match parse_number(&line) {
            Some(n) => Value::Number(n),
            None => Value::String(line),
        },
        Ok(None) => Value::string(""),
        Err(e) => {
            interp.report(DmoError::new(
                ErrorKind::IoError,
                format!("scanf failed to read input: {}", e),
                location.clone(),
            ));
            Value::string("")
        }
    };
    store(interp, target, value);
}

fn fget(interp: &mut Interpreter, args: &[Node], location: &SourceLocation) {
    let target = match target_name("fget", args, 2, 1) {
        Ok(target) => target,
        Err(fault) => {
            interp.settle(Err(fault), location.clone());
            return;
        }
    };

    let path = match interp.eval_value(&args[0]) {
        Value::String(path) => path,
        other => {
            let fault = Fault::type_error(
                format!("fget expects a file path string but received {}", other.kind_name()),
                Value::Void,
            );
            interp.settle(Err(fault), location.clone());
            return;
        }
    };

    match fs::read_to_string(&path) {
        Ok(contents) => store(interp, target, Value::String(contents)),
        Err(e) => interp.report(DmoError::new(
            ErrorKind::IoError,
            format!("fget could not read '{}': {}", path, e),
            location.clone(),
        )),
    }
}

/// The identifier at `args[position]`, after checking the argument count
fn target_name<'a>(
    name: &str,
    args: &'a [Node],
    expected: usize,
    position: usize,
) -> Result<&'a str, Fault> {
    if args.len() != expected {
        return Err(Fault::arity(name, &expected.to_string(), args.len(), Value::Void));
    }
    args[position].as_identifier().ok_or_else(|| {
        Fault::type_error(
            format!("{} needs a variable name to store into, found {}", name, args[position].kind_name()),
            Value::Void,
        )
    })
}

/// Assigns to a visible variable, or declares it in the current frame
fn store(interp: &mut Interpreter, target: &str, value: Value) {
    if !interp.env.assign(target, value.clone()) {
        let type_name = match value {
            Value::Number(_) => "int",
            _ => "string",
        };
        interp.env.declare_or_set(target, type_name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use std::io::Cursor;
    use std::io::Write as _;
    use std::sync::{Arc, Mutex};

    fn interpreter(input: &str) -> (Interpreter, Arc<Mutex<Vec<u8>>>) {
        let mut interp = Interpreter::new();
        let buffer = Arc::new(Mutex::new(Vec::new()));
        interp.set_output(buffer.clone());
        interp.set_input(Box::new(Cursor::new(input.to_string())));
        (interp, buffer)
    }

    fn output(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn test_show_txt_joins_rendered_values() {
        let (mut interp, buffer) = interpreter("");
        let result = interp.eval_value(&call("show.txt", vec![string("total:"), num(2.5)]));

        assert_eq!(result, Value::Void);
        assert_eq!(output(&buffer), "total: 2.5\n");
    }

    #[test]
    fn test_scanf_stores_numbers_and_text() {
        let (mut interp, _) = interpreter("42\nhello world\n");
        interp.evaluate(&program(vec![
            call("scanf", vec![ident("age")]),
            var("string", "name", None),
            call("scanf", vec![ident("name")]),
            call("scanf", vec![ident("rest")]),
        ]));

        assert_eq!(interp.variable("age"), Some(Value::Number(42.0)));
        assert_eq!(interp.variable("name"), Some(Value::string("hello world")));
        assert_eq!(interp.variable("rest"), Some(Value::string("")));
        assert!(interp.diagnostics().is_empty());
    }

    #[test]
    fn test_scanf_rejects_non_identifier_target() {
        let (mut interp, _) = interpreter("1\n");
        interp.eval_value(&call("scanf", vec![string("x")]));
        interp.eval_value(&call("scanf", vec![]));

        assert_eq!(
            interp.diagnostics().kinds(),
            vec![ErrorKind::TypeError, ErrorKind::ArityError]
        );
    }

    #[test]
    fn test_fget_reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "line one\nline two\n").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let (mut interp, _) = interpreter("");
        interp.eval_value(&call("fget", vec![string(&path), ident("contents")]));

        assert_eq!(interp.variable("contents"), Some(Value::string("line one\nline two\n")));
    }

    #[test]
    fn test_fget_failure_leaves_target_untouched() {
        let (mut interp, _) = interpreter("");
        interp.evaluate(&program(vec![
            var("string", "contents", Some(string("before"))),
            call("fget", vec![string("/definitely/not/here.txt"), ident("contents")]),
        ]));

        assert_eq!(interp.variable("contents"), Some(Value::string("before")));
        assert_eq!(interp.diagnostics().kinds(), vec![ErrorKind::IoError]);
    }
}
