// File: src/interpreter/calls.rs
//
// Function call protocol.
//
// A call is first offered to the native registries with its raw argument
// nodes. Only when none of them handles the name is a user function looked
// up. Arguments to a user function are evaluated in the caller's frame, then
// bound in a fresh frame pushed on top of it.

use super::{native_functions, Interpreter, Value, OUT_OF_REACH_NOTE};
use crate::ast::{FunctionDecl, Node};
use crate::errors::{find_closest_match, DmoError, ErrorKind, SourceLocation};
use std::rc::Rc;
use tracing::debug;

impl Interpreter {
    /// Calls `name` with unevaluated argument nodes
    pub fn call_function(&mut self, name: &str, args: &[Node], location: SourceLocation) -> Value {
        if let Some(value) = native_functions::call_native_function(self, name, args, &location) {
            return value;
        }

        match self.env.lookup_function(name) {
            Some(function) => self.call_user_function(function, args, location),
            None => {
                self.report_undefined_function(name, location);
                Value::Void
            }
        }
    }

    fn call_user_function(
        &mut self,
        function: Rc<FunctionDecl>,
        args: &[Node],
        location: SourceLocation,
    ) -> Value {
        if self.env.depth() > self.config.max_call_depth {
            self.report(
                DmoError::new(
                    ErrorKind::RecursionLimit,
                    format!(
                        "Call to '{}' exceeds the maximum call depth of {}",
                        function.name, self.config.max_call_depth
                    ),
                    location,
                )
                .with_help("Raise max_call_depth in the configuration to allow deeper recursion"),
            );
            return Value::Void;
        }

        // Surplus arguments are never evaluated; surplus parameters stay unbound
        let bound = function.params.len().min(args.len());
        let values = self.evaluate_arguments(&args[..bound]);

        debug!(function = %function.name, args = bound, depth = self.env.depth(), "calling function");
        self.env.push_frame(&function.name);
        for (param, value) in function.params.iter().zip(values) {
            self.env.declare_or_set(&param.name, &param.type_name, value);
        }

        let result = self.evaluate(&function.body).into_value();

        self.env.pop_frame();
        result
    }

    fn report_undefined_function(&mut self, name: &str, location: SourceLocation) {
        let mut error = DmoError::undefined_function(name, location);

        let mut candidates = self.env.visible_function_names();
        candidates.extend(native_functions::builtin_names());
        candidates.extend(self.native_names());
        if let Some(suggestion) = find_closest_match(name, candidates) {
            error = error.with_suggestion(suggestion);
        }
        if self.env.has_function_anywhere(name) {
            error = error.with_note(OUT_OF_REACH_NOTE);
        }
        self.report(error);
    }
}
