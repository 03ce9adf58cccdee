// File: src/interpreter/native_functions/mod.rs
//
// Native (built-in) functions, split by category.
//
// Every category answers a call by name with `Some(value)` when it owns the
// name and `None` otherwise, so a handled call that yields Void is never
// mistaken for an unknown one. Natives receive the raw argument nodes and
// evaluate them as they need.

pub mod extensions;
pub mod graphics;
pub mod io;
pub mod math;
pub mod strings;

use super::{Interpreter, Value};
use crate::ast::Node;
use crate::errors::SourceLocation;
use tracing::trace;

/// Main dispatcher that routes native function calls to the category modules
pub fn call_native_function(
    interp: &mut Interpreter,
    name: &str,
    args: &[Node],
    location: &SourceLocation,
) -> Option<Value> {
    let result = io::handle(interp, name, args, location)
        .or_else(|| strings::handle(interp, name, args, location))
        .or_else(|| math::handle(interp, name, args, location))
        .or_else(|| graphics::handle(interp, name, args, location))
        .or_else(|| extensions::handle(interp, name, args, location));

    if result.is_some() {
        trace!(name, "native call handled");
    }
    result
}

/// Names of every built-in callable, graphics included
pub fn builtin_names() -> Vec<&'static str> {
    let mut names = Vec::new();
    names.extend_from_slice(io::NAMES);
    names.extend_from_slice(strings::NAMES);
    names.extend_from_slice(math::NAMES);
    names.extend_from_slice(graphics::NAMES);
    names
}
