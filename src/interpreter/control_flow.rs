// File: src/interpreter/control_flow.rs
//
// Control flow signal for early returns.
//
// Every statement evaluation yields a Flow. Sequences (program, block) and
// loops stop as soon as they see `Returning` and hand it upward unchanged; the
// call protocol is the only place that turns it back into a plain value.

use super::value::Value;

/// Result of evaluating a node
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Evaluation finished normally with this value
    Normal(Value),
    /// A return statement fired; enclosing sequences must stop
    Returning(Value),
}

impl Flow {
    pub fn void() -> Self {
        Flow::Normal(Value::Void)
    }

    /// The carried value, whichever way evaluation ended
    pub fn into_value(self) -> Value {
        match self {
            Flow::Normal(value) | Flow::Returning(value) => value,
        }
    }
}
