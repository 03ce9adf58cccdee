// File: src/interpreter/environment.rs
//
// Variable and function storage for the DMO interpreter.
//
// The environment is a stack of call frames. Each frame owns a variable
// table and a function table. A lookup that misses the current frame falls
// back to the frame of the *caller*, one hop only: a function sees the
// variables live in the frame that called it, not the ones visible where it
// was defined, and not the caller's own fallback. `ScopeFallback::CallerChain`
// widens the fallback to the whole live call chain.

use super::value::Value;
use crate::ast::FunctionDecl;
use crate::config::ScopeFallback;
use ahash::AHashMap;
use std::rc::Rc;

/// A declared variable. The type name is informational and never enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub type_name: String,
    pub value: Value,
}

/// One call frame: the tables created for a single function invocation
#[derive(Debug, Default)]
struct Frame {
    owner: String,
    variables: AHashMap<String, Variable>,
    functions: AHashMap<String, Rc<FunctionDecl>>,
}

impl Frame {
    fn new(owner: &str) -> Self {
        Frame { owner: owner.to_string(), ..Default::default() }
    }
}

/// Call-frame stack with one-hop fallback lookup
///
/// # Examples
///
/// ```
/// use dmo::config::ScopeFallback;
/// use dmo::interpreter::{Environment, Value};
///
/// let mut env = Environment::new(ScopeFallback::SingleHop);
/// env.declare_or_set("x", "int", Value::Number(1.0));
///
/// env.push_frame("f");
/// assert_eq!(env.lookup_variable("x"), Some(&Value::Number(1.0)));
/// env.declare_or_set("x", "int", Value::Number(2.0)); // new local, caller untouched
/// env.pop_frame();
///
/// assert_eq!(env.lookup_variable("x"), Some(&Value::Number(1.0)));
/// ```
#[derive(Debug)]
pub struct Environment {
    frames: Vec<Frame>,
    fallback: ScopeFallback,
}

impl Environment {
    /// Create an environment holding only the root frame
    pub fn new(fallback: ScopeFallback) -> Self {
        Environment { frames: vec![Frame::new("<program>")], fallback }
    }

    /// Enter a function invocation
    pub fn push_frame(&mut self, owner: &str) {
        self.frames.push(Frame::new(owner));
    }

    /// Leave a function invocation, dropping every binding it owned.
    /// The root frame is never popped.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of live frames, root included
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Owners of the live frames, outermost first
    pub fn call_stack(&self) -> Vec<String> {
        self.frames.iter().map(|frame| frame.owner.clone()).collect()
    }

    /// Frames consulted by a lookup, innermost first
    fn visible(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev().take(self.reach())
    }

    fn reach(&self) -> usize {
        match self.fallback {
            ScopeFallback::SingleHop => 2,
            ScopeFallback::CallerChain => self.frames.len(),
        }
    }

    fn current(&mut self) -> &mut Frame {
        let index = self.frames.len() - 1;
        &mut self.frames[index]
    }

    /// Declare a variable in the current frame, or replace the value of the
    /// local binding with that name (its type name is kept).
    pub fn declare_or_set(&mut self, name: &str, type_name: &str, value: Value) {
        let frame = self.current();
        match frame.variables.get_mut(name) {
            Some(variable) => variable.value = value,
            None => {
                frame
                    .variables
                    .insert(name.to_string(), Variable { type_name: type_name.to_string(), value });
            }
        }
    }

    /// Look a variable up in the current frame, then the fallback
    pub fn lookup_variable(&self, name: &str) -> Option<&Value> {
        self.lookup_binding(name).map(|variable| &variable.value)
    }

    /// Like `lookup_variable` but returns the whole binding
    pub fn lookup_binding(&self, name: &str) -> Option<&Variable> {
        self.visible().find_map(|frame| frame.variables.get(name))
    }

    /// Replace the value of an existing binding wherever lookup finds it.
    /// Returns false when the name is not visible.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        let reach = self.reach();
        for frame in self.frames.iter_mut().rev().take(reach) {
            if let Some(variable) = frame.variables.get_mut(name) {
                variable.value = value;
                return true;
            }
        }
        false
    }

    /// Register a function in the current frame; the latest declaration wins
    pub fn declare_function(&mut self, decl: Rc<FunctionDecl>) {
        self.current().functions.insert(decl.name.clone(), decl);
    }

    /// Look a function up in the current frame, then the fallback
    pub fn lookup_function(&self, name: &str) -> Option<Rc<FunctionDecl>> {
        self.visible().find_map(|frame| frame.functions.get(name)).cloned()
    }

    /// True when some live frame binds `name`, reachable from here or not
    pub fn has_variable_anywhere(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.variables.contains_key(name))
    }

    /// True when some live frame defines `name`, reachable from here or not
    pub fn has_function_anywhere(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.functions.contains_key(name))
    }

    /// Every variable name a lookup from here could reach
    pub fn visible_variable_names(&self) -> Vec<&str> {
        self.visible().flat_map(|frame| frame.variables.keys().map(String::as_str)).collect()
    }

    /// Every function name a lookup from here could reach
    pub fn visible_function_names(&self) -> Vec<&str> {
        self.visible().flat_map(|frame| frame.functions.keys().map(String::as_str)).collect()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(ScopeFallback::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;

    fn decl(name: &str) -> Rc<FunctionDecl> {
        Rc::new(FunctionDecl {
            name: name.to_string(),
            return_type: "int".to_string(),
            params: vec![],
            body: build::block(vec![]),
        })
    }

    #[test]
    fn test_redeclaration_in_same_frame_overwrites_value_and_keeps_type() {
        let mut env = Environment::default();
        env.declare_or_set("x", "int", Value::Number(1.0));
        env.declare_or_set("x", "string", Value::string("now text"));

        let binding = env.lookup_binding("x").unwrap();
        assert_eq!(binding.type_name, "int");
        assert_eq!(binding.value, Value::string("now text"));
    }

    #[test]
    fn test_single_hop_sees_caller_but_not_callers_caller() {
        let mut env = Environment::new(ScopeFallback::SingleHop);
        env.declare_or_set("global", "int", Value::Number(1.0));
        env.push_frame("main");
        env.declare_or_set("local", "int", Value::Number(2.0));
        env.push_frame("helper");

        assert_eq!(env.lookup_variable("local"), Some(&Value::Number(2.0)));
        assert_eq!(env.lookup_variable("global"), None);
        assert!(env.has_variable_anywhere("global"));
    }

    #[test]
    fn test_caller_chain_walks_every_live_frame() {
        let mut env = Environment::new(ScopeFallback::CallerChain);
        env.declare_or_set("global", "int", Value::Number(1.0));
        env.declare_function(decl("fact"));
        env.push_frame("main");
        env.push_frame("fact");

        assert_eq!(env.lookup_variable("global"), Some(&Value::Number(1.0)));
        assert!(env.lookup_function("fact").is_some());
    }

    #[test]
    fn test_assign_through_fallback_mutates_callers_binding() {
        let mut env = Environment::default();
        env.declare_or_set("count", "int", Value::Number(1.0));
        env.push_frame("bump");

        assert!(env.assign("count", Value::Number(5.0)));
        assert!(!env.assign("missing", Value::Number(5.0)));
        env.pop_frame();

        assert_eq!(env.lookup_variable("count"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn test_pop_frame_drops_locals_and_keeps_root() {
        let mut env = Environment::default();
        env.push_frame("f");
        env.declare_or_set("tmp", "int", Value::Number(3.0));
        env.pop_frame();
        env.pop_frame();

        assert_eq!(env.depth(), 1);
        assert_eq!(env.lookup_variable("tmp"), None);
    }

    #[test]
    fn test_later_function_declaration_wins() {
        let mut env = Environment::default();
        let first = decl("f");
        let mut second = (*decl("f")).clone();
        second.return_type = "string".to_string();

        env.declare_function(first);
        env.declare_function(Rc::new(second));

        assert_eq!(env.lookup_function("f").unwrap().return_type, "string");
    }
}
