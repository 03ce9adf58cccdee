// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the DMO scripting language.
// Executes DMO programs by traversing the AST directly.
//
// The interpreter owns the environment (a stack of call frames holding
// variables and functions), the diagnostic stream, the graphics context and
// the module loader. Evaluation never aborts: a failing operation is reported
// to the diagnostics and replaced with a safe default value, so later
// independent statements still run.
//
// Values in DMO are numbers, strings, or void.

// Module structure
mod calls;
mod control_flow;
mod diagnostics;
mod environment;
pub mod native_functions;
mod operators;
mod value;

pub use control_flow::Flow;
pub use diagnostics::{Diagnostics, Fault};
pub use environment::{Environment, Variable};
pub use native_functions::extensions::NativeFunction;
pub use native_functions::graphics::{Color, GraphicsContext, GraphicsElement, Rect, Shape};
pub use value::{format_number, Value};

use crate::ast::{Node, NodeKind};
use crate::config::InterpreterConfig;
use crate::errors::{find_closest_match, DmoError, ErrorKind, SourceLocation};
use crate::module::{ModuleLoader, ModuleSource};
use ahash::AHashMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace};

/// Text a `dmo.<member>` access evaluates to
pub const GRAPHICS_SENTINEL: &str = "dmo_graphics_call";

/// Attached to lookups that miss a name bound in a frame beyond the fallback
pub(crate) const OUT_OF_REACH_NOTE: &str = "the name exists in an outer call frame, but lookups only \
     reach the caller's frame; set scope_fallback = \"caller-chain\" to search every frame";

/// What a complete run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Value of the last top-level statement
    pub setup_result: Value,
    /// Return value of `main`, when the program defines one
    pub main_result: Option<Value>,
    /// Number of runtime errors reported during the run
    pub error_count: usize,
}

impl RunOutcome {
    /// The program's result: `main`'s value if it ran, else the top level's
    pub fn result(&self) -> &Value {
        self.main_result.as_ref().unwrap_or(&self.setup_result)
    }

    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

/// Main interpreter that executes DMO programs
pub struct Interpreter {
    env: Environment,
    diagnostics: Diagnostics,
    graphics: GraphicsContext,
    module_loader: ModuleLoader,
    natives: AHashMap<String, NativeFunction>,
    output: Option<Arc<Mutex<Vec<u8>>>>,
    input: Option<Box<dyn BufRead>>,
    config: InterpreterConfig,
    source_file: Option<String>,
}

impl Interpreter {
    /// Creates an interpreter with the default configuration
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Interpreter {
            env: Environment::new(config.scope_fallback),
            diagnostics: Diagnostics::new(config.echo_diagnostics),
            graphics: GraphicsContext::new(&config.window),
            module_loader: ModuleLoader::new(config.module_paths.clone()),
            natives: AHashMap::new(),
            output: None,
            input: None,
            config,
            source_file: None,
        }
    }

    /// Sets the file name attached to reported error locations
    pub fn set_source_file(&mut self, file: impl Into<String>) {
        self.source_file = Some(file.into());
    }

    /// Sets the output sink for program output (used for testing)
    pub fn set_output(&mut self, output: Arc<Mutex<Vec<u8>>>) {
        self.output = Some(output);
    }

    /// Sets the line source read by `scanf`; stdin when unset
    pub fn set_input(&mut self, input: Box<dyn BufRead>) {
        self.input = Some(input);
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn graphics(&self) -> &GraphicsContext {
        &self.graphics
    }

    /// Mutable graphics state, for hosts that feed simulated input
    pub fn graphics_mut(&mut self) -> &mut GraphicsContext {
        &mut self.graphics
    }

    pub fn module_loader(&self) -> &ModuleLoader {
        &self.module_loader
    }

    /// Current value of a visible variable
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.env.lookup_variable(name).cloned()
    }

    /// Registers a native callable; it shadows user functions of the same name
    pub fn register_function(&mut self, name: &str, function: NativeFunction) {
        debug!(name, "registering native function");
        self.natives.insert(name.to_string(), function);
    }

    pub(crate) fn native(&self, name: &str) -> Option<NativeFunction> {
        self.natives.get(name).copied()
    }

    pub(crate) fn native_names(&self) -> impl Iterator<Item = &str> {
        self.natives.keys().map(String::as_str)
    }

    /// Runs a whole program: top-level statements, then `main` if defined,
    /// then graphics teardown.
    pub fn interpret(&mut self, program: &Node) -> RunOutcome {
        info!(statements = program.children().len(), "running DMO program");
        let setup_result = self.evaluate(program).into_value();

        let main_result = if self.env.lookup_function("main").is_some() {
            let result = self.call_function("main", &[], program.location());
            if let Value::Number(n) = result {
                self.write_output(&format!("Program returned: {}", format_number(n)));
            }
            Some(result)
        } else {
            None
        };

        if let Value::Number(n) = setup_result {
            self.write_output(&format!("Program setup returned: {}", format_number(n)));
        }

        self.finish_graphics();

        RunOutcome { setup_result, main_result, error_count: self.diagnostics.len() }
    }

    /// Closes the SVG document, writing it out when a path is configured
    pub fn finish_graphics(&mut self) -> Option<String> {
        let document = self.graphics.finish()?;
        if let Some(path) = self.config.svg_output.clone() {
            match fs::write(&path, &document) {
                Ok(()) => info!(path = %path.display(), "SVG output saved"),
                Err(e) => self.report(DmoError::new(
                    ErrorKind::IoError,
                    format!("Failed to write SVG output {}: {}", path.display(), e),
                    SourceLocation::unknown(),
                )),
            }
        }
        Some(document)
    }

    /// Evaluates a node, reporting whether a return is in flight
    pub fn evaluate(&mut self, node: &Node) -> Flow {
        trace!(node = node.kind_name(), line = node.line, "evaluate");
        match &node.kind {
            NodeKind::Program { statements } | NodeKind::Block { statements } => {
                self.eval_sequence(statements)
            }

            NodeKind::UseStatement { module } => {
                self.load_module(module, self.locate(node));
                Flow::void()
            }

            NodeKind::FunctionDef(decl) => {
                debug!(function = %decl.name, params = decl.params.len(), "defining function");
                self.env.declare_function(Rc::clone(decl));
                Flow::void()
            }

            NodeKind::VariableDecl { type_name, name, initializer } => {
                let value = match initializer {
                    Some(init) => self.eval_value(init),
                    None => Value::default_for_type(type_name),
                };
                self.env.declare_or_set(name, type_name, value.clone());
                Flow::Normal(value)
            }

            NodeKind::Assignment { target, value } => {
                let value = self.eval_value(value);
                if let Some(name) = target.as_identifier() {
                    if !self.env.assign(name, value.clone()) {
                        self.report_undefined_variable(name, self.locate(target));
                    }
                }
                Flow::Normal(value)
            }

            NodeKind::FunctionCall { name, arguments } => {
                Flow::Normal(self.call_function(name, arguments, self.locate(node)))
            }

            NodeKind::IfStatement { condition, then_branch, else_branch } => {
                if self.eval_value(condition).is_truthy() {
                    self.evaluate(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.evaluate(else_branch)
                } else {
                    Flow::void()
                }
            }

            NodeKind::WhileLoop { condition, body } => {
                let mut last = Value::Void;
                while self.eval_value(condition).is_loop_truthy() {
                    match self.evaluate(body) {
                        Flow::Returning(value) => return Flow::Returning(value),
                        Flow::Normal(value) => last = value,
                    }
                }
                Flow::Normal(last)
            }

            NodeKind::ForLoop { init, condition, increment, body } => {
                if let Some(init) = init {
                    self.eval_value(init);
                }
                let mut last = Value::Void;
                loop {
                    if let Some(condition) = condition {
                        if !self.eval_value(condition).is_loop_truthy() {
                            break;
                        }
                    }
                    match self.evaluate(body) {
                        Flow::Returning(value) => return Flow::Returning(value),
                        Flow::Normal(value) => last = value,
                    }
                    if let Some(increment) = increment {
                        self.eval_value(increment);
                    }
                }
                Flow::Normal(last)
            }

            NodeKind::ReturnStatement { value } => {
                let value = match value {
                    Some(expr) => self.eval_value(expr),
                    None => Value::Void,
                };
                Flow::Returning(value)
            }

            NodeKind::BinaryOp { operator, left, right } => {
                let left = self.eval_value(left);
                let right = self.eval_value(right);
                let result = operators::binary(*operator, &left, &right);
                Flow::Normal(self.settle(result, self.locate(node)))
            }

            NodeKind::UnaryOp { operator, operand } => {
                let operand = self.eval_value(operand);
                Flow::Normal(operators::unary(*operator, &operand))
            }

            NodeKind::Identifier { name } => match self.env.lookup_variable(name) {
                Some(value) => Flow::Normal(value.clone()),
                None => {
                    self.report_undefined_variable(name, self.locate(node));
                    Flow::void()
                }
            },

            NodeKind::NumberLiteral { value } => Flow::Normal(Value::Number(*value)),

            NodeKind::StringLiteral { value } => Flow::Normal(Value::String(value.clone())),

            NodeKind::ArrayAccess { array, index } => {
                let container = self.eval_value(array);
                let position = self.eval_value(index);
                let result = index_value(&container, &position);
                Flow::Normal(self.settle(result, self.locate(node)))
            }

            NodeKind::MemberAccess { object, .. } => {
                if object.as_identifier() == Some("dmo") {
                    Flow::Normal(Value::string(GRAPHICS_SENTINEL))
                } else {
                    Flow::void()
                }
            }
        }
    }

    /// Evaluates a node in expression position. A return inside an
    /// expression only yields its value; it does not end the enclosing call.
    pub fn eval_value(&mut self, node: &Node) -> Value {
        self.evaluate(node).into_value()
    }

    /// Evaluates every argument node in order
    pub(crate) fn evaluate_arguments(&mut self, args: &[Node]) -> Vec<Value> {
        args.iter().map(|arg| self.eval_value(arg)).collect()
    }

    fn eval_sequence(&mut self, statements: &[Node]) -> Flow {
        let mut last = Value::Void;
        for statement in statements {
            match self.evaluate(statement) {
                Flow::Returning(value) => return Flow::Returning(value),
                Flow::Normal(value) => last = value,
            }
        }
        Flow::Normal(last)
    }

    fn load_module(&mut self, name: &str, location: SourceLocation) {
        if self.module_loader.is_loaded(name) {
            debug!(module = name, "module already loaded");
            return;
        }
        if let Err(error) = self.module_loader.begin(name, location.clone()) {
            self.report(error);
            return;
        }

        let source = if native_functions::extensions::activate(self, name) {
            info!(module = name, "loaded extension module");
            Some(ModuleSource::Extension)
        } else {
            match self.module_loader.read(name, location) {
                Ok((path, program)) => {
                    info!(module = name, path = %path.display(), "loading module");
                    self.evaluate(&program);
                    Some(ModuleSource::File(path))
                }
                Err(error) => {
                    self.report(error);
                    None
                }
            }
        };

        self.module_loader.finish(name, source);
    }

    /// Writes a line of program output to the output buffer or stdout
    pub(crate) fn write_output(&self, text: &str) {
        if let Some(out) = &self.output {
            if let Ok(mut buffer) = out.lock() {
                let _ = writeln!(buffer, "{}", text);
            }
        } else {
            println!("{}", text);
        }
    }

    /// Reads one line of input without its line terminator; None at end of input
    pub(crate) fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = match self.input.as_mut() {
            Some(input) => input.read_line(&mut line)?,
            None => io::stdin().lock().read_line(&mut line)?,
        };
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Source location of a node, tagged with the current file name
    pub(crate) fn locate(&self, node: &Node) -> SourceLocation {
        match &self.source_file {
            Some(file) => SourceLocation::with_file(node.line, node.column, file.clone()),
            None => node.location(),
        }
    }

    /// Records a runtime error, annotated with the live call stack
    pub(crate) fn report(&mut self, error: DmoError) {
        let error = if self.env.depth() > 1 && error.call_stack.is_empty() {
            error.with_call_stack(self.env.call_stack())
        } else {
            error
        };
        self.diagnostics.report(error);
    }

    /// Unwraps an operation result, reporting a fault and yielding its fallback
    pub(crate) fn settle(&mut self, result: Result<Value, Fault>, location: SourceLocation) -> Value {
        match result {
            Ok(value) => value,
            Err(fault) => {
                self.report(DmoError::new(fault.kind, fault.message, location));
                fault.fallback
            }
        }
    }

    fn report_undefined_variable(&mut self, name: &str, location: SourceLocation) {
        let mut error = DmoError::undefined_variable(name, location);
        if let Some(suggestion) = find_closest_match(name, self.env.visible_variable_names()) {
            error = error.with_suggestion(suggestion);
        }
        if self.env.has_variable_anywhere(name) {
            error = error.with_note(OUT_OF_REACH_NOTE);
        }
        self.report(error);
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// `text[n]` yields the character at position n
fn index_value(container: &Value, position: &Value) -> Result<Value, Fault> {
    let (text, n) = match (container, position) {
        (Value::String(text), Value::Number(n)) => (text, *n),
        _ => {
            return Err(Fault::type_error(
                format!(
                    "Cannot index a {} with a {}",
                    container.kind_name(),
                    position.kind_name()
                ),
                Value::Void,
            ))
        }
    };

    if n < 0.0 || n.fract() != 0.0 {
        return Err(Fault::type_error(
            format!("String index {} is not a valid position", format_number(n)),
            Value::string(""),
        ));
    }
    text.chars().nth(n as usize).map(|c| Value::String(c.to_string())).ok_or_else(|| {
        Fault::type_error(
            format!(
                "String index {} out of range for length {}",
                format_number(n),
                text.chars().count()
            ),
            Value::string(""),
        )
    })
}
