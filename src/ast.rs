// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the DMO language.
//
// The tree is produced by an external front end and handed to the
// interpreter either directly (through the builder helpers in `build`) or as
// JSON. Every node owns its children; function declarations sit behind an
// `Rc` so a registered function shares its body with the tree.

use crate::errors::{DmoError, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::rc::Rc;

/// Binary operators understood by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Le => "<=",
            BinaryOperator::Ge => ">=",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators understood by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "!")]
    Not,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::Not => "!",
        }
    }
}

/// A declared function parameter: `name: type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A function declaration. Shared between the tree and every function record
/// registered from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default = "void_type")]
    pub return_type: String,
    #[serde(default)]
    pub params: Vec<Param>,
    pub body: Node,
}

fn void_type() -> String {
    "void".to_string()
}

/// The kind-specific payload of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum NodeKind {
    Program {
        #[serde(default)]
        statements: Vec<Node>,
    },
    UseStatement {
        module: String,
    },
    FunctionDef(Rc<FunctionDecl>),
    VariableDecl {
        #[serde(rename = "type")]
        type_name: String,
        name: String,
        #[serde(default)]
        initializer: Option<Box<Node>>,
    },
    Assignment {
        target: Box<Node>,
        value: Box<Node>,
    },
    FunctionCall {
        name: String,
        #[serde(default)]
        arguments: Vec<Node>,
    },
    IfStatement {
        condition: Box<Node>,
        then_branch: Box<Node>,
        #[serde(default)]
        else_branch: Option<Box<Node>>,
    },
    WhileLoop {
        condition: Box<Node>,
        body: Box<Node>,
    },
    ForLoop {
        #[serde(default)]
        init: Option<Box<Node>>,
        #[serde(default)]
        condition: Option<Box<Node>>,
        #[serde(default)]
        increment: Option<Box<Node>>,
        body: Box<Node>,
    },
    ReturnStatement {
        #[serde(default)]
        value: Option<Box<Node>>,
    },
    Block {
        #[serde(default)]
        statements: Vec<Node>,
    },
    BinaryOp {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryOp {
        operator: UnaryOperator,
        operand: Box<Node>,
    },
    Identifier {
        name: String,
    },
    NumberLiteral {
        value: f64,
    },
    StringLiteral {
        value: String,
    },
    ArrayAccess {
        array: Box<Node>,
        index: Box<Node>,
    },
    MemberAccess {
        object: Box<Node>,
        member: String,
    },
}

/// A node of the program tree with its source position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub column: usize,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node { kind, line: 0, column: 0 }
    }

    /// Attaches a source position
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Name of the node kind, as used in the JSON `node` tag
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Program { .. } => "Program",
            NodeKind::UseStatement { .. } => "UseStatement",
            NodeKind::FunctionDef(_) => "FunctionDef",
            NodeKind::VariableDecl { .. } => "VariableDecl",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::FunctionCall { .. } => "FunctionCall",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::WhileLoop { .. } => "WhileLoop",
            NodeKind::ForLoop { .. } => "ForLoop",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::Block { .. } => "Block",
            NodeKind::BinaryOp { .. } => "BinaryOp",
            NodeKind::UnaryOp { .. } => "UnaryOp",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::NumberLiteral { .. } => "NumberLiteral",
            NodeKind::StringLiteral { .. } => "StringLiteral",
            NodeKind::ArrayAccess { .. } => "ArrayAccess",
            NodeKind::MemberAccess { .. } => "MemberAccess",
        }
    }

    /// Returns the identifier name if this node is a plain identifier
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Renders the tree as an indented outline, one node per line
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = match &self.kind {
            NodeKind::Program { .. } => writeln!(out, "{}PROGRAM", indent),
            NodeKind::UseStatement { module } => writeln!(out, "{}USE: {}", indent, module),
            NodeKind::FunctionDef(decl) => {
                writeln!(out, "{}FUNCTION_DEF: {} {}", indent, decl.return_type, decl.name)
            }
            NodeKind::VariableDecl { type_name, name, .. } => {
                writeln!(out, "{}VAR_DECL: {} {}", indent, type_name, name)
            }
            NodeKind::Assignment { .. } => writeln!(out, "{}ASSIGN", indent),
            NodeKind::FunctionCall { name, .. } => writeln!(out, "{}FUNC_CALL: {}", indent, name),
            NodeKind::IfStatement { .. } => writeln!(out, "{}IF", indent),
            NodeKind::WhileLoop { .. } => writeln!(out, "{}WHILE", indent),
            NodeKind::ForLoop { .. } => writeln!(out, "{}FOR", indent),
            NodeKind::ReturnStatement { .. } => writeln!(out, "{}RETURN", indent),
            NodeKind::Block { .. } => writeln!(out, "{}BLOCK", indent),
            NodeKind::BinaryOp { operator, .. } => {
                writeln!(out, "{}BINARY_OP: {}", indent, operator)
            }
            NodeKind::UnaryOp { operator, .. } => {
                writeln!(out, "{}UNARY_OP: {}", indent, operator.symbol())
            }
            NodeKind::Identifier { name } => writeln!(out, "{}IDENTIFIER: {}", indent, name),
            NodeKind::NumberLiteral { value } => writeln!(
                out,
                "{}NUMBER: {}",
                indent,
                crate::interpreter::format_number(*value)
            ),
            NodeKind::StringLiteral { value } => writeln!(out, "{}STRING: {:?}", indent, value),
            NodeKind::ArrayAccess { .. } => writeln!(out, "{}ARRAY_ACCESS", indent),
            NodeKind::MemberAccess { member, .. } => {
                writeln!(out, "{}MEMBER_ACCESS: {}", indent, member)
            }
        };

        for child in self.children() {
            child.dump_into(out, depth + 1);
        }
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Program { statements } | NodeKind::Block { statements } => {
                statements.iter().collect()
            }
            NodeKind::FunctionDef(decl) => vec![&decl.body],
            NodeKind::VariableDecl { initializer, .. } => initializer.iter().map(|n| &**n).collect(),
            NodeKind::Assignment { target, value } => vec![&**target, &**value],
            NodeKind::FunctionCall { arguments, .. } => arguments.iter().collect(),
            NodeKind::IfStatement { condition, then_branch, else_branch } => {
                let mut nodes = vec![&**condition, &**then_branch];
                nodes.extend(else_branch.as_deref());
                nodes
            }
            NodeKind::WhileLoop { condition, body } => vec![&**condition, &**body],
            NodeKind::ForLoop { init, condition, increment, body } => init
                .as_deref()
                .into_iter()
                .chain(condition.as_deref())
                .chain(increment.as_deref())
                .chain(std::iter::once(&**body))
                .collect(),
            NodeKind::ReturnStatement { value } => value.iter().map(|n| &**n).collect(),
            NodeKind::BinaryOp { left, right, .. } => vec![&**left, &**right],
            NodeKind::UnaryOp { operand, .. } => vec![&**operand],
            NodeKind::ArrayAccess { array, index } => vec![&**array, &**index],
            NodeKind::MemberAccess { object, .. } => vec![&**object],
            NodeKind::UseStatement { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::NumberLiteral { .. }
            | NodeKind::StringLiteral { .. } => Vec::new(),
        }
    }
}

/// Decodes a program from its JSON form. The root must be a Program node.
pub fn program_from_json(source: &str) -> Result<Node, DmoError> {
    let node: Node = serde_json::from_str(source)
        .map_err(|e| DmoError::parse_error(format!("Invalid AST: {}", e)))?;

    match node.kind {
        NodeKind::Program { .. } => Ok(node),
        _ => Err(DmoError::parse_error(format!(
            "AST root must be a Program node, found {}",
            node.kind_name()
        ))),
    }
}

/// Constructors for building trees by hand (hosts, tests, extension modules)
pub mod build {
    use super::*;

    pub fn program(statements: Vec<Node>) -> Node {
        Node::new(NodeKind::Program { statements })
    }

    pub fn use_module(module: &str) -> Node {
        Node::new(NodeKind::UseStatement { module: module.to_string() })
    }

    pub fn param(name: &str, type_name: &str) -> Param {
        Param { name: name.to_string(), type_name: type_name.to_string() }
    }

    pub fn function(name: &str, params: Vec<Param>, return_type: &str, body: Vec<Node>) -> Node {
        Node::new(NodeKind::FunctionDef(Rc::new(FunctionDecl {
            name: name.to_string(),
            return_type: return_type.to_string(),
            params,
            body: block(body),
        })))
    }

    pub fn var(type_name: &str, name: &str, initializer: Option<Node>) -> Node {
        Node::new(NodeKind::VariableDecl {
            type_name: type_name.to_string(),
            name: name.to_string(),
            initializer: initializer.map(Box::new),
        })
    }

    pub fn assign(name: &str, value: Node) -> Node {
        Node::new(NodeKind::Assignment { target: Box::new(ident(name)), value: Box::new(value) })
    }

    pub fn call(name: &str, arguments: Vec<Node>) -> Node {
        Node::new(NodeKind::FunctionCall { name: name.to_string(), arguments })
    }

    pub fn if_else(condition: Node, then_branch: Node, else_branch: Option<Node>) -> Node {
        Node::new(NodeKind::IfStatement {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn while_loop(condition: Node, body: Vec<Node>) -> Node {
        Node::new(NodeKind::WhileLoop { condition: Box::new(condition), body: Box::new(block(body)) })
    }

    pub fn for_loop(
        init: Option<Node>,
        condition: Option<Node>,
        increment: Option<Node>,
        body: Vec<Node>,
    ) -> Node {
        Node::new(NodeKind::ForLoop {
            init: init.map(Box::new),
            condition: condition.map(Box::new),
            increment: increment.map(Box::new),
            body: Box::new(block(body)),
        })
    }

    pub fn ret(value: Option<Node>) -> Node {
        Node::new(NodeKind::ReturnStatement { value: value.map(Box::new) })
    }

    pub fn block(statements: Vec<Node>) -> Node {
        Node::new(NodeKind::Block { statements })
    }

    pub fn binary(operator: BinaryOperator, left: Node, right: Node) -> Node {
        Node::new(NodeKind::BinaryOp { operator, left: Box::new(left), right: Box::new(right) })
    }

    pub fn unary(operator: UnaryOperator, operand: Node) -> Node {
        Node::new(NodeKind::UnaryOp { operator, operand: Box::new(operand) })
    }

    pub fn ident(name: &str) -> Node {
        Node::new(NodeKind::Identifier { name: name.to_string() })
    }

    pub fn num(value: f64) -> Node {
        Node::new(NodeKind::NumberLiteral { value })
    }

    pub fn string(value: &str) -> Node {
        Node::new(NodeKind::StringLiteral { value: value.to_string() })
    }

    pub fn index(array: Node, index: Node) -> Node {
        Node::new(NodeKind::ArrayAccess { array: Box::new(array), index: Box::new(index) })
    }

    pub fn member(object: Node, member: &str) -> Node {
        Node::new(NodeKind::MemberAccess { object: Box::new(object), member: member.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::build::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_program_from_json_reads_nested_nodes() {
        let source = r#"{
            "node": "Program",
            "statements": [
                {
                    "node": "FunctionDef",
                    "name": "main",
                    "return_type": "int",
                    "params": [{ "name": "x", "type": "int" }],
                    "body": {
                        "node": "Block",
                        "statements": [
                            {
                                "node": "ReturnStatement",
                                "value": {
                                    "node": "BinaryOp",
                                    "operator": "+",
                                    "left": { "node": "Identifier", "name": "x", "line": 2, "column": 12 },
                                    "right": { "node": "NumberLiteral", "value": 1 }
                                }
                            }
                        ]
                    }
                }
            ]
        }"#;

        let expected = program(vec![function(
            "main",
            vec![param("x", "int")],
            "int",
            vec![ret(Some(binary(BinaryOperator::Add, ident("x").at(2, 12), num(1.0))))],
        )]);

        assert_eq!(program_from_json(source).unwrap(), expected);
    }

    #[test]
    fn test_optional_children_default_to_absent() {
        let source = r#"{
            "node": "Program",
            "statements": [
                { "node": "VariableDecl", "type": "int", "name": "n" },
                { "node": "ReturnStatement" },
                { "node": "ForLoop", "body": { "node": "Block" } }
            ]
        }"#;

        let parsed = program_from_json(source).unwrap();
        assert_eq!(
            parsed,
            program(vec![var("int", "n", None), ret(None), for_loop(None, None, None, vec![])])
        );
    }

    #[test]
    fn test_program_from_json_rejects_non_program_root() {
        let error = program_from_json(r#"{ "node": "NumberLiteral", "value": 3 }"#).unwrap_err();
        assert_eq!(error.kind, crate::errors::ErrorKind::ParseError);
        assert!(error.message.contains("NumberLiteral"));
    }

    #[test]
    fn test_program_from_json_rejects_garbage() {
        assert!(program_from_json("not json").is_err());
        assert!(program_from_json(r#"{ "node": "Teleport" }"#).is_err());
    }

    #[test]
    fn test_dump_outlines_the_tree() {
        let tree = program(vec![
            var("string", "s", Some(binary(BinaryOperator::Add, string("ab"), string("cd")))),
            call("show.txt", vec![ident("s"), num(2.5)]),
        ]);

        let expected = "\
PROGRAM
  VAR_DECL: string s
    BINARY_OP: +
      STRING: \"ab\"
      STRING: \"cd\"
  FUNC_CALL: show.txt
    IDENTIFIER: s
    NUMBER: 2.5
";
        assert_eq!(tree.dump(), expected);
    }
}
