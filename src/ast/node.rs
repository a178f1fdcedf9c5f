// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! AST Node definitions
//!
//! The parser hands us one of two shapes for most constructs: a dedicated
//! node (`Cube { size, center }`) or a generic `Invocation` carrying a name
//! and an argument list. Both are legal input.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position inside the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

/// Source range of a node, used for diagnostics only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span covering a single line range, offsets left at zero
    pub fn lines(start_line: u32, end_line: u32) -> Self {
        Self {
            start: Position { line: start_line, column: 1, offset: 0 },
            end: Position { line: end_line, column: 1, offset: 0 },
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}

/// AST Node representing a single statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind, span: None, id: None }
    }

    pub fn with_id(kind: NodeKind, id: impl Into<String>) -> Self {
        Self { kind, span: None, id: Some(id.into()) }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Generic call node, e.g. `cube(5, center=true)`
    pub fn invocation(name: impl Into<String>, args: Vec<Argument>, children: Vec<Node>) -> Self {
        Self::new(NodeKind::Invocation {
            name: name.into(),
            args,
            children,
        })
    }
}

/// Types of AST nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    // Primitives
    Cube {
        #[serde(default)]
        size: Option<Expr>,
        #[serde(default)]
        center: Option<Expr>,
    },
    Sphere {
        #[serde(default)]
        r: Option<Expr>,
        #[serde(default)]
        d: Option<Expr>,
        #[serde(default, rename = "$fn")]
        fn_: Option<Expr>,
    },
    Cylinder {
        #[serde(default)]
        h: Option<Expr>,
        #[serde(default)]
        r: Option<Expr>,
        #[serde(default)]
        r1: Option<Expr>,
        #[serde(default)]
        r2: Option<Expr>,
        #[serde(default)]
        d: Option<Expr>,
        #[serde(default)]
        d1: Option<Expr>,
        #[serde(default)]
        d2: Option<Expr>,
        #[serde(default)]
        center: Option<Expr>,
        #[serde(default, rename = "$fn")]
        fn_: Option<Expr>,
    },

    // Transformations
    Translate {
        #[serde(default)]
        v: Option<Expr>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Rotate {
        #[serde(default)]
        a: Option<Expr>,
        #[serde(default)]
        v: Option<Expr>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Scale {
        #[serde(default)]
        v: Option<Expr>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Mirror {
        #[serde(default)]
        v: Option<Expr>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Multmatrix {
        #[serde(default)]
        m: Option<Expr>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Color {
        #[serde(default)]
        c: Option<Expr>,
        #[serde(default)]
        alpha: Option<Expr>,
        #[serde(default)]
        children: Vec<Node>,
    },

    // Boolean operations
    Union {
        #[serde(default)]
        children: Vec<Node>,
    },
    Difference {
        #[serde(default)]
        children: Vec<Node>,
    },
    Intersection {
        #[serde(default)]
        children: Vec<Node>,
    },

    /// Generic module instantiation
    Invocation {
        name: String,
        #[serde(default)]
        args: Vec<Argument>,
        #[serde(default)]
        children: Vec<Node>,
    },

    // Structure
    Group {
        #[serde(default)]
        children: Vec<Node>,
    },
    Let {
        assignments: Vec<Assignment>,
        #[serde(default)]
        children: Vec<Node>,
    },
    Assignment {
        name: String,
        value: Expr,
    },
    ModuleDefinition {
        name: String,
        #[serde(default)]
        params: Vec<ModuleParam>,
        #[serde(default)]
        body: Vec<Node>,
    },
    Echo {
        #[serde(default)]
        args: Vec<Argument>,
    },

    // Empty node
    Empty,
}

impl NodeKind {
    /// Child statements of this node (the body, for module definitions)
    pub fn children(&self) -> &[Node] {
        match self {
            NodeKind::Translate { children, .. }
            | NodeKind::Rotate { children, .. }
            | NodeKind::Scale { children, .. }
            | NodeKind::Mirror { children, .. }
            | NodeKind::Multmatrix { children, .. }
            | NodeKind::Color { children, .. }
            | NodeKind::Union { children }
            | NodeKind::Difference { children }
            | NodeKind::Intersection { children }
            | NodeKind::Invocation { children, .. }
            | NodeKind::Group { children }
            | NodeKind::Let { children, .. } => children,
            NodeKind::ModuleDefinition { body, .. } => body,
            _ => &[],
        }
    }

    /// Mutable access to child statements, used for subtree replacement
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            NodeKind::Translate { children, .. }
            | NodeKind::Rotate { children, .. }
            | NodeKind::Scale { children, .. }
            | NodeKind::Mirror { children, .. }
            | NodeKind::Multmatrix { children, .. }
            | NodeKind::Color { children, .. }
            | NodeKind::Union { children }
            | NodeKind::Difference { children }
            | NodeKind::Intersection { children }
            | NodeKind::Invocation { children, .. }
            | NodeKind::Group { children }
            | NodeKind::Let { children, .. } => Some(children),
            NodeKind::ModuleDefinition { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Short label used in logs and error messages
    pub fn label(&self) -> &str {
        match self {
            NodeKind::Cube { .. } => "cube",
            NodeKind::Sphere { .. } => "sphere",
            NodeKind::Cylinder { .. } => "cylinder",
            NodeKind::Translate { .. } => "translate",
            NodeKind::Rotate { .. } => "rotate",
            NodeKind::Scale { .. } => "scale",
            NodeKind::Mirror { .. } => "mirror",
            NodeKind::Multmatrix { .. } => "multmatrix",
            NodeKind::Color { .. } => "color",
            NodeKind::Union { .. } => "union",
            NodeKind::Difference { .. } => "difference",
            NodeKind::Intersection { .. } => "intersection",
            NodeKind::Invocation { name, .. } => name,
            NodeKind::Group { .. } => "group",
            NodeKind::Let { .. } => "let",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::ModuleDefinition { .. } => "module",
            NodeKind::Echo { .. } => "echo",
            NodeKind::Empty => "empty",
        }
    }
}

/// A call argument; lists may freely mix both forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Named { name: String, value: Expr },
    Positional { value: Expr },
}

impl Argument {
    pub fn positional(value: impl Into<Expr>) -> Self {
        Argument::Positional { value: value.into() }
    }

    pub fn named(name: impl Into<String>, value: impl Into<Expr>) -> Self {
        Argument::Named {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Expr {
        match self {
            Argument::Positional { value } | Argument::Named { value, .. } => value,
        }
    }
}

/// `name = value` inside `let(...)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
}

impl Assignment {
    pub fn new(name: impl Into<String>, value: impl Into<Expr>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Declared parameter of a user module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleParam {
    pub name: String,
    #[serde(default)]
    pub default: Option<Expr>,
}

impl ModuleParam {
    pub fn new(name: impl Into<String>, default: Option<Expr>) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }
}

/// Argument expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    Undef,
    Bool(bool),
    Number(f64),
    Str(String),
    Vector(Vec<Expr>),
    Variable(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Str(s.into())
    }

    pub fn vec3(x: f64, y: f64, z: f64) -> Self {
        Expr::Vector(vec![Expr::Number(x), Expr::Number(y), Expr::Number(z)])
    }

    pub fn binary(op: BinaryOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        }
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::Number(n)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Bool(b)
    }
}

impl From<Vec<Expr>> for Expr {
    fn from(items: Vec<Expr>) -> Self {
        Expr::Vector(items)
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        f.write_str(symbol)
    }
}
