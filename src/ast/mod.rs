// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Abstract Syntax Tree module
//!
//! Defines the node contract produced by the OpenSCAD front end

mod node;
mod value;

pub use node::{Argument, Assignment, BinaryOp, Expr, ModuleParam, Node, NodeKind, Position, Span};
pub use value::Value;
