// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Runtime values produced by evaluating argument expressions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully evaluated argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Undef,
    Bool(bool),
    Number(f64),
    Str(String),
    Vector(Vec<Value>),
}

impl Value {
    /// Name of the value's type, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undef => "undef",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Vector(_) => "vector",
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Value::Undef)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric components of a vector, `None` if any element is not a number
    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        match self {
            Value::Vector(items) => items.iter().map(Value::as_number).collect(),
            _ => None,
        }
    }

    /// Interpret a number vector as a 3-vector.
    ///
    /// Missing trailing components are taken from `fill`; extra components
    /// are ignored.
    pub fn as_vec3(&self, fill: f64) -> Option<[f64; 3]> {
        let numbers = self.as_numbers()?;
        let mut out = [fill; 3];
        for (slot, n) in out.iter_mut().zip(numbers) {
            *slot = n;
        }
        Some(out)
    }

    /// Whether every element is a number (an empty vector qualifies)
    pub fn is_number_vector(&self) -> bool {
        match self {
            Value::Vector(items) => items.iter().all(|v| matches!(v, Value::Number(_))),
            _ => false,
        }
    }

    /// Whether the value is a vector whose rows are number vectors
    pub fn is_matrix(&self) -> bool {
        match self {
            Value::Vector(rows) => rows.iter().all(Value::is_number_vector),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => write!(f, "undef"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Vector(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Value::Vector(v.iter().map(|n| Value::Number(*n)).collect())
    }
}
