// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lexical scope stack for variable resolution
//!
//! - Lookup searches from the innermost scope outward, so inner bindings
//!   shadow outer ones
//! - A name can be defined once per scope; redefining it in the same scope is
//!   an error, shadowing it in a nested scope is not
//! - The global scope (level 0) lives as long as the service and cannot be
//!   exited
//!
//! ```
//! use polyframe_csg::scope::ScopeService;
//! use polyframe_csg::Value;
//!
//! let mut scopes = ScopeService::new();
//! scopes.define_variable("x", Value::Number(1.0), None).unwrap();
//! scopes.enter_scope("block");
//! scopes.define_variable("x", Value::Number(2.0), None).unwrap();
//! assert_eq!(scopes.resolve_variable("x").unwrap().value, Value::Number(2.0));
//! scopes.exit_scope().unwrap();
//! assert_eq!(scopes.resolve_variable("x").unwrap().value, Value::Number(1.0));
//! ```

use crate::ast::{Span, Value};
use crate::error::ScopeError;
use ahash::AHashMap;
use serde::Serialize;
use tracing::trace;

const GLOBAL_SCOPE: &str = "global";

/// A variable bound in some scope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub name: String,
    pub value: Value,
    pub scope_level: usize,
    pub location: Option<Span>,
}

/// One level of the scope stack
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub level: usize,
    pub bindings: AHashMap<String, Binding>,
}

impl Scope {
    fn new(name: impl Into<String>, level: usize) -> Self {
        Self {
            name: name.into(),
            level,
            bindings: AHashMap::new(),
        }
    }
}

/// Stack of lexical scopes threaded through a conversion.
///
/// Each conversion owns its own instance; the service is not meant to be
/// shared between concurrent conversions.
#[derive(Debug, Clone)]
pub struct ScopeService {
    scopes: Vec<Scope>,
}

impl ScopeService {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(GLOBAL_SCOPE, 0)],
        }
    }

    /// Push a new scope one level below the current one
    pub fn enter_scope(&mut self, name: impl Into<String>) {
        let level = self.current_level() + 1;
        let name = name.into();
        trace!(scope = %name, level, "enter scope");
        self.scopes.push(Scope::new(name, level));
    }

    /// Pop the current scope. The global scope is never popped.
    pub fn exit_scope(&mut self) -> Result<(), ScopeError> {
        if self.scopes.len() <= 1 {
            return Err(ScopeError::ExitGlobalScope);
        }
        if let Some(scope) = self.scopes.pop() {
            trace!(scope = %scope.name, level = scope.level, "exit scope");
        }
        Ok(())
    }

    /// Bind `name` in the current scope only
    pub fn define_variable(
        &mut self,
        name: impl Into<String>,
        value: Value,
        location: Option<Span>,
    ) -> Result<(), ScopeError> {
        let name = name.into();
        let scope = self.current_mut();
        if scope.bindings.contains_key(&name) {
            return Err(ScopeError::DuplicateDefinition {
                name,
                scope: scope.name.clone(),
            });
        }

        let binding = Binding {
            name: name.clone(),
            value,
            scope_level: scope.level,
            location,
        };
        scope.bindings.insert(name, binding);
        Ok(())
    }

    /// Innermost binding for `name`, if any scope defines it
    pub fn resolve_variable(&self, name: &str) -> Option<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    /// Bindings defined directly in the current scope
    pub fn current_scope_variables(&self) -> Vec<&Binding> {
        let mut bindings: Vec<&Binding> = self.current().bindings.values().collect();
        bindings.sort_by(|a, b| a.name.cmp(&b.name));
        bindings
    }

    /// Every visible binding, with shadowed outer bindings removed
    pub fn all_accessible_variables(&self) -> AHashMap<String, Binding> {
        let mut visible = AHashMap::new();
        for scope in &self.scopes {
            for (name, binding) in &scope.bindings {
                visible.insert(name.clone(), binding.clone());
            }
        }
        visible
    }

    /// Visible `(name, value)` pairs sorted by name, for fingerprinting
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        let mut pairs: Vec<(String, Value)> = self
            .all_accessible_variables()
            .into_iter()
            .map(|(name, binding)| (name, binding.value))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Number of scopes on the stack, 1 when only the global scope is active
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_level(&self) -> usize {
        self.current().level
    }

    pub fn current_scope_name(&self) -> &str {
        &self.current().name
    }

    /// Drop every scope and binding, leaving one empty global scope
    pub fn reset(&mut self) {
        self.scopes.clear();
        self.scopes.push(Scope::new(GLOBAL_SCOPE, 0));
    }

    fn current(&self) -> &Scope {
        // The stack is never empty: construction and reset() both push the
        // global scope and exit_scope() refuses to pop it.
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}

impl Default for ScopeService {
    fn default() -> Self {
        Self::new()
    }
}
