// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Conversion errors
//!
//! Every expected failure (malformed user code) is returned as a value.
//! Panics inside the walk are caught at the converter entry point and
//! surface as [`ConvertError::Internal`].

use crate::ast::Span;
use serde::Serialize;
use thiserror::Error;

/// Scope stack misuse
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScopeError {
    #[error("Variable '{name}' is already defined in scope '{scope}'")]
    DuplicateDefinition { name: String, scope: String },

    #[error("Cannot exit the global scope")]
    ExitGlobalScope,
}

/// Failures while unifying arguments against a parameter schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{construct}() takes at most {max} positional arguments, got one at index {index}")]
    PositionalOutOfRange {
        construct: String,
        index: usize,
        max: usize,
    },

    #[error("{construct}() has no parameter named '{name}'")]
    UnknownParameter { construct: String, name: String },

    #[error("{construct}() parameter '{param}' expects {expected}, got {found}")]
    TypeMismatch {
        construct: String,
        param: String,
        expected: String,
        found: String,
    },

    #[error("Invalid value for {construct}() parameter '{param}': {reason}")]
    InvalidValue {
        construct: String,
        param: String,
        reason: String,
    },

    #[error("Cannot apply '{op}' to {lhs} and {rhs}")]
    InvalidOperands {
        op: String,
        lhs: String,
        rhs: String,
    },
}

/// Errors surfaced by the CSG converter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),

    #[error("Undefined variable '{name}'")]
    UnresolvedVariable { name: String },

    #[error("Unknown construct '{name}'")]
    UnknownConstruct { name: String },

    #[error("Parameter resolution error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Maximum nesting depth of {max_depth} exceeded")]
    MaxDepthExceeded { max_depth: usize },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{source} (at {span})")]
    Located {
        span: Span,
        #[source]
        source: Box<ConvertError>,
    },
}

/// Error categories exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ScopeError,
    UnresolvedVariable,
    UnknownConstruct,
    ParameterResolutionError,
    MaxDepthExceeded,
    Internal,
}

impl ConvertError {
    /// Attach a source location unless the error already carries one.
    ///
    /// The innermost location wins, so the UI highlights the node that
    /// actually failed rather than one of its ancestors.
    pub fn at(self, span: Option<Span>) -> Self {
        match (self, span) {
            (err @ ConvertError::Located { .. }, _) => err,
            (err, Some(span)) => ConvertError::Located {
                span,
                source: Box::new(err),
            },
            (err, None) => err,
        }
    }

    /// The error with any location wrapper removed
    pub fn root(&self) -> &ConvertError {
        match self {
            ConvertError::Located { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn location(&self) -> Option<Span> {
        match self {
            ConvertError::Located { span, .. } => Some(*span),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            ConvertError::Scope(_) => ErrorKind::ScopeError,
            ConvertError::UnresolvedVariable { .. } => ErrorKind::UnresolvedVariable,
            ConvertError::UnknownConstruct { .. } => ErrorKind::UnknownConstruct,
            ConvertError::Parameter(_) => ErrorKind::ParameterResolutionError,
            ConvertError::MaxDepthExceeded { .. } => ErrorKind::MaxDepthExceeded,
            ConvertError::Internal(_) | ConvertError::Located { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConvertError::UnresolvedVariable { name: "width".into() };
        assert_eq!(err.to_string(), "Undefined variable 'width'");
    }

    #[test]
    fn test_innermost_location_wins() {
        let inner = Span::lines(4, 4);
        let outer = Span::lines(1, 9);
        let err = ConvertError::UnknownConstruct { name: "hull".into() }
            .at(Some(inner))
            .at(Some(outer));
        assert_eq!(err.location(), Some(inner));
        assert_eq!(err.kind(), ErrorKind::UnknownConstruct);
        assert!(err.to_string().contains("at 4:1"));
    }

    #[test]
    fn test_parameter_error_kind() {
        let err: ConvertError = ParameterError::UnknownParameter {
            construct: "cube".into(),
            name: "radius".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ParameterResolutionError);
    }
}
