// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Conversion results and their JSON envelope

use super::GeometryDescription;
use crate::ast::Span;
use crate::error::{ConvertError, ErrorKind};
use serde::Serialize;

/// Statistics gathered while walking the AST
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionMetadata {
    /// Deepest recursion level reached (root is 1)
    pub depth: usize,
    pub nodes_visited: usize,
    /// Wall-clock conversion time in milliseconds
    pub generation_time: f64,
}

/// Successful conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedGeometry {
    pub geometry_description: GeometryDescription,
    pub metadata: ConversionMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Span>,
}

impl From<&ConvertError> for ErrorReport {
    fn from(err: &ConvertError) -> Self {
        Self {
            kind: err.kind(),
            message: err.root().to_string(),
            location: err.location(),
        }
    }
}

/// `{ success, data | error }` wrapper returned across API boundaries
#[derive(Debug, Clone, Serialize)]
pub struct ConversionEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ConvertedGeometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl From<Result<ConvertedGeometry, ConvertError>> for ConversionEnvelope {
    fn from(result: Result<ConvertedGeometry, ConvertError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(ErrorReport::from(&err)),
            },
        }
    }
}

impl ConversionEnvelope {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
