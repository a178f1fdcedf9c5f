// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG
//!
//! Converts OpenSCAD abstract syntax trees into canonical CSG geometry
//! descriptions: parameterised primitives, affine transforms and boolean
//! combinations, ready for a rendering layer to tessellate.

pub mod ast;
pub mod config;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod normalize;
pub mod registry;
pub mod resolve;
pub mod scope;

#[cfg(feature = "wasm")]
pub mod ffi;

pub use ast::{Argument, Expr, Node, NodeKind, Span, Value};
pub use config::{ConverterConfig, UnknownConstructPolicy};
pub use convert::{BatchConverter, CacheStats, ConversionObserver, CsgConverter, ResultCache};
pub use error::{ConvertError, ErrorKind, ParameterError, ScopeError};
pub use geometry::{ConversionEnvelope, ConvertedGeometry, GeometryDescription};
pub use kernel::Kernel;
pub use scope::ScopeService;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Convert one AST with the default configuration
pub fn convert(root: &Node) -> Result<ConvertedGeometry, ConvertError> {
    CsgConverter::new(ConverterConfig::default()).convert(root)
}

/// Convert a JSON-encoded AST into a JSON-encoded result envelope.
///
/// Malformed JSON is an error of the call itself; conversion failures are
/// reported inside the envelope.
pub fn convert_json(ast_json: &str, config: &ConverterConfig) -> Result<String> {
    let root: Node = from_json(ast_json).context("Failed to parse AST JSON")?;
    let envelope = ConversionEnvelope::from(CsgConverter::new(config.clone()).convert(&root));
    envelope.to_json().context("Failed to serialize conversion result")
}

/// Deserialize JSON without a nesting limit, growing the stack as needed
pub fn from_json<T: DeserializeOwned>(json: &str) -> serde_json::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}
