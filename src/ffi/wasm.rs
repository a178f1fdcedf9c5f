// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! WASM bindings using wasm-bindgen

use crate::config::ConverterConfig;
use crate::registry::CONSTRUCTS;
use wasm_bindgen::prelude::*;

/// Convert a JSON AST and return the result envelope as JSON.
///
/// Conversion failures come back inside the envelope; only malformed input
/// raises a JS exception.
#[wasm_bindgen]
pub fn convert_ast_json(ast_json: &str) -> Result<String, JsValue> {
    crate::convert_json(ast_json, &ConverterConfig::default())
        .map_err(|e| JsValue::from_str(&format!("Conversion error: {:#}", e)))
}

/// Same as [`convert_ast_json`] with a TOML configuration
#[wasm_bindgen]
pub fn convert_ast_json_with_config(ast_json: &str, config_toml: &str) -> Result<String, JsValue> {
    let config: ConverterConfig = toml::from_str(config_toml)
        .map_err(|e| JsValue::from_str(&format!("Config error: {}", e)))?;
    crate::convert_json(ast_json, &config)
        .map_err(|e| JsValue::from_str(&format!("Conversion error: {:#}", e)))
}

/// Registered constructs and their parameter schemas as JSON
#[wasm_bindgen]
pub fn construct_schemas() -> Result<String, JsValue> {
    serde_json::to_string(CONSTRUCTS)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {}", e)))
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
