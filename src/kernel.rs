// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API for incremental conversion

use crate::ast::Node;
use crate::config::ConverterConfig;
use crate::convert::{CacheStats, CsgConverter};
use crate::error::ConvertError;
use crate::geometry::{ConversionMetadata, ConvertedGeometry, GeometryDescription};
use anyhow::{bail, Result};

/// Conversion session over one root AST.
///
/// Results of unchanged subtrees are memoized, so re-rendering after
/// [`Kernel::update_subtree`] only converts the replaced node and its
/// ancestors.
pub struct Kernel {
    converter: CsgConverter,
    root: Option<Node>,
}

impl Kernel {
    /// Create a new kernel
    pub fn new() -> Self {
        Self::with_config(ConverterConfig::default())
    }

    pub fn with_config(config: ConverterConfig) -> Self {
        Self {
            converter: CsgConverter::new(ConverterConfig { cache: true, ..config }),
            root: None,
        }
    }

    /// Initialize kernel with AST
    pub fn with_ast(ast: Node) -> Self {
        let mut kernel = Self::new();
        kernel.root = Some(ast);
        kernel
    }

    /// Full render of the current AST
    pub fn render(&mut self) -> Result<ConvertedGeometry, ConvertError> {
        match &self.root {
            Some(root) => self.converter.convert(root),
            None => Ok(ConvertedGeometry {
                geometry_description: GeometryDescription::empty(),
                metadata: ConversionMetadata::default(),
            }),
        }
    }

    /// Replace the node whose `id` matches `node_id` and re-render
    pub fn update_subtree(&mut self, node_id: &str, updated_node: Node) -> Result<ConvertedGeometry> {
        match &mut self.root {
            Some(root) => {
                if !replace_node(root, node_id, &updated_node) {
                    bail!("No node with id '{}' in the current AST", node_id);
                }
            }
            None => self.root = Some(updated_node),
        }

        Ok(self.render()?)
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.converter
            .cache()
            .map(|cache| cache.stats())
            .unwrap_or_default()
    }

    /// Forget every memoized result
    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.converter.cache() {
            cache.clear();
        }
    }

    /// Set the root AST
    pub fn set_ast(&mut self, ast: Node) {
        self.root = Some(ast);
    }

    /// Get a reference to the root AST
    pub fn get_ast(&self) -> Option<&Node> {
        self.root.as_ref()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

fn replace_node(node: &mut Node, target_id: &str, updated_node: &Node) -> bool {
    if node.id.as_deref() == Some(target_id) {
        *node = updated_node.clone();
        return true;
    }

    match node.kind.children_mut() {
        Some(children) => children
            .iter_mut()
            .any(|child| replace_node(child, target_id, updated_node)),
        None => false,
    }
}
