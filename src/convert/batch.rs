// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parallel conversion of independent top-level nodes using rayon

use super::{CsgConverter, ResultCache};
use crate::ast::Node;
use crate::config::ConverterConfig;
use crate::error::ConvertError;
use crate::geometry::ConvertedGeometry;
use rayon::prelude::*;
use std::sync::Arc;

/// Converts many roots at once, each with its own converter and scope
pub struct BatchConverter {
    config: ConverterConfig,
    cache: Option<Arc<ResultCache>>,
}

impl BatchConverter {
    pub fn new(config: ConverterConfig) -> Self {
        let cache = config.cache.then(|| Arc::new(ResultCache::new()));
        Self { config, cache }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    /// Results are returned in input order; one failure does not affect the
    /// other roots
    pub fn convert_all(&self, roots: &[Node]) -> Vec<Result<ConvertedGeometry, ConvertError>> {
        roots
            .par_iter()
            .map(|root| self.converter().convert(root))
            .collect()
    }

    fn converter(&self) -> CsgConverter {
        let converter = CsgConverter::new(self.config.clone()).without_cache();
        match &self.cache {
            Some(cache) => converter.with_cache(Arc::clone(cache)),
            None => converter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Argument, Expr};
    use crate::geometry::{GeometryDescription, PrimitiveShape};

    fn cube(size: f64) -> Node {
        Node::invocation("cube", vec![Argument::positional(size)], vec![])
    }

    #[test]
    fn test_results_keep_input_order() {
        let roots: Vec<Node> = (1..=32).map(|i| cube(i as f64)).collect();
        let results = BatchConverter::new(ConverterConfig::default()).convert_all(&roots);

        assert_eq!(results.len(), 32);
        for (i, result) in results.iter().enumerate() {
            let size = (i + 1) as f64;
            assert_eq!(
                result.as_ref().unwrap().geometry_description,
                GeometryDescription::primitive(PrimitiveShape::cube([size; 3], false))
            );
        }
    }

    #[test]
    fn test_failures_are_isolated() {
        let roots = vec![
            cube(1.0),
            Node::invocation("cube", vec![Argument::positional(Expr::var("nope"))], vec![]),
            cube(3.0),
        ];
        let results = BatchConverter::new(ConverterConfig::default()).convert_all(&roots);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_shared_cache_is_reused() {
        let roots = vec![cube(2.0), cube(2.0), cube(2.0), cube(2.0)];
        let batch = BatchConverter::new(ConverterConfig::default());
        batch.convert_all(&roots);
        batch.convert_all(&roots);

        let stats = batch.cache().unwrap().stats();
        assert_eq!(stats.entries, 1);
        assert!(stats.hits >= 4);
    }
}
