// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! AST to CSG conversion: the converter, its result cache and batch driver

pub mod batch;
pub mod cache;
mod converter;

pub use batch::BatchConverter;
pub use cache::{CacheStats, CachedSubtree, ResultCache};
pub use converter::{ConversionObserver, CsgConverter};
