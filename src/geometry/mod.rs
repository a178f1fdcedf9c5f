// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - canonical CSG descriptions, primitives and transforms

mod description;
mod primitives;
mod result;
mod transform;

pub use description::{BooleanOp, GeometryDescription, Material, Shape};
pub use primitives::{FragmentSettings, PrimitiveShape};
pub use result::{ConversionEnvelope, ConversionMetadata, ConvertedGeometry, ErrorReport};
pub use transform::TransformOp;
