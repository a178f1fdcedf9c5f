// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry descriptions handed to the rendering layer
//!
//! A description is a tree: leaves are parameterised primitives, inner nodes
//! are boolean combinations, and every node carries the transform that maps
//! its local frame into its parent's frame.

use super::PrimitiveShape;
use crate::ast::Value;
use crate::error::ParameterError;
use crate::resolve::ParameterRecord;
use nalgebra::Matrix4;
use serde::Serialize;

/// Boolean combination kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

/// Shape carried by a description node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Shape {
    Primitive { primitive: PrimitiveShape },
    /// Operands in authored order; for difference the first operand is the
    /// positive one and the rest are subtracted in sequence
    Boolean {
        op: BooleanOp,
        operands: Vec<GeometryDescription>,
    },
    Empty,
}

/// Surface attributes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Material {
    /// RGBA in `0.0..=1.0`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<[f64; 4]>,
}

impl Material {
    /// Material for `color(c, alpha)`; `c = undef` leaves the material unset
    pub fn from_record(record: &ParameterRecord) -> Result<Self, ParameterError> {
        let alpha = record.get("alpha").and_then(Value::as_number).unwrap_or(1.0);
        let color = match record.get("c").unwrap_or(&Value::Undef) {
            Value::Undef => None,
            Value::Str(name) => Some(parse_color_name(name, alpha)?),
            value => {
                let rgba = value.as_numbers().unwrap_or_default();
                match rgba.as_slice() {
                    [r, g, b] => Some([*r, *g, *b, alpha]),
                    [r, g, b, a] => Some([*r, *g, *b, *a]),
                    _ => {
                        return Err(invalid_color(format!(
                            "expected 3 or 4 components, got {}",
                            rgba.len()
                        )))
                    }
                }
            }
        };
        Ok(Self { color })
    }
}

fn invalid_color(reason: String) -> ParameterError {
    ParameterError::InvalidValue {
        construct: "color".into(),
        param: "c".into(),
        reason,
    }
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("gold", [255, 215, 0]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
    ("navy", [0, 0, 128]),
    ("teal", [0, 128, 128]),
    ("olive", [128, 128, 0]),
    ("maroon", [128, 0, 0]),
];

/// `#rgb`, `#rrggbb`, `#rrggbbaa` or a named web color
fn parse_color_name(name: &str, alpha: f64) -> Result<[f64; 4], ParameterError> {
    let channel = |v: u8| v as f64 / 255.0;

    if let Some(hex) = name.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(|| invalid_color(format!("'{}' is not a hex color", name)))?;
        return match digits.as_slice() {
            [r, g, b] => Ok([channel(r * 17), channel(g * 17), channel(b * 17), alpha]),
            [r1, r0, g1, g0, b1, b0] => Ok([
                channel(r1 * 16 + r0),
                channel(g1 * 16 + g0),
                channel(b1 * 16 + b0),
                alpha,
            ]),
            [r1, r0, g1, g0, b1, b0, a1, a0] => Ok([
                channel(r1 * 16 + r0),
                channel(g1 * 16 + g0),
                channel(b1 * 16 + b0),
                channel(a1 * 16 + a0),
            ]),
            _ => Err(invalid_color(format!("'{}' is not a hex color", name))),
        };
    }

    let lower = name.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(known, _)| *known == lower)
        .map(|(_, [r, g, b])| [channel(*r), channel(*g), channel(*b), alpha])
        .ok_or_else(|| invalid_color(format!("unknown color '{}'", name)))
}

/// One node of the canonical CSG description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryDescription {
    pub shape: Shape,
    /// Local-to-parent transform
    pub transform: Matrix4<f64>,
    pub material: Material,
}

impl GeometryDescription {
    pub fn primitive(primitive: PrimitiveShape) -> Self {
        Self::from_shape(Shape::Primitive { primitive })
    }

    pub fn boolean(op: BooleanOp, operands: Vec<GeometryDescription>) -> Self {
        Self::from_shape(Shape::Boolean { op, operands })
    }

    pub fn empty() -> Self {
        Self::from_shape(Shape::Empty)
    }

    fn from_shape(shape: Shape) -> Self {
        Self {
            shape,
            transform: Matrix4::identity(),
            material: Material::default(),
        }
    }

    /// Apply a parent transform on top of this node's own transform
    pub fn transformed(mut self, parent: &Matrix4<f64>) -> Self {
        self.transform = parent * self.transform;
        self
    }

    /// Color every node of the subtree that has no color of its own
    pub fn colored(mut self, material: Material) -> Self {
        if material.color.is_none() {
            return self;
        }
        if self.material.color.is_none() {
            self.material = material;
        }
        if let Shape::Boolean { operands, .. } = &mut self.shape {
            let taken = std::mem::take(operands);
            *operands = taken.into_iter().map(|operand| operand.colored(material)).collect();
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.shape, Shape::Empty)
    }

    pub fn operands(&self) -> &[GeometryDescription] {
        match &self.shape {
            Shape::Boolean { operands, .. } => operands,
            _ => &[],
        }
    }

    /// Number of primitive leaves in the tree
    pub fn primitive_count(&self) -> usize {
        match &self.shape {
            Shape::Primitive { .. } => 1,
            Shape::Boolean { operands, .. } => operands.iter().map(Self::primitive_count).sum(),
            Shape::Empty => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn color_record(c: Value) -> ParameterRecord {
        [("c".to_string(), c), ("alpha".to_string(), Value::Number(0.5))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_transforms_compose_parent_after_child() {
        let t = Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0));
        let s = Matrix4::new_scaling(2.0);
        let desc = GeometryDescription::primitive(PrimitiveShape::cube([1.0; 3], false))
            .transformed(&s)
            .transformed(&t);
        assert_eq!(desc.transform, t * s);
    }

    #[test]
    fn test_inner_color_wins() {
        let red = Material { color: Some([1.0, 0.0, 0.0, 1.0]) };
        let blue = Material { color: Some([0.0, 0.0, 1.0, 1.0]) };
        let inner = GeometryDescription::primitive(PrimitiveShape::cube([1.0; 3], false)).colored(red);
        let plain = GeometryDescription::primitive(PrimitiveShape::cube([2.0; 3], false));
        let tree = GeometryDescription::boolean(BooleanOp::Union, vec![inner, plain]).colored(blue);

        assert_eq!(tree.material, blue);
        assert_eq!(tree.operands()[0].material, red);
        assert_eq!(tree.operands()[1].material, blue);
    }

    #[test]
    fn test_color_parsing() {
        let named = Material::from_record(&color_record(Value::Str("Red".into()))).unwrap();
        assert_eq!(named.color, Some([1.0, 0.0, 0.0, 0.5]));

        let hex = Material::from_record(&color_record(Value::Str("#00ff00".into()))).unwrap();
        assert_eq!(hex.color, Some([0.0, 1.0, 0.0, 0.5]));

        let rgba = Material::from_record(&color_record(Value::Vector(vec![
            Value::Number(0.1),
            Value::Number(0.2),
            Value::Number(0.3),
            Value::Number(0.4),
        ])))
        .unwrap();
        assert_eq!(rgba.color, Some([0.1, 0.2, 0.3, 0.4]));

        assert!(Material::from_record(&color_record(Value::Str("no-such".into()))).is_err());
        assert!(Material::from_record(&color_record(Value::Undef)).unwrap().color.is_none());
    }

    #[test]
    fn test_primitive_count() {
        let leaf = || GeometryDescription::primitive(PrimitiveShape::cube([1.0; 3], false));
        let nested = GeometryDescription::boolean(
            BooleanOp::Difference,
            vec![leaf(), GeometryDescription::boolean(BooleanOp::Union, vec![leaf(), leaf()])],
        );
        assert_eq!(nested.primitive_count(), 3);
        assert_eq!(GeometryDescription::empty().primitive_count(), 0);
    }
}
