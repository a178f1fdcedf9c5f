// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Affine transformation operations

use crate::ast::Value;
use crate::error::ParameterError;
use crate::registry::ConstructKind;
use crate::resolve::ParameterRecord;
use nalgebra::{Matrix4, Unit, UnitQuaternion, Vector3};
use serde::Serialize;

/// Transformation operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransformOp {
    Translate(Vector3<f64>),
    /// Euler angles in degrees, applied X then Y then Z
    Rotate(Vector3<f64>),
    /// Angle in degrees about an arbitrary axis
    RotateAxis { angle: f64, axis: Vector3<f64> },
    Scale(Vector3<f64>),
    /// Reflection across the plane through the origin with this normal
    Mirror(Vector3<f64>),
    Multmatrix(Matrix4<f64>),
}

impl TransformOp {
    /// Convert transformation to a 4x4 matrix
    pub fn to_matrix(&self) -> Matrix4<f64> {
        match self {
            TransformOp::Translate(v) => Matrix4::new_translation(v),
            TransformOp::Rotate(angles) => {
                let rx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angles.x.to_radians());
                let ry = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angles.y.to_radians());
                let rz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles.z.to_radians());
                (rz * ry * rx).to_homogeneous()
            }
            TransformOp::RotateAxis { angle, axis } => match Unit::try_new(*axis, f64::EPSILON) {
                Some(axis) => UnitQuaternion::from_axis_angle(&axis, angle.to_radians()).to_homogeneous(),
                None => Matrix4::identity(),
            },
            TransformOp::Scale(s) => Matrix4::new_nonuniform_scaling(s),
            TransformOp::Mirror(normal) => {
                let len_sq = normal.norm_squared();
                let mut m = Matrix4::identity();
                if len_sq > 0.0 {
                    let reflection =
                        nalgebra::Matrix3::identity() - (normal * normal.transpose()) * (2.0 / len_sq);
                    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&reflection);
                }
                m
            }
            TransformOp::Multmatrix(m) => *m,
        }
    }

    /// Build the operation for a transform construct from its resolved record
    pub fn from_record(kind: ConstructKind, record: &ParameterRecord) -> Result<Self, ParameterError> {
        let get = |name: &str| record.get(name).unwrap_or(&Value::Undef);
        match kind {
            ConstructKind::Translate => Ok(TransformOp::Translate(vec3(get("v"), 0.0))),
            ConstructKind::Rotate => match (get("a"), get("v")) {
                (Value::Number(angle), axis @ Value::Vector(_)) => Ok(TransformOp::RotateAxis {
                    angle: *angle,
                    axis: vec3(axis, 0.0),
                }),
                // A bare angle rotates about Z
                (Value::Number(angle), _) => Ok(TransformOp::Rotate(Vector3::new(0.0, 0.0, *angle))),
                (angles, _) => Ok(TransformOp::Rotate(vec3(angles, 0.0))),
            },
            ConstructKind::Scale => match get("v") {
                Value::Number(s) => Ok(TransformOp::Scale(Vector3::repeat(*s))),
                v => Ok(TransformOp::Scale(vec3(v, 1.0))),
            },
            ConstructKind::Mirror => Ok(TransformOp::Mirror(vec3(get("v"), 0.0))),
            ConstructKind::Multmatrix => matrix(get("m")).map(TransformOp::Multmatrix),
            other => Err(ParameterError::InvalidValue {
                construct: other.name().into(),
                param: "-".into(),
                reason: "not a transform".into(),
            }),
        }
    }
}

fn vec3(value: &Value, fill: f64) -> Vector3<f64> {
    let [x, y, z] = value.as_vec3(fill).unwrap_or([fill; 3]);
    Vector3::new(x, y, z)
}

/// Rows of up to four numbers; missing entries come from the identity
fn matrix(value: &Value) -> Result<Matrix4<f64>, ParameterError> {
    let mut m = Matrix4::identity();
    let Value::Vector(rows) = value else {
        return Ok(m);
    };
    if rows.len() > 4 {
        return Err(ParameterError::InvalidValue {
            construct: "multmatrix".into(),
            param: "m".into(),
            reason: format!("expected at most 4 rows, got {}", rows.len()),
        });
    }
    for (r, row) in rows.iter().enumerate() {
        let numbers = row.as_numbers().unwrap_or_default();
        for (c, n) in numbers.into_iter().take(4).enumerate() {
            m[(r, c)] = n;
        }
    }
    Ok(m)
}
