// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Construct registry
//!
//! Static table mapping every known construct to its parameter schema.
//! Defaults follow OpenSCAD. New constructs are added here; the dispatch
//! code never hard-codes argument positions.

use crate::ast::Value;
use serde::Serialize;
use std::fmt;

/// Constructs the converter knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstructKind {
    Cube,
    Sphere,
    Cylinder,
    Translate,
    Rotate,
    Scale,
    Mirror,
    Multmatrix,
    Color,
    Union,
    Difference,
    Intersection,
}

/// How a construct composes its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstructClass {
    Primitive,
    Transform,
    Boolean,
}

/// Value type accepted by a schema slot. `undef` is accepted everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    Number,
    Bool,
    Vector,
    NumberOrVector,
    Matrix,
    Color,
}

impl ParamType {
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_undef() {
            return true;
        }
        match self {
            ParamType::Number => matches!(value, Value::Number(_)),
            ParamType::Bool => matches!(value, Value::Bool(_)),
            ParamType::Vector => value.is_number_vector(),
            ParamType::NumberOrVector => {
                matches!(value, Value::Number(_)) || value.is_number_vector()
            }
            ParamType::Matrix => value.is_matrix(),
            ParamType::Color => matches!(value, Value::Str(_)) || value.is_number_vector(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParamType::Number => "a number",
            ParamType::Bool => "a boolean",
            ParamType::Vector => "a number vector",
            ParamType::NumberOrVector => "a number or number vector",
            ParamType::Matrix => "a matrix",
            ParamType::Color => "a color vector or name",
        };
        f.write_str(text)
    }
}

/// Const-constructible default value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ParamDefault {
    Undef,
    Bool(bool),
    Number(f64),
    Vec3([f64; 3]),
    Identity,
}

impl ParamDefault {
    pub fn to_value(&self) -> Value {
        match self {
            ParamDefault::Undef => Value::Undef,
            ParamDefault::Bool(b) => Value::Bool(*b),
            ParamDefault::Number(n) => Value::Number(*n),
            ParamDefault::Vec3(v) => Value::from(*v),
            ParamDefault::Identity => Value::Vector(
                (0..4)
                    .map(|row| {
                        Value::Vector(
                            (0..4)
                                .map(|col| Value::Number(if row == col { 1.0 } else { 0.0 }))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
        }
    }
}

/// One schema slot
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub position: usize,
    pub default: ParamDefault,
    pub ty: ParamType,
}

const fn param(name: &'static str, position: usize, default: ParamDefault, ty: ParamType) -> ParamSpec {
    ParamSpec {
        name,
        position,
        default,
        ty,
    }
}

/// Registry entry
#[derive(Debug, Serialize)]
pub struct ConstructSpec {
    pub kind: ConstructKind,
    pub name: &'static str,
    pub class: ConstructClass,
    pub params: &'static [ParamSpec],
}

impl ConstructSpec {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn param_at(&self, position: usize) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.position == position)
    }

    /// Check that positions are unique and contiguous from 0 and names unique
    pub fn validate(&self) -> Result<(), String> {
        for (expected, spec) in self.params.iter().enumerate() {
            if self.param_at(expected).is_none() {
                return Err(format!("{}: no parameter at position {}", self.name, expected));
            }
            if self.params.iter().filter(|p| p.name == spec.name).count() > 1 {
                return Err(format!("{}: duplicate parameter '{}'", self.name, spec.name));
            }
            if self.params.iter().filter(|p| p.position == spec.position).count() > 1 {
                return Err(format!("{}: duplicate position {}", self.name, spec.position));
            }
        }
        Ok(())
    }
}

use ParamDefault as D;
use ParamType as T;

const CUBE_PARAMS: &[ParamSpec] = &[
    param("size", 0, D::Number(1.0), T::NumberOrVector),
    param("center", 1, D::Bool(false), T::Bool),
];

const SPHERE_PARAMS: &[ParamSpec] = &[
    param("r", 0, D::Number(1.0), T::Number),
    param("d", 1, D::Undef, T::Number),
    param("$fn", 2, D::Undef, T::Number),
    param("$fa", 3, D::Undef, T::Number),
    param("$fs", 4, D::Undef, T::Number),
];

const CYLINDER_PARAMS: &[ParamSpec] = &[
    param("h", 0, D::Number(1.0), T::Number),
    param("r1", 1, D::Undef, T::Number),
    param("r2", 2, D::Undef, T::Number),
    param("center", 3, D::Bool(false), T::Bool),
    param("r", 4, D::Number(1.0), T::Number),
    param("d", 5, D::Undef, T::Number),
    param("d1", 6, D::Undef, T::Number),
    param("d2", 7, D::Undef, T::Number),
    param("$fn", 8, D::Undef, T::Number),
    param("$fa", 9, D::Undef, T::Number),
    param("$fs", 10, D::Undef, T::Number),
];

const TRANSLATE_PARAMS: &[ParamSpec] = &[param("v", 0, D::Vec3([0.0, 0.0, 0.0]), T::Vector)];

const ROTATE_PARAMS: &[ParamSpec] = &[
    param("a", 0, D::Number(0.0), T::NumberOrVector),
    param("v", 1, D::Undef, T::Vector),
];

const SCALE_PARAMS: &[ParamSpec] = &[param("v", 0, D::Vec3([1.0, 1.0, 1.0]), T::NumberOrVector)];

const MIRROR_PARAMS: &[ParamSpec] = &[param("v", 0, D::Vec3([1.0, 0.0, 0.0]), T::Vector)];

const MULTMATRIX_PARAMS: &[ParamSpec] = &[param("m", 0, D::Identity, T::Matrix)];

const COLOR_PARAMS: &[ParamSpec] = &[
    param("c", 0, D::Undef, T::Color),
    param("alpha", 1, D::Number(1.0), T::Number),
];

/// Every registered construct
pub static CONSTRUCTS: &[ConstructSpec] = &[
    ConstructSpec { kind: ConstructKind::Cube, name: "cube", class: ConstructClass::Primitive, params: CUBE_PARAMS },
    ConstructSpec { kind: ConstructKind::Sphere, name: "sphere", class: ConstructClass::Primitive, params: SPHERE_PARAMS },
    ConstructSpec { kind: ConstructKind::Cylinder, name: "cylinder", class: ConstructClass::Primitive, params: CYLINDER_PARAMS },
    ConstructSpec { kind: ConstructKind::Translate, name: "translate", class: ConstructClass::Transform, params: TRANSLATE_PARAMS },
    ConstructSpec { kind: ConstructKind::Rotate, name: "rotate", class: ConstructClass::Transform, params: ROTATE_PARAMS },
    ConstructSpec { kind: ConstructKind::Scale, name: "scale", class: ConstructClass::Transform, params: SCALE_PARAMS },
    ConstructSpec { kind: ConstructKind::Mirror, name: "mirror", class: ConstructClass::Transform, params: MIRROR_PARAMS },
    ConstructSpec { kind: ConstructKind::Multmatrix, name: "multmatrix", class: ConstructClass::Transform, params: MULTMATRIX_PARAMS },
    ConstructSpec { kind: ConstructKind::Color, name: "color", class: ConstructClass::Transform, params: COLOR_PARAMS },
    ConstructSpec { kind: ConstructKind::Union, name: "union", class: ConstructClass::Boolean, params: &[] },
    ConstructSpec { kind: ConstructKind::Difference, name: "difference", class: ConstructClass::Boolean, params: &[] },
    ConstructSpec { kind: ConstructKind::Intersection, name: "intersection", class: ConstructClass::Boolean, params: &[] },
];

/// Registry entry for an OpenSCAD identifier
pub fn lookup(name: &str) -> Option<&'static ConstructSpec> {
    CONSTRUCTS.iter().find(|spec| spec.name == name)
}

impl ConstructKind {
    pub fn from_name(name: &str) -> Option<Self> {
        lookup(name).map(|spec| spec.kind)
    }

    pub fn spec(self) -> &'static ConstructSpec {
        CONSTRUCTS
            .iter()
            .find(|spec| spec.kind == self)
            .unwrap_or_else(|| unreachable!("construct {:?} missing from registry", self))
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn class(self) -> ConstructClass {
        self.spec().class
    }
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
