// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Canonical primitive shapes built from resolved parameter records

use crate::ast::Value;
use crate::error::ParameterError;
use crate::registry::ConstructKind;
use crate::resolve::ParameterRecord;
use serde::Serialize;
use std::f64::consts::PI;

/// Smallest radius that still gets more than the minimum fragment count
const GRID_FINE: f64 = 1e-5;
const MIN_FRAGMENTS: u32 = 3;

/// Resolution settings for circular primitives (`$fn`, `$fa`, `$fs`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentSettings {
    pub fn_: f64,
    pub fa: f64,
    pub fs: f64,
    pub max_fragments: u32,
}

impl FragmentSettings {
    /// Apply per-call `$fn`/`$fa`/`$fs` arguments found in a record
    pub fn with_overrides(mut self, record: &ParameterRecord) -> Self {
        if let Some(n) = record.get("$fn").and_then(Value::as_number) {
            self.fn_ = n;
        }
        if let Some(n) = record.get("$fa").and_then(Value::as_number) {
            self.fa = n;
        }
        if let Some(n) = record.get("$fs").and_then(Value::as_number) {
            self.fs = n;
        }
        self
    }

    /// OpenSCAD's fragment rule: `$fn` when positive, otherwise the finer of
    /// the angle and size limits, never fewer than 5
    pub fn fragments(&self, radius: f64) -> u32 {
        let count = if radius < GRID_FINE {
            MIN_FRAGMENTS
        } else if self.fn_ > 0.0 {
            (self.fn_.floor() as u32).max(MIN_FRAGMENTS)
        } else {
            let by_angle = 360.0 / self.fa;
            let by_size = radius * 2.0 * PI / self.fs;
            by_angle.min(by_size).max(5.0).ceil() as u32
        };
        count.clamp(MIN_FRAGMENTS, self.max_fragments.max(MIN_FRAGMENTS))
    }
}

/// Geometric primitives, fully parameterised
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PrimitiveShape {
    Box {
        width: f64,
        height: f64,
        depth: f64,
        center: bool,
    },
    Sphere { radius: f64, segments: u32 },
    Cylinder {
        height: f64,
        r1: f64,
        r2: f64,
        center: bool,
        segments: u32,
    },
}

impl PrimitiveShape {
    pub fn cube(size: [f64; 3], center: bool) -> Self {
        Self::Box {
            width: size[0],
            height: size[1],
            depth: size[2],
            center,
        }
    }

    /// Build the shape for a primitive construct from its resolved record
    pub fn from_record(
        kind: ConstructKind,
        record: &ParameterRecord,
        settings: FragmentSettings,
    ) -> Result<Self, ParameterError> {
        let reader = RecordReader { construct: kind.name(), record };
        match kind {
            ConstructKind::Cube => {
                let size = match reader.value("size") {
                    Value::Number(n) => [*n; 3],
                    Value::Undef => [1.0; 3],
                    v => v.as_vec3(0.0).ok_or_else(|| reader.invalid("size", "expected a number vector"))?,
                };
                Ok(Self::cube(size, reader.flag("center")))
            }
            ConstructKind::Sphere => {
                let radius = match reader.number("d") {
                    Some(d) => d / 2.0,
                    None => reader.number("r").unwrap_or(1.0),
                };
                if radius < 0.0 {
                    return Err(reader.invalid("r", "radius must not be negative"));
                }
                let segments = settings.with_overrides(record).fragments(radius);
                Ok(Self::Sphere { radius, segments })
            }
            ConstructKind::Cylinder => {
                let base = match reader.number("d") {
                    Some(d) => d / 2.0,
                    None => reader.number("r").unwrap_or(1.0),
                };
                let r1 = reader
                    .number("d1")
                    .map(|d| d / 2.0)
                    .or_else(|| reader.number("r1"))
                    .unwrap_or(base);
                let r2 = reader
                    .number("d2")
                    .map(|d| d / 2.0)
                    .or_else(|| reader.number("r2"))
                    .unwrap_or(base);
                if r1 < 0.0 || r2 < 0.0 {
                    return Err(reader.invalid("r", "radius must not be negative"));
                }
                let height = reader.number("h").unwrap_or(1.0);
                let segments = settings.with_overrides(record).fragments(r1.max(r2));
                Ok(Self::Cylinder {
                    height,
                    r1,
                    r2,
                    center: reader.flag("center"),
                    segments,
                })
            }
            other => Err(ParameterError::InvalidValue {
                construct: other.name().into(),
                param: "-".into(),
                reason: "not a primitive".into(),
            }),
        }
    }
}

struct RecordReader<'a> {
    construct: &'static str,
    record: &'a ParameterRecord,
}

impl RecordReader<'_> {
    fn value(&self, name: &str) -> &Value {
        self.record.get(name).unwrap_or(&Value::Undef)
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.value(name).as_number()
    }

    fn flag(&self, name: &str) -> bool {
        self.value(name).as_bool().unwrap_or(false)
    }

    fn invalid(&self, param: &str, reason: &str) -> ParameterError {
        ParameterError::InvalidValue {
            construct: self.construct.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }
}
