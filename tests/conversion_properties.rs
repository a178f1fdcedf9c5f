// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end conversion properties

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Point3;
use polyframe_csg::ast::{Assignment, ModuleParam};
use polyframe_csg::geometry::{BooleanOp, PrimitiveShape, Shape};
use polyframe_csg::registry::{ConstructClass, CONSTRUCTS};
use polyframe_csg::{
    convert, Argument, ConversionObserver, ConverterConfig, CsgConverter, ErrorKind, Expr,
    GeometryDescription, Node, NodeKind,
};
use std::sync::{Arc, Mutex};

fn primitive(node: &Node) -> PrimitiveShape {
    match convert(node).unwrap().geometry_description.shape {
        Shape::Primitive { primitive } => primitive,
        other => panic!("expected a primitive, got {:?}", other),
    }
}

#[test]
fn test_every_encoding_of_a_cylinder_agrees() {
    let dedicated = Node::new(NodeKind::Cylinder {
        h: Some(Expr::Number(10.0)),
        r: None,
        r1: Some(Expr::Number(3.0)),
        r2: Some(Expr::Number(1.0)),
        d: None,
        d1: None,
        d2: None,
        center: Some(Expr::Bool(true)),
        fn_: Some(Expr::Number(24.0)),
    });
    let positional = Node::invocation(
        "cylinder",
        vec![
            Argument::positional(10.0),
            Argument::positional(3.0),
            Argument::positional(1.0),
            Argument::positional(true),
            Argument::named("$fn", 24.0),
        ],
        vec![],
    );
    let named_shuffled = Node::invocation(
        "cylinder",
        vec![
            Argument::named("$fn", 24.0),
            Argument::named("center", true),
            Argument::named("r2", 1.0),
            Argument::named("h", 10.0),
            Argument::named("r1", 3.0),
        ],
        vec![],
    );

    let expected = PrimitiveShape::Cylinder {
        height: 10.0,
        r1: 3.0,
        r2: 1.0,
        center: true,
        segments: 24,
    };
    assert_eq!(primitive(&dedicated), expected);
    assert_eq!(primitive(&positional), expected);
    assert_eq!(primitive(&named_shuffled), expected);
}

#[test]
fn test_zero_argument_calls_succeed_for_every_construct() {
    for spec in CONSTRUCTS {
        let children = match spec.class {
            ConstructClass::Primitive => vec![],
            _ => vec![Node::invocation("cube", vec![], vec![])],
        };
        let node = Node::invocation(spec.name, vec![], children);
        let result = convert(&node);
        assert!(result.is_ok(), "{}() failed: {:?}", spec.name, result.err());
    }
}

#[test]
fn test_diameter_arguments() {
    let sphere = Node::invocation("sphere", vec![Argument::named("d", 8.0), Argument::named("$fn", 10.0)], vec![]);
    assert_eq!(primitive(&sphere), PrimitiveShape::Sphere { radius: 4.0, segments: 10 });

    let cone = Node::invocation(
        "cylinder",
        vec![
            Argument::named("h", 2.0),
            Argument::named("d1", 6.0),
            Argument::named("d2", 0.0),
            Argument::named("$fn", 12.0),
        ],
        vec![],
    );
    assert_eq!(
        primitive(&cone),
        PrimitiveShape::Cylinder { height: 2.0, r1: 3.0, r2: 0.0, center: false, segments: 12 }
    );
}

#[test]
fn test_nested_transforms_map_points() -> Result<()> {
    // translate([10, 0, 0]) rotate([0, 0, 90]) cube(1);
    let node = Node::new(NodeKind::Translate {
        v: Some(Expr::vec3(10.0, 0.0, 0.0)),
        children: vec![Node::new(NodeKind::Rotate {
            a: Some(Expr::vec3(0.0, 0.0, 90.0)),
            v: None,
            children: vec![Node::invocation("cube", vec![Argument::positional(1.0)], vec![])],
        })],
    });
    let result = convert(&node)?;
    let p = result
        .geometry_description
        .transform
        .transform_point(&Point3::new(1.0, 0.0, 0.0));
    assert_relative_eq!(p, Point3::new(10.0, 1.0, 0.0), epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_mirror_flips_handedness() -> Result<()> {
    let node = Node::invocation(
        "mirror",
        vec![Argument::positional(Expr::vec3(0.0, 0.0, 1.0))],
        vec![Node::invocation("cube", vec![], vec![])],
    );
    let result = convert(&node)?;
    let m = result.geometry_description.transform;
    assert_relative_eq!(m.fixed_view::<3, 3>(0, 0).clone_owned().determinant(), -1.0, epsilon = 1e-12);
    assert_relative_eq!(m.transform_point(&Point3::new(0.0, 0.0, 2.0)), Point3::new(0.0, 0.0, -2.0));
    Ok(())
}

#[test]
fn test_difference_with_assignments_between_operands() -> Result<()> {
    // difference() { cube(4); w = 2; cube(w); }
    let node = Node::new(NodeKind::Difference {
        children: vec![
            Node::invocation("cube", vec![Argument::positional(4.0)], vec![]),
            Node::new(NodeKind::Assignment { name: "w".into(), value: Expr::Number(2.0) }),
            Node::invocation("cube", vec![Argument::positional(Expr::var("w"))], vec![]),
        ],
    });
    let result = convert(&node)?.geometry_description;
    let Shape::Boolean { op, operands } = &result.shape else {
        panic!("expected a boolean, got {:?}", result.shape);
    };
    assert_eq!(*op, BooleanOp::Difference);
    assert_eq!(
        operands,
        &vec![
            GeometryDescription::primitive(PrimitiveShape::cube([4.0; 3], false)),
            GeometryDescription::primitive(PrimitiveShape::cube([2.0; 3], false)),
        ]
    );
    Ok(())
}

#[derive(Clone, Default)]
struct CountingObserver(Arc<Mutex<Vec<(String, usize)>>>);

impl ConversionObserver for CountingObserver {
    fn node_entered(&mut self, node: &Node, depth: usize) {
        self.0.lock().unwrap().push((node.kind.label().to_string(), depth));
    }
}

#[test]
fn test_failing_middle_child_stops_the_walk() {
    let observer = CountingObserver::default();
    let mut converter = CsgConverter::new(ConverterConfig::default()).with_observer(Box::new(observer.clone()));

    let node = Node::new(NodeKind::Intersection {
        children: vec![
            Node::invocation("cube", vec![], vec![]),
            Node::invocation("cube", vec![Argument::named("radius", 1.0)], vec![]),
            Node::invocation("sphere", vec![], vec![]),
        ],
    });
    let err = converter.convert(&node).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParameterResolutionError);

    let entered = observer.0.lock().unwrap().clone();
    assert_eq!(
        entered,
        vec![("intersection".to_string(), 1), ("cube".to_string(), 2), ("cube".to_string(), 2)]
    );
}

#[test]
fn test_module_arguments_are_evaluated_in_caller_scope() -> Result<()> {
    // size = 3; module box(s) { cube(s); } let (size = 5) box(size);
    let program = Node::new(NodeKind::Group {
        children: vec![
            Node::new(NodeKind::Assignment { name: "size".into(), value: Expr::Number(3.0) }),
            Node::new(NodeKind::ModuleDefinition {
                name: "box".into(),
                params: vec![ModuleParam::new("s", None)],
                body: vec![Node::invocation("cube", vec![Argument::positional(Expr::var("s"))], vec![])],
            }),
            Node::new(NodeKind::Let {
                assignments: vec![Assignment::new("size", 5.0)],
                children: vec![Node::invocation("box", vec![Argument::positional(Expr::var("size"))], vec![])],
            }),
        ],
    });
    let result = convert(&program)?;
    assert_eq!(
        result.geometry_description,
        GeometryDescription::primitive(PrimitiveShape::cube([5.0; 3], false))
    );
    Ok(())
}

#[test]
fn test_module_parameter_without_argument_is_undef() -> Result<()> {
    // module ball(r) { sphere(r); } ball();  -> sphere() defaults
    let program = Node::new(NodeKind::Group {
        children: vec![
            Node::new(NodeKind::ModuleDefinition {
                name: "ball".into(),
                params: vec![ModuleParam::new("r", None)],
                body: vec![Node::invocation(
                    "sphere",
                    vec![Argument::positional(Expr::var("r")), Argument::named("$fn", 6.0)],
                    vec![],
                )],
            }),
            Node::invocation("ball", vec![], vec![]),
        ],
    });
    let result = convert(&program)?;
    assert_eq!(
        result.geometry_description.shape,
        Shape::Primitive {
            primitive: PrimitiveShape::Sphere { radius: 1.0, segments: 6 }
        }
    );
    Ok(())
}
