// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Node normalizer
//!
//! Collapses dedicated construct nodes and generic invocations into one
//! canonical shape before any parameter logic runs. Dedicated nodes emit
//! their populated fields as named arguments under the schema's own names,
//! so both encodings reach the resolver through the same code path.

use crate::ast::{Argument, Expr, Node, NodeKind, Span};
use crate::registry::ConstructKind;

/// Construct call in canonical form
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalNode<'a> {
    pub kind: ConstructKind,
    pub positional: Vec<&'a Expr>,
    pub named: Vec<(&'a str, &'a Expr)>,
    pub children: &'a [Node],
    pub span: Option<Span>,
}

/// Outcome of normalizing one node
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized<'a> {
    /// A registered construct
    Construct(CanonicalNode<'a>),
    /// An invocation whose name is not in the registry
    Unknown {
        name: &'a str,
        args: &'a [Argument],
        children: &'a [Node],
        span: Option<Span>,
    },
    /// Group, let, assignment, module definition, echo or empty
    Structural,
}

fn dedicated<'a>(
    kind: ConstructKind,
    fields: &[(&'static str, &'a Option<Expr>)],
    children: &'a [Node],
    span: Option<Span>,
) -> Normalized<'a> {
    let named = fields
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|expr| (*name, expr)))
        .collect();
    Normalized::Construct(CanonicalNode {
        kind,
        positional: Vec::new(),
        named,
        children,
        span,
    })
}

/// Classify `node` and bring construct calls into canonical form
pub fn normalize(node: &Node) -> Normalized<'_> {
    let span = node.span;
    match &node.kind {
        NodeKind::Cube { size, center } => {
            dedicated(ConstructKind::Cube, &[("size", size), ("center", center)], &[], span)
        }
        NodeKind::Sphere { r, d, fn_ } => {
            dedicated(ConstructKind::Sphere, &[("r", r), ("d", d), ("$fn", fn_)], &[], span)
        }
        NodeKind::Cylinder { h, r, r1, r2, d, d1, d2, center, fn_ } => dedicated(
            ConstructKind::Cylinder,
            &[
                ("h", h),
                ("r1", r1),
                ("r2", r2),
                ("center", center),
                ("r", r),
                ("d", d),
                ("d1", d1),
                ("d2", d2),
                ("$fn", fn_),
            ],
            &[],
            span,
        ),
        NodeKind::Translate { v, children } => {
            dedicated(ConstructKind::Translate, &[("v", v)], children, span)
        }
        NodeKind::Rotate { a, v, children } => {
            dedicated(ConstructKind::Rotate, &[("a", a), ("v", v)], children, span)
        }
        NodeKind::Scale { v, children } => dedicated(ConstructKind::Scale, &[("v", v)], children, span),
        NodeKind::Mirror { v, children } => {
            dedicated(ConstructKind::Mirror, &[("v", v)], children, span)
        }
        NodeKind::Multmatrix { m, children } => {
            dedicated(ConstructKind::Multmatrix, &[("m", m)], children, span)
        }
        NodeKind::Color { c, alpha, children } => {
            dedicated(ConstructKind::Color, &[("c", c), ("alpha", alpha)], children, span)
        }
        NodeKind::Union { children } => dedicated(ConstructKind::Union, &[], children, span),
        NodeKind::Difference { children } => {
            dedicated(ConstructKind::Difference, &[], children, span)
        }
        NodeKind::Intersection { children } => {
            dedicated(ConstructKind::Intersection, &[], children, span)
        }
        NodeKind::Invocation { name, args, children } => match ConstructKind::from_name(name) {
            Some(kind) => {
                let mut positional = Vec::new();
                let mut named = Vec::new();
                for arg in args {
                    match arg {
                        Argument::Positional { value } => positional.push(value),
                        Argument::Named { name, value } => named.push((name.as_str(), value)),
                    }
                }
                Normalized::Construct(CanonicalNode {
                    kind,
                    positional,
                    named,
                    children,
                    span,
                })
            }
            None => Normalized::Unknown {
                name,
                args,
                children,
                span,
            },
        },
        NodeKind::Group { .. }
        | NodeKind::Let { .. }
        | NodeKind::Assignment { .. }
        | NodeKind::ModuleDefinition { .. }
        | NodeKind::Echo { .. }
        | NodeKind::Empty => Normalized::Structural,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedicated_cube_becomes_named_args() {
        let node = Node::new(NodeKind::Cube {
            size: Some(Expr::Number(5.0)),
            center: None,
        });
        match normalize(&node) {
            Normalized::Construct(canonical) => {
                assert_eq!(canonical.kind, ConstructKind::Cube);
                assert!(canonical.positional.is_empty());
                assert_eq!(canonical.named, vec![("size", &Expr::Number(5.0))]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invocation_keeps_argument_order() {
        let node = Node::invocation(
            "cylinder",
            vec![
                Argument::positional(10.0),
                Argument::named("r", 2.0),
                Argument::positional(3.0),
            ],
            vec![],
        );
        let Normalized::Construct(canonical) = normalize(&node) else {
            panic!("expected construct");
        };
        assert_eq!(canonical.kind, ConstructKind::Cylinder);
        assert_eq!(canonical.positional, vec![&Expr::Number(10.0), &Expr::Number(3.0)]);
        assert_eq!(canonical.named, vec![("r", &Expr::Number(2.0))]);
    }

    #[test]
    fn test_unknown_invocation_is_classified() {
        let span = Span::lines(7, 7);
        let node = Node::invocation("hull", vec![], vec![]).at(span);
        match normalize(&node) {
            Normalized::Unknown { name, span: s, .. } => {
                assert_eq!(name, "hull");
                assert_eq!(s, Some(span));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_structural_nodes() {
        let node = Node::new(NodeKind::Group { children: vec![] });
        assert_eq!(normalize(&node), Normalized::Structural);
    }
}
