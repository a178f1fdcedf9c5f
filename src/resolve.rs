// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parameter resolver
//!
//! Unifies positional and named arguments against a construct's schema:
//!
//! 1. every argument expression is evaluated against the current scope,
//! 2. the record is seeded with schema defaults,
//! 3. positional arguments fill the slot whose position matches their index,
//! 4. named arguments overwrite whatever the slot holds.
//!
//! Named beats positional beats default, and any ordering of the same
//! effective arguments converges to the same record. A repeated named
//! argument keeps its last occurrence.

use crate::ast::{Argument, BinaryOp, Expr, ModuleParam, Value};
use crate::error::{ConvertError, ParameterError};
use crate::normalize::CanonicalNode;
use crate::registry::{ConstructSpec, ParamSpec};
use crate::scope::ScopeService;
use ahash::AHashSet;
use std::collections::BTreeMap;
use tracing::warn;

/// Fully resolved, representation-independent parameter set
pub type ParameterRecord = BTreeMap<String, Value>;

/// Evaluate an argument expression against the visible bindings
pub fn evaluate_expr(expr: &Expr, scopes: &ScopeService) -> Result<Value, ConvertError> {
    match expr {
        Expr::Undef => Ok(Value::Undef),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Vector(items) => items
            .iter()
            .map(|item| evaluate_expr(item, scopes))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Vector),
        Expr::Variable(name) => scopes
            .resolve_variable(name)
            .map(|binding| binding.value.clone())
            .ok_or_else(|| ConvertError::UnresolvedVariable { name: name.clone() }),
        Expr::Negate(inner) => {
            let value = evaluate_expr(inner, scopes)?;
            negate(&value).ok_or_else(|| {
                ParameterError::InvalidOperands {
                    op: "-".into(),
                    lhs: value.type_name().into(),
                    rhs: "nothing".into(),
                }
                .into()
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate_expr(lhs, scopes)?;
            let rhs = evaluate_expr(rhs, scopes)?;
            apply_binary(*op, &lhs, &rhs).ok_or_else(|| {
                ParameterError::InvalidOperands {
                    op: op.to_string(),
                    lhs: lhs.type_name().into(),
                    rhs: rhs.type_name().into(),
                }
                .into()
            })
        }
    }
}

fn negate(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::Number(-n)),
        Value::Vector(items) => items.iter().map(negate).collect::<Option<Vec<_>>>().map(Value::Vector),
        _ => None,
    }
}

fn scalar_op(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
    }
}

fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Option<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Some(Value::Number(scalar_op(op, *a, *b))),
        // Element-wise over equally sized vectors
        (Value::Vector(a), Value::Vector(b)) if matches!(op, BinaryOp::Add | BinaryOp::Sub) => {
            if a.len() != b.len() {
                return None;
            }
            a.iter()
                .zip(b)
                .map(|(x, y)| apply_binary(op, x, y))
                .collect::<Option<Vec<_>>>()
                .map(Value::Vector)
        }
        (Value::Vector(items), Value::Number(_)) if matches!(op, BinaryOp::Mul | BinaryOp::Div) => items
            .iter()
            .map(|item| apply_binary(op, item, rhs))
            .collect::<Option<Vec<_>>>()
            .map(Value::Vector),
        (Value::Number(_), Value::Vector(items)) if op == BinaryOp::Mul => items
            .iter()
            .map(|item| apply_binary(op, lhs, item))
            .collect::<Option<Vec<_>>>()
            .map(Value::Vector),
        _ => None,
    }
}

fn check_type(spec: &ConstructSpec, param: &ParamSpec, value: &Value) -> Result<(), ParameterError> {
    if param.ty.accepts(value) {
        Ok(())
    } else {
        Err(ParameterError::TypeMismatch {
            construct: spec.name.into(),
            param: param.name.into(),
            expected: param.ty.to_string(),
            found: value.type_name().into(),
        })
    }
}

/// Resolve a canonical construct call into its parameter record
pub fn resolve_parameters(
    node: &CanonicalNode<'_>,
    scopes: &ScopeService,
) -> Result<ParameterRecord, ConvertError> {
    let spec = node.kind.spec();

    // Concrete values first, so schema assignment never sees a variable
    let positional = node
        .positional
        .iter()
        .map(|expr| evaluate_expr(expr, scopes))
        .collect::<Result<Vec<_>, _>>()?;
    let named = node
        .named
        .iter()
        .map(|(name, expr)| evaluate_expr(expr, scopes).map(|value| (*name, value)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut record: ParameterRecord = spec
        .params
        .iter()
        .map(|param| (param.name.to_string(), param.default.to_value()))
        .collect();

    for (index, value) in positional.into_iter().enumerate() {
        let param = spec
            .param_at(index)
            .ok_or_else(|| ParameterError::PositionalOutOfRange {
                construct: spec.name.into(),
                index,
                max: spec.params.len(),
            })?;
        check_type(spec, param, &value)?;
        record.insert(param.name.to_string(), value);
    }

    let mut seen = AHashSet::new();
    for (name, value) in named {
        let param = spec
            .param(name)
            .ok_or_else(|| ParameterError::UnknownParameter {
                construct: spec.name.into(),
                name: name.to_string(),
            })?;
        check_type(spec, param, &value)?;
        if !seen.insert(name) {
            warn!(construct = spec.name, param = name, "duplicate named argument, last value wins");
        }
        record.insert(param.name.to_string(), value);
    }

    Ok(record)
}

/// Bind call arguments to a user module's declared parameters.
///
/// Same precedence rules as [`resolve_parameters`]. Parameters without a
/// default and without an argument are bound to `undef`. Named `$`-variables
/// that the module does not declare are passed through so they reach the
/// module body, as OpenSCAD does for `$fn` and friends.
pub fn resolve_module_arguments(
    module: &str,
    params: &[ModuleParam],
    args: &[Argument],
    scopes: &ScopeService,
) -> Result<Vec<(String, Value)>, ConvertError> {
    let mut bound: Vec<(String, Value)> = params
        .iter()
        .map(|param| -> Result<(String, Value), ConvertError> {
            let value = match &param.default {
                Some(expr) => evaluate_expr(expr, scopes)?,
                None => Value::Undef,
            };
            Ok((param.name.clone(), value))
        })
        .collect::<Result<_, _>>()?;

    let mut positional_index = 0;
    let mut named = Vec::new();
    for arg in args {
        match arg {
            Argument::Positional { value } => {
                let value = evaluate_expr(value, scopes)?;
                let slot = bound
                    .get_mut(positional_index)
                    .ok_or_else(|| ParameterError::PositionalOutOfRange {
                        construct: module.into(),
                        index: positional_index,
                        max: params.len(),
                    })?;
                slot.1 = value;
                positional_index += 1;
            }
            Argument::Named { name, value } => named.push((name, evaluate_expr(value, scopes)?)),
        }
    }

    let mut seen = AHashSet::new();
    for (name, value) in named {
        if !seen.insert(name.as_str()) {
            warn!(module, param = name.as_str(), "duplicate named argument, last value wins");
        }
        match bound.iter_mut().find(|(bound_name, _)| bound_name == name) {
            Some(slot) => slot.1 = value,
            None if name.starts_with('$') => bound.push((name.clone(), value)),
            None => {
                return Err(ParameterError::UnknownParameter {
                    construct: module.into(),
                    name: name.clone(),
                }
                .into())
            }
        }
    }

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, NodeKind};
    use crate::normalize::{normalize, Normalized};

    fn resolve(node: &Node, scopes: &ScopeService) -> Result<ParameterRecord, ConvertError> {
        match normalize(node) {
            Normalized::Construct(canonical) => resolve_parameters(&canonical, scopes),
            other => panic!("not a construct: {:?}", other),
        }
    }

    #[test]
    fn test_zero_args_yield_defaults() {
        let scopes = ScopeService::new();
        let record = resolve(&Node::invocation("cube", vec![], vec![]), &scopes).unwrap();
        assert_eq!(record["size"], Value::Number(1.0));
        assert_eq!(record["center"], Value::Bool(false));
    }

    #[test]
    fn test_named_overrides_positional() {
        let scopes = ScopeService::new();
        let node = Node::invocation(
            "sphere",
            vec![Argument::positional(3.0), Argument::named("r", 7.0)],
            vec![],
        );
        let record = resolve(&node, &scopes).unwrap();
        assert_eq!(record["r"], Value::Number(7.0));
    }

    #[test]
    fn test_argument_order_does_not_matter() {
        let scopes = ScopeService::new();
        let a = Node::invocation(
            "cylinder",
            vec![Argument::named("center", true), Argument::positional(4.0), Argument::named("r", 2.0)],
            vec![],
        );
        let b = Node::invocation(
            "cylinder",
            vec![Argument::positional(4.0), Argument::named("r", 2.0), Argument::named("center", true)],
            vec![],
        );
        assert_eq!(resolve(&a, &scopes).unwrap(), resolve(&b, &scopes).unwrap());
    }

    #[test]
    fn test_dedicated_and_invocation_records_match() {
        let scopes = ScopeService::new();
        let dedicated = Node::new(NodeKind::Cube {
            size: Some(Expr::Number(5.0)),
            center: Some(Expr::Bool(true)),
        });
        let generic = Node::invocation(
            "cube",
            vec![Argument::positional(5.0), Argument::named("center", true)],
            vec![],
        );
        assert_eq!(resolve(&dedicated, &scopes).unwrap(), resolve(&generic, &scopes).unwrap());
    }

    #[test]
    fn test_positional_out_of_range() {
        let scopes = ScopeService::new();
        let node = Node::invocation(
            "translate",
            vec![Argument::positional(Expr::vec3(1.0, 2.0, 3.0)), Argument::positional(1.0)],
            vec![],
        );
        let err = resolve(&node, &scopes).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Parameter(ParameterError::PositionalOutOfRange {
                construct: "translate".into(),
                index: 1,
                max: 1,
            })
        );
    }

    #[test]
    fn test_unknown_named_parameter() {
        let scopes = ScopeService::new();
        let node = Node::invocation("cube", vec![Argument::named("radius", 2.0)], vec![]);
        assert!(matches!(
            resolve(&node, &scopes),
            Err(ConvertError::Parameter(ParameterError::UnknownParameter { .. }))
        ));
    }

    #[test]
    fn test_number_is_not_a_boolean() {
        let scopes = ScopeService::new();
        let node = Node::invocation("cube", vec![Argument::positional(5.0), Argument::positional(1.0)], vec![]);
        match resolve(&node, &scopes) {
            Err(ConvertError::Parameter(ParameterError::TypeMismatch { param, found, .. })) => {
                assert_eq!(param, "center");
                assert_eq!(found, "number");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_named_last_wins() {
        let scopes = ScopeService::new();
        let node = Node::invocation(
            "cube",
            vec![Argument::named("center", true), Argument::named("center", false)],
            vec![],
        );
        assert_eq!(resolve(&node, &scopes).unwrap()["center"], Value::Bool(false));
    }

    #[test]
    fn test_variables_resolved_before_assignment() {
        let mut scopes = ScopeService::new();
        scopes.define_variable("w", Value::Number(4.0), None).unwrap();
        let node = Node::invocation(
            "cube",
            vec![Argument::positional(Expr::binary(BinaryOp::Mul, Expr::var("w"), 2.0))],
            vec![],
        );
        assert_eq!(resolve(&node, &scopes).unwrap()["size"], Value::Number(8.0));
    }

    #[test]
    fn test_undefined_variable() {
        let scopes = ScopeService::new();
        let node = Node::invocation("sphere", vec![Argument::named("r", Expr::var("nope"))], vec![]);
        assert_eq!(
            resolve(&node, &scopes).unwrap_err(),
            ConvertError::UnresolvedVariable { name: "nope".into() }
        );
    }

    #[test]
    fn test_vector_arithmetic() {
        let scopes = ScopeService::new();
        let sum = Expr::binary(BinaryOp::Add, Expr::vec3(1.0, 2.0, 3.0), Expr::vec3(1.0, 1.0, 1.0));
        assert_eq!(evaluate_expr(&sum, &scopes).unwrap(), Value::from([2.0, 3.0, 4.0]));

        let scaled = Expr::binary(BinaryOp::Mul, 2.0, Expr::vec3(1.0, 2.0, 3.0));
        assert_eq!(evaluate_expr(&scaled, &scopes).unwrap(), Value::from([2.0, 4.0, 6.0]));

        let negated = Expr::Negate(Box::new(Expr::vec3(1.0, 0.0, -2.0)));
        assert_eq!(evaluate_expr(&negated, &scopes).unwrap(), Value::from([-1.0, -0.0, 2.0]));

        let bad = Expr::binary(BinaryOp::Add, true, 1.0);
        assert!(matches!(
            evaluate_expr(&bad, &scopes),
            Err(ConvertError::Parameter(ParameterError::InvalidOperands { .. }))
        ));
    }

    #[test]
    fn test_module_arguments() {
        let scopes = ScopeService::new();
        let params = vec![
            ModuleParam::new("w", Some(Expr::Number(1.0))),
            ModuleParam::new("h", None),
        ];
        let args = vec![Argument::named("h", 3.0), Argument::positional(2.0), Argument::named("$fn", 12.0)];
        let bound = resolve_module_arguments("slab", &params, &args, &scopes).unwrap();
        assert_eq!(
            bound,
            vec![
                ("w".to_string(), Value::Number(2.0)),
                ("h".to_string(), Value::Number(3.0)),
                ("$fn".to_string(), Value::Number(12.0)),
            ]
        );

        let missing = resolve_module_arguments("slab", &params, &[], &scopes).unwrap();
        assert_eq!(missing[1].1, Value::Undef);

        let err = resolve_module_arguments("slab", &params, &[Argument::named("depth", 1.0)], &scopes);
        assert!(err.is_err());
    }

    #[test]
    fn test_module_duplicate_named_last_wins() {
        let scopes = ScopeService::new();
        let params = vec![ModuleParam::new("w", None)];
        let args = vec![
            Argument::named("w", 1.0),
            Argument::named("$fn", 6.0),
            Argument::named("w", 4.0),
            Argument::named("$fn", 9.0),
        ];
        let bound = resolve_module_arguments("slab", &params, &args, &scopes).unwrap();
        assert_eq!(
            bound,
            vec![
                ("w".to_string(), Value::Number(4.0)),
                ("$fn".to_string(), Value::Number(9.0)),
            ]
        );
    }
}
