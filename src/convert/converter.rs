// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Depth-first AST to CSG converter
//!
//! Every node goes through the same pipeline: normalize, resolve its
//! parameters against the current scope, convert its children left to right
//! and compose. The first child failure aborts the whole walk.

use super::cache::{chain_digest, CachedSubtree, Fingerprint, ResultCache};
use crate::ast::{Argument, ModuleParam, Node, NodeKind, Span};
use crate::config::{ConverterConfig, UnknownConstructPolicy};
use crate::error::ConvertError;
use crate::geometry::{
    BooleanOp, ConversionMetadata, ConvertedGeometry, FragmentSettings, GeometryDescription,
    Material, PrimitiveShape, TransformOp,
};
use crate::normalize::{normalize, CanonicalNode, Normalized};
use crate::registry::{ConstructClass, ConstructKind};
use crate::resolve::{evaluate_expr, resolve_module_arguments, resolve_parameters};
use crate::scope::ScopeService;
use ahash::AHashMap;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

// Stack kept free before recursing, and the size of each new segment
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_SEGMENT: usize = 1024 * 1024;

/// Hook invoked for every node the converter enters
pub trait ConversionObserver: Send {
    fn node_entered(&mut self, node: &Node, depth: usize);
}

#[derive(Debug)]
struct UserModule {
    params: Vec<ModuleParam>,
    body: Vec<Node>,
}

/// User modules defined in one block, plus a digest of every module
/// visible from it
#[derive(Debug, Default)]
struct ModuleFrame {
    modules: AHashMap<String, Arc<UserModule>>,
    digest: String,
}

/// Converts one AST at a time; owns its scope stack
pub struct CsgConverter {
    config: ConverterConfig,
    config_fingerprint: String,
    scopes: ScopeService,
    modules: Vec<ModuleFrame>,
    cache: Option<Arc<ResultCache>>,
    observer: Option<Box<dyn ConversionObserver>>,
    nodes_visited: usize,
    deepest: usize,
}

impl CsgConverter {
    pub fn new(config: ConverterConfig) -> Self {
        let cache = config.cache.then(|| Arc::new(ResultCache::new()));
        Self {
            config_fingerprint: config.fingerprint(),
            config,
            scopes: ScopeService::new(),
            modules: vec![ModuleFrame::default()],
            cache,
            observer: None,
            nodes_visited: 0,
            deepest: 0,
        }
    }

    /// Share a result cache with other converters
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn ConversionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn scopes(&self) -> &ScopeService {
        &self.scopes
    }

    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    /// Convert a whole tree starting from a fresh global scope.
    ///
    /// Panics raised inside the walk are reported as
    /// [`ConvertError::Internal`] instead of unwinding into the caller.
    pub fn convert(&mut self, root: &Node) -> Result<ConvertedGeometry, ConvertError> {
        let started = Instant::now();
        self.reset();

        let outcome = catch_unwind(AssertUnwindSafe(|| self.convert_node(root, 1)));
        let description = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "conversion panicked");
                self.reset();
                return Err(ConvertError::Internal(message));
            }
        };

        let metadata = ConversionMetadata {
            depth: self.deepest,
            nodes_visited: self.nodes_visited,
            generation_time: started.elapsed().as_secs_f64() * 1000.0,
        };
        debug!(
            nodes = metadata.nodes_visited,
            depth = metadata.depth,
            ms = metadata.generation_time,
            "conversion finished"
        );
        Ok(ConvertedGeometry {
            geometry_description: description,
            metadata,
        })
    }

    /// Convert `node` found at recursion level `depth` in the current scope
    pub fn convert_node(&mut self, node: &Node, depth: usize) -> Result<GeometryDescription, ConvertError> {
        if depth > self.config.max_depth {
            return Err(ConvertError::MaxDepthExceeded {
                max_depth: self.config.max_depth,
            }
            .at(node.span));
        }

        self.nodes_visited += 1;
        self.deepest = self.deepest.max(depth);
        if let Some(observer) = self.observer.as_mut() {
            observer.node_entered(node, depth);
        }
        debug!(node = node.kind.label(), depth, "convert");

        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.dispatch(node, depth))
            .map_err(|err| err.at(node.span))
    }

    fn reset(&mut self) {
        self.scopes.reset();
        self.modules = vec![ModuleFrame::default()];
        self.nodes_visited = 0;
        self.deepest = 0;
    }

    fn dispatch(&mut self, node: &Node, depth: usize) -> Result<GeometryDescription, ConvertError> {
        if let NodeKind::Invocation { name, args, children } = &node.kind {
            if let Some(module) = self.lookup_module(name) {
                return self.memoized(node, depth, |this| {
                    this.call_module(name, &module, args, children, node.span, depth)
                });
            }
        }

        match normalize(node) {
            Normalized::Construct(canonical) => {
                self.memoized(node, depth, |this| this.convert_construct(canonical, depth))
            }
            Normalized::Unknown { name, children, .. } => self.convert_unknown(name, children, depth),
            Normalized::Structural => self.convert_structural(node, depth),
        }
    }

    fn convert_construct(
        &mut self,
        canonical: CanonicalNode<'_>,
        depth: usize,
    ) -> Result<GeometryDescription, ConvertError> {
        let record = resolve_parameters(&canonical, &self.scopes)?;
        let kind = canonical.kind;

        match kind.class() {
            ConstructClass::Primitive => {
                let shape = PrimitiveShape::from_record(kind, &record, self.fragment_settings())?;
                Ok(GeometryDescription::primitive(shape))
            }
            ConstructClass::Transform if kind == ConstructKind::Color => {
                let material = Material::from_record(&record)?;
                let body = self.convert_block(kind.name(), canonical.children, depth)?;
                Ok(body.colored(material))
            }
            ConstructClass::Transform => {
                let matrix = TransformOp::from_record(kind, &record)?.to_matrix();
                let body = self.convert_block(kind.name(), canonical.children, depth)?;
                Ok(body.transformed(&matrix))
            }
            ConstructClass::Boolean => {
                let op = boolean_op(kind)
                    .ok_or_else(|| ConvertError::Internal(format!("{} is not a boolean", kind)))?;
                let operands = self.scoped(kind.name(), |this| this.convert_children(canonical.children, depth))?;
                if operands.is_empty() {
                    Ok(GeometryDescription::empty())
                } else {
                    Ok(GeometryDescription::boolean(op, operands))
                }
            }
        }
    }

    fn convert_unknown(
        &mut self,
        name: &str,
        children: &[Node],
        depth: usize,
    ) -> Result<GeometryDescription, ConvertError> {
        match self.config.unknown_constructs {
            UnknownConstructPolicy::Error => Err(ConvertError::UnknownConstruct { name: name.into() }),
            UnknownConstructPolicy::Ignore => {
                warn!(construct = name, "ignoring unknown construct");
                Ok(GeometryDescription::empty())
            }
            UnknownConstructPolicy::Group => {
                warn!(construct = name, "treating unknown construct as a group");
                self.convert_block(name, children, depth)
            }
        }
    }

    fn convert_structural(&mut self, node: &Node, depth: usize) -> Result<GeometryDescription, ConvertError> {
        match &node.kind {
            NodeKind::Group { children } => self.convert_block("group", children, depth),
            NodeKind::Let { assignments, children } => self.scoped("let", |this| {
                for assignment in assignments {
                    let value = evaluate_expr(&assignment.value, &this.scopes)?;
                    this.scopes.define_variable(&assignment.name, value, node.span)?;
                }
                Ok(implicit_union(this.convert_children(children, depth)?))
            }),
            NodeKind::Assignment { name, value } => {
                let value = evaluate_expr(value, &self.scopes)?;
                self.scopes.define_variable(name, value, node.span)?;
                Ok(GeometryDescription::empty())
            }
            NodeKind::ModuleDefinition { name, params, body } => {
                self.define_module(name, params, body);
                Ok(GeometryDescription::empty())
            }
            NodeKind::Echo { args } => {
                let text = self.echo_text(args)?;
                info!(target: "polyframe_csg::echo", "ECHO: {}", text);
                Ok(GeometryDescription::empty())
            }
            NodeKind::Empty => Ok(GeometryDescription::empty()),
            other => Err(ConvertError::Internal(format!(
                "'{}' is not a structural node",
                other.label()
            ))),
        }
    }

    fn call_module(
        &mut self,
        name: &str,
        module: &UserModule,
        args: &[Argument],
        children: &[Node],
        span: Option<Span>,
        depth: usize,
    ) -> Result<GeometryDescription, ConvertError> {
        // Arguments are evaluated before the module scope is pushed; the body
        // still resolves outer names through the caller's chain
        let bound = resolve_module_arguments(name, &module.params, args, &self.scopes)?;
        if !children.is_empty() {
            debug!(module = name, "children of a user module call are not passed on");
        }

        self.scoped(name, |this| {
            for (param, value) in bound {
                this.scopes.define_variable(param, value, span)?;
            }
            Ok(implicit_union(this.convert_children(&module.body, depth)?))
        })
    }

    /// Children of a block, as one description, in a scope of their own
    fn convert_block(
        &mut self,
        scope_name: &str,
        children: &[Node],
        depth: usize,
    ) -> Result<GeometryDescription, ConvertError> {
        self.scoped(scope_name, |this| this.convert_children(children, depth))
            .map(implicit_union)
    }

    /// Convert children left to right; statements that produce no geometry
    /// are dropped from the result
    fn convert_children(&mut self, children: &[Node], depth: usize) -> Result<Vec<GeometryDescription>, ConvertError> {
        // Module definitions are visible to the whole block
        for child in children {
            if let NodeKind::ModuleDefinition { name, params, body } = &child.kind {
                self.define_module(name, params, body);
            }
        }

        let mut operands = Vec::with_capacity(children.len());
        for child in children {
            let description = self.convert_node(child, depth + 1)?;
            if produces_geometry(&child.kind) {
                operands.push(description);
            }
        }
        Ok(operands)
    }

    /// Run `body` inside a fresh scope, popping it again whatever the outcome
    fn scoped<T>(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self) -> Result<T, ConvertError>,
    ) -> Result<T, ConvertError> {
        self.scopes.enter_scope(name);
        let digest = self.modules_digest().to_string();
        self.modules.push(ModuleFrame {
            modules: AHashMap::new(),
            digest,
        });

        let result = body(self);

        self.modules.pop();
        let exited = self.scopes.exit_scope();
        let value = result?;
        exited?;
        Ok(value)
    }

    fn memoized(
        &mut self,
        node: &Node,
        depth: usize,
        build: impl FnOnce(&mut Self) -> Result<GeometryDescription, ConvertError>,
    ) -> Result<GeometryDescription, ConvertError> {
        let key = self.cache_key(node);
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                let deepest = depth + hit.height - 1;
                // Past the depth limit: walk it again to fail at the same node
                if deepest <= self.config.max_depth {
                    debug!(node = node.kind.label(), height = hit.height, "cache hit");
                    self.deepest = self.deepest.max(deepest);
                    return Ok(hit.description.clone());
                }
            }
        }

        let outer_deepest = std::mem::replace(&mut self.deepest, depth);
        let built = build(self);
        let height = self.deepest - depth + 1;
        self.deepest = self.deepest.max(outer_deepest);

        let description = built?;
        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.insert(
                key,
                CachedSubtree {
                    description: description.clone(),
                    height,
                },
            );
        }
        Ok(description)
    }

    fn cache_key(&self, node: &Node) -> Option<Fingerprint> {
        self.cache.as_ref()?;
        if defines_modules(node) {
            return None;
        }
        ResultCache::fingerprint(
            node,
            &self.scopes.snapshot(),
            self.modules_digest(),
            &self.config_fingerprint,
        )
    }

    fn define_module(&mut self, name: &str, params: &[ModuleParam], body: &[Node]) {
        let Some(frame) = self.modules.last_mut() else {
            return;
        };
        if frame
            .modules
            .get(name)
            .is_some_and(|known| known.params == params && known.body == body)
        {
            return;
        }

        debug!(module = name, params = params.len(), "define module");
        let encoded = serde_json::to_vec(&(name, params, body)).unwrap_or_default();
        frame.digest = chain_digest(&frame.digest, &encoded);
        frame.modules.insert(
            name.to_string(),
            Arc::new(UserModule {
                params: params.to_vec(),
                body: body.to_vec(),
            }),
        );
    }

    fn lookup_module(&self, name: &str) -> Option<Arc<UserModule>> {
        self.modules
            .iter()
            .rev()
            .find_map(|frame| frame.modules.get(name).cloned())
    }

    fn modules_digest(&self) -> &str {
        self.modules.last().map(|frame| frame.digest.as_str()).unwrap_or("")
    }

    /// Configured defaults, overridden by `$fn`/`$fa`/`$fs` bound in scope
    fn fragment_settings(&self) -> FragmentSettings {
        let mut settings = self.config.fragment_settings();
        let special = |name: &str| {
            self.scopes
                .resolve_variable(name)
                .and_then(|binding| binding.value.as_number())
        };
        if let Some(n) = special("$fn") {
            settings.fn_ = n;
        }
        if let Some(n) = special("$fa") {
            settings.fa = n;
        }
        if let Some(n) = special("$fs") {
            settings.fs = n;
        }
        settings
    }

    fn echo_text(&self, args: &[Argument]) -> Result<String, ConvertError> {
        let parts = args
            .iter()
            .map(|arg| -> Result<String, ConvertError> {
                let value = evaluate_expr(arg.value(), &self.scopes)?;
                Ok(match arg {
                    Argument::Named { name, .. } => format!("{} = {}", name, value),
                    Argument::Positional { .. } => value.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(", "))
    }
}

fn boolean_op(kind: ConstructKind) -> Option<BooleanOp> {
    match kind {
        ConstructKind::Union => Some(BooleanOp::Union),
        ConstructKind::Difference => Some(BooleanOp::Difference),
        ConstructKind::Intersection => Some(BooleanOp::Intersection),
        _ => None,
    }
}

fn implicit_union(mut operands: Vec<GeometryDescription>) -> GeometryDescription {
    match operands.len() {
        0 => GeometryDescription::empty(),
        1 => operands.remove(0),
        _ => GeometryDescription::boolean(BooleanOp::Union, operands),
    }
}

fn produces_geometry(kind: &NodeKind) -> bool {
    !matches!(
        kind,
        NodeKind::Assignment { .. } | NodeKind::ModuleDefinition { .. } | NodeKind::Echo { .. } | NodeKind::Empty
    )
}

fn defines_modules(node: &Node) -> bool {
    matches!(node.kind, NodeKind::ModuleDefinition { .. })
        || node.kind.children().iter().any(defines_modules)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "conversion panicked".to_string()
    }
}
