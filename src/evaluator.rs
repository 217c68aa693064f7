//! The tree evaluator: `PermissionEvaluator::check_access` and the recursive
//! `dispatch` it drives. Resolves `NO_BYPASS`, consults the bypass
//! predicate, and walks the grammar.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::bypass::{BypassCallback, BypassEvaluator};
use crate::config::EvaluatorConfig;
use crate::error::{self, AccessError};
use crate::gate::{gate_not, run_gate, GateKind};
use crate::node::{bool_literal, Keyword, LEGACY_NO_BYPASS, NO_BYPASS};
use crate::registry::{TypeCallback, TypeRegistry};

/// Evaluates permission trees against registered permission types and an
/// optional bypass predicate.
///
/// Cloning a `PermissionEvaluator` produces another handle onto the *same*
/// underlying registry and bypass predicate (cheap, `Arc`-backed), not an
/// independent copy; use [`PermissionEvaluator::new`] for a fresh instance.
#[derive(Debug, Clone, Default)]
pub struct PermissionEvaluator {
    types: TypeRegistry,
    bypass: BypassEvaluator,
    config: EvaluatorConfig,
}

impl PermissionEvaluator {
    /// A fresh evaluator with no registered types, no bypass predicate, and
    /// the default [`EvaluatorConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh evaluator using `config` instead of the default.
    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The evaluator's configuration.
    pub fn config(&self) -> EvaluatorConfig {
        self.config
    }

    // -- Registry API -----------------------------------------------------

    /// Register `callback` under `name`. Fails if `name` is empty, reserved,
    /// or already registered.
    pub fn add_type(&self, name: impl Into<String>, callback: TypeCallback) -> Result<(), AccessError> {
        self.types.add(name, callback)
    }

    /// Remove the permission type registered under `name`.
    pub fn remove_type(&self, name: &str) -> Result<(), AccessError> {
        self.types.remove(name)
    }

    /// True iff `name` is currently a registered permission type.
    pub fn type_exists(&self, name: &str) -> bool {
        self.types.exists(name)
    }

    /// The callback registered under `name`.
    pub fn get_type_callback(&self, name: &str) -> Result<TypeCallback, AccessError> {
        self.types.get(name)
    }

    /// Replace the callback registered under `name`.
    pub fn set_type_callback(&self, name: &str, callback: TypeCallback) -> Result<(), AccessError> {
        self.types.replace(name, callback)
    }

    /// A shallow copy of every registered permission type.
    pub fn get_types(&self) -> HashMap<String, TypeCallback> {
        self.types.get_all()
    }

    /// Replace the entire permission-type registry.
    pub fn set_types(&self, types: HashMap<String, TypeCallback>) -> Result<(), AccessError> {
        self.types.set_all(types)
    }

    /// The reserved grammar keywords plus every registered permission type.
    pub fn get_valid_permission_keys(&self) -> Vec<String> {
        self.types.valid_permission_keys()
    }

    // -- Bypass API ---------------------------------------------------------

    /// The currently configured bypass predicate, if any.
    pub fn get_bypass_callback(&self) -> Option<BypassCallback> {
        self.bypass.get()
    }

    /// Install `callback` as the bypass predicate.
    pub fn set_bypass_callback(&self, callback: BypassCallback) {
        self.bypass.set(callback)
    }

    // -- Evaluation ---------------------------------------------------------

    /// Evaluate `tree` against `context`, returning whether access is
    /// granted.
    ///
    /// `context` defaults to an empty object; `allow_bypass` defaults to
    /// `true`. The input tree is never mutated: evaluation runs over a
    /// deep-cloned working copy.
    #[tracing::instrument(skip(self, tree, context), fields(allow_bypass))]
    pub fn check_access(
        &self,
        tree: &Value,
        context: Option<Value>,
        allow_bypass: Option<bool>,
    ) -> Result<bool, AccessError> {
        let context = context.unwrap_or_else(|| Value::Object(Map::new()));
        if !context.is_object() {
            return error::InvalidArgumentTypeCtx {
                name: "context",
                expected: "object",
                value: context,
            }
            .fail();
        }
        if !matches!(
            tree,
            Value::Object(_) | Value::Array(_) | Value::String(_) | Value::Bool(_)
        ) {
            return error::InvalidArgumentTypeCtx {
                name: "tree",
                expected: "bool, string, array, or object",
                value: tree.clone(),
            }
            .fail();
        }

        let mut allow_bypass = allow_bypass.unwrap_or(true);
        tracing::Span::current().record("allow_bypass", allow_bypass);

        // Step 1: deep copy so the caller's tree is never observably
        // mutated.
        let mut root = tree.clone();

        // Step 2: resolve and strip NO_BYPASS before anything else sees it.
        resolve_no_bypass(&mut root, &mut allow_bypass, &context, &self.types, &self.config)?;

        // Step 3: bypass check.
        if allow_bypass && self.bypass.invoke(&context)? {
            tracing::debug!("bypass predicate granted access");
            return Ok(true);
        }

        // Step 4: empty shortcut, then dispatch.
        let granted = match &root {
            Value::Object(map) if map.is_empty() => true,
            Value::Array(items) if items.is_empty() => true,
            Value::String(_) | Value::Bool(_) => {
                dispatch(&root, None, &context, &self.types, 1, &self.config)?
            }
            _ => run_gate(GateKind::Or, &root, None, &context, &self.types, 1, &self.config)?,
        };
        tracing::debug!(granted, "evaluated permission tree");
        Ok(granted)
    }
}

/// Resolve `NO_BYPASS` at the root: apply the legacy `no_bypass` alias,
/// compute the new `allow_bypass`, and strip the entry from `root`
/// regardless of whether bypass was allowed.
fn resolve_no_bypass(
    root: &mut Value,
    allow_bypass: &mut bool,
    context: &Value,
    types: &TypeRegistry,
    config: &EvaluatorConfig,
) -> Result<(), AccessError> {
    let Value::Object(map) = root else {
        return Ok(());
    };
    if let Some(legacy) = map.remove(LEGACY_NO_BYPASS) {
        map.entry(NO_BYPASS.to_string()).or_insert(legacy);
    }
    let Some(entry) = map.remove(NO_BYPASS) else {
        return Ok(());
    };
    if !*allow_bypass {
        // Still stripped above; otherwise ignored entirely.
        return Ok(());
    }
    *allow_bypass = match &entry {
        Value::Bool(negate_bypass) => !*negate_bypass,
        Value::String(s) => match bool_literal(s) {
            Some(true) => false,
            Some(false) => true,
            None => {
                return error::InvalidArgumentValueCtx {
                    name: "NO_BYPASS",
                    reason: "a string payload must be \"TRUE\" or \"FALSE\"",
                    value: entry,
                }
                .fail()
            }
        },
        Value::Object(_) => {
            let suppressed = run_gate(GateKind::Or, &entry, None, context, types, 1, config)?;
            !suppressed
        }
        _ => {
            return error::InvalidArgumentValueCtx {
                name: "NO_BYPASS",
                reason: "must be a boolean, string, or object",
                value: entry,
            }
            .fail()
        }
    };
    Ok(())
}

/// Recursively evaluate `node` under `active_type`.
///
/// `depth` counts nesting below the root (which starts at `1`); past
/// `config.max_depth` this returns [`AccessError::TreeTooDeep`] rather than
/// risking a stack overflow on a pathological tree.
pub(crate) fn dispatch(
    node: &Value,
    active_type: Option<&str>,
    context: &Value,
    types: &TypeRegistry,
    depth: usize,
    config: &EvaluatorConfig,
) -> Result<bool, AccessError> {
    if depth > config.max_depth {
        return error::TreeTooDeepCtx {
            max_depth: config.max_depth,
        }
        .fail();
    }
    match node {
        Value::Bool(b) => {
            if active_type.is_some() {
                return error::InvalidArgumentValueCtx {
                    name: "tree",
                    reason: "a boolean literal cannot appear under an active permission type",
                    value: node.clone(),
                }
                .fail();
            }
            Ok(*b)
        }
        Value::String(s) => dispatch_string(s, active_type, context, types),
        Value::Array(items) => {
            if items.is_empty() {
                return Ok(true);
            }
            run_gate(GateKind::Or, node, active_type, context, types, depth + 1, config)
        }
        Value::Object(map) => dispatch_object(node, map, active_type, context, types, depth, config),
        _ => error::InvalidArgumentTypeCtx {
            name: "tree",
            expected: "bool, string, array, or object",
            value: node.clone(),
        }
        .fail(),
    }
}

fn dispatch_string(
    s: &str,
    active_type: Option<&str>,
    context: &Value,
    types: &TypeRegistry,
) -> Result<bool, AccessError> {
    if let Some(literal) = bool_literal(s) {
        if active_type.is_some() {
            return error::InvalidArgumentValueCtx {
                name: "tree",
                reason: "a boolean-literal string cannot appear under an active permission type",
                value: Value::String(s.to_string()),
            }
            .fail();
        }
        return Ok(literal);
    }
    let Some(type_name) = active_type else {
        return error::InvalidArgumentValueCtx {
            name: "tree",
            reason: "a bare string leaf requires a surrounding permission type",
            value: Value::String(s.to_string()),
        }
        .fail();
    };
    invoke_type_callback(types, type_name, s, context)
}

fn dispatch_object(
    node: &Value,
    map: &serde_json::Map<String, Value>,
    active_type: Option<&str>,
    context: &Value,
    types: &TypeRegistry,
    depth: usize,
    config: &EvaluatorConfig,
) -> Result<bool, AccessError> {
    if map.is_empty() {
        return Ok(true);
    }
    if map.len() == 1 {
        let (k, v) = map.iter().next().expect("checked len == 1");
        if let Some(keyword) = Keyword::parse(k) {
            return match keyword {
                Keyword::NoBypass => error::InvalidArgumentValueCtx {
                    name: "tree",
                    reason: "NO_BYPASS is only legal at the top level of the root map",
                    value: node.clone(),
                }
                .fail(),
                Keyword::And => run_gate(GateKind::And, v, active_type, context, types, depth + 1, config),
                Keyword::Nand => run_gate(GateKind::Nand, v, active_type, context, types, depth + 1, config),
                Keyword::Or => run_gate(GateKind::Or, v, active_type, context, types, depth + 1, config),
                Keyword::Nor => run_gate(GateKind::Nor, v, active_type, context, types, depth + 1, config),
                Keyword::Xor => run_gate(GateKind::Xor, v, active_type, context, types, depth + 1, config),
                Keyword::Not => gate_not(v, active_type, context, types, depth + 1, config),
                Keyword::True | Keyword::False => error::InvalidArgumentValueCtx {
                    name: "tree",
                    reason: "a boolean-literal keyword cannot have children",
                    value: node.clone(),
                }
                .fail(),
            };
        }
        // `k` is a candidate permission-type name.
        if active_type.is_some() {
            return error::InvalidArgumentValueCtx {
                name: "tree",
                reason: "a permission type cannot be nested under another active type",
                value: node.clone(),
            }
            .fail();
        }
        if !types.exists(k) {
            return error::PermissionTypeNotRegisteredCtx { name: k.clone() }.fail();
        }
        return match v {
            Value::Array(_) | Value::Object(_) => {
                run_gate(GateKind::Or, v, Some(k.as_str()), context, types, depth + 1, config)
            }
            Value::String(_) | Value::Bool(_) => {
                dispatch(v, Some(k.as_str()), context, types, depth + 1, config)
            }
            _ => error::InvalidArgumentTypeCtx {
                name: "tree",
                expected: "bool, string, array, or object",
                value: v.clone(),
            }
            .fail(),
        };
    }
    // size >= 2: shorthand OR across simultaneous keys.
    run_gate(GateKind::Or, node, active_type, context, types, depth + 1, config)
}

fn invoke_type_callback(
    types: &TypeRegistry,
    type_name: &str,
    permission: &str,
    context: &Value,
) -> Result<bool, AccessError> {
    let callback = types.get(type_name)?;
    let result = callback(permission, context);
    result.as_bool().ok_or_else(|| {
        error::InvalidCallbackReturnTypeCtx {
            source: format!("permission type \"{type_name}\""),
            value: result,
        }
        .build()
    })
}
