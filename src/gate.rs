//! The six logic gates (`AND`, `NAND`, `OR`, `NOR`, `XOR`, `NOT`) a gate map
//! key dispatches to.
//!
//! `AND`/`NAND`/`OR`/`NOR`/`XOR` share a shape: walk a List or Map's elements
//! in order, evaluating each as a sub-node, short-circuiting per the gate's
//! truth table. `process_or` (used both for the `OR` gate itself and for
//! every implicit-OR desugaring elsewhere in the grammar) is exactly this
//! routine run with [`GateKind::Or`].

use serde_json::{Map, Value};

use crate::error::{self, AccessError};
use crate::evaluator::dispatch;

/// Which of the five collection-walking gates to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    And,
    Nand,
    Or,
    Nor,
    Xor,
}

impl GateKind {
    fn name(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Nand => "NAND",
            Self::Or => "OR",
            Self::Nor => "NOR",
            Self::Xor => "XOR",
        }
    }

    fn min_elements(self) -> usize {
        if self == Self::Xor {
            2
        } else {
            1
        }
    }
}

/// Run `kind` over `value`, recursing into each sub-node via [`dispatch`].
///
/// `process_or` is `run_gate(GateKind::Or, ...)`: both the `OR` gate
/// and every implicit-OR desugaring (a non-empty list, a multi-key map, or a
/// type whose value is a collection) go through this same path.
pub fn run_gate(
    kind: GateKind,
    value: &Value,
    active_type: Option<&str>,
    context: &Value,
    types: &crate::registry::TypeRegistry,
    depth: usize,
    config: &crate::config::EvaluatorConfig,
) -> Result<bool, AccessError> {
    let elements = collect_elements(kind.name(), value)?;
    if elements.len() < kind.min_elements() {
        return error::InvalidValueForLogicGateCtx {
            gate: kind.name(),
            reason: if kind == GateKind::Xor {
                "XOR requires at least two sub-nodes"
            } else {
                "requires at least one sub-node"
            },
            value: value.clone(),
        }
        .fail();
    }

    match kind {
        GateKind::And | GateKind::Nand => {
            let mut result = true;
            for element in &elements {
                if !dispatch(element, active_type, context, types, depth, config)? {
                    result = false;
                    break;
                }
            }
            Ok(result ^ (kind == GateKind::Nand))
        }
        GateKind::Or | GateKind::Nor => {
            let mut result = false;
            for element in &elements {
                if dispatch(element, active_type, context, types, depth, config)? {
                    result = true;
                    break;
                }
            }
            Ok(result ^ (kind == GateKind::Nor))
        }
        GateKind::Xor => {
            let mut seen_true = false;
            let mut seen_false = false;
            for element in &elements {
                if dispatch(element, active_type, context, types, depth, config)? {
                    seen_true = true;
                } else {
                    seen_false = true;
                }
                if seen_true && seen_false {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Evaluate `NOT`'s operand: a single-entry map or a non-empty string,
/// negated.
pub fn gate_not(
    value: &Value,
    active_type: Option<&str>,
    context: &Value,
    types: &crate::registry::TypeRegistry,
    depth: usize,
    config: &crate::config::EvaluatorConfig,
) -> Result<bool, AccessError> {
    let is_valid_shape = match value {
        Value::String(s) => !s.is_empty(),
        Value::Object(map) => map.len() == 1,
        _ => false,
    };
    if !is_valid_shape {
        return error::InvalidValueForLogicGateCtx {
            gate: "NOT",
            reason: "requires a single-entry object or a non-empty string",
            value: value.clone(),
        }
        .fail();
    }
    Ok(!dispatch(value, active_type, context, types, depth, config)?)
}

/// Turn a gate body into its ordered sub-nodes: a List's elements as-is, or
/// a Map's entries each wrapped as a synthetic single-entry map `{k: v}`.
fn collect_elements(gate: &'static str, value: &Value) -> Result<Vec<Value>, AccessError> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| {
                let mut entry = Map::new();
                entry.insert(k.clone(), v.clone());
                Value::Object(entry)
            })
            .collect()),
        _ => error::InvalidValueForLogicGateCtx {
            gate,
            reason: "requires an array or object value",
            value: value.clone(),
        }
        .fail(),
    }
}
