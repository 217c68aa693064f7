//! The bypass evaluator: an optional global predicate that can short-circuit
//! `check_access` to a grant, subject to suppression via `NO_BYPASS`.

use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::{self, AccessError};

/// A bypass predicate: given the evaluation context, returns a JSON value
/// that must be a boolean.
pub type BypassCallback = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Holds the process-wide bypass predicate for a [`crate::PermissionEvaluator`].
#[derive(Clone, Default)]
pub struct BypassEvaluator {
    callback: Arc<RwLock<Option<BypassCallback>>>,
}

impl std::fmt::Debug for BypassEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = self.callback.read().unwrap().is_some();
        f.debug_struct("BypassEvaluator").field("set", &set).finish()
    }
}

impl BypassEvaluator {
    /// No bypass predicate configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `callback` as the bypass predicate, replacing any previous
    /// one.
    pub fn set(&self, callback: BypassCallback) {
        *self.callback.write().unwrap() = Some(callback);
    }

    /// The currently configured bypass predicate, if any.
    pub fn get(&self) -> Option<BypassCallback> {
        self.callback.read().unwrap().clone()
    }

    /// Invoke the bypass predicate against `context`.
    ///
    /// Returns `false` if no predicate is configured. Fails if the
    /// predicate returns something other than a boolean.
    pub fn invoke(&self, context: &Value) -> Result<bool, AccessError> {
        let callback = self.callback.read().unwrap().clone();
        let Some(callback) = callback else {
            return Ok(false);
        };
        let result = callback(context);
        result.as_bool().ok_or_else(|| {
            error::InvalidCallbackReturnTypeCtx {
                source: "the bypass predicate".to_string(),
                value: result,
            }
            .build()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_never_bypasses() {
        let bypass = BypassEvaluator::new();
        assert!(!bypass.invoke(&json!({})).unwrap());
        assert!(bypass.get().is_none());
    }

    #[test]
    fn set_then_invoke() {
        let bypass = BypassEvaluator::new();
        bypass.set(Arc::new(|ctx: &Value| json!(ctx["admin"] == json!(true))));
        assert!(bypass.invoke(&json!({"admin": true})).unwrap());
        assert!(!bypass.invoke(&json!({"admin": false})).unwrap());
        assert!(bypass.get().is_some());
    }

    #[test]
    fn non_boolean_return_is_an_error() {
        let bypass = BypassEvaluator::new();
        bypass.set(Arc::new(|_ctx: &Value| json!("yes")));
        assert!(matches!(
            bypass.invoke(&json!({})),
            Err(AccessError::InvalidCallbackReturnType { .. })
        ));
    }
}
