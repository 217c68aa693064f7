//! Evaluator configuration.
//!
//! The only knob the tree evaluator needs is a bound on recursion depth, so
//! a pathologically deep tree fails cleanly instead of overflowing the
//! stack. Everything else about evaluation (caching, async, persistence)
//! is out of scope and deliberately has no corresponding flag here.

/// Default maximum permission-tree nesting depth. Generous for any
/// hand-written or generated tree; exists to turn a pathological or
/// adversarially deep tree into a clean [`crate::error::AccessError::TreeTooDeep`]
/// instead of a stack overflow.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration for a [`crate::PermissionEvaluator`].
///
/// Cheaply `Copy`able and independently constructible, so multiple
/// evaluators with different limits can coexist in one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Maximum nesting depth `dispatch` will recurse before returning
    /// [`crate::error::AccessError::TreeTooDeep`].
    pub max_depth: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
