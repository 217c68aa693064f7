/*
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
╔═══════════════════════════════════════════════════════════════════════╗
║                                                                       ║
║                               AccessError                              ║
║                               ¯¯¯¯¯¯¯¯¯¯¯                              ║
╚═══════════════════════════════════════════════════════════════════════╝
░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░
*/

//! The error taxonomy raised by the registry, bypass evaluator, and tree
//! evaluator. Every variant carries the offending value so a caller (or the
//! tracing spans in [`crate::evaluator`]) can render a precise diagnostic
//! without re-deriving context from the call site.

use serde_json::Value;
use snafu::{Backtrace, Snafu};

/// Errors raised while registering permission types, setting the bypass
/// predicate, or evaluating a permission tree.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), context(suffix(Ctx)))]
pub enum AccessError {
    /// A required parameter was omitted.
    #[snafu(display("missing required argument `{name}`"))]
    MissingArgument {
        name: &'static str,
        backtrace: Backtrace,
    },

    /// A parameter had the wrong structural kind (e.g. a tree that is
    /// neither a bool, string, array, nor object).
    #[snafu(display("invalid argument type for `{name}`: expected {expected}, found {value}"))]
    InvalidArgumentType {
        name: &'static str,
        expected: &'static str,
        value: Value,
        backtrace: Backtrace,
    },

    /// A parameter was structurally valid but semantically illegal: an
    /// empty or reserved type name, a misplaced `NO_BYPASS`, a boolean leaf
    /// under an active type, a nested type, or a malformed `NO_BYPASS`
    /// payload.
    #[snafu(display("invalid value for `{name}`: {reason}; found {value}"))]
    InvalidArgumentValue {
        name: &'static str,
        reason: &'static str,
        value: Value,
        backtrace: Backtrace,
    },

    /// `add_type` was called with a name that is already registered.
    #[snafu(display("permission type `{name}` is already registered"))]
    PermissionTypeAlreadyExists { name: String, backtrace: Backtrace },

    /// A lookup (`remove_type`, `get_type_callback`, `set_type_callback`, or
    /// evaluation of a leaf) named a type that isn't registered.
    #[snafu(display("permission type `{name}` is not registered"))]
    PermissionTypeNotRegistered { name: String, backtrace: Backtrace },

    /// A gate's value had the wrong shape or too few elements (e.g. `XOR`
    /// with fewer than two sub-nodes).
    #[snafu(display("invalid value for logic gate `{gate}`: {reason}; found {value}"))]
    InvalidValueForLogicGate {
        gate: &'static str,
        reason: &'static str,
        value: Value,
        backtrace: Backtrace,
    },

    /// A permission-type or bypass callback returned something other than a
    /// boolean.
    #[snafu(display("callback for {source} must return a boolean; returned {value}"))]
    InvalidCallbackReturnType {
        /// `"permission type \"role\""` or `"the bypass predicate"`, kept as
        /// a pre-rendered phrase so the display message reads naturally for
        /// both cases.
        source: String,
        value: Value,
        backtrace: Backtrace,
    },

    /// The permission tree nested deeper than the evaluator's configured
    /// limit (see [`crate::config::EvaluatorConfig::max_depth`]).
    #[snafu(display("permission tree exceeds maximum nesting depth of {max_depth}"))]
    TreeTooDeep {
        max_depth: usize,
        backtrace: Backtrace,
    },
}
