//! A recursive evaluator for *permission trees*: a small, JSON-shaped
//! expression language combining user-registered permission types ("role",
//! "flag", ...) with boolean logic gates (`AND`, `NAND`, `OR`, `NOR`, `XOR`,
//! `NOT`) and the literals `TRUE`/`FALSE`, plus a `NO_BYPASS` marker that can
//! suppress a global bypass predicate.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use permission_tree::PermissionEvaluator;
//!
//! let evaluator = PermissionEvaluator::new();
//! evaluator
//!     .add_type(
//!         "flag",
//!         Arc::new(|flag: &str, ctx: &serde_json::Value| {
//!             json!(ctx["user"][flag] == json!(true))
//!         }),
//!     )
//!     .unwrap();
//!
//! let tree = json!({"flag": "testflag"});
//! let context = json!({"user": {"testflag": true}});
//! assert!(evaluator.check_access(&tree, Some(context), None).unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bypass;
mod config;
mod error;
mod evaluator;
mod gate;
mod node;
mod registry;

pub use bypass::BypassCallback;
pub use config::EvaluatorConfig;
pub use error::AccessError;
pub use evaluator::PermissionEvaluator;
pub use node::{Node, RESERVED_KEYS};
pub use registry::TypeCallback;
