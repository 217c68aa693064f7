//! The permission-type registry: a `name -> callback` association the tree
//! evaluator consults for every non-literal string leaf.
//!
//! Reads (`exists`, `get`, `get_all`, `valid_permission_keys`) happen on every
//! [`crate::PermissionEvaluator::check_access`] call; writes (`add`,
//! `remove`, `replace`, `set_all`) are comparatively rare. A `RwLock` gives
//! concurrent evaluation readers without serializing them behind a mutex.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::{self, AccessError};
use crate::node::is_reserved_key;

/// A permission-type callback: given the permission string from a leaf and
/// the evaluation context, returns a JSON value that must be a boolean.
///
/// The return type is `Value`, not `bool`, even though this is a statically
/// typed host: the callback is host-supplied and may be wired up to
/// arbitrary logic, so whether it actually returned a boolean remains a
/// runtime fact the evaluator checks (see
/// [`AccessError::InvalidCallbackReturnType`]).
pub type TypeCallback = Arc<dyn Fn(&str, &Value) -> Value + Send + Sync>;

/// Registry of permission-type callbacks.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    callbacks: Arc<RwLock<HashMap<String, TypeCallback>>>,
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&String> = self.callbacks.read().unwrap().keys().collect();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `name` is currently registered.
    pub fn exists(&self, name: &str) -> bool {
        self.callbacks.read().unwrap().contains_key(name)
    }

    /// Register `callback` under `name`.
    ///
    /// Fails if `name` is empty, reserved, or already registered.
    pub fn add(&self, name: impl Into<String>, callback: TypeCallback) -> Result<(), AccessError> {
        let name = name.into();
        validate_name(&name, false)?;
        let mut callbacks = self.callbacks.write().unwrap();
        if callbacks.contains_key(&name) {
            return error::PermissionTypeAlreadyExistsCtx { name }.fail();
        }
        callbacks.insert(name, callback);
        Ok(())
    }

    /// Remove the callback registered under `name`.
    ///
    /// Fails if `name` isn't registered.
    pub fn remove(&self, name: &str) -> Result<(), AccessError> {
        let mut callbacks = self.callbacks.write().unwrap();
        if callbacks.remove(name).is_none() {
            return error::PermissionTypeNotRegisteredCtx {
                name: name.to_string(),
            }
            .fail();
        }
        Ok(())
    }

    /// Look up the callback registered under `name`.
    ///
    /// Fails if `name` isn't registered.
    pub fn get(&self, name: &str) -> Result<TypeCallback, AccessError> {
        self.callbacks
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| {
                error::PermissionTypeNotRegisteredCtx {
                    name: name.to_string(),
                }
                .build()
            })
    }

    /// Replace the callback registered under `name`.
    ///
    /// Fails if `name` isn't already registered.
    pub fn replace(&self, name: &str, callback: TypeCallback) -> Result<(), AccessError> {
        let mut callbacks = self.callbacks.write().unwrap();
        if !callbacks.contains_key(name) {
            return error::PermissionTypeNotRegisteredCtx {
                name: name.to_string(),
            }
            .fail();
        }
        callbacks.insert(name.to_string(), callback);
        Ok(())
    }

    /// Replace the registry wholesale.
    ///
    /// Validates every key (non-empty, not numeric-looking, not reserved)
    /// before mutating anything, so a single invalid key leaves the
    /// existing registry untouched.
    pub fn set_all(&self, types: HashMap<String, TypeCallback>) -> Result<(), AccessError> {
        for name in types.keys() {
            validate_name(name, true)?;
        }
        *self.callbacks.write().unwrap() = types;
        Ok(())
    }

    /// A shallow copy of every registered `name -> callback` association.
    pub fn get_all(&self) -> HashMap<String, TypeCallback> {
        self.callbacks.read().unwrap().clone()
    }

    /// The union of the grammar's reserved keywords and currently
    /// registered type names.
    pub fn valid_permission_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = crate::node::RESERVED_KEYS
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        keys.extend(self.callbacks.read().unwrap().keys().cloned());
        keys
    }
}

fn validate_name(name: &str, reject_numeric_looking: bool) -> Result<(), AccessError> {
    if name.is_empty() {
        return error::InvalidArgumentValueCtx {
            name: "name",
            reason: "must not be empty",
            value: Value::String(name.to_string()),
        }
        .fail();
    }
    if is_reserved_key(name) {
        return error::InvalidArgumentValueCtx {
            name: "name",
            reason: "is a reserved grammar keyword",
            value: Value::String(name.to_string()),
        }
        .fail();
    }
    if reject_numeric_looking && crate::node::looks_numeric(name) {
        return error::InvalidArgumentValueCtx {
            name: "name",
            reason: "looks numeric, which is indistinguishable from an array index",
            value: Value::String(name.to_string()),
        }
        .fail();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cb(result: bool) -> TypeCallback {
        Arc::new(move |_perm: &str, _ctx: &Value| Value::Bool(result))
    }

    #[test]
    fn add_then_exists() {
        let registry = TypeRegistry::new();
        registry.add("flag", cb(true)).unwrap();
        assert!(registry.exists("flag"));
        assert!(!registry.exists("role"));
    }

    #[test]
    fn add_rejects_empty_and_reserved() {
        let registry = TypeRegistry::new();
        assert!(registry.add("", cb(true)).is_err());
        assert!(registry.add("and", cb(true)).is_err());
        assert!(registry.add("NO_BYPASS", cb(true)).is_err());
    }

    #[test]
    fn add_does_not_reject_numeric_looking() {
        let registry = TypeRegistry::new();
        registry.add("42", cb(true)).unwrap();
        assert!(registry.exists("42"));
    }

    #[test]
    fn add_twice_fails() {
        let registry = TypeRegistry::new();
        registry.add("flag", cb(true)).unwrap();
        assert!(matches!(
            registry.add("flag", cb(true)),
            Err(AccessError::PermissionTypeAlreadyExists { .. })
        ));
    }

    #[test]
    fn remove_missing_fails() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.remove("flag"),
            Err(AccessError::PermissionTypeNotRegistered { .. })
        ));
    }

    #[test]
    fn replace_requires_existing() {
        let registry = TypeRegistry::new();
        assert!(registry.replace("flag", cb(true)).is_err());
        registry.add("flag", cb(false)).unwrap();
        registry.replace("flag", cb(true)).unwrap();
        assert_eq!((registry.get("flag").unwrap())("x", &Value::Null), Value::Bool(true));
    }

    #[test]
    fn set_all_rejects_numeric_looking_key() {
        let registry = TypeRegistry::new();
        let mut types = HashMap::new();
        types.insert("0".to_string(), cb(true));
        assert!(registry.set_all(types).is_err());
        assert!(!registry.exists("0"));
    }

    #[test]
    fn set_all_is_atomic() {
        let registry = TypeRegistry::new();
        registry.add("flag", cb(true)).unwrap();
        let mut types = HashMap::new();
        types.insert("role".to_string(), cb(true));
        types.insert("AND".to_string(), cb(true));
        assert!(registry.set_all(types).is_err());
        // the original registry is untouched since the reserved key was
        // rejected before any mutation happened.
        assert!(registry.exists("flag"));
        assert!(!registry.exists("role"));
    }

    #[test]
    fn valid_permission_keys_includes_reserved_and_registered() {
        let registry = TypeRegistry::new();
        registry.add("flag", cb(true)).unwrap();
        let keys = registry.valid_permission_keys();
        assert!(keys.contains(&"AND".to_string()));
        assert!(keys.contains(&"flag".to_string()));
    }

    #[test]
    fn set_types_get_types_idempotent() {
        let registry = TypeRegistry::new();
        registry.add("flag", cb(true)).unwrap();
        registry.add("role", cb(false)).unwrap();
        let snapshot = registry.get_all();
        let names: std::collections::HashSet<_> = snapshot.keys().cloned().collect();
        registry.set_all(snapshot).unwrap();
        let after: std::collections::HashSet<_> = registry.get_all().keys().cloned().collect();
        assert_eq!(names, after);
    }
}
