//! Structural sharing between successive values.
//!
//! `replace_equal_deep(prev, next)` returns a value equal to `next` in which
//! every subtree deeply equal to the corresponding subtree of `prev` is the
//! `prev` instance itself. When nothing changed the result is `prev`.

use super::{Map, Value};
use std::sync::Arc;

/// Reconcile `next` against `prev`, reusing unchanged subtrees of `prev`.
pub fn replace_equal_deep(prev: &Value, next: Value) -> Value {
    if prev.ptr_eq(&next) {
        return prev.clone();
    }

    match (prev, &next) {
        (Value::Object(p), Value::Object(n)) => {
            let mut unchanged = p.len() == n.len();
            let mut out = Map::new();
            for (key, value) in n.iter() {
                let shared = match p.get(key) {
                    Some(old) => {
                        let shared = replace_equal_deep(old, value.clone());
                        if !old.ptr_eq(&shared) {
                            unchanged = false;
                        }
                        shared
                    }
                    None => {
                        unchanged = false;
                        value.clone()
                    }
                };
                out.insert(key.clone(), shared);
            }
            if unchanged {
                prev.clone()
            } else {
                Value::Object(Arc::new(out))
            }
        }
        (Value::Array(p), Value::Array(n)) => {
            let mut unchanged = p.len() == n.len();
            let mut out = Vec::with_capacity(n.len());
            for (i, value) in n.iter().enumerate() {
                let shared = match p.get(i) {
                    Some(old) => {
                        let shared = replace_equal_deep(old, value.clone());
                        if !old.ptr_eq(&shared) {
                            unchanged = false;
                        }
                        shared
                    }
                    None => value.clone(),
                };
                out.push(shared);
            }
            if unchanged {
                prev.clone()
            } else {
                Value::Array(Arc::new(out))
            }
        }
        _ if prev == &next => prev.clone(),
        _ => next,
    }
}

/// Full structural equality.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    a.ptr_eq(b) || a == b
}

/// Every key present in `b` must be present in `a` with a partially equal value.
/// Arrays still compare element by element.
pub fn partial_deep_equal(a: &Value, b: &Value) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => b.iter().all(|(key, bv)| {
            a.get(key)
                .map(|av| partial_deep_equal(av, bv))
                .unwrap_or(false)
        }),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| partial_deep_equal(x, y))
        }
        _ => a == b,
    }
}
