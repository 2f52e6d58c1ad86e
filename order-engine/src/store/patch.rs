//! Flattened partial-write patch builder
//!
//! A write is modeled as an ordered list of `(path, value)` pairs instead
//! of one nested object, so the store adapter can apply each path
//! independently and concurrent partial writes never collide on unrelated
//! sibling fields. Paths are slash-separated (`lifecycleTimestamps/readyAt`).

use serde_json::Value;

/// One addressed write
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOp {
    pub path: String,
    pub value: Value,
}

/// Ordered set of path writes; later writes to the same path win
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchSet {
    ops: Vec<PatchOp>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address one path. A previous op on the same path is replaced.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let path = path.into();
        self.ops.retain(|op| op.path != path);
        self.ops.push(PatchOp {
            path,
            value: value.into(),
        });
        self
    }

    /// Flatten `value` beneath `prefix`: objects recurse into
    /// slash-separated child paths, everything else (scalars, arrays,
    /// empty objects) is written as a leaf.
    pub fn merge(&mut self, prefix: &str, value: &Value) -> &mut Self {
        match value {
            Value::Object(map) if !map.is_empty() => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}/{}", prefix, key)
                    };
                    self.merge(&path, child);
                }
            }
            _ => {
                self.set(prefix, value.clone());
            }
        }
        self
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether any op addresses `path`
    pub fn touches(&self, path: &str) -> bool {
        self.ops.iter().any(|op| op.path == path)
    }
}
