//! The per-run key index cache.
//!
//! An index is computed at most once per (document root, key name) pair,
//! eagerly in full at first use, and never invalidated during a run —
//! source documents are immutable while a transformation executes. The
//! interpreter walks the document and evaluates the key's match/use
//! expressions when it installs an index; this module owns the cache and
//! the node-set-argument union semantics.

use std::collections::{HashMap, HashSet};
use weft_model::node::{Name, SourceNode};
use weft_model::value::Value;

#[derive(Debug)]
pub struct KeyIndexCache<N> {
    indexes: HashMap<(N, Name), HashMap<String, Vec<N>>>,
}

impl<N> Default for KeyIndexCache<N> {
    fn default() -> Self {
        KeyIndexCache {
            indexes: HashMap::new(),
        }
    }
}

impl<'a, N: SourceNode<'a>> KeyIndexCache<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_built(&self, root: N, name: &Name) -> bool {
        self.indexes.contains_key(&(root, name.clone()))
    }

    pub fn install(&mut self, root: N, name: Name, index: HashMap<String, Vec<N>>) {
        self.indexes.insert((root, name), index);
    }

    /// Nodes indexed under one string value, in insertion (document)
    /// order. The index must have been installed.
    pub fn nodes_for(&self, root: N, name: &Name, value: &str) -> Vec<N> {
        self.indexes
            .get(&(root, name.clone()))
            .and_then(|index| index.get(value))
            .cloned()
            .unwrap_or_default()
    }
}

/// The reference strings a key lookup argument contributes. A node-set
/// reference is deduplicated by string value with insertion-order-first
/// semantics: a repeated string is processed once, at its first position.
/// Any other value contributes its single string coercion.
pub fn reference_strings<'a, N: SourceNode<'a>>(reference: &Value<N>) -> Vec<String> {
    match reference {
        Value::NodeSet(nodes) => {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for node in nodes {
                let s = node.string_value();
                if seen.insert(s.clone()) {
                    out.push(s);
                }
            }
            out
        }
        other => vec![other.to_string()],
    }
}

/// Unions per-value result node-sets, removing duplicate nodes and
/// producing a single stable document order.
pub fn union_in_document_order<'a, N: SourceNode<'a>>(
    sets: impl IntoIterator<Item = Vec<N>>,
) -> Vec<N> {
    let mut seen = HashSet::new();
    let mut out: Vec<N> = Vec::new();
    for set in sets {
        for node in set {
            if seen.insert(node) {
                out.push(node);
            }
        }
    }
    out.sort();
    out
}
