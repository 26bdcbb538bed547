//! The core abstraction for a navigable, read-only source tree.

use std::fmt;
use std::hash::Hash;

/// A qualified name borrowed from the source document, consisting of an
/// optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

/// An owned qualified name, used for everything the compiled stylesheet
/// refers to by name: templates, attribute sets, keys, modes, result
/// element and attribute names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    pub prefix: Option<String>,
    pub local: String,
}

impl Name {
    pub fn local(local: impl Into<String>) -> Self {
        Name {
            prefix: None,
            local: local.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Name {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// Splits a lexical `prefix:local` form. An empty string yields a name
    /// with an empty local part; callers that forbid empty names check
    /// [`Name::is_empty`].
    pub fn parse(lexical: &str) -> Self {
        match lexical.split_once(':') {
            Some((prefix, local)) => Name::prefixed(prefix, local),
            None => Name::local(lexical),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.prefix.is_none()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

impl From<&str> for Name {
    fn from(lexical: &str) -> Self {
        Name::parse(lexical)
    }
}

/// The type of a node in the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The universal contract for a node in a read-only, hierarchical source
/// tree.
///
/// The interpreter is written exclusively against this trait, so it can
/// operate on any tree representation that implements it. Node values are
/// cheap handles: `Copy`, with identity given by `Eq`/`Hash` and document
/// order given by `Ord`.
///
/// `'a` is the lifetime of the underlying source document.
pub trait SourceNode<'a>:
    fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node. Returns `None` for node types that
    /// do not have names, such as text or root nodes. For a
    /// processing-instruction, this is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The string value of the node:
    /// - for a text node, its content;
    /// - for an element or the root, the concatenation of the string
    ///   values of all descendant text nodes;
    /// - for an attribute, its value;
    /// - for a comment or processing instruction, its content.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node. Empty for
    /// non-element nodes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the child nodes of this node. Empty for leaf
    /// nodes.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. Returns `None` for the root node.
    fn parent(&self) -> Option<Self>;

    /// The root of the document this node belongs to, reached by walking
    /// parent links.
    fn document_root(&self) -> Self {
        let mut node = *self;
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_prefix() {
        assert_eq!(Name::parse("ext:run"), Name::prefixed("ext", "run"));
        assert_eq!(Name::parse("run"), Name::local("run"));
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(Name::prefixed("a", "b").to_string(), "a:b");
        assert_eq!(Name::local("b").to_string(), "b");
    }

    #[test]
    fn empty_name_detected() {
        assert!(Name::parse("").is_empty());
        assert!(!Name::parse("x").is_empty());
    }
}
