//! The tagged value type produced by expression evaluation.

use crate::node::SourceNode;
use crate::sink::{self, Event};
use std::fmt;

/// The result of evaluating an expression: one of the five value spaces of
/// the embedded query language.
#[derive(Debug, Clone)]
pub enum Value<N> {
    Boolean(bool),
    Number(f64),
    String(String),
    /// Ordered, duplicate-free node selection.
    NodeSet(Vec<N>),
    /// A buffered, already-materialized chunk of output events.
    Fragment(Vec<Event>),
}

impl<'a, N: SourceNode<'a>> Value<N> {
    /// Boolean coercion: non-empty node-set, non-empty string, non-zero
    /// non-NaN number. A fragment coerces through its text content.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::Fragment(events) => !sink::text_of(events).is_empty(),
        }
    }

    /// Number coercion. Strings that do not parse become NaN; a node-set
    /// coerces through the string value of its first node.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
            Value::NodeSet(nodes) => {
                let s = nodes.first().map(|n| n.string_value()).unwrap_or_default();
                s.trim().parse().unwrap_or(f64::NAN)
            }
            Value::Fragment(events) => {
                sink::text_of(events).trim().parse().unwrap_or(f64::NAN)
            }
        }
    }

    pub fn empty_string() -> Self {
        Value::String(String::new())
    }
}

impl<'a, N: SourceNode<'a>> fmt::Display for Value<N> {
    /// String coercion. Numbers format without a trailing `.0` for
    /// integral values; a node-set coerces through its first node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            Value::Fragment(events) => write!(f, "{}", sink::text_of(events)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNode;

    type V<'a> = Value<MockNode<'a>>;

    #[test]
    fn boolean_coercions() {
        assert!(V::Boolean(true).to_bool());
        assert!(!V::Number(0.0).to_bool());
        assert!(!V::Number(f64::NAN).to_bool());
        assert!(V::String("x".into()).to_bool());
        assert!(!V::String(String::new()).to_bool());
        assert!(!V::NodeSet(vec![]).to_bool());
    }

    #[test]
    fn string_coercion_of_numbers() {
        assert_eq!(V::Number(3.0).to_string(), "3");
        assert_eq!(V::Number(3.5).to_string(), "3.5");
        assert_eq!(V::Boolean(true).to_string(), "true");
    }

    #[test]
    fn fragment_coerces_through_text() {
        let fragment = V::Fragment(vec![
            Event::StartElement("a".into()),
            Event::Characters("12".into()),
            Event::EndElement("a".into()),
        ]);
        assert_eq!(fragment.to_string(), "12");
        assert_eq!(fragment.to_number(), 12.0);
        assert!(fragment.to_bool());
    }
}
