//! The expression-evaluator contract.
//!
//! The engine never interprets the query sublanguage itself: compiled
//! expressions and match patterns are opaque tokens produced by the
//! front end, and an [`Evaluator`] turns them into typed [`Value`]s. The
//! evaluator reaches back into the running transformation — variables,
//! key lookup, the current substring group, stylesheet functions, decimal
//! formats — through the [`Scope`] it is handed with every call.

use crate::node::SourceNode;
use crate::value::Value;
use std::fmt;
use thiserror::Error;

/// An opaque compiled expression. The engine only ever hands it back to
/// the evaluator; the `source` text is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub source: Box<str>,
}

impl Expr {
    pub fn new(source: impl Into<String>) -> Self {
        Expr {
            source: source.into().into_boxed_str(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// An opaque compiled match pattern, used by template rules and key
/// definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub source: Box<str>,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        Pattern {
            source: source.into().into_boxed_str(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("expression error in '{expr}': {message}")]
    Expression { expr: String, message: String },

    #[error("reference to undeclared variable ${0}")]
    UndeclaredVariable(String),

    #[error("circular definition of variable ${0}")]
    CircularVariable(String),

    #[error("reference to undeclared key '{0}'")]
    UndeclaredKey(String),

    #[error("call to unknown function '{0}'")]
    UnknownFunction(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("fatal fault during nested execution: {0}")]
    Nested(String),
}

impl EvalError {
    pub fn expression(expr: impl fmt::Display, message: impl Into<String>) -> Self {
        EvalError::Expression {
            expr: expr.to_string(),
            message: message.into(),
        }
    }
}

/// The symbol set of a decimal format, with standard defaults for the
/// unnamed format.
#[derive(Debug, Clone, PartialEq)]
pub struct DecimalFormat {
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub infinity: String,
    pub minus_sign: char,
    pub nan: String,
    pub percent: char,
    pub per_mille: char,
    pub zero_digit: char,
    pub digit: char,
    pub pattern_separator: char,
}

impl Default for DecimalFormat {
    fn default() -> Self {
        DecimalFormat {
            decimal_separator: '.',
            grouping_separator: ',',
            infinity: "Infinity".to_string(),
            minus_sign: '-',
            nan: "NaN".to_string(),
            percent: '%',
            per_mille: '\u{2030}',
            zero_digit: '0',
            digit: '#',
            pattern_separator: ';',
        }
    }
}

/// Run-state the evaluator may consult during evaluation. Implemented by
/// the interpreter; variable reads force lazy bindings, and the first key
/// lookup for a (document, key) pair builds that index.
pub trait Scope<'a, N: SourceNode<'a>> {
    /// Resolve an in-scope variable by name.
    fn variable(&mut self, name: &str) -> Result<Value<N>, EvalError>;

    /// Key lookup. `reference` follows the documented node-set-argument
    /// semantics: node-set references are deduplicated by string value in
    /// insertion order and the per-value results unioned in stable
    /// document order.
    fn key(&mut self, name: &str, reference: &Value<N>) -> Result<Vec<N>, EvalError>;

    /// The substring groups of the innermost grouping construct; empty
    /// outside any grouping body.
    fn current_group(&self) -> Vec<String>;

    /// Invoke a stylesheet function and return its result value.
    fn call_function(&mut self, name: &str, args: &[Value<N>]) -> Result<Value<N>, EvalError>;

    /// The decimal format registered under `name` (`None` selects the
    /// default format). A missing declaration yields a synthesized
    /// default after a warning.
    fn decimal_format(&mut self, name: Option<&str>) -> DecimalFormat;
}

/// The state an expression is evaluated against.
pub struct EvalContext<'a, 'c, N: SourceNode<'a>> {
    pub node: N,
    /// 1-based position of `node` in the current node list.
    pub position: usize,
    pub size: usize,
    pub scope: &'c mut dyn Scope<'a, N>,
}

impl<'a, 'c, N: SourceNode<'a>> EvalContext<'a, 'c, N> {
    pub fn new(node: N, position: usize, size: usize, scope: &'c mut dyn Scope<'a, N>) -> Self {
        EvalContext {
            node,
            position,
            size,
            scope,
        }
    }
}

/// The opaque expression evaluator.
pub trait Evaluator<'a, N: SourceNode<'a>> {
    /// Evaluate a compiled expression to a typed value. Coercions between
    /// value spaces follow the query language's standard rules and are
    /// deterministic.
    fn evaluate(
        &self,
        expr: &Expr,
        ctx: &mut EvalContext<'a, '_, N>,
    ) -> Result<Value<N>, EvalError>;

    /// Test a node against a compiled match pattern.
    fn matches(&self, pattern: &Pattern, node: N) -> Result<bool, EvalError>;
}
