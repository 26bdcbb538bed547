//! The fault taxonomy, split by the time an error can arise.
//!
//! [`ComposeError`] covers structural errors raised while the compiled
//! tree is being assembled; they never surface at run time. [`Fault`]
//! covers execution-time errors; every fault that unwinds a run has been
//! reported through the diagnostics channel at its raise site, with the
//! locator of the offending instruction.

use thiserror::Error;
use weft_model::eval::EvalError;
use weft_model::node::Name;

/// Composition-time structural errors. Always fatal; the builder refuses
/// to produce a stylesheet containing them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComposeError {
    #[error("{child} is not allowed as a child of {parent}")]
    DisallowedChild {
        parent: &'static str,
        child: &'static str,
    },

    #[error("duplicate definition of named template '{0}'")]
    DuplicateTemplate(Name),

    #[error("duplicate definition of function '{0}'")]
    DuplicateFunction(Name),

    #[error("duplicate definition of key '{0}'")]
    DuplicateKey(Name),

    #[error("a parameter must precede all other content of its template")]
    MisplacedParam,
}

/// Execution-time faults. Fatal variants abort the run; the contained
/// extension failure never reaches callers (it is absorbed by fallback
/// execution) and exists only for handler implementations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Fault {
    #[error("call to unknown named template '{0}'")]
    TemplateNotFound(Name),

    #[error("apply-imports is not allowed in this context")]
    ApplyImportsNotAllowed,

    #[error("attribute set '{0}' directly or indirectly used itself")]
    AttributeSetSelfReference(Name),

    #[error("a function may not set more than one result")]
    DuplicateFunctionResult,

    #[error("instruction requires a source node, but none is current")]
    NullSourceNode,

    #[error("illegal value '{value}' for the {attribute} attribute")]
    IllegalAttributeValue {
        attribute: &'static str,
        value: String,
    },

    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("recursion depth limit of {0} exceeded")]
    RecursionLimit(usize),

    #[error("transformation terminated")]
    Terminated,

    #[error(transparent)]
    Eval(#[from] EvalError),
}
