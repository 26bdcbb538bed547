//! # weft-engine
//!
//! The interpreter core of the weft tree-transformation language. It
//! executes a compiled, import-resolved instruction tree against a
//! read-only source tree, producing structured events on an output sink.
//!
//! The crate follows a composition–execution split:
//!
//! 1. **Composition** ([`StylesheetBuilder`]): the front end assembles the
//!    instruction arena and the named resolution tables. All structural
//!    errors are raised here.
//! 2. **Execution** ([`Interpreter`]): a synchronous recursive-descent
//!    dispatcher over the instruction kinds, carrying the per-run mutable
//!    state (variable frames, execution context, key indexes, extension
//!    registry).
//!
//! A [`CompiledStylesheet`] is immutable after composition and may be
//! shared by any number of concurrent runs, each with its own
//! [`Interpreter`].
//!
//! Expression evaluation, source-tree representation, output handling and
//! diagnostics are consumed through the `weft-model` contracts.

pub mod ast;
pub mod context;
pub mod error;
pub mod executor;
pub mod extensions;
pub mod keys;
pub mod output;
pub mod variables;

mod executor_handlers;

#[cfg(any(test, feature = "testing"))]
pub mod testkit;

pub use ast::{CompiledStylesheet, InstructionId, InstructionKind, StylesheetBuilder};
pub use error::{ComposeError, Fault};
pub use executor::{EngineConfig, Interpreter};
