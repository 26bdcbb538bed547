//! Collaborator contracts for the weft transformation engine.
//!
//! The engine in `weft-engine` is written exclusively against the
//! abstractions in this crate:
//!
//! - [`SourceNode`] — a navigable, read-only source tree with node
//!   identity and document order;
//! - [`Value`] — the tagged result of expression evaluation;
//! - [`EventSink`] — the write-only structured output stream;
//! - [`Evaluator`] / [`Scope`] — the opaque query-language evaluator and
//!   the run-state it may consult;
//! - [`Diagnostics`] — the fatal/warn/message reporting channel.
//!
//! The [`mock`] module ships test doubles for all of these, used by the
//! engine's own suites and available to downstream crates.

pub mod diag;
pub mod eval;
pub mod mock;
pub mod node;
pub mod sink;
pub mod value;

pub use diag::{DiagCode, Diagnostics, Location, LogDiagnostics};
pub use eval::{DecimalFormat, EvalContext, EvalError, Evaluator, Expr, Pattern, Scope};
pub use node::{Name, NodeType, QName, SourceNode};
pub use sink::{Event, EventSink};
pub use value::Value;
