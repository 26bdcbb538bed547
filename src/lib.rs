//! weft — execution engine for a declarative tree-transformation
//! language.
//!
//! This crate is the integration surface over the workspace:
//!
//! - [`weft_model`] defines the collaborator contracts (source tree,
//!   typed values, output events, expression evaluation, diagnostics);
//! - [`weft_engine`] interprets a compiled instruction tree against a
//!   source tree.

pub use weft_engine::{
    CompiledStylesheet, ComposeError, EngineConfig, Fault, InstructionId, InstructionKind,
    Interpreter, StylesheetBuilder,
};
pub use weft_model::{
    DiagCode, Diagnostics, EvalError, Evaluator, Event, EventSink, Expr, Location,
    LogDiagnostics, Name, Pattern, Scope, SourceNode, Value,
};

/// Installs the `env_logger` backend for the [`LogDiagnostics`] channel.
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
    log::debug!("weft logging initialized");
}
