//! The diagnostics channel: fatal errors, warnings, and user messages.

use std::fmt;

/// A position in the stylesheet source, carried by every compiled
/// instruction for error reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub fn new(line: usize, col: usize) -> Self {
        Location { line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

/// Stable codes for reportable conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagCode {
    TemplateNotFound,
    ApplyImportsNotAllowed,
    AttributeSetSelfReference,
    AttributeSetNotFound,
    DuplicateFunctionResult,
    NullSourceNode,
    IllegalAttributeValue,
    InvalidRegex,
    MissingDecimalFormat,
    ExtensionUnavailable,
    RecursionLimit,
    Terminated,
    EvalFailure,
}

impl DiagCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagCode::TemplateNotFound => "template-not-found",
            DiagCode::ApplyImportsNotAllowed => "apply-imports-not-allowed",
            DiagCode::AttributeSetSelfReference => "attribute-set-self-reference",
            DiagCode::AttributeSetNotFound => "attribute-set-not-found",
            DiagCode::DuplicateFunctionResult => "duplicate-function-result",
            DiagCode::NullSourceNode => "null-source-node",
            DiagCode::IllegalAttributeValue => "illegal-attribute-value",
            DiagCode::InvalidRegex => "invalid-regex",
            DiagCode::MissingDecimalFormat => "missing-decimal-format",
            DiagCode::ExtensionUnavailable => "extension-unavailable",
            DiagCode::RecursionLimit => "recursion-limit",
            DiagCode::Terminated => "terminated",
            DiagCode::EvalFailure => "eval-failure",
        }
    }
}

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the engine reports. Fatal reports always precede the fault that
/// unwinds the run; warnings and messages do not interrupt execution.
pub trait Diagnostics {
    fn fatal(&self, code: DiagCode, detail: &str, locator: &Location);
    fn warn(&self, code: DiagCode, detail: &str, locator: &Location);
    fn message(&self, text: &str);
}

/// Default diagnostics backed by the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn fatal(&self, code: DiagCode, detail: &str, locator: &Location) {
        log::error!("[{}] {} ({})", code, detail, locator);
    }

    fn warn(&self, code: DiagCode, detail: &str, locator: &Location) {
        log::warn!("[{}] {} ({})", code, detail, locator);
    }

    fn message(&self, text: &str) {
        log::info!("{}", text);
    }
}
