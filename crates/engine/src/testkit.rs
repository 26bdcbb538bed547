//! Helpers for exercising the interpreter with the `weft-model` test
//! doubles. Available to downstream crates behind the `testing` feature.

use crate::ast::{Avt, AvtPart, CompiledStylesheet};
use crate::error::Fault;
use crate::executor::{EngineConfig, Interpreter};
use crate::extensions::ExtensionRegistry;
use weft_model::eval::{Expr, Pattern};
use weft_model::mock::{CollectingDiagnostics, MockEvaluator, MockNode, MockTree, RecordingSink};
use weft_model::node::Name;
use weft_model::sink::Event;

pub fn expr(source: &str) -> Expr {
    Expr::new(source)
}

pub fn pattern(source: &str) -> Pattern {
    Pattern::new(source)
}

pub fn name(lexical: &str) -> Name {
    Name::parse(lexical)
}

pub fn avt(text: &str) -> Avt {
    Avt::fixed(text)
}

pub fn avt_expr(source: &str) -> Avt {
    Avt::Dynamic(vec![AvtPart::Dynamic(Expr::new(source))])
}

/// Everything a finished test run exposes for assertions.
pub struct RunOutcome {
    pub rendered: String,
    pub events: Vec<Event>,
    pub result: Result<(), Fault>,
    pub diagnostics: CollectingDiagnostics,
}

/// Transforms the tree with the scripted evaluator and default config.
pub fn run(sheet: &CompiledStylesheet, tree: &MockTree) -> RunOutcome {
    run_configured(sheet, tree, EngineConfig::default(), |_| {})
}

/// `run` with extension handlers installed before the transform starts.
pub fn run_with<'t>(
    sheet: &CompiledStylesheet,
    tree: &'t MockTree,
    install: impl FnOnce(&mut ExtensionRegistry<'t, MockNode<'t>>),
) -> RunOutcome {
    run_configured(sheet, tree, EngineConfig::default(), install)
}

pub fn run_configured<'t>(
    sheet: &CompiledStylesheet,
    tree: &'t MockTree,
    config: EngineConfig,
    install: impl FnOnce(&mut ExtensionRegistry<'t, MockNode<'t>>),
) -> RunOutcome {
    let evaluator = MockEvaluator;
    let diagnostics = CollectingDiagnostics::new();
    let mut sink = RecordingSink::new();
    let result = {
        let mut interpreter = Interpreter::new(sheet, &evaluator, &diagnostics, config);
        install(interpreter.extensions_mut());
        interpreter.transform(tree.root(), &mut sink)
    };
    RunOutcome {
        rendered: sink.render(),
        events: sink.events,
        result,
        diagnostics,
    }
}
