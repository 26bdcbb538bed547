//! The instruction dispatcher.
//!
//! [`Interpreter`] walks the compiled tree recursively, matching on the
//! instruction kind and delegating to the handler modules. All mutable
//! per-run state lives here — variable stack, execution context, key
//! cache, extension registry — so independent runs against one shared
//! [`CompiledStylesheet`] never interfere.

use crate::ast::{CompiledStylesheet, InstructionId, InstructionKind};
use crate::context::ExecutionContext;
use crate::error::Fault;
use crate::extensions::ExtensionRegistry;
use crate::keys::{self, KeyIndexCache};
use crate::variables::{Binding, VariableStack};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use weft_model::diag::{DiagCode, Diagnostics};
use weft_model::eval::{DecimalFormat, EvalContext, EvalError, Evaluator, Expr, Scope};
use weft_model::node::{Name, SourceNode};
use weft_model::sink::EventSink;
use weft_model::value::Value;

/// Interpreter tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum depth of nested instruction frames. Template recursion
    /// rides the host call stack, so the engine bounds it explicitly
    /// rather than running until stack exhaustion.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { max_depth: 1024 }
    }
}

pub struct Interpreter<'s, 'a, N: SourceNode<'a>> {
    pub(crate) stylesheet: &'s CompiledStylesheet,
    pub(crate) evaluator: &'s dyn Evaluator<'a, N>,
    pub(crate) diagnostics: &'s dyn Diagnostics,
    pub(crate) config: EngineConfig,
    pub(crate) variables: VariableStack<N>,
    pub(crate) ctx: ExecutionContext<N>,
    pub(crate) keys: KeyIndexCache<N>,
    pub(crate) extensions: ExtensionRegistry<'a, N>,
    /// Named decimal formats already reported missing, so each is warned
    /// about once per run.
    missing_formats: HashSet<Name>,
    _marker: PhantomData<&'a ()>,
}

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    pub fn new(
        stylesheet: &'s CompiledStylesheet,
        evaluator: &'s dyn Evaluator<'a, N>,
        diagnostics: &'s dyn Diagnostics,
        config: EngineConfig,
    ) -> Self {
        let mut variables = VariableStack::new();
        // Globals are declared, not forced: each evaluates on first read.
        for global in &stylesheet.globals {
            variables.push_global(
                &global.name.to_string(),
                Binding::Deferred(global.select.clone()),
            );
        }
        variables.set_frame_base(variables.depth());

        Interpreter {
            stylesheet,
            evaluator,
            diagnostics,
            config,
            variables,
            ctx: ExecutionContext::new(),
            keys: KeyIndexCache::new(),
            extensions: ExtensionRegistry::new(),
            missing_formats: HashSet::new(),
            _marker: PhantomData,
        }
    }

    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry<'a, N> {
        &mut self.extensions
    }

    /// Runs the transformation: applies template rules to the document
    /// root in the unnamed mode.
    pub fn transform(&mut self, root: N, sink: &mut dyn EventSink) -> Result<(), Fault> {
        self.ctx.set_focus(root, 1, 1);
        self.apply_to_nodes(&[root], None, &[], sink)
    }

    /// Executes one instruction. Every entry pushes an instruction frame
    /// and sets the locator; both are restored on all exit paths.
    pub fn execute(&mut self, id: InstructionId, sink: &mut dyn EventSink) -> Result<(), Fault> {
        if self.ctx.frames.len() >= self.config.max_depth {
            return Err(self.fatal(
                DiagCode::RecursionLimit,
                Fault::RecursionLimit(self.config.max_depth),
            ));
        }
        let saved_locator = self.ctx.locator;
        self.ctx.locator = self.stylesheet.node(id).location;
        self.ctx.frames.push(id);

        let result = self.dispatch(id, sink);

        self.ctx.frames.pop();
        self.ctx.locator = saved_locator;
        result
    }

    fn dispatch(&mut self, id: InstructionId, sink: &mut dyn EventSink) -> Result<(), Fault> {
        match self.kind(id) {
            InstructionKind::Template => self.execute_children(id, sink),
            InstructionKind::Param { .. } => self.handle_param(id, sink),
            InstructionKind::Variable { .. } => self.handle_variable(id, sink),
            InstructionKind::Text(text) => {
                sink.characters(text);
                Ok(())
            }
            InstructionKind::ValueOf { select } => {
                let text = self.evaluate(select)?.to_string();
                sink.characters(&text);
                Ok(())
            }
            InstructionKind::If { .. } => self.handle_if(id, sink),
            InstructionKind::Choose => self.handle_choose(id, sink),
            InstructionKind::ForEach { .. } => self.handle_for_each(id, sink),
            InstructionKind::ApplyTemplates { .. } => self.handle_apply_templates(id, sink),
            InstructionKind::ApplyImports => self.handle_apply_imports(id, sink),
            InstructionKind::CallTemplate { .. } => self.handle_call_template(id, sink),
            InstructionKind::Copy => self.handle_copy(id, sink),
            InstructionKind::CopyOf { select } => {
                let value = self.evaluate(select)?;
                self.copy_value(value, sink)
            }
            InstructionKind::Element { .. } => self.handle_element(id, sink),
            InstructionKind::Attribute { .. } => self.handle_attribute(id, sink),
            InstructionKind::Comment => self.handle_comment(id, sink),
            InstructionKind::ProcessingInstruction { .. } => self.handle_pi(id, sink),
            InstructionKind::Namespace { .. } => self.handle_namespace(id, sink),
            InstructionKind::AttributeSet { .. } => self.handle_attribute_set(id, sink),
            InstructionKind::Message { .. } => self.handle_message(id, sink),
            // Function definitions execute only through invocation.
            InstructionKind::Function { .. } => Ok(()),
            InstructionKind::FunctionResult { .. } => self.handle_function_result(id, sink),
            InstructionKind::ExsltFunctionResult { .. } => self.handle_exslt_result(id, sink),
            InstructionKind::AnalyzeString { .. } => self.handle_analyze_string(id, sink),
            InstructionKind::ExtensionCall { .. } => self.handle_extension_call(id, sink),
            InstructionKind::Unknown { .. } => self.handle_unknown(id, sink),
            // Executed by their owning construct, never directly.
            InstructionKind::When { .. }
            | InstructionKind::Otherwise
            | InstructionKind::WithParam { .. }
            | InstructionKind::MatchingSubstring
            | InstructionKind::NonMatchingSubstring
            | InstructionKind::Fallback => Ok(()),
        }
    }

    /// The kind of an instruction, borrowed for the stylesheet's
    /// lifetime rather than the interpreter's, so handlers can hold it
    /// across mutations.
    pub(crate) fn kind(&self, id: InstructionId) -> &'s InstructionKind {
        &self.stylesheet.node(id).kind
    }

    pub(crate) fn child_ids(&self, id: InstructionId) -> &'s [InstructionId] {
        self.stylesheet.children(id)
    }

    /// Executes the children of an instruction in document order.
    pub(crate) fn execute_children(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        for &child in self.stylesheet.children(id) {
            self.execute(child, sink)?;
        }
        Ok(())
    }

    /// Reports a fatal condition and returns the fault for propagation.
    pub(crate) fn fatal(&self, code: DiagCode, fault: Fault) -> Fault {
        self.diagnostics
            .fatal(code, &fault.to_string(), &self.ctx.locator);
        fault
    }

    pub(crate) fn warn(&self, code: DiagCode, detail: &str) {
        self.diagnostics.warn(code, detail, &self.ctx.locator);
    }

    /// Evaluates an expression against the current focus.
    pub(crate) fn evaluate(&mut self, expr: &Expr) -> Result<Value<N>, Fault> {
        let Some(node) = self.ctx.current_node else {
            return Err(self.fatal(DiagCode::NullSourceNode, Fault::NullSourceNode));
        };
        let (position, size) = (self.ctx.position, self.ctx.size);
        let evaluator = self.evaluator;
        let mut ectx = EvalContext::new(node, position, size, self);
        match evaluator.evaluate(expr, &mut ectx) {
            Ok(value) => Ok(value),
            Err(e) => Err(self.fatal(DiagCode::EvalFailure, Fault::Eval(e))),
        }
    }

    /// Evaluates with a temporary focus, restoring the previous one on
    /// both paths.
    pub(crate) fn evaluate_at(
        &mut self,
        expr: &Expr,
        node: N,
        position: usize,
        size: usize,
    ) -> Result<Value<N>, Fault> {
        let saved = self.ctx.save_focus();
        self.ctx.set_focus(node, position, size);
        let result = self.evaluate(expr);
        self.ctx.restore_focus(saved);
        result
    }

    /// Raw evaluation without fatal reporting, for paths that surface
    /// through the evaluator contract (lazy globals, key building).
    fn evaluate_quiet(
        &mut self,
        expr: &Expr,
        node: N,
        position: usize,
        size: usize,
    ) -> Result<Value<N>, EvalError> {
        let saved = self.ctx.save_focus();
        self.ctx.set_focus(node, position, size);
        let evaluator = self.evaluator;
        let mut ectx = EvalContext::new(node, position, size, self);
        let result = evaluator.evaluate(expr, &mut ectx);
        self.ctx.restore_focus(saved);
        result
    }

    /// Evaluates an attribute value template to a string.
    pub(crate) fn evaluate_avt(&mut self, avt: &crate::ast::Avt) -> Result<String, Fault> {
        match avt {
            crate::ast::Avt::Static(text) => Ok(text.clone()),
            crate::ast::Avt::Dynamic(parts) => {
                let mut out = String::new();
                for part in parts.clone() {
                    match part {
                        crate::ast::AvtPart::Static(text) => out.push_str(&text),
                        crate::ast::AvtPart::Dynamic(expr) => {
                            out.push_str(&self.evaluate(&expr)?.to_string());
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    /// Executes children into a buffer and returns the collected events.
    pub(crate) fn collect_children(
        &mut self,
        id: InstructionId,
    ) -> Result<crate::output::BufferingSink, Fault> {
        let mut buffer = crate::output::BufferingSink::new();
        self.execute_children(id, &mut buffer)?;
        Ok(buffer)
    }

    /// Executes children into a buffer and returns the character content.
    pub(crate) fn collect_text(&mut self, id: InstructionId) -> Result<String, Fault> {
        Ok(self.collect_children(id)?.text())
    }

    fn force_global(&mut self, slot: usize, name: &str) -> Result<Value<N>, EvalError> {
        match self.variables.read_absolute(slot) {
            Some(Binding::Value(value)) => return Ok(value.clone()),
            Some(Binding::Unbound) | None => return Ok(Value::empty_string()),
            Some(Binding::Forcing) => {
                return Err(EvalError::CircularVariable(name.to_string()));
            }
            Some(Binding::Deferred(_)) => {}
        }
        let expr = match self.variables.begin_forcing(slot) {
            Binding::Deferred(expr) => expr,
            other => {
                // Not a deferred binding; restore it untouched.
                self.variables.write_absolute(slot, other);
                return Ok(Value::empty_string());
            }
        };
        let context_node = self
            .ctx
            .current_node
            .map(|node| node.document_root())
            .ok_or_else(|| EvalError::UndeclaredVariable(name.to_string()))?;
        match self.evaluate_quiet(&expr, context_node, 1, 1) {
            Ok(value) => {
                self.variables
                    .write_absolute(slot, Binding::Value(value.clone()));
                Ok(value)
            }
            Err(e) => {
                // Leave the binding re-forceable; the fault propagates.
                self.variables.write_absolute(slot, Binding::Deferred(expr));
                Err(e)
            }
        }
    }

    fn ensure_key_index(&mut self, root: N, name: &Name) -> Result<(), EvalError> {
        if self.keys.is_built(root, name) {
            return Ok(());
        }
        log::debug!("building key index '{}'", name);
        let def = self
            .stylesheet
            .keys
            .get(name)
            .ok_or_else(|| EvalError::UndeclaredKey(name.to_string()))?;
        let match_pattern = def.match_pattern.clone();
        let use_expr = def.use_expr.clone();

        let mut matching = Vec::new();
        collect_matching(root, &match_pattern, self.evaluator, &mut matching)?;

        let mut index: HashMap<String, Vec<N>> = HashMap::new();
        for node in matching {
            let value = self.evaluate_quiet(&use_expr, node, 1, 1)?;
            let key_values = match value {
                Value::NodeSet(nodes) => {
                    nodes.iter().map(|n| n.string_value()).collect::<Vec<_>>()
                }
                other => vec![other.to_string()],
            };
            for key in key_values {
                index.entry(key).or_default().push(node);
            }
        }
        self.keys.install(root, name.clone(), index);
        Ok(())
    }
}

/// Preorder walk over a document, collecting nodes (including
/// attributes) that match a key's pattern.
fn collect_matching<'a, N: SourceNode<'a>>(
    node: N,
    pattern: &weft_model::eval::Pattern,
    evaluator: &dyn Evaluator<'a, N>,
    out: &mut Vec<N>,
) -> Result<(), EvalError> {
    if evaluator.matches(pattern, node)? {
        out.push(node);
    }
    for attribute in node.attributes() {
        if evaluator.matches(pattern, attribute)? {
            out.push(attribute);
        }
    }
    for child in node.children() {
        collect_matching(child, pattern, evaluator, out)?;
    }
    Ok(())
}

impl<'s, 'a, N: SourceNode<'a> + 'a> Scope<'a, N> for Interpreter<'s, 'a, N> {
    fn variable(&mut self, name: &str) -> Result<Value<N>, EvalError> {
        let slot = self
            .variables
            .resolve(name)
            .ok_or_else(|| EvalError::UndeclaredVariable(name.to_string()))?;
        self.force_global(slot, name)
    }

    fn key(&mut self, name: &str, reference: &Value<N>) -> Result<Vec<N>, EvalError> {
        let key_name = Name::parse(name);
        let root = self
            .ctx
            .current_node
            .map(|node| node.document_root())
            .ok_or_else(|| EvalError::UndeclaredKey(name.to_string()))?;
        self.ensure_key_index(root, &key_name)?;

        let strings = keys::reference_strings(reference);
        let sets = strings
            .iter()
            .map(|value| self.keys.nodes_for(root, &key_name, value));
        Ok(keys::union_in_document_order(sets.collect::<Vec<_>>()))
    }

    fn current_group(&self) -> Vec<String> {
        self.ctx.group.clone()
    }

    fn call_function(&mut self, name: &str, args: &[Value<N>]) -> Result<Value<N>, EvalError> {
        self.invoke_function(&Name::parse(name), args)
    }

    fn decimal_format(&mut self, name: Option<&str>) -> DecimalFormat {
        let key = name.map(Name::parse);
        if let Some(format) = self.stylesheet.decimal_formats.get(&key) {
            return format.clone();
        }
        if let Some(missing) = key
            && self.missing_formats.insert(missing.clone())
        {
            self.warn(
                DiagCode::MissingDecimalFormat,
                &format!("decimal format '{}' is not declared; using defaults", missing),
            );
        }
        DecimalFormat::default()
    }
}
