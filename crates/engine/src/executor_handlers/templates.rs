//! Template invocation: named calls, rule application, apply-imports,
//! parameter passing, and the built-in rules.

use crate::ast::{InstructionId, InstructionKind};
use crate::context::RuleId;
use crate::error::Fault;
use crate::executor::Interpreter;
use crate::variables::Binding;
use weft_model::diag::DiagCode;
use weft_model::eval::EvalError;
use weft_model::node::{Name, NodeType, SourceNode};
use weft_model::sink::EventSink;
use weft_model::value::Value;

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    pub(crate) fn handle_call_template(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::CallTemplate { name, resolved } = self.kind(id) else {
            return Ok(());
        };
        // Resolution is idempotent, so the first lookup is memoized on
        // the instruction.
        let index = match resolved.get() {
            Some(&index) => index,
            None => match self.stylesheet.named_template(name) {
                Some(index) => {
                    let _ = resolved.set(index);
                    index
                }
                None => {
                    return Err(self.fatal(
                        DiagCode::TemplateNotFound,
                        Fault::TemplateNotFound(name.clone()),
                    ));
                }
            },
        };
        let body = self.stylesheet.named_template_at(index).body;
        // with-param values are evaluated in the caller's context before
        // the callee's scope exists.
        let passed = self.evaluate_with_params(id)?;
        self.invoke_template(body, &passed, sink)
    }

    /// Runs a template body in a fresh frame. The frame marker is popped
    /// and the saved context restored on every exit path.
    pub(crate) fn invoke_template(
        &mut self,
        body: InstructionId,
        passed: &[(Name, Value<N>)],
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let marker = self.variables.push_frame_marker();
        let base = self.variables.depth();
        let saved = self.ctx.save();

        let result = self.bind_frame_params(body, passed).and_then(|()| {
            self.variables.set_frame_base(base);
            self.execute(body, sink)
        });

        self.variables.pop_to(marker);
        self.ctx.restore(saved);
        result
    }

    pub(crate) fn handle_apply_templates(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::ApplyTemplates {
            select,
            mode,
            sort_keys,
        } = self.kind(id)
        else {
            return Ok(());
        };
        let Some(current) = self.ctx.current_node else {
            return Err(self.fatal(DiagCode::NullSourceNode, Fault::NullSourceNode));
        };
        let nodes = match select {
            Some(expr) => match self.evaluate(expr)? {
                Value::NodeSet(nodes) => nodes,
                other => {
                    let error = EvalError::Type(format!(
                        "apply-templates select must yield a node-set, got {}",
                        other
                    ));
                    return Err(self.fatal(DiagCode::EvalFailure, Fault::Eval(error)));
                }
            },
            None => current.children().collect(),
        };
        let nodes = self.sort_node_set(nodes, sort_keys)?;
        let passed = self.evaluate_with_params(id)?;
        self.apply_to_nodes(&nodes, mode.as_ref(), &passed, sink)
    }

    /// Applies the best matching rule (or the built-in rule) to each node
    /// in order. Mode and focus are restored symmetrically, fault exits
    /// included.
    pub(crate) fn apply_to_nodes(
        &mut self,
        nodes: &[N],
        mode: Option<&Name>,
        passed: &[(Name, Value<N>)],
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let saved_mode = self.ctx.mode.clone();
        self.ctx.mode = mode.cloned();
        let saved_focus = self.ctx.save_focus();

        let size = nodes.len();
        let mut result = Ok(());
        for (i, &node) in nodes.iter().enumerate() {
            self.ctx.set_focus(node, i + 1, size);
            result = match self.find_matching_rule(node, mode, None) {
                Ok(Some(rule)) => self.execute_rule(rule, passed, sink),
                Ok(None) => self.builtin_rule(node, sink),
                Err(fault) => Err(fault),
            };
            if result.is_err() {
                break;
            }
        }

        self.ctx.restore_focus(saved_focus);
        self.ctx.mode = saved_mode;
        result
    }

    /// First matching rule in best-first order, optionally restricted to
    /// import precedence strictly below a bound (apply-imports).
    fn find_matching_rule(
        &mut self,
        node: N,
        mode: Option<&Name>,
        below_precedence: Option<u32>,
    ) -> Result<Option<RuleId>, Fault> {
        for &index in self.stylesheet.rules_for_mode(mode) {
            let rule = self.stylesheet.rule(index);
            if let Some(bound) = below_precedence
                && rule.precedence >= bound
            {
                continue;
            }
            match self.evaluator.matches(&rule.pattern, node) {
                Ok(true) => return Ok(Some(index)),
                Ok(false) => {}
                Err(e) => {
                    return Err(self.fatal(DiagCode::EvalFailure, Fault::Eval(e)));
                }
            }
        }
        Ok(None)
    }

    fn execute_rule(
        &mut self,
        rule: RuleId,
        passed: &[(Name, Value<N>)],
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let body = self.stylesheet.rule(rule).body;
        let saved = self.ctx.save();
        self.ctx.current_rule = Some(rule);

        let marker = self.variables.push_frame_marker();
        let base = self.variables.depth();
        let result = self.bind_frame_params(body, passed).and_then(|()| {
            self.variables.set_frame_base(base);
            self.execute(body, sink)
        });
        self.variables.pop_to(marker);

        self.ctx.restore(saved);
        result
    }

    pub(crate) fn handle_apply_imports(
        &mut self,
        _id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let Some(current_rule) = self.ctx.current_rule else {
            return Err(self.fatal(
                DiagCode::ApplyImportsNotAllowed,
                Fault::ApplyImportsNotAllowed,
            ));
        };
        let Some(node) = self.ctx.current_node else {
            return Err(self.fatal(DiagCode::NullSourceNode, Fault::NullSourceNode));
        };
        // Only templates at strictly lower import precedence are
        // eligible; the executing template can never match itself.
        let precedence = self.stylesheet.rule(current_rule).precedence;
        let mode = self.ctx.mode.clone();
        match self.find_matching_rule(node, mode.as_ref(), Some(precedence))? {
            Some(rule) => self.execute_rule(rule, &[], sink),
            None => self.builtin_rule(node, sink),
        }
    }

    /// The built-in rules: recurse for root and element nodes, copy the
    /// string value of text and attribute nodes, skip everything else.
    pub(crate) fn builtin_rule(
        &mut self,
        node: N,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        match node.node_type() {
            NodeType::Root | NodeType::Element => {
                let children: Vec<N> = node.children().collect();
                let mode = self.ctx.mode.clone();
                self.apply_to_nodes(&children, mode.as_ref(), &[], sink)
            }
            NodeType::Text | NodeType::Attribute => {
                sink.characters(&node.string_value());
                Ok(())
            }
            NodeType::Comment | NodeType::ProcessingInstruction => Ok(()),
        }
    }

    /// Evaluates the with-param children of a call in the caller's
    /// context.
    pub(crate) fn evaluate_with_params(
        &mut self,
        call: InstructionId,
    ) -> Result<Vec<(Name, Value<N>)>, Fault> {
        let mut passed = Vec::new();
        for &child in self.child_ids(call) {
            if let InstructionKind::WithParam { name, select } = self.kind(child) {
                let value = self.evaluate(select)?;
                passed.push((name.clone(), value));
            }
        }
        Ok(passed)
    }

    /// Pushes one binding per declared parameter of `body`, taking the
    /// passed value when present and the declared default otherwise.
    /// Runs before the frame base moves, so defaults see the caller's
    /// scope.
    pub(crate) fn bind_frame_params(
        &mut self,
        body: InstructionId,
        passed: &[(Name, Value<N>)],
    ) -> Result<(), Fault> {
        for &child in self.child_ids(body) {
            let InstructionKind::Param { name, select, .. } = self.kind(child) else {
                break;
            };
            let value = if let Some((_, value)) = passed.iter().find(|(n, _)| n == name) {
                value.clone()
            } else if let Some(expr) = select {
                self.evaluate(expr)?
            } else if !self.child_ids(child).is_empty() {
                Value::Fragment(self.collect_children(child)?.into_events())
            } else {
                Value::empty_string()
            };
            self.variables
                .push_binding(&name.to_string(), Binding::Value(value));
        }
        Ok(())
    }
}
