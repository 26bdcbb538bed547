//! Stylesheet functions and the two result-instruction flavors.
//!
//! A function is invoked from expressions through the evaluator's scope
//! callback. The invocation frame reserves one slot past the parameters
//! for the result; body output itself is discarded. Result instructions
//! find their owning function by walking parent links in the compiled
//! tree — the dynamic frame base still belongs to that function, because
//! only calls move it and a called template's body is never statically
//! inside the function.

use crate::ast::{InstructionId, InstructionKind};
use crate::error::Fault;
use crate::executor::Interpreter;
use crate::output::BufferingSink;
use crate::variables::Binding;
use weft_model::diag::DiagCode;
use weft_model::eval::EvalError;
use weft_model::node::{Name, SourceNode};
use weft_model::sink::EventSink;
use weft_model::value::Value;

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    /// Invokes a stylesheet function with already-evaluated arguments in
    /// the caller-established context.
    pub(crate) fn invoke_function(
        &mut self,
        name: &Name,
        args: &[Value<N>],
    ) -> Result<Value<N>, EvalError> {
        let Some(def) = self.stylesheet.functions.get(name) else {
            return Err(EvalError::UnknownFunction(name.to_string()));
        };
        let node = def.node;
        let param_count = def.param_count;

        let marker = self.variables.push_frame_marker();
        let base = self.variables.depth();
        let saved = self.ctx.save();

        let result = self
            .bind_function_params(node, args)
            .and_then(|()| {
                // One fresh, unset result slot per invocation.
                self.variables.push_slot(Binding::Unbound);
                self.variables.set_frame_base(base);
                let mut scratch = BufferingSink::new();
                self.execute_children(node, &mut scratch)?;
                Ok(match self.variables.read(param_count) {
                    Some(Binding::Value(value)) => value.clone(),
                    _ => Value::empty_string(),
                })
            })
            .map_err(|fault| EvalError::Nested(fault.to_string()));

        self.variables.pop_to(marker);
        self.ctx.restore(saved);
        result
    }

    fn bind_function_params(
        &mut self,
        function: InstructionId,
        args: &[Value<N>],
    ) -> Result<(), Fault> {
        let mut index = 0usize;
        for &child in self.child_ids(function) {
            let InstructionKind::Param { name, select, .. } = self.kind(child) else {
                break;
            };
            let value = if let Some(value) = args.get(index) {
                value.clone()
            } else if let Some(expr) = select {
                self.evaluate(expr)?
            } else {
                Value::empty_string()
            };
            self.variables
                .push_binding(&name.to_string(), Binding::Value(value));
            index += 1;
        }
        Ok(())
    }

    /// Plain result-bearing flavor: repeated execution overwrites the
    /// result, last write wins.
    pub(crate) fn handle_function_result(
        &mut self,
        id: InstructionId,
        _sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::FunctionResult { select } = self.kind(id) else {
            return Ok(());
        };
        let Some(slot) = self.function_result_slot(id) else {
            // No enclosing function definition: the instruction is inert.
            return Ok(());
        };
        let value = match select {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Fragment(self.collect_children(id)?.into_events()),
        };
        self.variables.write(slot, Binding::Value(value));
        Ok(())
    }

    /// Strict flavor: at most one result per invocation. The slot is
    /// re-armed by each invocation, so recursive calls never trip this;
    /// two results within one invocation do.
    pub(crate) fn handle_exslt_result(
        &mut self,
        id: InstructionId,
        _sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::ExsltFunctionResult { select } = self.kind(id) else {
            return Ok(());
        };
        let Some(slot) = self.function_result_slot(id) else {
            return Ok(());
        };
        if self.variables.is_bound(slot) {
            return Err(self.fatal(
                DiagCode::DuplicateFunctionResult,
                Fault::DuplicateFunctionResult,
            ));
        }
        let value = self.evaluate(select)?;
        self.variables.write(slot, Binding::Value(value));
        Ok(())
    }

    /// The frame-relative result slot of the nearest enclosing function
    /// definition, reached through parent links.
    fn function_result_slot(&self, id: InstructionId) -> Option<usize> {
        let function = self
            .stylesheet
            .enclosing(id, |kind| matches!(kind, InstructionKind::Function { .. }))?;
        let InstructionKind::Function { name } = self.kind(function) else {
            return None;
        };
        self.stylesheet
            .functions
            .get(name)
            .map(|def| def.param_count)
    }
}
