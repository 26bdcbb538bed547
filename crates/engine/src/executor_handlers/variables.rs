//! Variable and parameter binding instructions.

use crate::ast::{InstructionId, InstructionKind};
use crate::error::Fault;
use crate::executor::Interpreter;
use crate::variables::Binding;
use weft_model::node::SourceNode;
use weft_model::sink::EventSink;
use weft_model::value::Value;

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    pub(crate) fn handle_variable(
        &mut self,
        id: InstructionId,
        _sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::Variable { name, slot, select } = self.kind(id) else {
            return Ok(());
        };
        let value = self.binding_value(id, select.as_ref())?;
        self.variables
            .bind(*slot, &name.to_string(), Binding::Value(value));
        Ok(())
    }

    /// A parameter executes only when its caller did not bind it; the
    /// declared default applies then.
    pub(crate) fn handle_param(
        &mut self,
        id: InstructionId,
        _sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::Param { name, slot, select } = self.kind(id) else {
            return Ok(());
        };
        if self.variables.is_bound(*slot) {
            return Ok(());
        }
        let value = self.binding_value(id, select.as_ref())?;
        self.variables
            .bind(*slot, &name.to_string(), Binding::Value(value));
        Ok(())
    }

    /// Select expression, content-bodied tree fragment, or the empty
    /// string.
    fn binding_value(
        &mut self,
        id: InstructionId,
        select: Option<&weft_model::eval::Expr>,
    ) -> Result<Value<N>, Fault> {
        if let Some(expr) = select {
            return self.evaluate(expr);
        }
        if !self.child_ids(id).is_empty() {
            return Ok(Value::Fragment(self.collect_children(id)?.into_events()));
        }
        Ok(Value::empty_string())
    }
}
