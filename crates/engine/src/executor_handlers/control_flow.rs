//! Control flow: conditionals, choose/when/otherwise, message.

use crate::ast::{InstructionId, InstructionKind};
use crate::error::Fault;
use crate::executor::Interpreter;
use weft_model::diag::DiagCode;
use weft_model::node::SourceNode;
use weft_model::sink::EventSink;

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    pub(crate) fn handle_if(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::If { test } = self.kind(id) else {
            return Ok(());
        };
        // The branch shares the caller's context and frame.
        if self.evaluate(test)?.to_bool() {
            self.execute_children(id, sink)?;
        }
        Ok(())
    }

    pub(crate) fn handle_choose(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        for &branch in self.child_ids(id) {
            match self.kind(branch) {
                InstructionKind::When { test } => {
                    if self.evaluate(test)?.to_bool() {
                        return self.execute_children(branch, sink);
                    }
                }
                InstructionKind::Otherwise => {
                    return self.execute_children(branch, sink);
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn handle_message(
        &mut self,
        id: InstructionId,
        _sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::Message { terminate } = self.kind(id) else {
            return Ok(());
        };
        let text = self.collect_text(id)?;
        self.diagnostics.message(&text);
        if *terminate {
            return Err(self.fatal(DiagCode::Terminated, Fault::Terminated));
        }
        Ok(())
    }
}
