//! Extension-instruction dispatch and fallback execution.

use crate::ast::{InstructionId, InstructionKind};
use crate::error::Fault;
use crate::executor::Interpreter;
use crate::extensions::{ExtensionError, ExtensionInvocation};
use crate::output::BufferingSink;
use weft_model::diag::DiagCode;
use weft_model::node::SourceNode;
use weft_model::sink::EventSink;

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    /// Invokes the handler registered for the call's namespace. Handler
    /// output is buffered so a failed invocation leaves nothing behind;
    /// failure is contained — a warning, the call marked unavailable for
    /// this invocation, and the fallback children in document order.
    pub(crate) fn handle_extension_call(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::ExtensionCall {
            namespace,
            local_name,
            attributes,
        } = self.kind(id)
        else {
            return Ok(());
        };

        let mut evaluated = Vec::with_capacity(attributes.len());
        for (name, avt) in attributes {
            evaluated.push((name.clone(), self.evaluate_avt(avt)?));
        }
        let invocation = ExtensionInvocation {
            namespace: namespace.clone(),
            local_name: local_name.clone(),
            attributes: evaluated,
        };

        let decl = self.stylesheet.extensions.get(namespace);
        let handler = self.extensions.handler_for(namespace, decl);
        let node = self.ctx.current_node;

        let outcome = match handler {
            Some(handler) => {
                let mut isolated = BufferingSink::new();
                match handler.invoke(&invocation, node, &mut isolated) {
                    Ok(()) => {
                        isolated.flush_to(sink);
                        Ok(())
                    }
                    Err(error) => Err(error),
                }
            }
            None => Err(ExtensionError::new(format!(
                "no handler available for namespace '{}'",
                namespace
            ))),
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(error) => {
                self.warn(
                    DiagCode::ExtensionUnavailable,
                    &format!("extension {}:{} failed: {}", namespace, local_name, error),
                );
                self.execute_fallbacks(id, sink)
            }
        }
    }

    /// An unrecognized instruction executes its fallback children and is
    /// otherwise inert. Faults inside a fallback propagate fatally.
    pub(crate) fn handle_unknown(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        self.execute_fallbacks(id, sink)
    }

    /// Executes the content of every fallback child in document order;
    /// absent fallbacks, nothing happens at all.
    pub(crate) fn execute_fallbacks(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        for &child in self.child_ids(id) {
            if matches!(self.kind(child), InstructionKind::Fallback) {
                self.execute_children(child, sink)?;
            }
        }
        Ok(())
    }
}
