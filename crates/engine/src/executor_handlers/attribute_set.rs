//! Attribute-set application with transitive self-reference detection.

use crate::ast::{InstructionId, InstructionKind};
use crate::error::Fault;
use crate::executor::Interpreter;
use weft_model::diag::DiagCode;
use weft_model::node::{Name, SourceNode};
use weft_model::sink::EventSink;

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    pub(crate) fn handle_attribute_set(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::AttributeSet { name, .. } = self.kind(id) else {
            return Ok(());
        };
        self.apply_attribute_set(name, sink)
    }

    /// Applies the full logical definition of a named set: every
    /// registered declaration in import order, each preceded by the sets
    /// it uses. A name already on the active stack is a self-reference
    /// and produces no output.
    pub(crate) fn apply_attribute_set(
        &mut self,
        name: &Name,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        if self.ctx.active_attribute_sets.contains(name) {
            return Err(self.fatal(
                DiagCode::AttributeSetSelfReference,
                Fault::AttributeSetSelfReference(name.clone()),
            ));
        }
        let Some(definitions) = self.stylesheet.attribute_sets.get(name) else {
            self.warn(
                DiagCode::AttributeSetNotFound,
                &format!("attribute set '{}' is not defined", name),
            );
            return Ok(());
        };

        self.ctx.active_attribute_sets.push(name.clone());
        let marker = self.variables.push_frame_marker();

        let mut result = Ok(());
        'definitions: for &definition in definitions {
            let InstructionKind::AttributeSet { use_sets, .. } = self.kind(definition) else {
                continue;
            };
            for used in use_sets {
                result = self.apply_attribute_set(used, sink);
                if result.is_err() {
                    break 'definitions;
                }
            }
            result = self.execute_children(definition, sink);
            if result.is_err() {
                break;
            }
        }

        self.variables.pop_to(marker);
        self.ctx.active_attribute_sets.pop();
        result
    }
}
