//! Result construction: elements, attributes, comments, processing
//! instructions, and namespace declarations.

use crate::ast::{InstructionId, InstructionKind};
use crate::error::Fault;
use crate::executor::Interpreter;
use weft_model::diag::DiagCode;
use weft_model::node::{Name, SourceNode};
use weft_model::sink::EventSink;

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    pub(crate) fn handle_element(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::Element { name, use_sets } = self.kind(id) else {
            return Ok(());
        };
        let lexical = self.evaluate_avt(name)?;
        if lexical.trim().is_empty() {
            return Err(self.illegal_attribute("name", lexical));
        }
        let element_name = Name::parse(&lexical);
        sink.start_element(&element_name);

        let mut result = Ok(());
        for set in use_sets {
            result = self.apply_attribute_set(set, sink);
            if result.is_err() {
                break;
            }
        }
        if result.is_ok() {
            result = self.execute_children(id, sink);
        }

        // The element is closed on the fault path too, keeping the event
        // stream balanced while the fault unwinds.
        sink.end_element(&element_name);
        result
    }

    pub(crate) fn handle_attribute(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::Attribute { name } = self.kind(id) else {
            return Ok(());
        };
        let lexical = self.evaluate_avt(name)?;
        if lexical.trim().is_empty() {
            return Err(self.illegal_attribute("name", lexical));
        }
        let value = self.collect_text(id)?;
        sink.attribute(&Name::parse(&lexical), &value);
        Ok(())
    }

    pub(crate) fn handle_comment(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let text = self.collect_text(id)?;
        sink.comment(&text);
        Ok(())
    }

    pub(crate) fn handle_pi(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::ProcessingInstruction { target } = self.kind(id) else {
            return Ok(());
        };
        let target = self.evaluate_avt(target)?;
        if target.trim().is_empty() {
            return Err(self.illegal_attribute("name", target));
        }
        let data = self.collect_text(id)?;
        sink.processing_instruction(&target, &data);
        Ok(())
    }

    /// Registers a namespace declaration on the currently open result
    /// element. The prefix is attribute-value-templated and must be
    /// non-empty; the URI is the collected child content.
    pub(crate) fn handle_namespace(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::Namespace { name, excluded } = self.kind(id) else {
            return Ok(());
        };
        let prefix = self.evaluate_avt(name)?;
        if prefix.trim().is_empty() {
            return Err(self.illegal_attribute("name", prefix));
        }
        let uri = self.collect_text(id)?;
        sink.namespace(&prefix, &uri, *excluded);
        Ok(())
    }

    fn illegal_attribute(&self, attribute: &'static str, value: String) -> Fault {
        self.fatal(
            DiagCode::IllegalAttributeValue,
            Fault::IllegalAttributeValue { attribute, value },
        )
    }
}
