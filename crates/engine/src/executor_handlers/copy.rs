//! Shallow and deep copying of source nodes into the output stream.

use crate::ast::{InstructionId, InstructionKind};
use crate::error::Fault;
use crate::executor::Interpreter;
use weft_model::diag::DiagCode;
use weft_model::node::{Name, NodeType, QName, SourceNode};
use weft_model::sink::{self, EventSink};
use weft_model::value::Value;

fn owned_name(qname: QName<'_>) -> Name {
    Name {
        prefix: qname.prefix.map(str::to_string),
        local: qname.local_part.to_string(),
    }
}

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    /// Shallow copy: reproduce the current node itself, with executed
    /// children as its content where it can have any.
    pub(crate) fn handle_copy(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::Copy = self.kind(id) else {
            return Ok(());
        };
        let Some(node) = self.ctx.current_node else {
            return Err(self.fatal(DiagCode::NullSourceNode, Fault::NullSourceNode));
        };
        match node.node_type() {
            NodeType::Element => {
                let name = node.name().map(owned_name).unwrap_or_else(|| Name::local(""));
                sink.start_element(&name);
                let result = self.execute_children(id, sink);
                sink.end_element(&name);
                result
            }
            NodeType::Root => self.execute_children(id, sink),
            NodeType::Text => {
                sink.characters(&node.string_value());
                Ok(())
            }
            NodeType::Attribute => {
                if let Some(qname) = node.name() {
                    sink.attribute(&owned_name(qname), &node.string_value());
                }
                Ok(())
            }
            NodeType::Comment => {
                sink.comment(&node.string_value());
                Ok(())
            }
            NodeType::ProcessingInstruction => {
                let target = node.name().map(|q| q.local_part.to_string()).unwrap_or_default();
                sink.processing_instruction(&target, &node.string_value());
                Ok(())
            }
        }
    }

    /// Deep copy of an evaluated value. Non-node values emit their string
    /// coercion as characters; a fragment replays its buffered events.
    pub(crate) fn copy_value(
        &mut self,
        value: Value<N>,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        match value {
            Value::NodeSet(nodes) => {
                for node in nodes {
                    self.copy_node(node, sink);
                }
                Ok(())
            }
            Value::Fragment(events) => {
                sink::replay(&events, sink);
                Ok(())
            }
            other => {
                sink.characters(&other.to_string());
                Ok(())
            }
        }
    }

    /// Structural copy of one node and its subtree.
    ///
    /// A whole-document node copies each child in turn — no document
    /// start/end events exist in the stream. A bare attribute node
    /// attaches to the currently open result element; whether an element
    /// is actually open is the output sink's contract.
    fn copy_node(&mut self, node: N, sink: &mut dyn EventSink) {
        match node.node_type() {
            NodeType::Root => {
                for child in node.children() {
                    self.copy_node(child, sink);
                }
            }
            NodeType::Element => {
                let name = node.name().map(owned_name).unwrap_or_else(|| Name::local(""));
                sink.start_element(&name);
                for attribute in node.attributes() {
                    if let Some(qname) = attribute.name() {
                        sink.attribute(&owned_name(qname), &attribute.string_value());
                    }
                }
                for child in node.children() {
                    self.copy_node(child, sink);
                }
                sink.end_element(&name);
            }
            NodeType::Attribute => {
                if let Some(qname) = node.name() {
                    sink.attribute(&owned_name(qname), &node.string_value());
                }
            }
            NodeType::Text => sink.characters(&node.string_value()),
            NodeType::Comment => sink.comment(&node.string_value()),
            NodeType::ProcessingInstruction => {
                let target = node.name().map(|q| q.local_part.to_string()).unwrap_or_default();
                sink.processing_instruction(&target, &node.string_value());
            }
        }
    }
}
