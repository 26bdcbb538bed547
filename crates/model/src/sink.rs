//! The write-only output contract: an ordered stream of structured events.

use crate::node::Name;

/// One event in the output stream. Buffered sequences of events are also
/// the representation of tree-fragment values.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartElement(Name),
    EndElement(Name),
    Attribute { name: Name, value: String },
    Namespace {
        prefix: String,
        uri: String,
        excluded: bool,
    },
    Characters(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

/// The semantic actions of building the result tree, decoupled from any
/// concrete serialization.
///
/// Implementations must hold attributes and namespace declarations
/// reported after a `start_element` in a pending state until the first
/// following non-attribute event, so that late attribute attachment (deep
/// copy of node-sets, namespace construction) lands on the still-open
/// element. Attaching an attribute when no element is open is an output
/// contract violation; sinks decide how to surface it.
pub trait EventSink {
    fn start_element(&mut self, name: &Name);
    fn end_element(&mut self, name: &Name);
    fn attribute(&mut self, name: &Name, value: &str);
    fn namespace(&mut self, prefix: &str, uri: &str, excluded: bool);
    fn characters(&mut self, text: &str);
    fn comment(&mut self, text: &str);
    fn processing_instruction(&mut self, target: &str, data: &str);
}

/// Replays a buffered event sequence into a sink.
pub fn replay(events: &[Event], sink: &mut dyn EventSink) {
    for event in events {
        match event {
            Event::StartElement(name) => sink.start_element(name),
            Event::EndElement(name) => sink.end_element(name),
            Event::Attribute { name, value } => sink.attribute(name, value),
            Event::Namespace {
                prefix,
                uri,
                excluded,
            } => sink.namespace(prefix, uri, *excluded),
            Event::Characters(text) => sink.characters(text),
            Event::Comment(text) => sink.comment(text),
            Event::ProcessingInstruction { target, data } => {
                sink.processing_instruction(target, data)
            }
        }
    }
}

/// Concatenated character content of an event sequence, as used when a
/// fragment is coerced to a string.
pub fn text_of(events: &[Event]) -> String {
    let mut out = String::new();
    for event in events {
        if let Event::Characters(text) = event {
            out.push_str(text);
        }
    }
    out
}
