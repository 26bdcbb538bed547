//! Event buffering for tree fragments, content collection, and
//! extension-output isolation.

use weft_model::node::Name;
use weft_model::sink::{self, Event, EventSink};

/// An [`EventSink`] that records events instead of forwarding them. The
/// buffer either becomes a fragment value, is flushed to a real sink, or
/// is discarded (a failed extension call must leave no output behind).
#[derive(Debug, Default)]
pub struct BufferingSink {
    events: Vec<Event>,
}

impl BufferingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Concatenated character content, used when child content is
    /// collected to a string (comments, processing instructions,
    /// namespace URIs, messages).
    pub fn text(&self) -> String {
        sink::text_of(&self.events)
    }

    pub fn flush_to(self, target: &mut dyn EventSink) {
        sink::replay(&self.events, target);
    }
}

impl EventSink for BufferingSink {
    fn start_element(&mut self, name: &Name) {
        self.events.push(Event::StartElement(name.clone()));
    }

    fn end_element(&mut self, name: &Name) {
        self.events.push(Event::EndElement(name.clone()));
    }

    fn attribute(&mut self, name: &Name, value: &str) {
        self.events.push(Event::Attribute {
            name: name.clone(),
            value: value.to_string(),
        });
    }

    fn namespace(&mut self, prefix: &str, uri: &str, excluded: bool) {
        self.events.push(Event::Namespace {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            excluded,
        });
    }

    fn characters(&mut self, text: &str) {
        self.events.push(Event::Characters(text.to_string()));
    }

    fn comment(&mut self, text: &str) {
        self.events.push(Event::Comment(text.to_string()));
    }

    fn processing_instruction(&mut self, target: &str, data: &str) {
        self.events.push(Event::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_model::mock::RecordingSink;

    #[test]
    fn buffered_events_replay_in_order() {
        let mut buffer = BufferingSink::new();
        buffer.start_element(&Name::local("a"));
        buffer.characters("x");
        buffer.end_element(&Name::local("a"));

        let mut sink = RecordingSink::new();
        buffer.flush_to(&mut sink);
        assert_eq!(sink.render(), "<a>x</a>");
    }

    #[test]
    fn text_collects_characters_only() {
        let mut buffer = BufferingSink::new();
        buffer.start_element(&Name::local("a"));
        buffer.characters("x");
        buffer.comment("skip");
        buffer.characters("y");
        assert_eq!(buffer.text(), "xy");
    }
}
