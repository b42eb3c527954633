//! Internal message representation: payload plus classified headers.

use crate::attachment::Attachment;
use crate::events::{AdapterEvent, EventSink};
use crate::headers::{HeaderValue, MessageHeader};
use std::sync::Arc;
use xmltree::Element;

/// Message payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// Serialized XML
    Text(String),
    /// Already parsed XML document
    Document(Element),
    /// Raw bytes of non-XML transports, not writable into a SOAP body
    Binary(Vec<u8>),
    /// No payload at all
    #[default]
    Empty,
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Name of the payload kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Document(_) => "document",
            Self::Binary(_) => "binary",
            Self::Empty => "empty",
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Element> for Payload {
    fn from(element: Element) -> Self {
        Self::Document(element)
    }
}

/// A message passed between translators and handlers.
///
/// Built through [`MessageBuilder`] and immutable afterwards. Header keys are
/// unique and keep insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    payload: Payload,
    headers: Vec<MessageHeader>,
}

impl Message {
    pub fn builder(payload: impl Into<Payload>) -> MessageBuilder {
        MessageBuilder::with_payload(payload)
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn headers(&self) -> &[MessageHeader] {
        &self.headers
    }

    pub fn get(&self, key: &str) -> Option<&MessageHeader> {
        self.headers.iter().find(|header| header.matches(key))
    }

    pub fn contains_header(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Text value of a header, `None` if absent or an attachment reference.
    pub fn header_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MessageHeader::text)
    }

    /// Attachment referenced under `content_id`.
    pub fn attachment(&self, content_id: &str) -> Option<&Arc<Attachment>> {
        match self.get(content_id) {
            Some(MessageHeader::Plain {
                value: HeaderValue::Attachment(attachment),
                ..
            }) => Some(attachment),
            _ => None,
        }
    }

    pub fn soap_action(&self) -> Option<&str> {
        self.headers.iter().find_map(|header| match header {
            MessageHeader::SoapAction(action) => Some(action.as_str()),
            _ => None,
        })
    }

    pub fn fault_definition(&self) -> Option<&str> {
        self.headers.iter().find_map(|header| match header {
            MessageHeader::FaultMarker(definition) => Some(definition.as_str()),
            _ => None,
        })
    }

    /// Builder initialized with a copy of this message.
    pub fn to_builder(&self) -> MessageBuilder {
        MessageBuilder {
            payload: self.payload.clone(),
            headers: self.headers.clone(),
        }
    }
}

/// Builds a [`Message`].
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    payload: Payload,
    headers: Vec<MessageHeader>,
}

impl MessageBuilder {
    pub fn with_payload(payload: impl Into<Payload>) -> Self {
        Self {
            payload: payload.into(),
            headers: Vec::new(),
        }
    }

    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set a header, replacing an existing one with the same key.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.set_header(key, value);
        self
    }

    /// Set a header, replacing an existing one with the same key.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<HeaderValue>) {
        let header = MessageHeader::new(key, value);
        let key = header.key();
        match self.headers.iter_mut().find(|existing| existing.matches(&key)) {
            Some(existing) => *existing = header,
            None => self.headers.push(header),
        }
    }

    /// Set a header unless the key is already taken.
    ///
    /// Returns `false` and reports the clash when an earlier value is kept.
    pub fn insert_header(
        &mut self,
        key: impl Into<String>,
        value: impl Into<HeaderValue>,
        sink: &dyn EventSink,
    ) -> bool {
        let header = MessageHeader::new(key, value);
        let key = header.key();
        if self.headers.iter().any(|existing| existing.matches(&key)) {
            sink.emit(AdapterEvent::DuplicateHeaderIgnored { key });
            return false;
        }
        self.headers.push(header);
        true
    }

    /// Drop the header with `key`, if any.
    pub fn remove_header(&mut self, key: &str) {
        self.headers.retain(|header| !header.matches(key));
    }

    pub fn build(self) -> Message {
        Message {
            payload: self.payload,
            headers: self.headers,
        }
    }
}
