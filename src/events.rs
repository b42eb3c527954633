//! Structured events reported by the translators.
//!
//! Translators never log through process-wide state. Every call receives an
//! [`EventSink`]; [`TracingSink`] forwards events to `tracing`, [`MemorySink`]
//! keeps them for inspection.

use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Optional envelope capabilities a translator may find missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SoapHeaders,
    SoapAction,
    Attachments,
    MimeHeaders,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoapHeaders => "soap_headers",
            Self::SoapAction => "soap_action",
            Self::Attachments => "attachments",
            Self::MimeHeaders => "mime_headers",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
}

/// Something worth reporting that does not abort a translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// An inbound envelope was translated into a message
    RequestReceived { payload_len: usize, header_count: usize },
    /// A reply envelope was read back on the client side
    ResponseReceived { payload_len: usize, header_count: usize },
    /// A reply message is about to be written
    ReplySending { fault: bool, header_count: usize },
    /// The handler produced no reply
    NoReply { handler: String },
    /// An attachment was exposed under its content-id
    AttachmentExtracted { content_id: String },
    /// An attachment without content-id was left out
    AttachmentSkipped { content_type: String },
    /// The envelope lacks a capability, so a header class was omitted
    CapabilityMissing {
        capability: Capability,
        header: Option<String>,
    },
    /// A header was already set by an earlier step and kept
    DuplicateHeaderIgnored { key: String },
}

impl AdapterEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            Self::AttachmentExtracted { .. } | Self::DuplicateHeaderIgnored { .. } => {
                EventLevel::Debug
            }
            Self::RequestReceived { .. }
            | Self::ResponseReceived { .. }
            | Self::ReplySending { .. } => EventLevel::Info,
            Self::NoReply { .. } | Self::AttachmentSkipped { .. } | Self::CapabilityMissing { .. } => {
                EventLevel::Warn
            }
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level() == EventLevel::Warn
    }
}

/// Receiver of adapter events.
pub trait EventSink {
    fn emit(&self, event: AdapterEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: AdapterEvent) {
        match event {
            AdapterEvent::RequestReceived {
                payload_len,
                header_count,
            } => info!(payload_len, header_count, "Received SOAP request"),
            AdapterEvent::ResponseReceived {
                payload_len,
                header_count,
            } => info!(payload_len, header_count, "Received SOAP response"),
            AdapterEvent::ReplySending {
                fault,
                header_count,
            } => info!(fault, header_count, "Sending SOAP response"),
            AdapterEvent::NoReply { handler } => {
                warn!(handler = %handler, "No reply message from message handler, no SOAP response for calling client")
            }
            AdapterEvent::AttachmentExtracted { content_id } => {
                debug!(content_id = %content_id, "SOAP message contains attachment")
            }
            AdapterEvent::AttachmentSkipped { content_type } => warn!(
                content_type = %content_type,
                "Could not handle SOAP attachment with empty content-id, attachment is ignored"
            ),
            AdapterEvent::CapabilityMissing { capability, header } => warn!(
                capability = %capability,
                header = ?header,
                "Envelope implementation does not support capability, skipping"
            ),
            AdapterEvent::DuplicateHeaderIgnored { key } => {
                debug!(key = %key, "Header already set, keeping first value")
            }
        }
    }
}

/// Records events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AdapterEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<AdapterEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn warnings(&self) -> Vec<AdapterEvent> {
        self.events().into_iter().filter(AdapterEvent::is_warning).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: AdapterEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(
            AdapterEvent::AttachmentExtracted {
                content_id: "cid:1".to_string()
            }
            .level(),
            EventLevel::Debug
        );
        assert!(AdapterEvent::CapabilityMissing {
            capability: Capability::MimeHeaders,
            header: None,
        }
        .is_warning());
    }

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(AdapterEvent::DuplicateHeaderIgnored {
            key: "a".to_string(),
        });
        sink.emit(AdapterEvent::AttachmentSkipped {
            content_type: "text/plain".to_string(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], AdapterEvent::DuplicateHeaderIgnored { .. }));
        assert_eq!(sink.warnings().len(), 1);
    }

    #[test]
    fn test_tracing_sink_accepts_all_events() {
        let sink = TracingSink;
        sink.emit(AdapterEvent::NoReply {
            handler: "EmptyResponseHandler".to_string(),
        });
        sink.emit(AdapterEvent::CapabilityMissing {
            capability: Capability::Attachments,
            header: Some("cid:1".to_string()),
        });
    }
}
