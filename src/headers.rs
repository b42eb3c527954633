//! Reserved header keys and header classification.
//!
//! Each header is classified once, when it is added to a message. Consumers
//! match on [`MessageHeader`] instead of re-inspecting key prefixes.

use crate::attachment::Attachment;
use std::sync::Arc;

/// SOAP action of the envelope.
pub const SOAP_ACTION: &str = "soapAction";
/// Marks a reply to be rendered as SOAP fault; value is `code,reason[,locale]`.
pub const SOAP_FAULT: &str = "soapFault";
/// Transport (MIME) headers carry this prefix in the message.
pub const HTTP_PREFIX: &str = "http.";
/// Framework internal headers, never written to the wire.
pub const INTERNAL_PREFIX: &str = "citrus_";
/// Transport context headers of JMS endpoints, never written to the wire.
pub const JMS_PREFIX: &str = "JMS";
/// Already serialized SOAP header XML.
pub const HEADER_CONTENT: &str = "citrus_header_content";

/// Content-id of the last extracted attachment.
pub const ATTACHMENT_CONTENT_ID: &str = "citrus_attachment_content_id";
/// Content type of the last extracted attachment.
pub const ATTACHMENT_CONTENT_TYPE: &str = "citrus_attachment_content_type";
/// Body of the last extracted attachment as trimmed UTF-8 text.
pub const ATTACHMENT_CONTENT: &str = "citrus_attachment_content";
/// Charset used to decode [`ATTACHMENT_CONTENT`].
pub const ATTACHMENT_CHARSET: &str = "citrus_attachment_charset";

/// Value of a plain header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Text(String),
    Attachment(Arc<Attachment>),
}

impl HeaderValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Attachment(_) => None,
        }
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Arc<Attachment>> for HeaderValue {
    fn from(value: Arc<Attachment>) -> Self {
        Self::Attachment(value)
    }
}

/// A classified message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageHeader {
    /// Rendered as SOAP header element named by the key
    Plain { name: String, value: HeaderValue },
    /// Transport header, `name` without [`HTTP_PREFIX`]
    Transport { name: String, value: String },
    /// Never rendered on the wire
    Internal { name: String, value: String },
    SoapAction(String),
    FaultMarker(String),
    RawContent(String),
}

impl MessageHeader {
    /// Classify a header by its key.
    ///
    /// Attachment values are only kept for plain keys; reserved keys take the
    /// attachment body as text.
    pub fn new(key: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        let key = key.into();
        let value = value.into();

        let text = |value: HeaderValue| match value {
            HeaderValue::Text(text) => text,
            HeaderValue::Attachment(attachment) => attachment.content_as_string(),
        };

        if key.eq_ignore_ascii_case(SOAP_ACTION) {
            Self::SoapAction(text(value))
        } else if key.eq_ignore_ascii_case(SOAP_FAULT) {
            Self::FaultMarker(text(value))
        } else if key.eq_ignore_ascii_case(HEADER_CONTENT) {
            Self::RawContent(text(value))
        } else if starts_with_ignore_case(&key, HTTP_PREFIX) {
            Self::Transport {
                name: key[HTTP_PREFIX.len()..].to_string(),
                value: text(value),
            }
        } else if key.starts_with(INTERNAL_PREFIX) || key.starts_with(JMS_PREFIX) {
            Self::Internal {
                name: key,
                value: text(value),
            }
        } else {
            Self::Plain { name: key, value }
        }
    }

    /// Key of this header in the message.
    pub fn key(&self) -> String {
        match self {
            Self::Plain { name, .. } | Self::Internal { name, .. } => name.clone(),
            Self::Transport { name, .. } => format!("{}{}", HTTP_PREFIX, name),
            Self::SoapAction(_) => SOAP_ACTION.to_string(),
            Self::FaultMarker(_) => SOAP_FAULT.to_string(),
            Self::RawContent(_) => HEADER_CONTENT.to_string(),
        }
    }

    /// Whether this header answers to `key`.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Plain { name, .. } | Self::Internal { name, .. } => name == key,
            Self::Transport { name, .. } => {
                starts_with_ignore_case(key, HTTP_PREFIX) && key[HTTP_PREFIX.len()..] == **name
            }
            Self::SoapAction(_) => key.eq_ignore_ascii_case(SOAP_ACTION),
            Self::FaultMarker(_) => key.eq_ignore_ascii_case(SOAP_FAULT),
            Self::RawContent(_) => key.eq_ignore_ascii_case(HEADER_CONTENT),
        }
    }

    /// Text value, `None` for attachment references.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Plain { value, .. } => value.as_text(),
            Self::Transport { value, .. } | Self::Internal { value, .. } => Some(value),
            Self::SoapAction(value) | Self::FaultMarker(value) | Self::RawContent(value) => {
                Some(value)
            }
        }
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_keys() {
        assert_eq!(
            MessageHeader::new("soapAction", "urn:ping"),
            MessageHeader::SoapAction("urn:ping".to_string())
        );
        assert_eq!(
            MessageHeader::new("SOAPACTION", "urn:ping"),
            MessageHeader::SoapAction("urn:ping".to_string())
        );
        assert_eq!(
            MessageHeader::new("soapFault", "SERVER,boom"),
            MessageHeader::FaultMarker("SERVER,boom".to_string())
        );
        assert_eq!(
            MessageHeader::new(HEADER_CONTENT, "<a/>"),
            MessageHeader::RawContent("<a/>".to_string())
        );
    }

    #[test]
    fn test_transport_prefix_is_stripped() {
        let header = MessageHeader::new("HTTP.Content-Type", "text/xml");
        assert_eq!(
            header,
            MessageHeader::Transport {
                name: "Content-Type".to_string(),
                value: "text/xml".to_string(),
            }
        );
        assert_eq!(header.key(), "http.Content-Type");
        assert!(header.matches("http.Content-Type"));
        assert!(!header.matches("http.content-type"));
    }

    #[test]
    fn test_internal_prefixes() {
        assert!(matches!(
            MessageHeader::new("citrus_message_id", "1"),
            MessageHeader::Internal { .. }
        ));
        assert!(matches!(
            MessageHeader::new("JMSCorrelationID", "1"),
            MessageHeader::Internal { .. }
        ));
        assert!(matches!(
            MessageHeader::new(ATTACHMENT_CONTENT, "x"),
            MessageHeader::Internal { .. }
        ));
    }

    #[test]
    fn test_plain_header() {
        let header = MessageHeader::new("token", "abc123");
        assert_eq!(header.key(), "token");
        assert_eq!(header.text(), Some("abc123"));
        assert!(header.matches("token"));
        assert!(!header.matches("Token"));
    }

    #[test]
    fn test_attachment_value_on_plain_key() {
        let attachment = Arc::new(Attachment::new("cid:1", "text/plain", b"hello".to_vec()));
        let header = MessageHeader::new("cid:1", attachment.clone());
        assert_eq!(
            header,
            MessageHeader::Plain {
                name: "cid:1".to_string(),
                value: HeaderValue::Attachment(attachment),
            }
        );
        assert_eq!(header.text(), None);
    }
}
