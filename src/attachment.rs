//! SOAP attachments and their exposure as message headers.

use crate::events::{AdapterEvent, EventSink};
use crate::headers::{
    ATTACHMENT_CHARSET, ATTACHMENT_CONTENT, ATTACHMENT_CONTENT_ID, ATTACHMENT_CONTENT_TYPE,
};
use crate::message::MessageBuilder;
use std::sync::Arc;

/// Charset used to decode attachment bodies.
pub const ATTACHMENT_CHARSET_NAME: &str = "UTF-8";

/// A MIME attachment of a SOAP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    content_id: String,
    content_type: String,
    data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        content_id: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Content-id as found on the wire, possibly in angle brackets.
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Body decoded as UTF-8 and trimmed.
    pub fn content_as_string(&self) -> String {
        String::from_utf8_lossy(&self.data).trim().to_string()
    }
}

/// Strip one leading `<` and one trailing `>` from a content-id.
///
/// Returns `None` for blank ids.
pub fn normalize_content_id(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    let id = raw.strip_prefix('<').unwrap_or(raw);
    let id = id.strip_suffix('>').unwrap_or(id);
    if id.trim().is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Expose attachments as message headers.
///
/// Each attachment is referenced under its normalized content-id; its id,
/// content type and text body are also set under the attachment header keys.
pub(crate) fn extract_attachments(
    attachments: &[Arc<Attachment>],
    builder: &mut MessageBuilder,
    sink: &dyn EventSink,
) {
    for attachment in attachments {
        let Some(content_id) = normalize_content_id(attachment.content_id()) else {
            sink.emit(AdapterEvent::AttachmentSkipped {
                content_type: attachment.content_type().to_string(),
            });
            continue;
        };

        sink.emit(AdapterEvent::AttachmentExtracted {
            content_id: content_id.clone(),
        });

        builder.insert_header(content_id.as_str(), Arc::clone(attachment), sink);
        builder.insert_header(ATTACHMENT_CONTENT_ID, content_id.as_str(), sink);
        builder.insert_header(ATTACHMENT_CONTENT_TYPE, attachment.content_type(), sink);
        builder.insert_header(ATTACHMENT_CONTENT, attachment.content_as_string(), sink);
        builder.insert_header(ATTACHMENT_CHARSET, ATTACHMENT_CHARSET_NAME, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;

    #[test]
    fn test_normalize_content_id() {
        assert_eq!(normalize_content_id("<cid:123>"), Some("cid:123".to_string()));
        assert_eq!(normalize_content_id("cid:123"), Some("cid:123".to_string()));
        assert_eq!(normalize_content_id("<<cid>>"), Some("<cid>".to_string()));
        assert_eq!(normalize_content_id(""), None);
        assert_eq!(normalize_content_id("   "), None);
        assert_eq!(normalize_content_id("<>"), None);
    }

    #[test]
    fn test_content_as_string_trims() {
        let attachment = Attachment::new("cid:1", "text/plain", b"  hello world\n".to_vec());
        assert_eq!(attachment.content_as_string(), "hello world");
    }

    #[test]
    fn test_extract_attachment_headers() {
        let sink = MemorySink::new();
        let attachment = Arc::new(Attachment::new("<cid:123>", "text/plain", b" data ".to_vec()));
        let mut builder = MessageBuilder::with_payload("");
        extract_attachments(&[attachment.clone()], &mut builder, &sink);
        let message = builder.build();

        let found = message.attachment("cid:123").expect("attachment reference");
        assert!(Arc::ptr_eq(found, &attachment));
        assert_eq!(message.header_text(ATTACHMENT_CONTENT_ID), Some("cid:123"));
        assert_eq!(message.header_text(ATTACHMENT_CONTENT_TYPE), Some("text/plain"));
        assert_eq!(message.header_text(ATTACHMENT_CONTENT), Some("data"));
        assert_eq!(message.header_text(ATTACHMENT_CHARSET), Some("UTF-8"));
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn test_empty_content_id_is_skipped() {
        let sink = MemorySink::new();
        let attachment = Arc::new(Attachment::new("", "text/plain", b"data".to_vec()));
        let mut builder = MessageBuilder::with_payload("");
        extract_attachments(&[attachment], &mut builder, &sink);
        let message = builder.build();

        assert!(message.headers().is_empty());
        assert_eq!(
            sink.warnings(),
            vec![AdapterEvent::AttachmentSkipped {
                content_type: "text/plain".to_string()
            }]
        );
    }
}
