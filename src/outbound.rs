//! Outbound translation: internal message to wire envelope.

use crate::adapter::SoapEnvelopeAdapter;
use crate::envelope::{SoapMessage, WebServiceMessage};
use crate::error::{AdapterError, Result};
use crate::events::{AdapterEvent, Capability, EventSink};
use crate::fault::{prepare_fault, FaultDefinition, SoapFault};
use crate::headers::{HeaderValue, MessageHeader};
use crate::message::{Message, Payload};
use crate::parser::parse_fragment;
use crate::qname;
use std::sync::Arc;
use xmltree::Element;

/// What ends up in the reply body.
enum ReplyBody {
    Payload(Element),
    Fault(SoapFault),
}

impl SoapEnvelopeAdapter {
    /// Write `reply` into `envelope`.
    ///
    /// The body (or fault) is prepared before anything is written, so payload
    /// and fault definition errors leave the envelope untouched. Headers are
    /// then emitted in message order; emission stops at the first failing
    /// header and the headers written before it remain.
    pub fn translate_outbound(
        &self,
        reply: &Message,
        envelope: &mut dyn WebServiceMessage,
        sink: &dyn EventSink,
    ) -> Result<()> {
        let body = prepare_body(reply, envelope)?;

        match envelope.as_soap_mut() {
            Some(soap) => self.write_headers(reply, soap, sink)?,
            None => report_unwritable_headers(reply, sink),
        }

        match body {
            ReplyBody::Payload(payload) => envelope.write_payload(payload),
            ReplyBody::Fault(fault) => match envelope.as_soap_mut() {
                Some(soap) => {
                    soap.soap_body_mut().add_fault(fault);
                    Ok(())
                }
                None => Err(unsupported_version()),
            },
        }
    }

    fn write_headers(
        &self,
        reply: &Message,
        soap: &mut dyn SoapMessage,
        sink: &dyn EventSink,
    ) -> Result<()> {
        let headers = &self.config().headers;
        let default_namespace = headers.default_namespace();

        for header in reply.headers() {
            match header {
                MessageHeader::Internal { .. } | MessageHeader::FaultMarker(_) => {}
                MessageHeader::SoapAction(action) => soap.set_soap_action(action),
                MessageHeader::RawContent(content) => {
                    if !content.trim().is_empty() {
                        soap.add_header_content(parse_fragment(content)?);
                    }
                }
                MessageHeader::Transport { name, value } => match soap.mime_headers_mut() {
                    Some(mime) => mime.set_header(name.as_str(), value.as_str()),
                    None => sink.emit(AdapterEvent::CapabilityMissing {
                        capability: Capability::MimeHeaders,
                        header: Some(header.key()),
                    }),
                },
                MessageHeader::Plain {
                    name,
                    value: HeaderValue::Text(text),
                } => {
                    let name = qname::resolve(name, default_namespace, &headers.default_prefix)?;
                    soap.add_header_element(name, text);
                }
                MessageHeader::Plain {
                    value: HeaderValue::Attachment(attachment),
                    ..
                } => match soap.attachments_mut() {
                    Some(attachments) => attachments.push(Arc::clone(attachment)),
                    None => sink.emit(AdapterEvent::CapabilityMissing {
                        capability: Capability::Attachments,
                        header: Some(header.key()),
                    }),
                },
            }
        }

        Ok(())
    }
}

fn prepare_body(reply: &Message, envelope: &dyn WebServiceMessage) -> Result<ReplyBody> {
    let Some(definition) = reply.fault_definition() else {
        return payload_element(reply.payload()).map(ReplyBody::Payload);
    };

    let definition = FaultDefinition::parse(definition)?;
    let detail = fault_detail(reply.payload())?;
    let version = envelope
        .as_soap()
        .and_then(|soap| soap.soap_body().version());
    prepare_fault(&definition, version, detail).map(ReplyBody::Fault)
}

/// Coerce a reply payload into a body element.
fn payload_element(payload: &Payload) -> Result<Element> {
    match payload {
        Payload::Document(document) => Ok(document.clone()),
        Payload::Text(text) if text.trim().is_empty() => {
            Err(AdapterError::UnsupportedPayloadType("blank text"))
        }
        Payload::Text(text) => parse_fragment(text),
        other => Err(AdapterError::UnsupportedPayloadType(other.kind())),
    }
}

/// Fault detail taken from the reply payload, if it carries any XML.
fn fault_detail(payload: &Payload) -> Result<Option<Element>> {
    match payload {
        Payload::Document(document) => Ok(Some(document.clone())),
        Payload::Text(text) if !text.trim().is_empty() => parse_fragment(text).map(Some),
        _ => Ok(None),
    }
}

fn unsupported_version() -> AdapterError {
    AdapterError::UnsupportedProtocolVersion("message has no SOAP body".to_string())
}

/// Non-SOAP envelopes carry the body only.
fn report_unwritable_headers(reply: &Message, sink: &dyn EventSink) {
    for header in reply.headers() {
        let capability = match header {
            MessageHeader::Internal { .. } | MessageHeader::FaultMarker(_) => continue,
            MessageHeader::SoapAction(_) => Capability::SoapAction,
            MessageHeader::Transport { .. } => Capability::MimeHeaders,
            MessageHeader::Plain {
                value: HeaderValue::Attachment(_),
                ..
            } => Capability::Attachments,
            MessageHeader::Plain { .. } | MessageHeader::RawContent(_) => Capability::SoapHeaders,
        };
        sink.emit(AdapterEvent::CapabilityMissing {
            capability,
            header: Some(header.key()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::Attachment;
    use crate::config::{SoapAdapterConfig, SoapVersion, SOAP_12_NS};
    use crate::events::MemorySink;
    use crate::headers::{ATTACHMENT_CONTENT_ID, HEADER_CONTENT, SOAP_ACTION, SOAP_FAULT};
    use crate::qname::QualifiedName;
    use crate::xml_message::{PoxMessage, XmlSoapMessage};

    fn adapter(default_namespace: Option<&str>) -> SoapEnvelopeAdapter {
        let mut config = SoapAdapterConfig::default();
        config.headers.default_namespace = default_namespace.map(str::to_string);
        config.headers.default_prefix = "ctx".to_string();
        SoapEnvelopeAdapter::new(config)
    }

    #[test]
    fn test_payload_and_headers() {
        let sink = MemorySink::new();
        let reply = Message::builder("<pong/>")
            .header(SOAP_ACTION, "\"urn:pong\"")
            .header("token", "abc123")
            .header("{urn:trace}id", "42")
            .header("http.X-Trace", "a, b")
            .header(ATTACHMENT_CONTENT_ID, "cid:1")
            .header("JMSMessageID", "1")
            .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);

        adapter(Some("urn:ctx"))
            .translate_outbound(&reply, &mut envelope, &sink)
            .unwrap();

        assert_eq!(envelope.payload_source().unwrap(), "<pong/>");
        assert_eq!(envelope.soap_action(), Some("\"urn:pong\""));
        let names: Vec<QualifiedName> = envelope
            .header_elements()
            .into_iter()
            .map(|element| element.name)
            .collect();
        assert_eq!(
            names,
            vec![
                QualifiedName::new("urn:ctx", "token", "ctx"),
                QualifiedName::new("urn:trace", "id", ""),
            ]
        );
        assert_eq!(
            envelope.mime_headers().unwrap().header("X-Trace"),
            vec!["a, b"]
        );
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn test_invalid_qname_stops_emission() {
        let sink = MemorySink::new();
        let reply = Message::builder("<pong/>")
            .header("{urn:a}first", "1")
            .header("not a qname", "x")
            .header("{urn:a}last", "2")
            .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);

        let err = adapter(None)
            .translate_outbound(&reply, &mut envelope, &sink)
            .unwrap_err();

        assert!(matches!(err, AdapterError::InvalidQName { .. }));
        let headers = envelope.header_elements();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name.local_part(), "first");
        assert_eq!(envelope.payload_source().unwrap(), "");
        assert!(envelope.fault().is_none());
    }

    #[test]
    fn test_plain_header_without_default_namespace() {
        let reply = Message::builder("<pong/>").header("token", "abc").build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);
        let err = adapter(None)
            .translate_outbound(&reply, &mut envelope, &MemorySink::new())
            .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidQName { .. }));
    }

    #[test]
    fn test_raw_header_content() {
        let reply = Message::builder("<pong/>")
            .header(HEADER_CONTENT, r#"<w:Security xmlns:w="urn:wsse">token</w:Security>"#)
            .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);
        adapter(None)
            .translate_outbound(&reply, &mut envelope, &MemorySink::new())
            .unwrap();

        let headers = envelope.header_elements();
        assert_eq!(headers[0].name, QualifiedName::new("urn:wsse", "Security", "w"));
        assert_eq!(headers[0].text, "token");
    }

    #[test]
    fn test_raw_header_content_keeps_qualified_attributes() {
        let reply = Message::builder("<pong/>")
            .header(
                HEADER_CONTENT,
                r#"<w:Security xmlns:w="urn:w" xmlns:u="urn:u" u:Id="T1">t</w:Security>"#,
            )
            .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);
        adapter(None)
            .translate_outbound(&reply, &mut envelope, &MemorySink::new())
            .unwrap();

        let security = envelope
            .header()
            .and_then(|header| header.children.iter().find_map(xmltree::XMLNode::as_element))
            .unwrap();
        assert_eq!(security.attributes.get("u:Id").map(String::as_str), Some("T1"));
        assert!(envelope.to_xml().unwrap().contains(
            r#"<w:Security xmlns:u="urn:u" xmlns:w="urn:w" u:Id="T1">t</w:Security>"#
        ));
    }

    #[test]
    fn test_payload_keeps_qualified_attributes() {
        let reply = Message::builder(
            r#"<pong xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true"/>"#,
        )
        .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);
        adapter(None)
            .translate_outbound(&reply, &mut envelope, &MemorySink::new())
            .unwrap();

        assert_eq!(
            envelope.payload_source().unwrap(),
            r#"<pong xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true"/>"#
        );
    }

    #[test]
    fn test_unsupported_payloads() {
        let sink = MemorySink::new();
        for payload in [Payload::Binary(vec![1, 2]), Payload::Empty, Payload::Text("  ".to_string())] {
            let reply = Message::builder(payload).header("{urn:a}id", "1").build();
            let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);
            let err = adapter(None)
                .translate_outbound(&reply, &mut envelope, &sink)
                .unwrap_err();
            assert!(matches!(err, AdapterError::UnsupportedPayloadType(_)));
            assert!(envelope.header_elements().is_empty());
        }

        let reply = Message::builder("<broken>").build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);
        let err = adapter(None)
            .translate_outbound(&reply, &mut envelope, &sink)
            .unwrap_err();
        assert!(matches!(err, AdapterError::PayloadTransform(_)));
    }

    #[test]
    fn test_fault_reply() {
        let reply = Message::builder("<error>quota</error>")
            .header(SOAP_FAULT, "{urn:errors}Quota,Over quota")
            .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap12);
        adapter(None)
            .translate_outbound(&reply, &mut envelope, &MemorySink::new())
            .unwrap();

        let fault = envelope.fault().unwrap();
        assert_eq!(fault.code(), &QualifiedName::new(SOAP_12_NS, "Receiver", ""));
        assert_eq!(fault.subcodes(), &[QualifiedName::new("urn:errors", "Quota", "")]);
        assert_eq!(fault.reason(), "Over quota");
        assert_eq!(fault.detail().len(), 1);
    }

    #[test]
    fn test_invalid_fault_definition_writes_nothing() {
        let reply = Message::builder("<pong/>")
            .header(SOAP_ACTION, "urn:pong")
            .header(SOAP_FAULT, "SERVER")
            .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);
        let err = adapter(None)
            .translate_outbound(&reply, &mut envelope, &MemorySink::new())
            .unwrap_err();

        assert!(matches!(err, AdapterError::InvalidFaultDefinition { .. }));
        assert!(envelope.soap_action().is_none());
    }

    #[test]
    fn test_fault_on_unknown_envelope_version() {
        let mut envelope = XmlSoapMessage::parse(
            br#"<e:Envelope xmlns:e="urn:custom:envelope"><e:Body/></e:Envelope>"#,
        )
        .unwrap();
        let reply = Message::builder("").header(SOAP_FAULT, "SERVER,boom").build();
        let err = adapter(None)
            .translate_outbound(&reply, &mut envelope, &MemorySink::new())
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedProtocolVersion(_)));
    }

    #[test]
    fn test_capability_gaps_are_warnings() {
        let sink = MemorySink::new();
        let attachment = Arc::new(Attachment::new("cid:1", "text/plain", b"x".to_vec()));
        let reply = Message::builder("<pong/>")
            .header("http.X-Trace", "1")
            .header("cid:1", attachment)
            .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11)
            .without_mime_access()
            .without_attachment_access();

        adapter(None)
            .translate_outbound(&reply, &mut envelope, &sink)
            .unwrap();

        assert_eq!(envelope.payload_source().unwrap(), "<pong/>");
        assert_eq!(
            sink.warnings(),
            vec![
                AdapterEvent::CapabilityMissing {
                    capability: Capability::MimeHeaders,
                    header: Some("http.X-Trace".to_string()),
                },
                AdapterEvent::CapabilityMissing {
                    capability: Capability::Attachments,
                    header: Some("cid:1".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_attachment_is_written() {
        let attachment = Arc::new(Attachment::new("cid:1", "text/plain", b"x".to_vec()));
        let reply = Message::builder("<pong/>")
            .header("cid:1", attachment.clone())
            .build();
        let mut envelope = XmlSoapMessage::new(SoapVersion::Soap11);
        adapter(None)
            .translate_outbound(&reply, &mut envelope, &MemorySink::new())
            .unwrap();

        let attachments = envelope.attachments().unwrap();
        assert_eq!(attachments.len(), 1);
        assert!(Arc::ptr_eq(&attachments[0], &attachment));
    }

    #[test]
    fn test_plain_xml_envelope() {
        let sink = MemorySink::new();
        let reply = Message::builder("<pong/>").header("token", "abc").build();
        let mut envelope = PoxMessage::new();
        adapter(None)
            .translate_outbound(&reply, &mut envelope, &sink)
            .unwrap();

        assert_eq!(envelope.payload_source().unwrap(), "<pong/>");
        assert_eq!(
            sink.warnings(),
            vec![AdapterEvent::CapabilityMissing {
                capability: Capability::SoapHeaders,
                header: Some("token".to_string()),
            }]
        );

        let reply = Message::builder("<pong/>").header(SOAP_FAULT, "SERVER,boom").build();
        let err = adapter(None)
            .translate_outbound(&reply, &mut PoxMessage::new(), &sink)
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedProtocolVersion(_)));
    }
}
