//! Inbound translation: wire envelope to internal message.

use crate::adapter::{ContextProperties, SoapEnvelopeAdapter};
use crate::attachment::extract_attachments;
use crate::envelope::{SoapMessage, WebServiceMessage};
use crate::error::Result;
use crate::events::{AdapterEvent, Capability, EventSink};
use crate::headers::{HTTP_PREFIX, SOAP_ACTION};
use crate::message::{Message, MessageBuilder};
use crate::mime::merge_headers;
use crate::parser::normalize_soap_action;

impl SoapEnvelopeAdapter {
    /// Translate a request envelope received by an endpoint.
    ///
    /// Context properties are copied first, followed by SOAP header elements,
    /// the SOAP action, attachments and, when `mime.handle_mime_headers` is
    /// set, the merged transport headers. A key taken by an earlier step keeps
    /// its value.
    pub fn translate_inbound(
        &self,
        envelope: &dyn WebServiceMessage,
        properties: &ContextProperties,
        sink: &dyn EventSink,
    ) -> Result<Message> {
        let message = read_message(
            envelope,
            Some(properties),
            self.config().mime.handle_mime_headers,
            sink,
        )?;

        sink.emit(AdapterEvent::RequestReceived {
            payload_len: payload_len(&message),
            header_count: message.headers().len(),
        });
        Ok(message)
    }

    /// Translate a reply envelope received by a client.
    ///
    /// Same as [`translate_inbound`](Self::translate_inbound) without context
    /// properties; transport headers are always captured.
    pub fn translate_response(
        &self,
        envelope: &dyn WebServiceMessage,
        sink: &dyn EventSink,
    ) -> Result<Message> {
        let message = read_message(envelope, None, true, sink)?;

        sink.emit(AdapterEvent::ResponseReceived {
            payload_len: payload_len(&message),
            header_count: message.headers().len(),
        });
        Ok(message)
    }
}

fn payload_len(message: &Message) -> usize {
    message.payload().as_text().map_or(0, str::len)
}

fn read_message(
    envelope: &dyn WebServiceMessage,
    properties: Option<&ContextProperties>,
    capture_mime: bool,
    sink: &dyn EventSink,
) -> Result<Message> {
    let mut builder = MessageBuilder::with_payload(envelope.payload_source()?);

    for (key, value) in properties.into_iter().flatten() {
        builder.insert_header(key.as_str(), value.as_str(), sink);
    }

    if let Some(soap) = envelope.as_soap() {
        read_soap_headers(soap, &mut builder, sink);

        match soap.attachments() {
            Some(attachments) => extract_attachments(attachments, &mut builder, sink),
            None => sink.emit(AdapterEvent::CapabilityMissing {
                capability: Capability::Attachments,
                header: None,
            }),
        }

        if capture_mime {
            read_mime_headers(soap, &mut builder, sink);
        }
    }

    Ok(builder.build())
}

fn read_soap_headers(soap: &dyn SoapMessage, builder: &mut MessageBuilder, sink: &dyn EventSink) {
    for element in soap.header_elements() {
        builder.insert_header(element.name.local_part(), element.text, sink);
    }

    if let Some(action) = soap.soap_action().and_then(normalize_soap_action) {
        builder.insert_header(SOAP_ACTION, action, sink);
    }
}

fn read_mime_headers(soap: &dyn SoapMessage, builder: &mut MessageBuilder, sink: &dyn EventSink) {
    let Some(headers) = soap.mime_headers() else {
        sink.emit(AdapterEvent::CapabilityMissing {
            capability: Capability::MimeHeaders,
            header: None,
        });
        return;
    };

    for (name, value) in merge_headers(headers.iter()) {
        builder.insert_header(format!("{}{}", HTTP_PREFIX, name), value, sink);
    }
}
