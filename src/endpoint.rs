//! Web service endpoint: inbound translation, handler call, outbound
//! translation.

use crate::adapter::{ContextProperties, SoapEnvelopeAdapter};
use crate::config::{SoapAdapterConfig, SoapVersion};
use crate::envelope::WebServiceMessage;
use crate::error::Result;
use crate::events::{AdapterEvent, EventSink};
use crate::headers::SOAP_FAULT;
use crate::message::Message;

/// Handles request messages of an endpoint.
pub trait MessageHandler: Send + Sync {
    /// Produce the reply for `request`, `None` for no reply.
    fn handle_message(&self, request: Message) -> Option<Message>;

    /// Name used when reporting the handler.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> MessageHandler for F
where
    F: Fn(Message) -> Option<Message> + Send + Sync,
{
    fn handle_message(&self, request: Message) -> Option<Message> {
        self(request)
    }
}

/// Never replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResponseHandler;

impl MessageHandler for EmptyResponseHandler {
    fn handle_message(&self, _request: Message) -> Option<Message> {
        None
    }

    fn name(&self) -> &str {
        "EmptyResponseHandler"
    }
}

/// Replies with the request itself, optionally marked as fault.
#[derive(Debug, Clone, Default)]
pub struct EchoHandler {
    fault: Option<String>,
}

impl EchoHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo every request as fault described by `definition`.
    pub fn with_fault(definition: impl Into<String>) -> Self {
        Self {
            fault: Some(definition.into()),
        }
    }
}

impl MessageHandler for EchoHandler {
    fn handle_message(&self, request: Message) -> Option<Message> {
        match &self.fault {
            Some(definition) => Some(request.to_builder().header(SOAP_FAULT, definition.as_str()).build()),
            None => Some(request),
        }
    }

    fn name(&self) -> &str {
        "EchoHandler"
    }
}

/// Result of an endpoint invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The response envelope was written
    Replied,
    /// The handler gave no reply; the response envelope is untouched
    NoReply,
}

/// Endpoint dispatching translated requests to a [`MessageHandler`].
#[derive(Debug, Clone)]
pub struct WebServiceEndpoint<H = EmptyResponseHandler> {
    adapter: SoapEnvelopeAdapter,
    handler: H,
}

impl Default for WebServiceEndpoint {
    fn default() -> Self {
        Self::new(SoapAdapterConfig::default(), EmptyResponseHandler)
    }
}

impl<H: MessageHandler> WebServiceEndpoint<H> {
    pub fn new(config: SoapAdapterConfig, handler: H) -> Self {
        Self {
            adapter: SoapEnvelopeAdapter::new(config),
            handler,
        }
    }

    pub fn adapter(&self) -> &SoapEnvelopeAdapter {
        &self.adapter
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Version of reply envelopes for a request of `request_version`.
    ///
    /// The configured response version wins; SOAP 1.1 is used when neither is
    /// known.
    pub fn response_version(&self, request_version: Option<SoapVersion>) -> SoapVersion {
        self.adapter
            .config()
            .endpoint
            .response_version
            .or(request_version)
            .unwrap_or(SoapVersion::Soap11)
    }

    /// Process one request.
    ///
    /// The handler is called exactly once. A missing reply or a reply with an
    /// empty payload leaves `response` untouched.
    pub fn invoke(
        &self,
        request: &dyn WebServiceMessage,
        properties: &ContextProperties,
        response: &mut dyn WebServiceMessage,
        sink: &dyn EventSink,
    ) -> Result<InvocationOutcome> {
        let request = self.adapter.translate_inbound(request, properties, sink)?;

        let reply = match self.handler.handle_message(request) {
            Some(reply) if !reply.payload().is_empty() => reply,
            _ => {
                sink.emit(AdapterEvent::NoReply {
                    handler: self.handler.name().to_string(),
                });
                return Ok(InvocationOutcome::NoReply);
            }
        };

        sink.emit(AdapterEvent::ReplySending {
            fault: reply.fault_definition().is_some(),
            header_count: reply.headers().len(),
        });
        self.adapter.translate_outbound(&reply, response, sink)?;
        Ok(InvocationOutcome::Replied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::SoapMessage;
    use crate::events::MemorySink;
    use crate::message::Payload;
    use crate::xml_message::XmlSoapMessage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PING: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><ping/></soap:Body></soap:Envelope>"#;

    fn request() -> XmlSoapMessage {
        XmlSoapMessage::parse(PING.as_bytes()).unwrap()
    }

    #[test]
    fn test_empty_response_handler() {
        let sink = MemorySink::new();
        let endpoint = WebServiceEndpoint::default();
        let mut response = XmlSoapMessage::new(SoapVersion::Soap11);
        let untouched = response.clone();

        let outcome = endpoint
            .invoke(&request(), &ContextProperties::new(), &mut response, &sink)
            .unwrap();

        assert_eq!(outcome, InvocationOutcome::NoReply);
        assert_eq!(response, untouched);
        assert!(sink.warnings().contains(&AdapterEvent::NoReply {
            handler: "EmptyResponseHandler".to_string()
        }));
    }

    #[test]
    fn test_empty_payload_is_no_reply() {
        let sink = MemorySink::new();
        let handler = |request: Message| Some(request.to_builder().payload(Payload::Empty).build());
        let endpoint = WebServiceEndpoint::new(SoapAdapterConfig::default(), handler);
        let mut response = XmlSoapMessage::new(SoapVersion::Soap11);

        let outcome = endpoint
            .invoke(&request(), &ContextProperties::new(), &mut response, &sink)
            .unwrap();
        assert_eq!(outcome, InvocationOutcome::NoReply);
    }

    #[test]
    fn test_handler_called_once() {
        let calls = AtomicUsize::new(0);
        let handler = |request: Message| {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(request.to_builder().payload("<pong/>").build())
        };
        let endpoint = WebServiceEndpoint::new(SoapAdapterConfig::default(), handler);
        let mut response = XmlSoapMessage::new(SoapVersion::Soap11);

        let outcome = endpoint
            .invoke(&request(), &ContextProperties::new(), &mut response, &MemorySink::new())
            .unwrap();

        assert_eq!(outcome, InvocationOutcome::Replied);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.payload_source().unwrap(), "<pong/>");
    }

    #[test]
    fn test_echo_with_fault() {
        let sink = MemorySink::new();
        let endpoint = WebServiceEndpoint::new(
            SoapAdapterConfig::default(),
            EchoHandler::with_fault("CLIENT,rejected"),
        );
        let request = request().with_soap_action("\"urn:ping\"");
        let mut response = XmlSoapMessage::new(SoapVersion::Soap11);

        endpoint
            .invoke(&request, &ContextProperties::new(), &mut response, &sink)
            .unwrap();

        let fault = response.fault().unwrap();
        assert_eq!(fault.code().local_part(), "Client");
        assert_eq!(fault.detail().len(), 1);
        assert_eq!(response.soap_action(), Some("urn:ping"));
        assert!(sink.events().contains(&AdapterEvent::ReplySending {
            fault: true,
            header_count: 2,
        }));
    }

    #[test]
    fn test_response_version() {
        let endpoint = WebServiceEndpoint::default();
        assert_eq!(endpoint.response_version(None), SoapVersion::Soap11);
        assert_eq!(
            endpoint.response_version(Some(SoapVersion::Soap12)),
            SoapVersion::Soap12
        );

        let mut config = SoapAdapterConfig::default();
        config.endpoint.response_version = Some(SoapVersion::Soap12);
        let endpoint = WebServiceEndpoint::new(config, EchoHandler::new());
        assert_eq!(
            endpoint.response_version(Some(SoapVersion::Soap11)),
            SoapVersion::Soap12
        );
    }
}
