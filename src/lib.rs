//! SOAP envelope adapter
//!
//! Translates between wire-level SOAP/MIME envelopes and an internal message
//! made of a payload and an ordered header map.
//!
//! # Features
//!
//! - SOAP header elements, SOAP action and transport headers mapped to message headers
//! - Repeated transport headers merged into comma-joined values
//! - Attachments exposed by content-id
//! - Qualified names for outbound header keys, with configurable defaults
//! - SOAP 1.1 and SOAP 1.2 faults built from `code,reason[,locale]` definitions
//! - Capability gaps of envelope implementations reported as warnings
//!
//! # Example
//!
//! ```ignore
//! use soap_envelope_adapter::{
//!     ContextProperties, EchoHandler, SoapAdapterConfig, TracingSink, WebServiceEndpoint,
//!     XmlSoapMessage,
//! };
//!
//! let endpoint = WebServiceEndpoint::new(SoapAdapterConfig::default(), EchoHandler::new());
//! let request = XmlSoapMessage::parse(body.as_bytes())?;
//! let mut response = XmlSoapMessage::new(endpoint.response_version(request.version()));
//! endpoint.invoke(&request, &ContextProperties::new(), &mut response, &TracingSink)?;
//! println!("{}", response.to_xml()?);
//! ```

pub mod adapter;
pub mod attachment;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod events;
pub mod fault;
pub mod headers;
pub mod inbound;
pub mod message;
pub mod mime;
pub mod outbound;
pub mod parser;
pub mod qname;
pub mod writer;
pub mod xml_message;

pub use adapter::{ContextProperties, SoapEnvelopeAdapter};
pub use attachment::Attachment;
pub use config::{SoapAdapterConfig, SoapVersion};
pub use endpoint::{EchoHandler, EmptyResponseHandler, InvocationOutcome, MessageHandler, WebServiceEndpoint};
pub use envelope::{SoapBody, SoapMessage, WebServiceMessage};
pub use error::{AdapterError, Result};
pub use events::{AdapterEvent, EventSink, MemorySink, TracingSink};
pub use fault::{build_fault, FaultDefinition, SoapFault};
pub use message::{Message, MessageBuilder, Payload};
pub use qname::QualifiedName;
pub use xml_message::{PoxMessage, XmlSoapMessage};
