//! Capability interface of wire envelopes.
//!
//! Translators only code against these traits. Optional capabilities are
//! exposed as `Option`s; an absent capability is reported as a warning and the
//! affected header class is skipped.

use crate::attachment::Attachment;
use crate::config::SoapVersion;
use crate::error::Result;
use crate::fault::SoapFault;
use crate::mime::MimeHeaders;
use crate::qname::QualifiedName;
use std::sync::Arc;
use xmltree::Element;

/// A SOAP header element as read from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapHeaderElement {
    pub name: QualifiedName,
    pub text: String,
}

/// Any message exchanged by a web service endpoint.
pub trait WebServiceMessage {
    /// Body payload serialized as XML, empty for an empty body.
    fn payload_source(&self) -> Result<String>;

    /// Replace the body payload.
    fn write_payload(&mut self, payload: Element) -> Result<()>;

    /// SOAP view of this message, if it has SOAP semantics.
    fn as_soap(&self) -> Option<&dyn SoapMessage> {
        None
    }

    fn as_soap_mut(&mut self) -> Option<&mut dyn SoapMessage> {
        None
    }
}

/// SOAP specific capabilities of a message.
pub trait SoapMessage {
    fn header_elements(&self) -> Vec<SoapHeaderElement>;

    /// Add a header element carrying `text`.
    fn add_header_element(&mut self, name: QualifiedName, text: &str);

    /// Graft already built header content into the SOAP header.
    fn add_header_content(&mut self, content: Element);

    /// SOAP action as found on the wire, quotes included.
    fn soap_action(&self) -> Option<&str>;

    fn set_soap_action(&mut self, action: &str);

    /// `None` if the implementation cannot access attachments.
    fn attachments(&self) -> Option<&[Arc<Attachment>]>;

    fn attachments_mut(&mut self) -> Option<&mut Vec<Arc<Attachment>>>;

    /// `None` if the implementation cannot access transport headers.
    fn mime_headers(&self) -> Option<&MimeHeaders>;

    fn mime_headers_mut(&mut self) -> Option<&mut MimeHeaders>;

    fn soap_body(&self) -> &dyn SoapBody;

    fn soap_body_mut(&mut self) -> &mut dyn SoapBody;
}

/// Body of a SOAP message.
pub trait SoapBody {
    /// Protocol version, `None` if neither SOAP 1.1 nor SOAP 1.2.
    fn version(&self) -> Option<SoapVersion>;

    /// Replace the body content with a fault.
    fn add_fault(&mut self, fault: SoapFault);
}
