//! In-memory envelope backends.
//!
//! [`XmlSoapMessage`] implements every capability; MIME and attachment access
//! can be switched off to model envelope implementations without them.
//! [`PoxMessage`] carries plain XML without SOAP semantics.

use crate::attachment::Attachment;
use crate::config::SoapVersion;
use crate::envelope::{SoapBody, SoapHeaderElement, SoapMessage, WebServiceMessage};
use crate::error::{AdapterError, Result};
use crate::fault::SoapFault;
use crate::mime::MimeHeaders;
use crate::parser::parse_document;
use crate::qname::QualifiedName;
use crate::writer::{document_to_string, element_to_string};
use std::sync::Arc;
use xmltree::{Element, XMLNode};

/// Content of a SOAP body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BodyContent {
    #[default]
    Empty,
    Payload(Element),
    Fault(SoapFault),
}

/// Body of an [`XmlSoapMessage`].
#[derive(Debug, Clone, PartialEq)]
pub struct XmlSoapBody {
    version: Option<SoapVersion>,
    content: BodyContent,
}

impl SoapBody for XmlSoapBody {
    fn version(&self) -> Option<SoapVersion> {
        self.version
    }

    fn add_fault(&mut self, fault: SoapFault) {
        self.content = BodyContent::Fault(fault);
    }
}

/// A SOAP envelope held as element tree.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlSoapMessage {
    namespace: String,
    prefix: String,
    header: Option<Element>,
    body: XmlSoapBody,
    soap_action: Option<String>,
    mime_headers: Option<MimeHeaders>,
    attachments: Option<Vec<Arc<Attachment>>>,
}

impl XmlSoapMessage {
    /// An empty envelope of `version`.
    pub fn new(version: SoapVersion) -> Self {
        Self {
            namespace: version.namespace().to_string(),
            prefix: version.default_prefix().to_string(),
            header: None,
            body: XmlSoapBody {
                version: Some(version),
                content: BodyContent::Empty,
            },
            soap_action: None,
            mime_headers: Some(MimeHeaders::new()),
            attachments: Some(Vec::new()),
        }
    }

    /// Parse an envelope document.
    ///
    /// Envelopes in an unknown namespace are accepted; their body reports no
    /// version.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let root = parse_document(data)?;
        if root.name != "Envelope" {
            return Err(AdapterError::XmlParse(format!(
                "Expected SOAP Envelope, found '{}'",
                root.name
            )));
        }

        let namespace = root.namespace.clone().unwrap_or_default();
        let prefix = root.prefix.clone().unwrap_or_default();

        let mut header = None;
        let mut body = None;
        for child in root.children.iter().filter_map(XMLNode::as_element) {
            if child.namespace.as_deref().unwrap_or("") != namespace {
                continue;
            }
            match child.name.as_str() {
                "Header" if header.is_none() => header = Some(child.clone()),
                "Body" if body.is_none() => body = Some(child),
                _ => {}
            }
        }

        let body = body.ok_or_else(|| AdapterError::XmlParse("Missing SOAP Body".to_string()))?;
        let content = body
            .children
            .iter()
            .find_map(XMLNode::as_element)
            .map(|payload| BodyContent::Payload(payload.clone()))
            .unwrap_or_default();

        Ok(Self {
            body: XmlSoapBody {
                version: SoapVersion::from_namespace(&namespace),
                content,
            },
            namespace,
            prefix,
            header,
            soap_action: None,
            mime_headers: Some(MimeHeaders::new()),
            attachments: Some(Vec::new()),
        })
    }

    pub fn with_soap_action(mut self, action: impl Into<String>) -> Self {
        self.soap_action = Some(action.into());
        self
    }

    /// Add a transport header instance; ignored without MIME access.
    pub fn with_mime_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(headers) = self.mime_headers.as_mut() {
            headers.add_header(name, value);
        }
        self
    }

    /// Add an attachment; ignored without attachment access.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        if let Some(attachments) = self.attachments.as_mut() {
            attachments.push(Arc::new(attachment));
        }
        self
    }

    pub fn without_mime_access(mut self) -> Self {
        self.mime_headers = None;
        self
    }

    pub fn without_attachment_access(mut self) -> Self {
        self.attachments = None;
        self
    }

    pub fn version(&self) -> Option<SoapVersion> {
        self.body.version
    }

    pub fn envelope_namespace(&self) -> &str {
        &self.namespace
    }

    pub fn fault(&self) -> Option<&SoapFault> {
        match &self.body.content {
            BodyContent::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// The `Header` element, if any header content was read or added.
    pub fn header(&self) -> Option<&Element> {
        self.header.as_ref()
    }

    /// Serialize the whole envelope.
    pub fn to_xml(&self) -> Result<String> {
        let mut envelope = self.envelope_element("Envelope");
        if let Some(header) = self.header.as_ref().filter(|h| !h.children.is_empty()) {
            envelope.children.push(XMLNode::Element(header.clone()));
        }

        let mut body = self.envelope_element("Body");
        match &self.body.content {
            BodyContent::Empty => {}
            BodyContent::Payload(payload) => body.children.push(XMLNode::Element(payload.clone())),
            BodyContent::Fault(fault) => body
                .children
                .push(XMLNode::Element(fault.to_element(&self.prefix))),
        }
        envelope.children.push(XMLNode::Element(body));

        document_to_string(&envelope)
    }

    fn envelope_element(&self, name: &str) -> Element {
        envelope_element(&self.namespace, &self.prefix, name)
    }

    fn header_mut(&mut self) -> &mut Element {
        let (namespace, prefix) = (&self.namespace, &self.prefix);
        self.header
            .get_or_insert_with(|| envelope_element(namespace, prefix, "Header"))
    }
}

fn envelope_element(namespace: &str, prefix: &str, name: &str) -> Element {
    let mut element = Element::new(name);
    if !namespace.is_empty() {
        element.namespace = Some(namespace.to_string());
    }
    if !prefix.is_empty() {
        element.prefix = Some(prefix.to_string());
    }
    element
}

impl WebServiceMessage for XmlSoapMessage {
    fn payload_source(&self) -> Result<String> {
        match &self.body.content {
            BodyContent::Empty => Ok(String::new()),
            BodyContent::Payload(payload) => element_to_string(payload),
            BodyContent::Fault(fault) => element_to_string(&fault.to_element(&self.prefix)),
        }
    }

    fn write_payload(&mut self, payload: Element) -> Result<()> {
        self.body.content = BodyContent::Payload(payload);
        Ok(())
    }

    fn as_soap(&self) -> Option<&dyn SoapMessage> {
        Some(self)
    }

    fn as_soap_mut(&mut self) -> Option<&mut dyn SoapMessage> {
        Some(self)
    }
}

impl SoapMessage for XmlSoapMessage {
    fn header_elements(&self) -> Vec<SoapHeaderElement> {
        let Some(header) = &self.header else {
            return Vec::new();
        };
        header
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .map(|element| SoapHeaderElement {
                name: QualifiedName::new(
                    element.namespace.clone().unwrap_or_default(),
                    element.name.clone(),
                    element.prefix.clone().unwrap_or_default(),
                ),
                text: element
                    .get_text()
                    .map(|text| text.into_owned())
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn add_header_element(&mut self, name: QualifiedName, text: &str) {
        let mut element = Element::new(name.local_part());
        if name.has_namespace() {
            element.namespace = Some(name.namespace().to_string());
        }
        if !name.prefix().is_empty() {
            element.prefix = Some(name.prefix().to_string());
        }
        element.children.push(XMLNode::Text(text.to_string()));
        self.header_mut().children.push(XMLNode::Element(element));
    }

    fn add_header_content(&mut self, content: Element) {
        let is_header = content.name == "Header"
            && content.namespace.as_deref().unwrap_or("") == self.namespace;
        let header = self.header_mut();
        if is_header {
            header.children.extend(content.children);
        } else {
            header.children.push(XMLNode::Element(content));
        }
    }

    fn soap_action(&self) -> Option<&str> {
        self.soap_action.as_deref()
    }

    fn set_soap_action(&mut self, action: &str) {
        self.soap_action = Some(action.to_string());
    }

    fn attachments(&self) -> Option<&[Arc<Attachment>]> {
        self.attachments.as_deref()
    }

    fn attachments_mut(&mut self) -> Option<&mut Vec<Arc<Attachment>>> {
        self.attachments.as_mut()
    }

    fn mime_headers(&self) -> Option<&MimeHeaders> {
        self.mime_headers.as_ref()
    }

    fn mime_headers_mut(&mut self) -> Option<&mut MimeHeaders> {
        self.mime_headers.as_mut()
    }

    fn soap_body(&self) -> &dyn SoapBody {
        &self.body
    }

    fn soap_body_mut(&mut self) -> &mut dyn SoapBody {
        &mut self.body
    }
}

/// Plain old XML message without SOAP semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoxMessage {
    payload: Option<Element>,
}

impl PoxMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self {
            payload: Some(parse_document(data)?),
        })
    }

    pub fn payload(&self) -> Option<&Element> {
        self.payload.as_ref()
    }
}

impl WebServiceMessage for PoxMessage {
    fn payload_source(&self) -> Result<String> {
        match &self.payload {
            Some(payload) => element_to_string(payload),
            None => Ok(String::new()),
        }
    }

    fn write_payload(&mut self, payload: Element) -> Result<()> {
        self.payload = Some(payload);
        Ok(())
    }
}
