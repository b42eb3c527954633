//! SOAP fault definitions and their rendering for SOAP 1.1 and SOAP 1.2.

use crate::config::SoapVersion;
use crate::envelope::SoapBody;
use crate::error::{AdapterError, Result};
use crate::parser::parse_fragment;
use crate::qname::QualifiedName;
use std::str::FromStr;
use xmltree::{Element, XMLNode};

/// Locale of the fault reason if the definition names none.
pub const DEFAULT_FAULT_LOCALE: &str = "en";

/// Fault code of a fault definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultCode {
    Server,
    Receiver,
    Client,
    Sender,
    Custom(QualifiedName),
}

impl FaultCode {
    /// Parse a fault code token.
    ///
    /// The well-known codes are matched exactly (`SERVER`, `RECEIVER`,
    /// `CLIENT`, `SENDER`). A `{namespace}localPart` token becomes a namespaced
    /// custom code; any other token is used literally as local part.
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "SERVER" => Ok(Self::Server),
            "RECEIVER" => Ok(Self::Receiver),
            "CLIENT" => Ok(Self::Client),
            "SENDER" => Ok(Self::Sender),
            _ if token.starts_with('{') => QualifiedName::parse(token)
                .map(Self::Custom)
                .map_err(|e| AdapterError::invalid_fault(token, e.to_string())),
            _ => Ok(Self::Custom(QualifiedName::local(token))),
        }
    }
}

/// Parsed fault marker value `code,reason[,locale]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultDefinition {
    pub code: FaultCode,
    pub reason: String,
    pub locale: String,
}

impl FaultDefinition {
    pub fn parse(definition: &str) -> Result<Self> {
        let tokens: Vec<&str> = definition.split(',').map(str::trim).collect();
        if tokens.len() > 3 {
            return Err(AdapterError::invalid_fault(
                definition,
                "expected 'code,reason[,locale]'",
            ));
        }

        let code = match tokens[0] {
            "" => return Err(AdapterError::invalid_fault(definition, "missing fault code")),
            code => FaultCode::parse(code)?,
        };
        let reason = match tokens.get(1) {
            Some(reason) if !reason.is_empty() => reason.to_string(),
            _ => return Err(AdapterError::invalid_fault(definition, "missing fault reason")),
        };
        let locale = tokens
            .get(2)
            .filter(|locale| !locale.is_empty())
            .map(|locale| locale.replace('_', "-"))
            .unwrap_or_else(|| DEFAULT_FAULT_LOCALE.to_string());

        Ok(Self {
            code,
            reason,
            locale,
        })
    }
}

impl FromStr for FaultDefinition {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A SOAP fault ready to be placed in a body.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapFault {
    version: SoapVersion,
    code: QualifiedName,
    subcodes: Vec<QualifiedName>,
    reason: String,
    locale: String,
    detail: Vec<Element>,
}

impl SoapFault {
    pub fn new(
        version: SoapVersion,
        code: QualifiedName,
        reason: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            version,
            code,
            subcodes: Vec::new(),
            reason: reason.into(),
            locale: locale.into(),
            detail: Vec::new(),
        }
    }

    /// `Server` fault in SOAP 1.1, `Receiver` fault in SOAP 1.2.
    pub fn receiver(version: SoapVersion, reason: impl Into<String>, locale: impl Into<String>) -> Self {
        let local_part = match version {
            SoapVersion::Soap11 => "Server",
            SoapVersion::Soap12 => "Receiver",
        };
        Self::new(
            version,
            QualifiedName::new(version.namespace(), local_part, ""),
            reason,
            locale,
        )
    }

    /// `Client` fault in SOAP 1.1, `Sender` fault in SOAP 1.2.
    pub fn sender(version: SoapVersion, reason: impl Into<String>, locale: impl Into<String>) -> Self {
        let local_part = match version {
            SoapVersion::Soap11 => "Client",
            SoapVersion::Soap12 => "Sender",
        };
        Self::new(
            version,
            QualifiedName::new(version.namespace(), local_part, ""),
            reason,
            locale,
        )
    }

    /// Append a subcode. Only rendered for SOAP 1.2.
    pub fn add_subcode(&mut self, subcode: QualifiedName) {
        self.subcodes.push(subcode);
    }

    pub fn add_detail_entry(&mut self, entry: Element) {
        self.detail.push(entry);
    }

    pub fn version(&self) -> SoapVersion {
        self.version
    }

    pub fn code(&self) -> &QualifiedName {
        &self.code
    }

    pub fn subcodes(&self) -> &[QualifiedName] {
        &self.subcodes
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn detail(&self) -> &[Element] {
        &self.detail
    }

    /// Render the `Fault` element using `envelope_prefix` for envelope names.
    pub fn to_element(&self, envelope_prefix: &str) -> Element {
        let names = EnvelopeNames {
            namespace: self.version.namespace(),
            prefix: envelope_prefix,
        };
        match self.version {
            SoapVersion::Soap11 => self.to_soap11_element(&names),
            SoapVersion::Soap12 => self.to_soap12_element(&names),
        }
    }

    fn to_soap11_element(&self, names: &EnvelopeNames<'_>) -> Element {
        let mut fault = names.element("Fault");
        let mut generated = 0;

        let mut faultcode = Element::new("faultcode");
        let code = names.qname_text(&self.code, &mut faultcode, &mut generated);
        faultcode.children.push(XMLNode::Text(code));
        fault.children.push(XMLNode::Element(faultcode));

        let mut faultstring = Element::new("faultstring");
        faultstring
            .attributes
            .insert("xml:lang".to_string(), self.locale.clone());
        faultstring.children.push(XMLNode::Text(self.reason.clone()));
        fault.children.push(XMLNode::Element(faultstring));

        if !self.detail.is_empty() {
            let mut detail = Element::new("detail");
            detail
                .children
                .extend(self.detail.iter().cloned().map(XMLNode::Element));
            fault.children.push(XMLNode::Element(detail));
        }

        fault
    }

    fn to_soap12_element(&self, names: &EnvelopeNames<'_>) -> Element {
        let mut fault = names.element("Fault");
        let mut generated = 0;

        // Subcodes nest, so build them from the innermost outwards.
        let mut nested: Option<Element> = None;
        for subcode in self.subcodes.iter().rev() {
            let mut element = names.element("Subcode");
            element
                .children
                .push(XMLNode::Element(names.value_element(subcode, &mut generated)));
            if let Some(inner) = nested.take() {
                element.children.push(XMLNode::Element(inner));
            }
            nested = Some(element);
        }

        let mut code = names.element("Code");
        code.children
            .push(XMLNode::Element(names.value_element(&self.code, &mut generated)));
        if let Some(subcode) = nested {
            code.children.push(XMLNode::Element(subcode));
        }
        fault.children.push(XMLNode::Element(code));

        let mut text = names.element("Text");
        text.attributes
            .insert("xml:lang".to_string(), self.locale.clone());
        text.children.push(XMLNode::Text(self.reason.clone()));
        let mut reason = names.element("Reason");
        reason.children.push(XMLNode::Element(text));
        fault.children.push(XMLNode::Element(reason));

        if !self.detail.is_empty() {
            let mut detail = names.element("Detail");
            detail
                .children
                .extend(self.detail.iter().cloned().map(XMLNode::Element));
            fault.children.push(XMLNode::Element(detail));
        }

        fault
    }
}

struct EnvelopeNames<'a> {
    namespace: &'a str,
    prefix: &'a str,
}

impl EnvelopeNames<'_> {
    fn element(&self, name: &str) -> Element {
        let mut element = Element::new(name);
        element.namespace = Some(self.namespace.to_string());
        if !self.prefix.is_empty() {
            element.prefix = Some(self.prefix.to_string());
        }
        element
    }

    fn value_element(&self, name: &QualifiedName, generated: &mut usize) -> Element {
        let mut value = self.element("Value");
        let text = self.qname_text(name, &mut value, generated);
        value.children.push(XMLNode::Text(text));
        value
    }

    /// Text form of a QName valued element, declaring a foreign namespace on
    /// `holder` when needed.
    fn qname_text(&self, name: &QualifiedName, holder: &mut Element, generated: &mut usize) -> String {
        if !name.has_namespace() {
            return name.local_part().to_string();
        }
        if name.namespace() == self.namespace {
            if self.prefix.is_empty() {
                return name.local_part().to_string();
            }
            return format!("{}:{}", self.prefix, name.local_part());
        }

        let prefix = if name.prefix().is_empty() {
            let prefix = format!("ns{}", generated);
            *generated += 1;
            prefix
        } else {
            name.prefix().to_string()
        };
        holder.attributes.insert(
            format!("xmlns:{}", prefix),
            name.namespace().to_string(),
        );
        format!("{}:{}", prefix, name.local_part())
    }
}

/// Build the fault described by `definition` into `body`.
///
/// A non-blank `detail` is parsed and becomes the single detail entry.
pub fn build_fault(definition: &str, detail: Option<&str>, body: &mut dyn SoapBody) -> Result<()> {
    let definition = FaultDefinition::parse(definition)?;
    let detail = detail
        .filter(|detail| !detail.trim().is_empty())
        .map(parse_fragment)
        .transpose()?;
    let fault = prepare_fault(&definition, body.version(), detail)?;
    body.add_fault(fault);
    Ok(())
}

/// Construct a fault without touching any body.
pub(crate) fn prepare_fault(
    definition: &FaultDefinition,
    version: Option<SoapVersion>,
    detail: Option<Element>,
) -> Result<SoapFault> {
    let version = version.ok_or_else(|| {
        AdapterError::UnsupportedProtocolVersion("body is neither SOAP 1.1 nor SOAP 1.2".to_string())
    })?;

    let reason = definition.reason.as_str();
    let locale = definition.locale.as_str();
    let mut fault = match (&definition.code, version) {
        (FaultCode::Server | FaultCode::Receiver, _) => SoapFault::receiver(version, reason, locale),
        (FaultCode::Client | FaultCode::Sender, _) => SoapFault::sender(version, reason, locale),
        (FaultCode::Custom(code), SoapVersion::Soap11) => {
            SoapFault::new(version, code.clone(), reason, locale)
        }
        (FaultCode::Custom(code), SoapVersion::Soap12) => {
            let mut fault = SoapFault::receiver(version, reason, locale);
            fault.add_subcode(code.clone());
            fault
        }
    };

    if let Some(detail) = detail {
        fault.add_detail_entry(detail);
    }
    Ok(fault)
}
