//! XML parsing utilities.
//!
//! Documents are read with quick-xml into an `xmltree` element tree. DOCTYPE
//! declarations are rejected. Attribute keys keep their qualified name
//! (`xsi:nil`, `xmlns:wsu`) and every element records the namespace bindings
//! in scope, so a parsed subtree serializes back with its prefixes intact.
//!
//! Whitespace-only text is kept in leaf elements (`<a> </a>`) and dropped
//! between child elements, where it is only indentation.

use crate::error::{AdapterError, Result};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use xmltree::{Element, Namespace, XMLNode};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parse a complete envelope document.
pub fn parse_document(data: &[u8]) -> Result<Element> {
    let text = std::str::from_utf8(data)
        .map_err(|e| AdapterError::XmlParse(format!("Invalid UTF-8: {}", e)))?;
    build_tree(text)
}

/// Parse a payload, detail or header fragment with a single root element.
pub fn parse_fragment(text: &str) -> Result<Element> {
    build_tree(text).map_err(|e| match e {
        AdapterError::XmlParse(message) => AdapterError::PayloadTransform(message),
        other => other,
    })
}

fn build_tree(text: &str) -> Result<Element> {
    let mut reader = Reader::from_str(text);
    let mut builder = TreeBuilder::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            AdapterError::XmlParse(format!(
                "XML parse error at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;
        match event {
            Event::DocType(_) => {
                return Err(AdapterError::XmlParse(
                    "DOCTYPE declarations are not allowed".to_string(),
                ));
            }
            Event::Start(start) => {
                let element = builder.open_element(&start)?;
                builder.open.push(element);
            }
            Event::Empty(start) => {
                let element = builder.open_element(&start)?;
                builder.close_element(element)?;
            }
            Event::End(_) => {
                let element = builder.open.pop().ok_or_else(|| {
                    AdapterError::XmlParse("Unexpected closing tag".to_string())
                })?;
                builder.close_element(element)?;
            }
            Event::Text(content) => {
                let content = content.xml_content().map_err(xml_error)?;
                builder.push_text(&content)?;
            }
            Event::GeneralRef(reference) => builder.push_text(&resolve_reference(&reference)?)?,
            Event::CData(data) => {
                let data = data.decode().map_err(xml_error)?.into_owned();
                builder.push_node(XMLNode::CData(data));
            }
            Event::Comment(comment) => {
                let comment = comment.decode().map_err(xml_error)?.into_owned();
                builder.push_node(XMLNode::Comment(comment));
            }
            Event::PI(instruction) => {
                let target = utf8(instruction.target())?.to_string();
                let data = utf8(instruction.content())?.trim_start();
                let data = (!data.is_empty()).then(|| data.to_string());
                builder.push_node(XMLNode::ProcessingInstruction(target, data));
            }
            Event::Decl(_) => {}
            Event::Eof => break,
        }
    }

    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    open: Vec<Element>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn open_element(&self, start: &BytesStart<'_>) -> Result<Element> {
        let mut scope = self
            .open
            .last()
            .and_then(|parent| parent.namespaces.clone())
            .unwrap_or_else(Namespace::empty);

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute
                .map_err(|e| AdapterError::XmlParse(format!("Invalid attribute: {}", e)))?;
            let key = utf8(attribute.key.as_ref())?.to_string();
            let value = attribute.unescape_value().map_err(xml_error)?.into_owned();
            if key == "xmlns" {
                scope.0.insert(String::new(), value.clone());
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                scope.0.insert(prefix.to_string(), value.clone());
            }
            attributes.push((key, value));
        }

        for (key, _) in &attributes {
            if let Some((prefix, _)) = key.split_once(':') {
                if prefix != "xmlns" {
                    resolve_prefix(&scope, prefix)?;
                }
            }
        }

        let name = start.name();
        let (local_name, prefix) = name.decompose();
        let prefix = prefix.map(|prefix| utf8(prefix.into_inner())).transpose()?;

        let mut element = Element::new(utf8(local_name.into_inner())?);
        element.namespace = resolve_prefix(&scope, prefix.unwrap_or(""))?;
        element.prefix = prefix.map(str::to_string);
        element.attributes.extend(attributes);
        element.namespaces = Some(scope);
        Ok(element)
    }

    fn close_element(&mut self, mut element: Element) -> Result<()> {
        if element.children.iter().any(|child| matches!(child, XMLNode::Element(_))) {
            element
                .children
                .retain(|child| !matches!(child, XMLNode::Text(text) if text.trim().is_empty()));
        }

        match self.open.last_mut() {
            Some(parent) => parent.children.push(XMLNode::Element(element)),
            None if self.root.is_none() => self.root = Some(element),
            None => {
                return Err(AdapterError::XmlParse(
                    "Multiple root elements".to_string(),
                ))
            }
        }
        Ok(())
    }

    /// Append text, merging with a preceding text node.
    fn push_text(&mut self, text: &str) -> Result<()> {
        let Some(parent) = self.open.last_mut() else {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(AdapterError::XmlParse(
                "Text outside of the root element".to_string(),
            ));
        };
        if text.is_empty() {
            return Ok(());
        }
        match parent.children.last_mut() {
            Some(XMLNode::Text(existing)) => existing.push_str(text),
            _ => parent.children.push(XMLNode::Text(text.to_string())),
        }
        Ok(())
    }

    /// Comments and processing instructions outside the root are dropped.
    fn push_node(&mut self, node: XMLNode) {
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(node);
        }
    }

    fn finish(self) -> Result<Element> {
        if let Some(unclosed) = self.open.last() {
            return Err(AdapterError::XmlParse(format!(
                "Unclosed element '{}'",
                unclosed.name
            )));
        }
        self.root
            .ok_or_else(|| AdapterError::XmlParse("No root element".to_string()))
    }
}

fn resolve_prefix(scope: &Namespace, prefix: &str) -> Result<Option<String>> {
    if prefix == "xml" {
        return Ok(Some(XML_NAMESPACE.to_string()));
    }
    match scope.get(prefix).filter(|uri| !uri.is_empty()) {
        Some(uri) => Ok(Some(uri.to_string())),
        None if prefix.is_empty() => Ok(None),
        None => Err(AdapterError::XmlParse(format!(
            "Unbound namespace prefix '{}'",
            prefix
        ))),
    }
}

fn resolve_reference(reference: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = reference.resolve_char_ref().map_err(xml_error)? {
        return Ok(ch.to_string());
    }
    let name = reference.decode().map_err(xml_error)?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| AdapterError::XmlParse(format!("Unknown entity '&{};'", name)))
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| AdapterError::XmlParse(format!("Invalid UTF-8: {}", e)))
}

fn xml_error(error: impl std::fmt::Display) -> AdapterError {
    AdapterError::XmlParse(error.to_string())
}

/// Normalize a wire SOAP action.
///
/// `""` becomes an empty action, a quoted action loses its quotes and
/// anything else is kept verbatim. Blank actions yield `None`.
pub fn normalize_soap_action(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    if raw == "\"\"" {
        return Some(String::new());
    }
    match raw
        .strip_prefix('"')
        .and_then(|unquoted| unquoted.strip_suffix('"'))
    {
        Some(unquoted) => Some(unquoted.to_string()),
        None => Some(raw.to_string()),
    }
}
