//! Serialization of element trees with quick-xml.
//!
//! Declarations written on an element are kept. Namespaces inherited from
//! ancestors are declared only where an element name or a prefixed attribute
//! uses them, at the outermost element that needs them.

use crate::error::{AdapterError, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::BTreeMap;
use std::io::Write;
use xmltree::{Element, XMLNode};

type Scope = BTreeMap<String, String>;

/// Serialize an element subtree without XML declaration.
pub fn element_to_string(element: &Element) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element, &Scope::new())?;
    into_string(writer)
}

/// Serialize a complete document with XML declaration.
pub fn document_to_string(root: &Element) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write_element(&mut writer, root, &Scope::new())?;
    into_string(writer)
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| AdapterError::PayloadTransform(format!("Invalid UTF-8 output: {}", e)))
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| AdapterError::PayloadTransform(e.to_string()))
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element, parent: &Scope) -> Result<()> {
    let mut scope = parent.clone();
    let mut declarations = Vec::new();

    let mut attributes: Vec<(&str, &str)> = element
        .attributes
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    attributes.sort();

    for (name, value) in &attributes {
        if let Some(declared_prefix) = declared_prefix(name) {
            declare(declared_prefix, value, &mut scope, &mut declarations);
        }
    }

    let prefix = element.prefix.as_deref().unwrap_or("");
    let uri = element.namespace.as_deref().unwrap_or("");
    if !(uri.is_empty() && !prefix.is_empty()) {
        declare(prefix, uri, &mut scope, &mut declarations);
    }

    for (name, _) in &attributes {
        let Some((attribute_prefix, _)) = name.split_once(':') else {
            continue;
        };
        let bound = element
            .namespaces
            .as_ref()
            .and_then(|namespaces| namespaces.get(attribute_prefix));
        if let Some(bound) = bound {
            declare(attribute_prefix, bound, &mut scope, &mut declarations);
        }
    }

    let name = if prefix.is_empty() {
        element.name.clone()
    } else {
        format!("{}:{}", prefix, element.name)
    };

    let mut start = BytesStart::new(name.as_str());
    for (declared_prefix, declared_uri) in &declarations {
        if declared_prefix.is_empty() {
            start.push_attribute(("xmlns", declared_uri.as_str()));
        } else {
            let key = format!("xmlns:{}", declared_prefix);
            start.push_attribute((key.as_str(), declared_uri.as_str()));
        }
    }
    for (attribute_name, value) in &attributes {
        if declared_prefix(attribute_name).is_none() {
            start.push_attribute((*attribute_name, *value));
        }
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            XMLNode::Element(child) => write_element(writer, child, &scope)?,
            XMLNode::Text(text) => emit(writer, Event::Text(BytesText::new(text)))?,
            XMLNode::CData(data) => emit(writer, Event::CData(BytesCData::new(data.as_str())))?,
            XMLNode::Comment(comment) => {
                emit(writer, Event::Comment(BytesText::from_escaped(comment.as_str())))?
            }
            XMLNode::ProcessingInstruction(target, data) => {
                let content = match data {
                    Some(data) => format!("{} {}", target, data),
                    None => target.clone(),
                };
                emit(writer, Event::PI(BytesPI::new(content)))?
            }
        }
    }
    emit(writer, Event::End(BytesEnd::new(name.as_str())))
}

/// Prefix bound by an `xmlns` or `xmlns:p` attribute.
fn declared_prefix(attribute: &str) -> Option<&str> {
    match attribute {
        "xmlns" => Some(""),
        other => other.strip_prefix("xmlns:"),
    }
}

fn declare(prefix: &str, uri: &str, scope: &mut Scope, declarations: &mut Vec<(String, String)>) {
    if prefix == "xml" || prefix == "xmlns" {
        return;
    }
    let current = scope.get(prefix).map(String::as_str).unwrap_or("");
    if current == uri {
        return;
    }
    scope.insert(prefix.to_string(), uri.to_string());
    declarations.push((prefix.to_string(), uri.to_string()));
}
