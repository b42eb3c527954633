//! Qualified names for SOAP header elements and fault codes.

use crate::error::{AdapterError, Result};
use std::fmt;
use std::str::FromStr;

/// A `(namespace, local part, prefix)` triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    namespace: String,
    local_part: String,
    prefix: String,
}

impl QualifiedName {
    pub fn new(
        namespace: impl Into<String>,
        local_part: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            local_part: local_part.into(),
            prefix: prefix.into(),
        }
    }

    /// A name without namespace or prefix.
    pub fn local(local_part: impl Into<String>) -> Self {
        Self::new("", local_part, "")
    }

    /// Parse `{namespace}localPart`, `prefix:localPart` or `localPart`.
    pub fn parse(text: &str) -> Result<Self> {
        if let Some(rest) = text.strip_prefix('{') {
            let (namespace, local_part) = rest
                .split_once('}')
                .ok_or_else(|| AdapterError::invalid_qname(text, "unterminated namespace"))?;
            check_ncname(text, local_part)?;
            return Ok(Self::new(namespace, local_part, ""));
        }

        match text.split_once(':') {
            Some((prefix, local_part)) => {
                check_ncname(text, prefix)?;
                check_ncname(text, local_part)?;
                Ok(Self::new("", local_part, prefix))
            }
            None => {
                check_ncname(text, text)?;
                Ok(Self::local(text))
            }
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn has_namespace(&self) -> bool {
        !self.namespace.is_empty()
    }

    /// Element name as written on the wire (`prefix:localPart` or `localPart`).
    pub fn prefixed_name(&self) -> String {
        if self.prefix.is_empty() {
            self.local_part.clone()
        } else {
            format!("{}:{}", self.prefix, self.local_part)
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local_part)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_part)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Resolve a header key into the qualified name of a SOAP header element.
///
/// Keys carrying a namespace are used as they are. Otherwise the default
/// namespace is applied, keeping a prefix given in the key and falling back
/// to `default_prefix`.
///
/// A key whose local part is not an XML name (`"not a qname"`) is rejected
/// even when a default namespace is set: no well-formed header element could
/// carry that name.
pub fn resolve(
    key: &str,
    default_namespace: Option<&str>,
    default_prefix: &str,
) -> Result<QualifiedName> {
    let parsed = QualifiedName::parse(key)?;
    if parsed.has_namespace() {
        return Ok(parsed);
    }

    match default_namespace.filter(|ns| !ns.is_empty()) {
        Some(namespace) => {
            let prefix = if parsed.prefix.is_empty() {
                default_prefix
            } else {
                parsed.prefix.as_str()
            };
            Ok(QualifiedName::new(namespace, parsed.local_part, prefix))
        }
        None => Err(AdapterError::invalid_qname(
            key,
            "neither valid QName nor default namespace-uri is set",
        )),
    }
}

fn check_ncname(key: &str, part: &str) -> Result<()> {
    if is_ncname(part) {
        Ok(())
    } else {
        Err(AdapterError::invalid_qname(
            key,
            format!("'{}' is not a valid XML name", part),
        ))
    }
}

fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
