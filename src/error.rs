//! Error types for the SOAP envelope adapter.

use thiserror::Error;

/// Errors raised while translating between envelopes and messages.
///
/// Every variant is fatal for the call that produced it. Capability gaps and
/// skipped attachments are reported as [`AdapterEvent`](crate::events::AdapterEvent)s
/// instead.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Payload transformation error: {0}")]
    PayloadTransform(String),

    #[error("Unsupported payload type '{0}': supported types are XML text or a parsed document")]
    UnsupportedPayloadType(&'static str),

    #[error("Failed to add SOAP header '{key}': {reason}")]
    InvalidQName { key: String, reason: String },

    #[error("Invalid SOAP fault definition '{definition}': {reason}")]
    InvalidFaultDefinition { definition: String, reason: String },

    #[error("Unsupported SOAP implementation: {0}. Use SOAP 1.1 or SOAP 1.2")]
    UnsupportedProtocolVersion(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    pub(crate) fn invalid_qname(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidQName {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_fault(definition: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFaultDefinition {
            definition: definition.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`AdapterError`].
pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_qname_message() {
        let err = AdapterError::invalid_qname("not a qname", "no default namespace-uri is set");
        assert_eq!(
            err.to_string(),
            "Failed to add SOAP header 'not a qname': no default namespace-uri is set"
        );
    }

    #[test]
    fn test_unsupported_version_message() {
        let err = AdapterError::UnsupportedProtocolVersion("urn:custom:envelope".to_string());
        assert!(err.to_string().contains("Use SOAP 1.1 or SOAP 1.2"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AdapterError = io.into();
        assert!(matches!(err, AdapterError::Io(_)));
    }
}
