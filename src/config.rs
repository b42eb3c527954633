//! Configuration types for the SOAP envelope adapter.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};

/// SOAP 1.1 envelope namespace.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.2 envelope namespace.
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Main configuration for the adapter.
///
/// Set once when the adapter is constructed and only read afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoapAdapterConfig {
    /// Config version
    pub version: String,

    /// SOAP header rendering
    pub headers: HeaderConfig,

    /// Transport (MIME) header handling
    pub mime: MimeConfig,

    /// Endpoint settings
    pub endpoint: EndpointConfig,
}

impl Default for SoapAdapterConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            headers: HeaderConfig::default(),
            mime: MimeConfig::default(),
            endpoint: EndpointConfig::default(),
        }
    }
}

impl SoapAdapterConfig {
    /// Parse a configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| AdapterError::Config(e.to_string()))
    }
}

/// Default qualified name parts for outbound SOAP header elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Namespace used for header keys that carry none
    pub default_namespace: Option<String>,

    /// Prefix used together with the default namespace
    pub default_prefix: String,
}

impl HeaderConfig {
    /// The default namespace, treating an empty string as unset.
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref().filter(|ns| !ns.is_empty())
    }
}

/// Transport header settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MimeConfig {
    /// Copy transport headers of inbound requests into the message
    pub handle_mime_headers: bool,
}

/// Endpoint settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// SOAP version of reply envelopes (defaults to the request version)
    pub response_version: Option<SoapVersion>,
}

/// SOAP versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoapVersion {
    /// SOAP 1.1 (namespace: http://schemas.xmlsoap.org/soap/envelope/)
    #[serde(rename = "1.1")]
    Soap11,
    /// SOAP 1.2 (namespace: http://www.w3.org/2003/05/soap-envelope)
    #[serde(rename = "1.2")]
    Soap12,
}

impl SoapVersion {
    /// Envelope namespace URI of this version.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_11_NS,
            Self::Soap12 => SOAP_12_NS,
        }
    }

    /// Detect the version from an envelope namespace URI.
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        match namespace {
            SOAP_11_NS => Some(Self::Soap11),
            SOAP_12_NS => Some(Self::Soap12),
            _ => None,
        }
    }

    /// Prefix used for envelopes created from scratch.
    pub fn default_prefix(&self) -> &'static str {
        match self {
            Self::Soap11 => "SOAP-ENV",
            Self::Soap12 => "env",
        }
    }

    /// Content type of a message body in this version.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Soap11 => "text/xml; charset=utf-8",
            Self::Soap12 => "application/soap+xml; charset=utf-8",
        }
    }
}
