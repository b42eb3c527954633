//! The SOAP envelope adapter.
//!
//! Translation itself lives in [`inbound`](crate::inbound) and
//! [`outbound`](crate::outbound).

use crate::config::SoapAdapterConfig;
use std::collections::BTreeMap;

/// Properties of the exchange an inbound envelope arrived in.
pub type ContextProperties = BTreeMap<String, String>;

/// Translates between wire envelopes and [`Message`](crate::message::Message)s.
///
/// Holds read-only configuration only; one adapter may serve any number of
/// concurrent translations as long as each uses its own envelope.
#[derive(Debug, Clone, Default)]
pub struct SoapEnvelopeAdapter {
    config: SoapAdapterConfig,
}

impl SoapEnvelopeAdapter {
    pub fn new(config: SoapAdapterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SoapAdapterConfig {
        &self.config
    }
}
