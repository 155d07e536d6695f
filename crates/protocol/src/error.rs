//! Fehlertypen des Protokoll-Crates

use thiserror::Error;

/// Fehler beim Kodieren oder Dekodieren von Envelopes
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Envelope oder eingebetteter Payload ist strukturell ungueltig
    #[error("Ungueltiges Envelope: {0}")]
    MalformedEnvelope(String),

    /// Serialisierung fehlgeschlagen
    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(String),
}

impl ProtocolError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedEnvelope(msg.into())
    }
}

/// Result-Typ fuer das Protokoll-Crate
pub type ProtocolResult<T> = Result<T, ProtocolError>;
