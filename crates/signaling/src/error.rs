//! Fehlertypen fuer den Signaling-Service

use rtcmesh_core::MeshError;
use rtcmesh_protocol::ProtocolError;
use thiserror::Error;

/// Fehlertyp fuer den Signaling-Service
///
/// Keiner dieser Fehler verlaesst den Dispatch-Pfad: eingehende Anomalien
/// werden geloggt und verworfen. Fehler entstehen nur auf dem ausgehenden
/// Pfad (`emit`, `verbinden`).
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Envelope-Kodierung oder -Dekodierung fehlgeschlagen
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtocolError),

    /// Crate-uebergreifender Fehler (Konfiguration etc.)
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Transport hat die Nachricht nicht angenommen
    #[error("Transportfehler: {0}")]
    Transport(String),

    /// Sitzung ist bereits verbunden
    #[error("Sitzung ist bereits verbunden")]
    BereitsVerbunden,

    /// Sitzung wurde getrennt
    #[error("Sitzung getrennt")]
    Getrennt,
}

impl SignalingError {
    /// Erstellt einen Transportfehler
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Result-Typ fuer den Signaling-Service
pub type SignalingResult<T> = Result<T, SignalingError>;
