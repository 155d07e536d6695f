//! Fehlertypen fuer rtcmesh
//!
//! Zentraler Fehler-Enum fuer crate-uebergreifende Fehlerzustaende.
//! Untermodule definieren eigene Fehler und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer rtcmesh
pub type Result<T> = std::result::Result<T, MeshError>;

/// Crate-uebergreifende Fehler
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl MeshError {
    /// Erstellt einen Konfigurationsfehler
    pub fn konfiguration(msg: impl Into<String>) -> Self {
        Self::Konfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = MeshError::konfiguration("kanal fehlt");
        assert_eq!(e.to_string(), "Konfigurationsfehler: kanal fehlt");
    }

    #[test]
    fn anyhow_wird_durchgereicht() {
        let e: MeshError = anyhow::anyhow!("kaputt").into();
        assert_eq!(e.to_string(), "kaputt");
    }
}
