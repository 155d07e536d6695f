//! Sitzungs-Konfiguration
//!
//! Wird aus einer TOML-Datei geladen. Alle Felder haben sinnvolle
//! Standardwerte, sodass eine Sitzung ohne Konfigurationsdatei lauffaehig
//! ist (mit zufaelliger Teilnehmer-ID).
//!
//! ```toml
//! [sitzung]
//! teilnehmer_id = "alice"
//! kanal = "raum-42"
//!
//! [sitzung.extra]
//! name = "Alice"
//!
//! [medien]
//! video = false
//! richtung = "one-way"
//! ```

use rtcmesh_core::{MeshError, ParticipantId};
use rtcmesh_protocol::MediaConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard-Event-Name fuer Session-Nachrichten
pub const STANDARD_NACHRICHTEN_EVENT: &str = "RTCMultiConnection-Message";

/// Vollstaendige Sitzungs-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    /// Identitaet und Kanal
    pub sitzung: SitzungsEinstellungen,
    /// Medien-Flags fuer die Praeferenz-Ableitung
    pub medien: MediaConfig,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Identitaet und Kanal der lokalen Sitzung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitzungsEinstellungen {
    /// Lokale Teilnehmer-ID
    pub teilnehmer_id: ParticipantId,
    /// Name des Transport-Kanals
    pub kanal: String,
    /// Event-Name unter dem Session-Nachrichten laufen
    pub nachrichten_event: String,
    /// Lokale `extra`-Metadaten, die jeder ausgehenden Nachricht beiliegen
    pub extra: Value,
    /// Groesse der Eingangs-Queue zwischen Transport und Dispatcher
    pub eingangs_queue: usize,
}

impl Default for SitzungsEinstellungen {
    fn default() -> Self {
        Self {
            teilnehmer_id: ParticipantId::zufaellig(),
            kanal: "rtcmesh".into(),
            nachrichten_event: STANDARD_NACHRICHTEN_EVENT.into(),
            extra: Value::Object(Default::default()),
            eingangs_queue: 256,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl SessionConfig {
    /// Konfiguration fuer einen Teilnehmer in einem Kanal, sonst Standardwerte
    pub fn neu(teilnehmer_id: impl Into<ParticipantId>, kanal: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.sitzung.teilnehmer_id = teilnehmer_id.into();
        config.sitzung.kanal = kanal.into();
        config
    }

    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> rtcmesh_core::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map_err(|e| MeshError::konfiguration(format!("'{pfad}': {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(MeshError::konfiguration(format!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                )))
            }
        };
        config.validieren()?;
        Ok(config)
    }

    /// Parst eine Konfiguration aus einem TOML-String
    pub fn aus_toml(inhalt: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(inhalt)?)
    }

    /// Prueft die Werte, die nicht ueber Typen abgesichert sind
    pub fn validieren(&self) -> rtcmesh_core::Result<()> {
        if self.sitzung.teilnehmer_id.as_str().is_empty() {
            return Err(MeshError::konfiguration("teilnehmer_id darf nicht leer sein"));
        }
        if self.sitzung.kanal.is_empty() {
            return Err(MeshError::konfiguration("kanal darf nicht leer sein"));
        }
        if self.sitzung.nachrichten_event.is_empty()
            || self.sitzung.nachrichten_event == rtcmesh_protocol::PRESENCE_EVENT
        {
            return Err(MeshError::konfiguration(format!(
                "ungueltiger nachrichten_event '{}'",
                self.sitzung.nachrichten_event
            )));
        }
        if self.sitzung.eingangs_queue == 0 {
            return Err(MeshError::konfiguration("eingangs_queue muss > 0 sein"));
        }
        Ok(())
    }

    /// Lokale Teilnehmer-ID
    pub fn teilnehmer_id(&self) -> &ParticipantId {
        &self.sitzung.teilnehmer_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcmesh_protocol::Direction;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = SessionConfig::default();
        assert!(cfg.validieren().is_ok());
        assert_eq!(cfg.sitzung.nachrichten_event, STANDARD_NACHRICHTEN_EVENT);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.medien.audio && cfg.medien.video);
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [sitzung]
            teilnehmer_id = "alice"
            kanal = "raum-42"

            [sitzung.extra]
            name = "Alice"

            [medien]
            video = false
            richtung = "one-way"
        "#;
        let cfg = SessionConfig::aus_toml(toml).unwrap();
        assert_eq!(cfg.teilnehmer_id().as_str(), "alice");
        assert_eq!(cfg.sitzung.kanal, "raum-42");
        assert_eq!(cfg.sitzung.extra["name"], "Alice");
        assert!(!cfg.medien.video);
        assert_eq!(cfg.medien.richtung, Direction::OneWay);
        // Nicht angegebene Felder behalten Standardwerte
        assert!(cfg.medien.audio);
        assert_eq!(cfg.sitzung.nachrichten_event, STANDARD_NACHRICHTEN_EVENT);
    }

    #[test]
    fn fehlende_datei_ergibt_standardwerte() {
        let cfg = SessionConfig::laden("/gibt/es/nicht/rtcmesh.toml").unwrap();
        assert_eq!(cfg.sitzung.kanal, "rtcmesh");
    }

    #[test]
    fn presence_als_nachrichten_event_ist_ungueltig() {
        let mut cfg = SessionConfig::neu("a", "k");
        cfg.sitzung.nachrichten_event = "presence".into();
        assert!(matches!(cfg.validieren(), Err(MeshError::Konfiguration(_))));
    }

    #[test]
    fn leerer_kanal_ist_ungueltig() {
        let cfg = SessionConfig::neu("a", "");
        assert!(cfg.validieren().is_err());
    }
}
