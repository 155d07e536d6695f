//! Structured Logging Setup via tracing-subscriber
//!
//! Die Werte aus der Sitzungs-Konfiguration (`[logging]`) lassen sich per
//! Umgebungsvariable ueberschreiben:
//! - `MESH_LOG_LEVEL`: EnvFilter-Direktive (z.B. `debug` oder
//!   `rtcmesh_signaling=trace`)
//! - `MESH_LOG_FORMAT`: `text` oder `json`

use tracing_subscriber::{fmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Level
pub const LEVEL_ENV: &str = "MESH_LOG_LEVEL";

/// Umgebungsvariable fuer das Log-Format
pub const FORMAT_ENV: &str = "MESH_LOG_FORMAT";

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parst `text` oder `json` (Kleinschreibung)
    pub fn parsen(wert: &str) -> Option<Self> {
        match wert {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Umgebung vor Konfiguration; Unbekanntes faellt auf `text` zurueck
    pub fn waehlen(aus_env: Option<&str>, konfiguriert: &str) -> Self {
        aus_env
            .and_then(Self::parsen)
            .or_else(|| Self::parsen(konfiguriert))
            .unwrap_or_default()
    }
}

/// Initialisiert das Logging-System.
///
/// Gibt `false` zurueck wenn bereits ein globaler Subscriber gesetzt ist
/// (z.B. wenn mehrere Tests im selben Prozess initialisieren).
pub fn logging_initialisieren(level: &str, format: &str) -> bool {
    let filter = EnvFilter::try_from_env(LEVEL_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = LogFormat::waehlen(std::env::var(FORMAT_ENV).ok().as_deref(), format);

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.is_ok()
}

/// Logging fuer Tests: Ausgabe ueber den Test-Writer, Level aus
/// `MESH_LOG_LEVEL` oder `debug`. Mehrfacher Aufruf ist unkritisch.
pub fn test_logging_initialisieren() {
    let filter = EnvFilter::try_from_env(LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level));
        }
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO")); // Gross-/Kleinschreibung
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn format_parsen() {
        assert_eq!(LogFormat::parsen("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parsen("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parsen("JSON"), None);
        assert_eq!(LogFormat::parsen("xml"), None);
    }

    #[test]
    fn umgebung_hat_vorrang() {
        assert_eq!(LogFormat::waehlen(Some("json"), "text"), LogFormat::Json);
        assert_eq!(LogFormat::waehlen(None, "json"), LogFormat::Json);
        // ungueltige Umgebung -> Konfiguration
        assert_eq!(LogFormat::waehlen(Some("xml"), "json"), LogFormat::Json);
        assert_eq!(LogFormat::waehlen(None, "xml"), LogFormat::Text);
    }

    #[test]
    fn zweite_initialisierung_meldet_false() {
        test_logging_initialisieren();
        assert!(!logging_initialisieren("info", "text"));
    }
}
