//! Envelope-Codec
//!
//! Jede Nachricht auf dem Transport-Kanal ist ein JSON-Text der Form:
//!
//! ```text
//! {"eventName": "<name>", "data": <beliebiges JSON>}
//! ```
//!
//! Der Codec kennt die Bedeutung von `data` nicht. Typisierte Payloads
//! werden in [`crate::message`] aus `data` dekodiert.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};

/// Event-Name fuer Presence-Envelopes (`{userid, isOnline}`)
pub const PRESENCE_EVENT: &str = "presence";

/// Event-Name mit dem die Anwendung ihren Raumbeitritt ankuendigt
pub const JOIN_ROOM_EVENT: &str = "join-room";

/// Event-Name der UUID-Aenderungs-Ankuendigung (wird nie gesendet)
pub const CHANGED_UUID_EVENT: &str = "changed-uuid";

/// Ein Envelope auf dem Transport-Kanal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub event_name: String,
    /// Fehlt `data` auf der Leitung, wird `null` angenommen
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(event_name: impl Into<String>, data: Value) -> Self {
        Self {
            event_name: event_name.into(),
            data,
        }
    }

    /// Kodiert das Envelope als JSON-Text
    pub fn kodieren(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Serialisierung(e.to_string()))
    }
}

/// Kodiert `{eventName, data}` als Leitungsnachricht
pub fn encode(event_name: &str, data: &Value) -> ProtocolResult<String> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct EnvelopeRef<'a> {
        event_name: &'a str,
        data: &'a Value,
    }

    serde_json::to_string(&EnvelopeRef { event_name, data })
        .map_err(|e| ProtocolError::Serialisierung(e.to_string()))
}

/// Dekodiert eine Leitungsnachricht
///
/// Kein gueltiges JSON, kein Objekt oder fehlender `eventName` ergeben
/// [`ProtocolError::MalformedEnvelope`].
pub fn decode(wire: &str) -> ProtocolResult<Envelope> {
    serde_json::from_str(wire).map_err(|e| ProtocolError::malformed(e.to_string()))
}
