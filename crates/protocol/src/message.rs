//! Typisierte Payloads innerhalb eines Envelopes
//!
//! - Session-Nachricht: `{sender, message, extra}` unter dem konfigurierten
//!   Session-Event-Namen
//! - Presence: `{userid, isOnline}` unter [`crate::PRESENCE_EVENT`]

use rtcmesh_core::types::ParticipantId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};
use crate::signal::ist_wahr;

/// Payload einer Session-Nachricht
///
/// `message` bleibt roh, die Klassifikation erfolgt ueber
/// [`crate::signal::SignalBody`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub sender: ParticipantId,
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub extra: Value,
}

impl SessionMessage {
    pub fn new(sender: ParticipantId, message: Value, extra: Value) -> Self {
        Self {
            sender,
            message,
            extra,
        }
    }

    /// Dekodiert den `data`-Teil eines Session-Envelopes
    pub fn aus_data(data: &Value) -> ProtocolResult<Self> {
        Self::deserialize(data)
            .map_err(|e| ProtocolError::malformed(format!("Session-Nachricht: {e}")))
    }

    /// Erzeugt den `data`-Teil fuer ein ausgehendes Envelope
    pub fn in_data(&self) -> Value {
        serde_json::json!({
            "sender": self.sender,
            "message": self.message,
            "extra": self.extra,
        })
    }

    /// Prueft ob die Nachricht einen Austritt (`userLeft`) ankuendigt
    pub fn kuendigt_austritt_an(&self) -> bool {
        ist_wahr(self.message.get("userLeft"))
    }
}

/// Payload eines Presence-Envelopes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub userid: ParticipantId,
    /// Nur ein explizites `true` gilt als online
    #[serde(rename = "isOnline", default, deserialize_with = "nur_true")]
    pub is_online: bool,
}

impl PresencePayload {
    pub fn aus_data(data: &Value) -> ProtocolResult<Self> {
        Self::deserialize(data).map_err(|e| ProtocolError::malformed(format!("Presence: {e}")))
    }

    pub fn in_data(&self) -> Value {
        serde_json::json!({ "userid": self.userid, "isOnline": self.is_online })
    }
}

fn nur_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let wert = Value::deserialize(deserializer)?;
    Ok(wert == Value::Bool(true))
}
