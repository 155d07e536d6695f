//! Payloads der Anwendungs-Benachrichtigungen
//!
//! Diese Typen werden vom Signaling-Crate an die Anwendung gereicht
//! (`SessionCallbacks`). Sie sind serde-kompatibel, damit eine Anwendung
//! sie unveraendert z.B. an eine UI weiterreichen kann.

use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Online-Status eines Teilnehmers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    Online,
    Offline,
}

impl OnlineStatus {
    /// Leitet den Status aus dem `isOnline`-Flag ab
    pub fn aus_flag(is_online: bool) -> Self {
        if is_online {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

/// Ein Peer hat seine `extra`-Metadaten geaendert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraDataUpdate {
    pub userid: ParticipantId,
    pub extra: Value,
}

/// Status-Aenderung eines Teilnehmers (aus Presence-Envelopes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatusChange {
    pub userid: ParticipantId,
    pub status: OnlineStatus,
    pub extra: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialisiert_klein() {
        let change = UserStatusChange {
            userid: ParticipantId::from("bob"),
            status: OnlineStatus::aus_flag(false),
            extra: serde_json::json!({}),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["status"], "offline");
        assert_eq!(json["userid"], "bob");
    }
}
