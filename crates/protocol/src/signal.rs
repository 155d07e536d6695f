//! Klassifikation des `message`-Bodys einer Session-Nachricht
//!
//! Auf der Leitung ist `message` ein untypisiertes JSON-Objekt (oder der
//! String `"dropPeerConnection"`). Die Art der Nachricht ergibt sich aus den
//! gesetzten Feldern. [`SignalBody::klassifizieren`] bildet das auf einen
//! Tagged Enum ab, in fester Prioritaet:
//!
//! ```text
//! StreamSync -> DropPeer -> AllParticipants -> NewParticipant
//!   -> ReadyForOffer -> ParticipationRequest -> ChangedUuid -> UserLeft
//!   -> Negotiation
//! ```
//!
//! Die Klassifikation kann ab einer beliebigen [`Stufe`] beginnen. Der
//! Dispatcher nutzt das fuer die Faelle, in denen eine Nachricht nach einer
//! Stufe weiter durchgereicht wird (unbekannter Sender bei StreamSync,
//! ReadyForOffer nach der Medienpruefung, ChangedUuid).

use rtcmesh_core::types::{ParticipantId, StreamId};
use serde_json::Value;

/// String-Body der eine Verbindung sofort abbaut
pub const DROP_PEER_CONNECTION: &str = "dropPeerConnection";

/// JS-Wahrheitswert eines optionalen JSON-Felds
///
/// Falsy sind: fehlend, `null`, `false`, `0`, `""`.
pub fn ist_wahr(wert: Option<&Value>) -> bool {
    match wert {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn als_string(wert: Option<&Value>) -> Option<String> {
    match wert? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Klassifikationsstufen in Prioritaetsreihenfolge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stufe {
    StreamSync,
    DropPeer,
    AllParticipants,
    NewParticipant,
    ReadyForOffer,
    ParticipationRequest,
    ChangedUuid,
    UserLeft,
    Negotiation,
}

/// Stream-Synchronisation (`streamSyncNeeded`)
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSync {
    pub streamid: StreamId,
    pub action: String,
    /// `None` wenn `type` fehlt oder `"both"` ist
    pub media_type: Option<String>,
}

impl StreamSync {
    /// Aktionen die das Stream-Ende signalisieren
    pub fn ist_ende(&self) -> bool {
        matches!(self.action.as_str(), "ended" | "inactive" | "stream-removed")
    }
}

/// Klassifizierter Body einer Session-Nachricht
#[derive(Debug, Clone, PartialEq)]
pub enum SignalBody {
    StreamSync(StreamSync),
    DropPeerConnection,
    AllParticipants(Vec<ParticipantId>),
    NewParticipant {
        participant: ParticipantId,
        user_preferences: Option<Value>,
    },
    ReadyForOffer,
    NewParticipationRequest,
    ChangedUuid {
        old_uuid: Option<ParticipantId>,
        new_uuid: Option<ParticipantId>,
    },
    UserLeft {
        auto_close_entire_session: bool,
    },
    /// Alles andere: SDP/ICE-Payload, opak weitergereicht
    Negotiation(Value),
}

impl SignalBody {
    /// Klassifiziert `message` ab der gegebenen Stufe
    pub fn klassifizieren(message: &Value, ab: Stufe) -> Self {
        let feld = |name: &str| message.get(name);

        if ab <= Stufe::StreamSync && ist_wahr(feld("streamSyncNeeded")) {
            let streamid = als_string(feld("streamid")).unwrap_or_default();
            let media_type = als_string(feld("type")).filter(|t| t != "both");
            return Self::StreamSync(StreamSync {
                streamid: StreamId::new(streamid),
                action: als_string(feld("action")).unwrap_or_default(),
                media_type,
            });
        }

        if ab <= Stufe::DropPeer && message.as_str() == Some(DROP_PEER_CONNECTION) {
            return Self::DropPeerConnection;
        }

        if ab <= Stufe::AllParticipants {
            if let Some(Value::Array(liste)) = feld("allParticipants") {
                let teilnehmer = liste
                    .iter()
                    .filter_map(|w| als_string(Some(w)))
                    .map(ParticipantId::from)
                    .collect();
                return Self::AllParticipants(teilnehmer);
            }
        }

        if ab <= Stufe::NewParticipant {
            if let Some(id) = als_string(feld("newParticipant")) {
                return Self::NewParticipant {
                    participant: ParticipantId::from(id),
                    user_preferences: feld("userPreferences").cloned(),
                };
            }
        }

        if ab <= Stufe::ReadyForOffer && ist_wahr(feld("readyForOffer")) {
            return Self::ReadyForOffer;
        }

        if ab <= Stufe::ParticipationRequest && ist_wahr(feld("newParticipationRequest")) {
            return Self::NewParticipationRequest;
        }

        if ab <= Stufe::ChangedUuid && ist_wahr(feld("changedUUID")) {
            return Self::ChangedUuid {
                old_uuid: als_string(feld("oldUUID")).map(ParticipantId::from),
                new_uuid: als_string(feld("newUUID")).map(ParticipantId::from),
            };
        }

        if ab <= Stufe::UserLeft && ist_wahr(feld("userLeft")) {
            return Self::UserLeft {
                auto_close_entire_session: ist_wahr(feld("autoCloseEntireSession")),
            };
        }

        Self::Negotiation(message.clone())
    }

    /// Entfernt die Migrationsfelder aus einem `changedUUID`-Body
    ///
    /// Bleibt danach nichts uebrig, gibt es `None` zurueck.
    pub fn ohne_migrationsfelder(message: &Value) -> Option<Value> {
        let mut rest = message.as_object()?.clone();
        for feld in ["changedUUID", "oldUUID", "newUUID"] {
            rest.remove(feld);
        }
        (!rest.is_empty()).then_some(Value::Object(rest))
    }
}
