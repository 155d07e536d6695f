//! Presence-Tracker – Online-Status der Teilnehmer
//!
//! Wertet Presence-Envelopes `{userid, isOnline}` aus, merkt sich den
//! letzten Status pro Teilnehmer und erzeugt die Status-Benachrichtigung
//! fuer die Anwendung. Der Roster wird hier nie veraendert, nur gelesen
//! (fuer die `extra`-Daten der Benachrichtigung).

use std::collections::HashMap;

use rtcmesh_core::event::{OnlineStatus, UserStatusChange};
use rtcmesh_core::types::ParticipantId;
use rtcmesh_protocol::PresencePayload;
use serde_json::{Map, Value};

use crate::roster::PeerRoster;

/// Letzter bekannter Online-Status pro Teilnehmer
#[derive(Debug, Default)]
pub struct PresenceTracker {
    status: HashMap<ParticipantId, OnlineStatus>,
}

impl PresenceTracker {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Verarbeitet einen Presence-Payload
    ///
    /// Gibt `None` fuer den eigenen Status zurueck, sonst die Benachrichtigung.
    pub fn verarbeiten(
        &mut self,
        payload: &PresencePayload,
        lokal: &ParticipantId,
        roster: &PeerRoster,
    ) -> Option<UserStatusChange> {
        if &payload.userid == lokal {
            return None;
        }

        let status = OnlineStatus::aus_flag(payload.is_online);
        self.status.insert(payload.userid.clone(), status);

        let extra = roster
            .peer(&payload.userid)
            .map(|peer| peer.extra.clone())
            .unwrap_or_else(|| Value::Object(Map::new()));

        tracing::debug!(userid = %payload.userid, ?status, "Presence aktualisiert");

        Some(UserStatusChange {
            userid: payload.userid.clone(),
            status,
            extra,
        })
    }

    /// Letzter bekannter Status eines Teilnehmers
    pub fn status(&self, userid: &ParticipantId) -> Option<OnlineStatus> {
        self.status.get(userid).copied()
    }

    /// Alle Teilnehmer mit Status `Online` (sortiert)
    pub fn online(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<_> = self
            .status
            .iter()
            .filter(|(_, s)| **s == OnlineStatus::Online)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}
