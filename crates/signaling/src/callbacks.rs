//! Anwendungs-Callbacks
//!
//! Alle Methoden haben leere Standard-Implementierungen, eine Anwendung
//! ueberschreibt nur was sie braucht.

use rtcmesh_core::event::{ExtraDataUpdate, UserStatusChange};
use rtcmesh_core::types::ParticipantId;
use rtcmesh_protocol::ParticipationRequest;

use crate::streams::StreamEvent;

/// Ausgehende Benachrichtigungen an die Anwendung
pub trait SessionCallbacks: Send + Sync + 'static {
    /// Ein Peer hat neue `extra`-Metadaten
    fn on_extra_data_updated(&self, _update: &ExtraDataUpdate) {}

    /// Ein Remote-Stream ist beendet (`extra` ggf. aus dem Backup)
    fn on_stream_ended(&self, _stream: &StreamEvent) {}

    /// Online-Status eines anderen Teilnehmers hat sich geaendert
    fn on_user_status_changed(&self, _change: &UserStatusChange) {}

    /// Ein Teilnehmer moechte eine Verbindung aufbauen
    ///
    /// Annehmen ueber `SignalingSession::teilnahme_annehmen`.
    fn on_new_participant_request(&self, _sender: &ParticipantId, _request: &ParticipationRequest) {}

    /// Die lokale Sitzung wurde verlassen
    fn on_session_leave(&self) {}
}

/// Callbacks ohne Wirkung
#[derive(Debug, Default, Clone, Copy)]
pub struct KeineCallbacks;

impl SessionCallbacks for KeineCallbacks {}
