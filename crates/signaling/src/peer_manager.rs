//! PeerManager-Schnittstelle
//!
//! Der PeerManager besitzt die eigentlichen Peer-Verbindungen (SDP/ICE,
//! Medien). Aus Sicht des Dispatchers sind alle Aufrufe fire-and-forget:
//! es wird kein Rueckgabewert ausgewertet und nichts abgebrochen.

use rtcmesh_core::types::{ParticipantId, PeerHandle};
use rtcmesh_protocol::PeerPreferences;
use serde_json::Value;

/// Befehlsempfaenger fuer den Peer-Lebenszyklus
pub trait PeerManager: Send + Sync + 'static {
    /// Neue Verbindung zu einem bisher unbekannten Teilnehmer aufbauen
    fn create_peer(&self, participant: &ParticipantId, handle: PeerHandle, preferences: &PeerPreferences);

    /// Bestehende Verbindung neu verhandeln
    fn renegotiate_peer(&self, participant: &ParticipantId, preferences: &PeerPreferences);

    /// Teilnehmer hat die Sitzung verlassen; Ressourcen freigeben
    fn on_participant_left(&self, participant: &ParticipantId);

    /// SDP/ICE-Payload an die Verbindung des Teilnehmers weiterreichen
    fn forward_negotiation(&self, participant: &ParticipantId, payload: &Value);

    /// Verbindung sofort abbauen
    fn drop_peer(&self, participant: &ParticipantId);
}
