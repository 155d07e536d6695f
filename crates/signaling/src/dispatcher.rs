//! Signaling-Dispatcher – Zustandsmaschine fuer Session-Nachrichten
//!
//! Der Dispatcher klassifiziert eine Session-Nachricht, veraendert unter der
//! Sitzungssperre Roster/Backups und gibt die daraus folgenden Befehle als
//! geordnete Liste von [`Aktion`]en zurueck. Er ruft selbst weder den
//! PeerManager noch die Anwendung auf; das erledigt die Sitzung, nachdem
//! die Sperre freigegeben ist.
//!
//! ## Ablauf
//! ```text
//! eigene Nachricht?          -> verwerfen
//! extra geaendert?           -> ExtraAktualisiert (unabhaengig)
//! SignalBody klassifizieren:
//!   StreamSync (bekannter Sender) -> MedienAktion | StreamBeendet
//!   DropPeerConnection            -> PeerAbbauen
//!   AllParticipants               -> PeerErstellen | PeerNeuVerhandeln (je Teilnehmer)
//!   NewParticipant                -> PeerErstellen
//!   ReadyForOffer                 -> Zurueckstellen oder weiter ab ParticipationRequest
//!   NewParticipationRequest       -> TeilnahmeAnfrage
//!   ChangedUuid                   -> umbenennen (+ PeerAbbauen fuer Verdraengten), Rest weiter ab UserLeft
//!   UserLeft                      -> TeilnehmerVerlassen (+ SitzungVerlassen)
//!   Negotiation                   -> NegotiationWeiterleiten
//! ```
//!
//! Doppelte oder wiederholte Nachrichten sind unkritisch: ein zweites
//! Anlegen wird zum Neuverhandeln, ein zweites Entfernen ist ein No-op.

use rtcmesh_core::event::ExtraDataUpdate;
use rtcmesh_core::types::{ParticipantId, PeerHandle};
use rtcmesh_protocol::{
    ParticipationRequest, PeerPreferences, SessionMessage, SignalBody, StreamSync, Stufe,
};
use serde_json::{Map, Value};

use crate::config::SessionConfig;
use crate::roster::Umbenennung;
use crate::session_state::{SessionState, SharedSessionState};
use crate::streams::{StreamEvent, StreamEvents};

// ---------------------------------------------------------------------------
// Aktionen
// ---------------------------------------------------------------------------

/// Befehl oder Benachrichtigung, die aus einem Dispatch folgt
#[derive(Debug, Clone)]
pub enum Aktion {
    /// `PeerManager::create_peer`
    PeerErstellen {
        participant: ParticipantId,
        handle: PeerHandle,
        preferences: PeerPreferences,
    },
    /// `PeerManager::renegotiate_peer`
    PeerNeuVerhandeln {
        participant: ParticipantId,
        preferences: PeerPreferences,
    },
    /// `PeerManager::drop_peer`
    PeerAbbauen(ParticipantId),
    /// `PeerManager::on_participant_left`
    TeilnehmerVerlassen(ParticipantId),
    /// `PeerManager::forward_negotiation`
    NegotiationWeiterleiten {
        participant: ParticipantId,
        payload: Value,
    },
    /// `SessionCallbacks::on_extra_data_updated`
    ExtraAktualisiert(ExtraDataUpdate),
    /// `SessionCallbacks::on_stream_ended`
    StreamBeendet(StreamEvent),
    /// Aktion auf dem Media-Handle des Streams ausfuehren
    MedienAktion {
        stream: StreamEvent,
        aktion: String,
        media_type: Option<String>,
    },
    /// `SessionCallbacks::on_new_participant_request`
    TeilnahmeAnfrage {
        sender: ParticipantId,
        request: ParticipationRequest,
    },
    /// Lokale Sitzung komplett verlassen (`autoCloseEntireSession`)
    SitzungVerlassen,
}

/// Ergebnis eines Dispatch-Aufrufs
#[derive(Debug)]
pub enum DispatchErgebnis {
    /// Nachricht vollstaendig verarbeitet
    Verarbeitet(Vec<Aktion>),
    /// Nachricht wartet auf lokale Medien und muss erneut dispatcht werden
    ///
    /// `aktionen` enthaelt was vor dem Zurueckstellen bereits anfiel.
    Zurueckgestellt {
        nachricht: SessionMessage,
        aktionen: Vec<Aktion>,
    },
}

impl DispatchErgebnis {
    /// Alle bereits angefallenen Aktionen
    pub fn aktionen(&self) -> &[Aktion] {
        match self {
            Self::Verarbeitet(a) => a,
            Self::Zurueckgestellt { aktionen, .. } => aktionen,
        }
    }

    pub fn ist_zurueckgestellt(&self) -> bool {
        matches!(self, Self::Zurueckgestellt { .. })
    }
}

// ---------------------------------------------------------------------------
// SignalingDispatcher
// ---------------------------------------------------------------------------

/// Dispatcher einer Sitzung
///
/// Zwischen zwei Aufrufen zustandslos bis auf den geteilten Sitzungszustand.
pub struct SignalingDispatcher {
    lokal: ParticipantId,
    /// Aus der Medien-Konfiguration abgeleitet, fuer alle Schritte identisch
    standard: PeerPreferences,
    state: SharedSessionState,
    streams: StreamEvents,
}

impl SignalingDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(config: &SessionConfig, state: SharedSessionState, streams: StreamEvents) -> Self {
        Self {
            lokal: config.teilnehmer_id().clone(),
            standard: PeerPreferences::ableiten(&config.medien),
            state,
            streams,
        }
    }

    /// Die abgeleiteten Standard-Praeferenzen
    pub fn standard_praeferenzen(&self) -> &PeerPreferences {
        &self.standard
    }

    /// Verarbeitet eine Session-Nachricht
    pub fn dispatch(&self, nachricht: SessionMessage) -> DispatchErgebnis {
        if nachricht.sender == self.lokal {
            tracing::trace!("Eigene Session-Nachricht verworfen");
            return DispatchErgebnis::Verarbeitet(Vec::new());
        }

        let mut state = self.state.lock();
        let mut aktionen = Vec::new();

        self.extra_pruefen(&mut state, &nachricht, &mut aktionen);

        let sender = nachricht.sender.clone();
        let mut body = SignalBody::klassifizieren(&nachricht.message, Stufe::StreamSync);

        loop {
            match body {
                SignalBody::StreamSync(sync) => {
                    if !state.roster.enthaelt(&sender) {
                        body = SignalBody::klassifizieren(&nachricht.message, Stufe::DropPeer);
                        continue;
                    }
                    self.stream_sync(&state, sync, &mut aktionen);
                }

                SignalBody::DropPeerConnection => {
                    if state.roster.entfernen(&sender).is_some() {
                        tracing::debug!(sender = %sender, "Peer-Verbindung abgebaut");
                        aktionen.push(Aktion::PeerAbbauen(sender.clone()));
                    } else {
                        tracing::debug!(sender = %sender, "dropPeerConnection fuer unbekannten Peer");
                    }
                }

                SignalBody::AllParticipants(liste) => {
                    self.alle_teilnehmer(&mut state, &nachricht, liste, &mut aktionen);
                }

                SignalBody::NewParticipant {
                    participant,
                    user_preferences,
                } => {
                    if participant == self.lokal || state.roster.enthaelt(&participant) {
                        tracing::trace!(participant = %participant, "newParticipant bereits bekannt");
                    } else {
                        let preferences = PeerPreferences::aus_wert(user_preferences.as_ref())
                            .unwrap_or_else(|| self.standard.clone());
                        self.peer_erstellen(&mut state, participant, preferences, leeres_extra(), &mut aktionen);
                    }
                }

                SignalBody::ReadyForOffer => {
                    if state.lokale_medien > 0 {
                        state.warte_auf_lokale_medien = false;
                    }
                    if state.warte_auf_lokale_medien {
                        tracing::trace!(sender = %sender, "readyForOffer zurueckgestellt – warte auf lokale Medien");
                        drop(state);
                        return DispatchErgebnis::Zurueckgestellt {
                            nachricht,
                            aktionen,
                        };
                    }
                    body = SignalBody::klassifizieren(&nachricht.message, Stufe::ParticipationRequest);
                    continue;
                }

                SignalBody::NewParticipationRequest => {
                    if state.roster.entfernen(&sender).is_some() {
                        aktionen.push(Aktion::PeerAbbauen(sender.clone()));
                    }
                    let request = ParticipationRequest::aus_nachricht(&nachricht, &self.standard);
                    tracing::debug!(sender = %sender, "Teilnahme-Anfrage empfangen");
                    aktionen.push(Aktion::TeilnahmeAnfrage {
                        sender: sender.clone(),
                        request,
                    });
                }

                SignalBody::ChangedUuid { old_uuid, new_uuid } => {
                    match (old_uuid, new_uuid) {
                        (Some(alt), Some(neu)) => {
                            match state.roster.umbenennen(&alt, &neu) {
                                Umbenennung::Verschoben => {
                                    tracing::debug!(alt = %alt, neu = %neu, "Peer-ID migriert");
                                }
                                Umbenennung::Ersetzt(verdraengt) => {
                                    tracing::debug!(
                                        alt = %alt,
                                        neu = %neu,
                                        handle = %verdraengt.handle,
                                        "Peer-ID migriert, bisheriger Eintrag verdraengt"
                                    );
                                    aktionen.push(Aktion::PeerAbbauen(verdraengt.userid));
                                }
                                Umbenennung::Unbekannt => {}
                            }
                        }
                        _ => tracing::debug!(sender = %sender, "changedUUID ohne alte/neue ID"),
                    }
                    if let Some(rest) = SignalBody::ohne_migrationsfelder(&nachricht.message) {
                        body = SignalBody::klassifizieren(&rest, Stufe::UserLeft);
                        continue;
                    }
                }

                SignalBody::UserLeft {
                    auto_close_entire_session,
                } => {
                    state.roster.entfernen(&sender);
                    tracing::debug!(sender = %sender, auto_close_entire_session, "Teilnehmer hat verlassen");
                    aktionen.push(Aktion::TeilnehmerVerlassen(sender.clone()));
                    if auto_close_entire_session {
                        aktionen.push(Aktion::SitzungVerlassen);
                    }
                }

                SignalBody::Negotiation(payload) => {
                    aktionen.push(Aktion::NegotiationWeiterleiten {
                        participant: sender.clone(),
                        payload,
                    });
                }
            }
            break;
        }

        DispatchErgebnis::Verarbeitet(aktionen)
    }

    /// Nimmt eine Teilnahme-Anfrage an
    ///
    /// Unbekannter Sender wird angelegt, bekannter neu verhandelt.
    pub fn teilnahme_annehmen(
        &self,
        sender: &ParticipantId,
        request: &ParticipationRequest,
    ) -> Vec<Aktion> {
        let mut state = self.state.lock();
        let mut aktionen = Vec::new();

        if state.roster.enthaelt(sender) {
            aktionen.push(Aktion::PeerNeuVerhandeln {
                participant: sender.clone(),
                preferences: request.preferences.clone(),
            });
        } else {
            self.peer_erstellen(
                &mut state,
                sender.clone(),
                request.preferences.clone(),
                request.extra.clone(),
                &mut aktionen,
            );
        }
        aktionen
    }

    /// Lokaler Austritt: Roster leeren, Gate schliessen
    ///
    /// Gibt fuer jeden bisherigen Peer ein `PeerAbbauen` zurueck.
    pub fn verlassen(&self) -> Vec<Aktion> {
        let mut state = self.state.lock();
        state.gate.schliessen();
        state.warte_auf_lokale_medien = false;

        let mut peers = state.roster.leeren();
        peers.sort_by(|a, b| a.userid.cmp(&b.userid));
        peers
            .into_iter()
            .map(|peer| Aktion::PeerAbbauen(peer.userid))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Einzelschritte
    // -----------------------------------------------------------------------

    fn extra_pruefen(
        &self,
        state: &mut SessionState,
        nachricht: &SessionMessage,
        aktionen: &mut Vec<Aktion>,
    ) {
        // Fehlendes extra auf der Leitung ist keine Aenderung
        if nachricht.extra.is_null() {
            return;
        }
        let unterschiedlich = state
            .roster
            .peer(&nachricht.sender)
            .is_some_and(|peer| peer.extra != nachricht.extra);

        if unterschiedlich && state.roster.extra_aktualisieren(&nachricht.sender, &nachricht.extra) {
            aktionen.push(Aktion::ExtraAktualisiert(ExtraDataUpdate {
                userid: nachricht.sender.clone(),
                extra: nachricht.extra.clone(),
            }));
        }
    }

    fn stream_sync(&self, state: &SessionState, sync: StreamSync, aktionen: &mut Vec<Aktion>) {
        let Some(mut stream) = self.streams.get(&sync.streamid) else {
            tracing::debug!(streamid = %sync.streamid, "Stream-Sync fuer unbekannten Stream ignoriert");
            return;
        };
        if stream.stream.is_none() {
            tracing::debug!(streamid = %sync.streamid, "Stream-Sync ohne Media-Handle ignoriert");
            return;
        }

        if sync.ist_ende() {
            if state.roster.backup_auf_stream_anwenden(&mut stream) {
                self.streams.extra_setzen(&sync.streamid, stream.extra.clone());
            }
            aktionen.push(Aktion::StreamBeendet(stream));
            return;
        }

        aktionen.push(Aktion::MedienAktion {
            stream,
            aktion: sync.action,
            media_type: sync.media_type,
        });
    }

    /// Die eigene ID wird uebersprungen, der Sender immer mitgenommen.
    fn alle_teilnehmer(
        &self,
        state: &mut SessionState,
        nachricht: &SessionMessage,
        mut liste: Vec<ParticipantId>,
        aktionen: &mut Vec<Aktion>,
    ) {
        if !liste.contains(&nachricht.sender) {
            liste.push(nachricht.sender.clone());
        }

        let mut gesehen = std::collections::HashSet::new();
        for participant in liste {
            if participant == self.lokal || !gesehen.insert(participant.clone()) {
                continue;
            }

            if state.roster.enthaelt(&participant) {
                aktionen.push(Aktion::PeerNeuVerhandeln {
                    participant,
                    preferences: self.standard.clone(),
                });
            } else {
                let extra = if participant == nachricht.sender && nachricht.extra.is_object() {
                    nachricht.extra.clone()
                } else {
                    leeres_extra()
                };
                self.peer_erstellen(state, participant, self.standard.clone(), extra, aktionen);
            }
        }
    }

    fn peer_erstellen(
        &self,
        state: &mut SessionState,
        participant: ParticipantId,
        preferences: PeerPreferences,
        extra: Value,
        aktionen: &mut Vec<Aktion>,
    ) {
        match state
            .roster
            .einfuegen(participant.clone(), preferences.clone(), extra)
        {
            Some(handle) => {
                tracing::debug!(participant = %participant, handle = %handle, "Neuer Peer");
                aktionen.push(Aktion::PeerErstellen {
                    participant,
                    handle,
                    preferences,
                });
            }
            None => aktionen.push(Aktion::PeerNeuVerhandeln {
                participant,
                preferences,
            }),
        }
    }
}

fn leeres_extra() -> Value {
    Value::Object(Map::new())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
