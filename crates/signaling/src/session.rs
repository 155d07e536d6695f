//! Signaling-Session – verbindet Transport, Dispatcher und Anwendung
//!
//! Eine `SignalingSession` abonniert den Kanal beim Transport, verarbeitet
//! eingehende Leitungsnachrichten in einem eigenen tokio-Task (strikt
//! nacheinander, in Zustellreihenfolge) und fuehrt die vom Dispatcher
//! erzeugten Aktionen ausserhalb der Zustandssperre aus.
//!
//! ## Eingangspfad
//! ```text
//! Transport -> mpsc -> eingang_schleife
//!                         |
//!                         +-- decode (Fehler: warn + verwerfen)
//!                         +-- Session-Event: Gate pruefen -> Dispatcher -> Aktionen
//!                         +-- presence:      PresenceTracker -> Callback
//!                         +-- jedes Event:   EventRegistry
//!
//! RETRY_INTERVALL-Tick -> zurueckgestellte Nachrichten erneut dispatchen
//! ```
//!
//! Der Task haelt eine Referenz auf die Sitzung bis `trennen` aufgerufen wird.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rtcmesh_core::event::OnlineStatus;
use rtcmesh_core::types::{ParticipantId, SubscriptionId};
use rtcmesh_protocol::{
    decode, encode, ist_wahr, ParticipationRequest, PresencePayload, SessionMessage,
    CHANGED_UUID_EVENT, JOIN_ROOM_EVENT, PRESENCE_EVENT,
};
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::callbacks::SessionCallbacks;
use crate::config::SessionConfig;
use crate::dispatcher::{Aktion, DispatchErgebnis, SignalingDispatcher};
use crate::error::{SignalingError, SignalingResult};
use crate::peer_manager::PeerManager;
use crate::registry::EventRegistry;
use crate::roster::{Peer, PeerBackup};
use crate::session_state::{SessionState, SharedSessionState};
use crate::streams::StreamEvents;
use crate::transport::{Transport, TransportSubscription};

/// Abstand zwischen zwei Versuchen fuer zurueckgestellte Nachrichten
pub const RETRY_INTERVALL: Duration = Duration::from_millis(1);

/// Laufzeit-Ressourcen einer verbundenen Sitzung
struct Laufzeit {
    abo: TransportSubscription,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// SignalingSession
// ---------------------------------------------------------------------------

/// Eine Signaling-Sitzung eines lokalen Teilnehmers
pub struct SignalingSession {
    config: Arc<SessionConfig>,
    transport: Arc<dyn Transport>,
    peers: Arc<dyn PeerManager>,
    callbacks: Arc<dyn SessionCallbacks>,
    state: SharedSessionState,
    dispatcher: SignalingDispatcher,
    registry: EventRegistry,
    streams: StreamEvents,
    /// Auf lokale Medien wartende Nachrichten, in Eingangsreihenfolge
    zurueckgestellt: Mutex<VecDeque<SessionMessage>>,
    laufzeit: Mutex<Option<Laufzeit>>,
}

impl SignalingSession {
    /// Erstellt eine neue, noch nicht verbundene Sitzung
    pub fn neu(
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        peers: Arc<dyn PeerManager>,
        callbacks: Arc<dyn SessionCallbacks>,
    ) -> SignalingResult<Arc<Self>> {
        config.validieren()?;

        let state = SessionState::geteilt();
        let streams = StreamEvents::neu();
        let dispatcher = SignalingDispatcher::neu(&config, Arc::clone(&state), streams.clone());

        Ok(Arc::new(Self {
            config: Arc::new(config),
            transport,
            peers,
            callbacks,
            state,
            dispatcher,
            registry: EventRegistry::neu(),
            streams,
            zurueckgestellt: Mutex::new(VecDeque::new()),
            laufzeit: Mutex::new(None),
        }))
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Abonniert den Kanal, startet den Eingangs-Task und meldet sich online
    pub fn verbinden(self: &Arc<Self>) -> SignalingResult<()> {
        {
            let mut laufzeit = self.laufzeit.lock();
            if laufzeit.is_some() {
                return Err(SignalingError::BereitsVerbunden);
            }

            let (tx, rx) = mpsc::channel(self.config.sitzung.eingangs_queue);
            let abo = self.transport.subscribe(&self.config.sitzung.kanal, tx)?;
            let (shutdown_tx, shutdown_rx) = watch::channel(false);

            let sitzung = Arc::clone(self);
            let task = tokio::spawn(async move {
                sitzung.eingang_schleife(rx, shutdown_rx).await;
            });

            *laufzeit = Some(Laufzeit {
                abo,
                shutdown_tx,
                task,
            });
        }

        tracing::info!(
            teilnehmer = %self.teilnehmer_id(),
            kanal = %self.config.sitzung.kanal,
            "Sitzung verbunden"
        );

        let presence = PresencePayload {
            userid: self.teilnehmer_id().clone(),
            is_online: true,
        };
        self.emit(PRESENCE_EVENT, presence.in_data())?;
        Ok(())
    }

    /// Beendet das Abonnement und wartet auf das Ende des Eingangs-Tasks
    ///
    /// Bereits ausgegebene PeerManager-Befehle werden nicht zurueckgenommen.
    pub async fn trennen(&self) -> SignalingResult<()> {
        let laufzeit = self.laufzeit.lock().take();
        let Some(laufzeit) = laufzeit else {
            return Err(SignalingError::Getrennt);
        };

        self.transport.unsubscribe(&laufzeit.abo);
        let _ = laufzeit.shutdown_tx.send(true);

        if let Err(e) = laufzeit.task.await {
            tracing::warn!(fehler = %e, "Eingangs-Task nicht sauber beendet");
        }
        tracing::info!(teilnehmer = %self.teilnehmer_id(), "Sitzung getrennt");
        Ok(())
    }

    pub fn ist_verbunden(&self) -> bool {
        self.laufzeit.lock().is_some()
    }

    async fn eingang_schleife(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<String>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut retry = tokio::time::interval(RETRY_INTERVALL);
        retry.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wartend = self.zurueckgestellte_anzahl() > 0;

            tokio::select! {
                biased;

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!(teilnehmer = %self.teilnehmer_id(), "Shutdown-Signal – Eingangs-Task endet");
                        break;
                    }
                }

                _ = retry.tick(), if wartend => {
                    self.zurueckgestellte_verarbeiten();
                }

                eingang = rx.recv() => {
                    match eingang {
                        Some(roh) => self.eingang_verarbeiten(&roh),
                        None => {
                            tracing::debug!(teilnehmer = %self.teilnehmer_id(), "Eingangs-Queue geschlossen");
                            break;
                        }
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Eingangspfad
    // -----------------------------------------------------------------------

    /// Verarbeitet eine einzelne Leitungsnachricht
    ///
    /// Wird vom Eingangs-Task aufgerufen; kann auch direkt genutzt werden,
    /// wenn die Nachrichten aus einer eigenen Quelle kommen.
    pub fn eingang_verarbeiten(&self, roh: &str) {
        let envelope = match decode(roh) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(fehler = %e, "Leitungsnachricht verworfen");
                return;
            }
        };

        if envelope.event_name == self.config.sitzung.nachrichten_event {
            match SessionMessage::aus_data(&envelope.data) {
                Ok(nachricht) => self.session_nachricht(nachricht),
                Err(e) => tracing::warn!(fehler = %e, "Session-Nachricht verworfen"),
            }
        } else if envelope.event_name == PRESENCE_EVENT {
            match PresencePayload::aus_data(&envelope.data) {
                Ok(payload) => self.presence_verarbeiten(&payload),
                Err(e) => tracing::warn!(fehler = %e, "Presence-Nachricht verworfen"),
            }
        }

        self.registry
            .veroeffentlichen(&envelope.event_name, &envelope.data);
    }

    fn session_nachricht(&self, nachricht: SessionMessage) {
        let offen = {
            let mut state = self.state.lock();
            // Jedes userLeft im Sitzungskanal schliesst, egal von wem
            if nachricht.kuendigt_austritt_an() {
                state.gate.schliessen();
            }
            state.gate.ist_offen()
        };

        if !offen {
            tracing::trace!(sender = %nachricht.sender, "Join-Gate geschlossen – Nachricht nicht dispatcht");
            return;
        }
        self.dispatch_ausfuehren(nachricht);
    }

    fn presence_verarbeiten(&self, payload: &PresencePayload) {
        let aenderung = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state
                .presence
                .verarbeiten(payload, self.teilnehmer_id(), &state.roster)
        };
        if let Some(aenderung) = aenderung {
            self.callbacks.on_user_status_changed(&aenderung);
        }
    }

    fn dispatch_ausfuehren(&self, nachricht: SessionMessage) {
        match self.dispatcher.dispatch(nachricht) {
            DispatchErgebnis::Verarbeitet(aktionen) => self.ausfuehren(aktionen),
            DispatchErgebnis::Zurueckgestellt {
                nachricht,
                aktionen,
            } => {
                self.ausfuehren(aktionen);
                self.zurueckgestellt.lock().push_back(nachricht);
            }
        }
    }

    /// Dispatcht alle zurueckgestellten Nachrichten erneut
    ///
    /// Gibt die Anzahl der erneut versuchten Nachrichten zurueck. Wer weiter
    /// warten muss, landet wieder in der Queue.
    pub fn zurueckgestellte_verarbeiten(&self) -> usize {
        let wartend: Vec<SessionMessage> = self.zurueckgestellt.lock().drain(..).collect();
        let anzahl = wartend.len();
        for nachricht in wartend {
            self.dispatch_ausfuehren(nachricht);
        }
        anzahl
    }

    fn ausfuehren(&self, aktionen: Vec<Aktion>) {
        for aktion in aktionen {
            match aktion {
                Aktion::PeerErstellen {
                    participant,
                    handle,
                    preferences,
                } => self.peers.create_peer(&participant, handle, &preferences),
                Aktion::PeerNeuVerhandeln {
                    participant,
                    preferences,
                } => self.peers.renegotiate_peer(&participant, &preferences),
                Aktion::PeerAbbauen(participant) => self.peers.drop_peer(&participant),
                Aktion::TeilnehmerVerlassen(participant) => {
                    self.peers.on_participant_left(&participant)
                }
                Aktion::NegotiationWeiterleiten {
                    participant,
                    payload,
                } => self.peers.forward_negotiation(&participant, &payload),
                Aktion::ExtraAktualisiert(update) => self.callbacks.on_extra_data_updated(&update),
                Aktion::StreamBeendet(stream) => self.callbacks.on_stream_ended(&stream),
                Aktion::MedienAktion {
                    stream,
                    aktion,
                    media_type,
                } => {
                    let Some(medien) = stream.stream.as_ref() else {
                        continue;
                    };
                    if !medien.aktion_ausfuehren(&aktion, media_type.as_deref()) {
                        tracing::debug!(streamid = %stream.streamid, aktion = %aktion, "Medien-Aktion nicht unterstuetzt");
                    }
                }
                Aktion::TeilnahmeAnfrage { sender, request } => {
                    self.callbacks.on_new_participant_request(&sender, &request)
                }
                Aktion::SitzungVerlassen => {
                    if let Err(e) = self.verlassen() {
                        tracing::warn!(fehler = %e, "Austritt konnte nicht gesendet werden");
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Ausgangspfad
    // -----------------------------------------------------------------------

    /// Sendet ein Event auf dem Sitzungskanal
    ///
    /// `changed-uuid` und Nachrichten mit `shiftedModerationControl` werden
    /// nicht gesendet (`Ok(None)`). `join-room` oeffnet das Join-Gate.
    /// Sonst wird der Kanalname als Bestaetigung zurueckgegeben.
    pub fn emit(&self, event_name: &str, data: Value) -> SignalingResult<Option<String>> {
        if event_name == CHANGED_UUID_EVENT {
            tracing::trace!("changed-uuid wird nicht gesendet");
            return Ok(None);
        }
        if ist_wahr(data.get("message").and_then(|m| m.get("shiftedModerationControl"))) {
            tracing::trace!("shiftedModerationControl wird nicht gesendet");
            return Ok(None);
        }

        if event_name == JOIN_ROOM_EVENT {
            self.state.lock().gate.oeffnen();
        }

        let kanal = &self.config.sitzung.kanal;
        let wire = encode(event_name, &data)?;
        self.transport.send(kanal, wire)?;
        tracing::trace!(event = event_name, kanal = %kanal, "Event gesendet");
        Ok(Some(kanal.clone()))
    }

    /// Sendet eine Session-Nachricht mit den lokalen `extra`-Daten
    pub fn nachricht_senden(&self, message: Value) -> SignalingResult<Option<String>> {
        let nachricht = SessionMessage::new(
            self.teilnehmer_id().clone(),
            message,
            self.config.sitzung.extra.clone(),
        );
        self.emit(&self.config.sitzung.nachrichten_event, nachricht.in_data())
    }

    /// Tritt dem Raum bei und oeffnet damit das Join-Gate
    pub fn raum_beitreten(&self, data: Value) -> SignalingResult<Option<String>> {
        self.emit(JOIN_ROOM_EVENT, data)
    }

    /// Verlaesst die Sitzung
    ///
    /// Kuendigt den Austritt an, baut alle Peers ab (Backups bleiben),
    /// schliesst das Join-Gate und verwirft zurueckgestellte Nachrichten.
    pub fn verlassen(&self) -> SignalingResult<()> {
        let gesendet = self.nachricht_senden(json!({ "userLeft": true }));

        let aktionen = self.dispatcher.verlassen();
        self.zurueckgestellt.lock().clear();
        tracing::info!(teilnehmer = %self.teilnehmer_id(), peers = aktionen.len(), "Sitzung verlassen");

        self.ausfuehren(aktionen);
        self.callbacks.on_session_leave();
        gesendet.map(|_| ())
    }

    /// Nimmt eine Teilnahme-Anfrage an (legt den Peer an)
    pub fn teilnahme_annehmen(&self, sender: &ParticipantId, request: &ParticipationRequest) {
        let aktionen = self.dispatcher.teilnahme_annehmen(sender, request);
        self.ausfuehren(aktionen);
    }

    // -----------------------------------------------------------------------
    // Lokale Medien
    // -----------------------------------------------------------------------

    /// Ein lokaler Media-Stream wurde angehaengt
    pub fn lokale_medien_anhaengen(&self) {
        self.state.lock().lokale_medien += 1;
    }

    /// Ein lokaler Media-Stream wurde entfernt
    pub fn lokale_medien_entfernen(&self) {
        let mut state = self.state.lock();
        state.lokale_medien = state.lokale_medien.saturating_sub(1);
    }

    /// Setzt, ob `readyForOffer` auf lokale Medien warten muss
    pub fn auf_lokale_medien_warten(&self, warten: bool) {
        self.state.lock().warte_auf_lokale_medien = warten;
    }

    // -----------------------------------------------------------------------
    // Abonnements und Abfragen
    // -----------------------------------------------------------------------

    /// Registriert einen Handler fuer ein Event (roher Signaling-Verkehr)
    pub fn on<F>(&self, event_name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.registry.on(event_name, handler)
    }

    pub fn off(&self, event_name: &str, id: SubscriptionId) -> bool {
        self.registry.off(event_name, id)
    }

    pub fn teilnehmer_id(&self) -> &ParticipantId {
        self.config.teilnehmer_id()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Store der Remote-Streams (wird von der Anwendung befuellt)
    pub fn streams(&self) -> &StreamEvents {
        &self.streams
    }

    /// Aktuelle Roster-Teilnehmer (sortiert)
    pub fn roster_teilnehmer(&self) -> Vec<ParticipantId> {
        self.state.lock().roster.teilnehmer()
    }

    pub fn peer(&self, userid: &ParticipantId) -> Option<Peer> {
        self.state.lock().roster.peer(userid).cloned()
    }

    pub fn backup(&self, userid: &ParticipantId) -> Option<PeerBackup> {
        self.state.lock().roster.backup(userid).cloned()
    }

    /// Letzter bekannter Online-Status
    pub fn status(&self, userid: &ParticipantId) -> Option<OnlineStatus> {
        self.state.lock().presence.status(userid)
    }

    /// Ist das Join-Gate offen?
    pub fn ist_beigetreten(&self) -> bool {
        self.state.lock().gate.ist_offen()
    }

    pub fn zurueckgestellte_anzahl(&self) -> usize {
        self.zurueckgestellt.lock().len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::KeineCallbacks;
    use crate::transport::InMemoryHub;
    use rtcmesh_core::event::{ExtraDataUpdate, UserStatusChange};
    use rtcmesh_core::types::PeerHandle;
    use rtcmesh_protocol::PeerPreferences;

    const EVENT: &str = crate::config::STANDARD_NACHRICHTEN_EVENT;

    /// Zeichnet alle PeerManager-Aufrufe als "befehl:teilnehmer" auf
    #[derive(Default)]
    struct Protokoll {
        eintraege: Mutex<Vec<String>>,
    }

    impl Protokoll {
        fn eintraege(&self) -> Vec<String> {
            self.eintraege.lock().clone()
        }

        fn schreiben(&self, eintrag: String) {
            self.eintraege.lock().push(eintrag);
        }
    }

    impl PeerManager for Protokoll {
        fn create_peer(&self, p: &ParticipantId, _: PeerHandle, _: &PeerPreferences) {
            self.schreiben(format!("create:{p}"));
        }
        fn renegotiate_peer(&self, p: &ParticipantId, _: &PeerPreferences) {
            self.schreiben(format!("renegotiate:{p}"));
        }
        fn on_participant_left(&self, p: &ParticipantId) {
            self.schreiben(format!("left:{p}"));
        }
        fn forward_negotiation(&self, p: &ParticipantId, _: &Value) {
            self.schreiben(format!("negotiation:{p}"));
        }
        fn drop_peer(&self, p: &ParticipantId) {
            self.schreiben(format!("drop:{p}"));
        }
    }

    impl SessionCallbacks for Protokoll {
        fn on_extra_data_updated(&self, u: &ExtraDataUpdate) {
            self.schreiben(format!("extra:{}", u.userid));
        }
        fn on_user_status_changed(&self, c: &UserStatusChange) {
            self.schreiben(format!("status:{}:{:?}", c.userid, c.status));
        }
        fn on_new_participant_request(&self, s: &ParticipantId, _: &ParticipationRequest) {
            self.schreiben(format!("request:{s}"));
        }
        fn on_session_leave(&self) {
            self.schreiben("leave".into());
        }
    }

    fn sitzung() -> (Arc<SignalingSession>, Arc<Protokoll>, InMemoryHub) {
        let hub = InMemoryHub::neu();
        let protokoll = Arc::new(Protokoll::default());
        let s = SignalingSession::neu(
            SessionConfig::neu("ich", "raum"),
            Arc::new(hub.clone()),
            protokoll.clone(),
            protokoll.clone(),
        )
        .unwrap();
        (s, protokoll, hub)
    }

    fn wire(sender: &str, message: Value) -> String {
        let data = SessionMessage::new(sender.into(), message, json!({})).in_data();
        encode(EVENT, &data).unwrap()
    }

    #[test]
    fn ungueltige_config_wird_abgelehnt() {
        let ergebnis = SignalingSession::neu(
            SessionConfig::neu("ich", ""),
            Arc::new(InMemoryHub::neu()),
            Arc::new(Protokoll::default()),
            Arc::new(KeineCallbacks),
        );
        assert!(matches!(ergebnis, Err(SignalingError::Mesh(_))));
    }

    #[test]
    fn geschlossenes_gate_blockiert_dispatch() {
        let (s, protokoll, _) = sitzung();
        s.eingang_verarbeiten(&wire("A", json!({"newParticipant": "B"})));
        assert!(protokoll.eintraege().is_empty());
        assert!(s.roster_teilnehmer().is_empty());
    }

    #[test]
    fn join_room_oeffnet_gate() {
        let (s, protokoll, _) = sitzung();
        assert_eq!(s.raum_beitreten(json!({})).unwrap().as_deref(), Some("raum"));
        assert!(s.ist_beigetreten());

        s.eingang_verarbeiten(&wire("A", json!({"newParticipant": "B"})));
        assert_eq!(protokoll.eintraege(), vec!["create:B"]);
    }

    #[test]
    fn registry_sieht_alles_auch_bei_geschlossenem_gate() {
        let (s, _, _) = sitzung();
        let zaehler = Arc::new(Mutex::new(0usize));
        let z = Arc::clone(&zaehler);
        let id = s.on(EVENT, move |_| *z.lock() += 1);

        s.eingang_verarbeiten(&wire("A", json!({"sdp": "x"})));
        s.eingang_verarbeiten("{kaputt");
        assert_eq!(*zaehler.lock(), 1);

        assert!(s.off(EVENT, id));
        s.eingang_verarbeiten(&wire("A", json!({"sdp": "x"})));
        assert_eq!(*zaehler.lock(), 1);
    }

    #[test]
    fn presence_wird_unabhaengig_vom_gate_gemeldet() {
        let (s, protokoll, _) = sitzung();
        let online = encode(PRESENCE_EVENT, &json!({"userid": "B", "isOnline": true})).unwrap();
        let eigen = encode(PRESENCE_EVENT, &json!({"userid": "ich", "isOnline": true})).unwrap();

        s.eingang_verarbeiten(&online);
        s.eingang_verarbeiten(&eigen);

        assert_eq!(protokoll.eintraege(), vec!["status:B:Online"]);
        assert_eq!(s.status(&"B".into()), Some(OnlineStatus::Online));
        assert_eq!(s.status(&"ich".into()), None);
    }

    #[test]
    fn emit_filtert_changed_uuid_und_moderation() {
        let (s, _, hub) = sitzung();
        let (tx, mut rx) = mpsc::channel(8);
        hub.subscribe("raum", tx).unwrap();

        assert_eq!(s.emit(CHANGED_UUID_EVENT, json!({})).unwrap(), None);
        assert_eq!(
            s.nachricht_senden(json!({"shiftedModerationControl": true}))
                .unwrap(),
            None
        );
        assert!(rx.try_recv().is_err());

        assert!(s.nachricht_senden(json!({"sdp": "x"})).unwrap().is_some());
        let envelope = decode(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(envelope.event_name, EVENT);
        assert_eq!(envelope.data["sender"], "ich");
    }

    #[test]
    fn eigener_user_left_schliesst_gate() {
        let (s, protokoll, _) = sitzung();
        s.raum_beitreten(json!({})).unwrap();

        s.eingang_verarbeiten(&wire("ich", json!({"userLeft": true})));
        assert!(!s.ist_beigetreten());

        s.eingang_verarbeiten(&wire("A", json!({"newParticipant": "B"})));
        assert!(protokoll.eintraege().is_empty());
    }

    #[test]
    fn zurueckgestellte_nachricht_laeuft_nach_medien_an() {
        let (s, protokoll, _) = sitzung();
        s.raum_beitreten(json!({})).unwrap();
        s.auf_lokale_medien_warten(true);

        s.eingang_verarbeiten(&wire("B", json!({"readyForOffer": true})));
        assert_eq!(s.zurueckgestellte_anzahl(), 1);
        assert_eq!(s.zurueckgestellte_verarbeiten(), 1);
        assert_eq!(s.zurueckgestellte_anzahl(), 1, "wartet weiter");

        s.lokale_medien_anhaengen();
        s.zurueckgestellte_verarbeiten();
        assert_eq!(s.zurueckgestellte_anzahl(), 0);
        assert_eq!(protokoll.eintraege(), vec!["negotiation:B"]);
    }

    #[test]
    fn lokale_medien_zaehler_saettigt() {
        let (s, _, _) = sitzung();
        s.lokale_medien_entfernen();
        s.lokale_medien_anhaengen();
        s.lokale_medien_entfernen();
        s.lokale_medien_entfernen();
        assert_eq!(s.state.lock().lokale_medien, 0);
    }

    #[test]
    fn teilnahme_anfrage_annehmen() {
        let (s, protokoll, _) = sitzung();
        s.raum_beitreten(json!({})).unwrap();

        let anfrage = SessionMessage::new(
            "B".into(),
            json!({"newParticipationRequest": true}),
            json!({"name": "Bob"}),
        );
        s.eingang_verarbeiten(&encode(EVENT, &anfrage.in_data()).unwrap());
        assert_eq!(protokoll.eintraege(), vec!["request:B"]);

        let request = ParticipationRequest::aus_nachricht(&anfrage, &PeerPreferences::default());
        s.teilnahme_annehmen(&"B".into(), &request);
        assert_eq!(protokoll.eintraege(), vec!["request:B", "create:B"]);
        assert_eq!(s.peer(&"B".into()).unwrap().extra, json!({"name": "Bob"}));
    }

    #[test]
    fn fremder_user_left_schliesst_gate() {
        let (s, protokoll, _) = sitzung();
        s.raum_beitreten(json!({})).unwrap();

        s.eingang_verarbeiten(&wire("A", json!({"userLeft": true})));
        assert!(!s.ist_beigetreten());

        s.eingang_verarbeiten(&wire("C", json!({"newParticipant": "B"})));
        assert!(protokoll.eintraege().is_empty());
        assert!(s.roster_teilnehmer().is_empty());
    }

    #[test]
    fn auto_close_von_aussen_wird_nicht_dispatcht() {
        let (s, protokoll, _) = sitzung();
        s.raum_beitreten(json!({})).unwrap();
        s.eingang_verarbeiten(&wire("A", json!({"allParticipants": ["B"]})));

        s.eingang_verarbeiten(&wire(
            "A",
            json!({"userLeft": true, "autoCloseEntireSession": true}),
        ));
        assert_eq!(protokoll.eintraege(), vec!["create:B", "create:A"]);
        assert!(!s.ist_beigetreten());
        assert_eq!(s.roster_teilnehmer().len(), 2);

        // Erneuter Beitritt oeffnet das Gate wieder
        s.raum_beitreten(json!({})).unwrap();
        s.eingang_verarbeiten(&wire("A", json!({"userLeft": true})));
        assert!(!s.ist_beigetreten());
        assert_eq!(protokoll.eintraege(), vec!["create:B", "create:A"]);
    }

    #[tokio::test]
    async fn verbinden_und_trennen() {
        let (s, _, hub) = sitzung();
        s.verbinden().unwrap();
        assert!(s.ist_verbunden());
        assert_eq!(hub.abonnenten("raum"), 1);
        assert!(matches!(s.verbinden(), Err(SignalingError::BereitsVerbunden)));

        s.trennen().await.unwrap();
        assert!(!s.ist_verbunden());
        assert_eq!(hub.abonnenten("raum"), 0);
        assert!(matches!(s.trennen().await, Err(SignalingError::Getrennt)));
    }

    #[tokio::test]
    async fn volle_eingangs_queue_meldet_transportfehler() {
        let hub = InMemoryHub::neu();
        let mut config = SessionConfig::neu("ich", "raum");
        config.sitzung.eingangs_queue = 1;
        let s = SignalingSession::neu(
            config,
            Arc::new(hub.clone()),
            Arc::new(Protokoll::default()),
            Arc::new(KeineCallbacks),
        )
        .unwrap();

        // Presence belegt den einzigen Platz, der Task lief noch nicht
        s.verbinden().unwrap();
        assert!(matches!(
            s.nachricht_senden(json!({"sdp": "x"})),
            Err(SignalingError::Transport(_))
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(s.nachricht_senden(json!({"sdp": "x"})).unwrap().is_some());

        s.trennen().await.unwrap();
    }
}
