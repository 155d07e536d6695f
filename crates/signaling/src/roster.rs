//! Peer-Roster und Backup-Store
//!
//! Der Roster ist die autoritative Liste der aktiven Peers einer Sitzung.
//! Daneben haelt der Backup-Store die zuletzt bekannten `extra`-Metadaten
//! jedes Peers, der je im Roster war. Backups werden waehrend der Sitzung
//! nie geloescht, damit spaete Events (z.B. Stream-Ende) nach dem Abgang
//! eines Peers noch die richtigen Metadaten tragen.

use std::collections::HashMap;

use rtcmesh_core::types::{ParticipantId, PeerHandle};
use rtcmesh_protocol::PeerPreferences;
use serde_json::Value;

use crate::streams::StreamEvent;

/// Eintrag im Roster
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub userid: ParticipantId,
    pub preferences: PeerPreferences,
    pub extra: Value,
    /// Schluessel der Verbindung im PeerManager
    pub handle: PeerHandle,
}

/// Ergebnis von [`PeerRoster::umbenennen`]
#[derive(Debug, Clone, PartialEq)]
pub enum Umbenennung {
    /// Kein Eintrag unter der alten ID
    Unbekannt,
    /// Eintrag liegt jetzt unter der neuen ID
    Verschoben,
    /// Wie `Verschoben`, der bisherige Eintrag der neuen ID ist raus
    Ersetzt(Peer),
}

/// Zuletzt bekannte Metadaten eines (evtl. abgegangenen) Peers
#[derive(Debug, Clone, PartialEq)]
pub struct PeerBackup {
    pub userid: ParticipantId,
    pub extra: Value,
}

/// Roster plus Backup-Store einer Sitzung
#[derive(Debug, Default)]
pub struct PeerRoster {
    peers: HashMap<ParticipantId, Peer>,
    backups: HashMap<ParticipantId, PeerBackup>,
}

impl PeerRoster {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt einen neuen Peer ein und schreibt sein Backup
    ///
    /// Ist die ID schon vorhanden, bleibt der bestehende Eintrag unveraendert
    /// und es wird `None` zurueckgegeben.
    pub fn einfuegen(
        &mut self,
        userid: ParticipantId,
        preferences: PeerPreferences,
        extra: Value,
    ) -> Option<PeerHandle> {
        if self.peers.contains_key(&userid) {
            return None;
        }

        let handle = PeerHandle::new();
        self.backup_schreiben(&userid, extra.clone());
        self.peers.insert(
            userid.clone(),
            Peer {
                userid,
                preferences,
                extra,
                handle,
            },
        );
        Some(handle)
    }

    /// Aktualisiert die `extra`-Daten eines Peers
    ///
    /// Gibt `true` zurueck wenn sich der Roster-Eintrag geaendert hat.
    /// Das Backup wird in jedem Fall gespiegelt.
    pub fn extra_aktualisieren(&mut self, userid: &ParticipantId, extra: &Value) -> bool {
        let geaendert = match self.peers.get_mut(userid) {
            Some(peer) if peer.extra != *extra => {
                peer.extra = extra.clone();
                true
            }
            _ => false,
        };
        self.backup_schreiben(userid, extra.clone());
        geaendert
    }

    /// Uebertraegt das Backup des Stream-Besitzers auf den Stream-Eintrag
    ///
    /// Gibt `true` zurueck wenn ein Backup existierte.
    pub fn backup_auf_stream_anwenden(&self, stream: &mut StreamEvent) -> bool {
        match self.backups.get(&stream.userid) {
            Some(backup) => {
                stream.extra = backup.extra.clone();
                true
            }
            None => false,
        }
    }

    /// Verschiebt einen Eintrag auf eine neue ID (UUID-Migration)
    ///
    /// Alle anderen Felder bleiben erhalten. No-op wenn `alt` fehlt. Ein
    /// bestehender Eintrag unter `neu` wird verdraengt und zurueckgegeben.
    pub fn umbenennen(&mut self, alt: &ParticipantId, neu: &ParticipantId) -> Umbenennung {
        let Some(mut peer) = self.peers.remove(alt) else {
            return Umbenennung::Unbekannt;
        };
        peer.userid = neu.clone();
        match self.peers.insert(neu.clone(), peer) {
            Some(verdraengt) => Umbenennung::Ersetzt(verdraengt),
            None => Umbenennung::Verschoben,
        }
    }

    /// Entfernt einen Peer aus dem Roster; das Backup bleibt
    pub fn entfernen(&mut self, userid: &ParticipantId) -> Option<Peer> {
        self.peers.remove(userid)
    }

    /// Leert den Roster (lokaler Austritt); Backups bleiben
    pub fn leeren(&mut self) -> Vec<Peer> {
        self.peers.drain().map(|(_, peer)| peer).collect()
    }

    pub fn enthaelt(&self, userid: &ParticipantId) -> bool {
        self.peers.contains_key(userid)
    }

    pub fn peer(&self, userid: &ParticipantId) -> Option<&Peer> {
        self.peers.get(userid)
    }

    pub fn backup(&self, userid: &ParticipantId) -> Option<&PeerBackup> {
        self.backups.get(userid)
    }

    /// IDs aller aktiven Peers (sortiert)
    pub fn teilnehmer(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<_> = self.peers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn anzahl(&self) -> usize {
        self.peers.len()
    }

    fn backup_schreiben(&mut self, userid: &ParticipantId, extra: Value) {
        match self.backups.get_mut(userid) {
            Some(backup) => backup.extra = extra,
            None => {
                self.backups.insert(
                    userid.clone(),
                    PeerBackup {
                        userid: userid.clone(),
                        extra,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    fn roster_mit(ids: &[&str]) -> PeerRoster {
        let mut roster = PeerRoster::neu();
        for i in ids {
            roster.einfuegen(id(i), PeerPreferences::default(), json!({}));
        }
        roster
    }

    #[test]
    fn einfuegen_ist_eindeutig() {
        let mut roster = roster_mit(&["a"]);
        assert!(roster
            .einfuegen(id("a"), PeerPreferences::default(), json!({"x": 1}))
            .is_none());
        assert_eq!(roster.anzahl(), 1);
        assert_eq!(roster.peer(&id("a")).unwrap().extra, json!({}));
    }

    #[test]
    fn extra_aktualisieren_meldet_aenderung() {
        let mut roster = roster_mit(&["a"]);
        assert!(roster.extra_aktualisieren(&id("a"), &json!({"name": "A"})));
        assert!(!roster.extra_aktualisieren(&id("a"), &json!({"name": "A"})));
        assert_eq!(roster.backup(&id("a")).unwrap().extra, json!({"name": "A"}));
    }

    #[test]
    fn extra_fuer_unbekannten_peer_schreibt_nur_backup() {
        let mut roster = PeerRoster::neu();
        assert!(!roster.extra_aktualisieren(&id("z"), &json!({"k": true})));
        assert!(!roster.enthaelt(&id("z")));
        assert_eq!(roster.backup(&id("z")).unwrap().extra, json!({"k": true}));
    }

    #[test]
    fn entfernen_behaelt_backup() {
        let mut roster = roster_mit(&["c"]);
        roster.extra_aktualisieren(&id("c"), &json!({"foo": 1}));
        assert!(roster.entfernen(&id("c")).is_some());
        assert!(!roster.enthaelt(&id("c")));
        assert_eq!(roster.backup(&id("c")).unwrap().extra, json!({"foo": 1}));
        // zweites Entfernen ist ein No-op
        assert!(roster.entfernen(&id("c")).is_none());
    }

    #[test]
    fn umbenennen_erhaelt_felder() {
        let mut roster = roster_mit(&["d"]);
        roster.extra_aktualisieren(&id("d"), &json!({"rolle": "host"}));
        let vorher = roster.peer(&id("d")).cloned().unwrap();

        assert_eq!(roster.umbenennen(&id("d"), &id("d2")), Umbenennung::Verschoben);
        assert!(!roster.enthaelt(&id("d")));
        let nachher = roster.peer(&id("d2")).unwrap();
        assert_eq!(nachher.handle, vorher.handle);
        assert_eq!(nachher.extra, vorher.extra);
        assert_eq!(nachher.preferences, vorher.preferences);
        assert_eq!(nachher.userid, id("d2"));
    }

    #[test]
    fn umbenennen_unbekannter_id_ist_noop() {
        let mut roster = roster_mit(&["x"]);
        assert_eq!(roster.umbenennen(&id("fehlt"), &id("neu")), Umbenennung::Unbekannt);
        assert_eq!(roster.teilnehmer(), vec![id("x")]);
    }

    #[test]
    fn umbenennen_auf_belegte_id_gibt_verdraengten_zurueck() {
        let mut roster = roster_mit(&["d", "e", "x"]);
        let handle_d = roster.peer(&id("d")).unwrap().handle;
        let alt_e = roster.peer(&id("e")).cloned().unwrap();

        assert_eq!(roster.umbenennen(&id("d"), &id("e")), Umbenennung::Ersetzt(alt_e));
        assert_eq!(roster.teilnehmer(), vec![id("e"), id("x")]);
        assert_eq!(roster.peer(&id("e")).unwrap().handle, handle_d);
    }

    #[test]
    fn leeren_behaelt_alle_backups() {
        let mut roster = roster_mit(&["a", "b"]);
        assert_eq!(roster.leeren().len(), 2);
        assert_eq!(roster.anzahl(), 0);
        assert!(roster.backup(&id("a")).is_some());
        assert!(roster.backup(&id("b")).is_some());
    }
}
