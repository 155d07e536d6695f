//! Verbindungs-Praeferenzen und ihre Ableitung aus der Medien-Konfiguration
//!
//! Die Praeferenzen beschreiben fuer eine Peer-Verbindung, welche Medien
//! lokal bzw. von der Gegenseite angeboten werden sollen und ob die
//! Verbindung einseitig oder reine Datenverbindung ist.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::SessionMessage;
use crate::signal::ist_wahr;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Richtung der Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    ManyToMany,
    OneToOne,
    OneToMany,
    OneWay,
}

/// Sitzungsweite Medien-Konfiguration (nur lesend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub audio: bool,
    pub video: bool,
    pub screen: bool,
    pub data: bool,
    /// Einseitige Sitzung (nur senden)
    pub oneway: bool,
    pub richtung: Direction,
    /// Standard-SDP-Constraints (`mandatory.OfferToReceiveAudio`)
    pub offer_to_receive_audio: bool,
    /// Standard-SDP-Constraints (`mandatory.OfferToReceiveVideo`)
    pub offer_to_receive_video: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
            screen: false,
            data: false,
            oneway: false,
            richtung: Direction::ManyToMany,
            offer_to_receive_audio: true,
            offer_to_receive_video: true,
        }
    }
}

impl MediaConfig {
    /// Reine Datensitzung: weder Audio, Video noch Screen, aber Data
    pub fn ist_nur_daten(&self) -> bool {
        !self.audio && !self.video && !self.screen && self.data
    }

    /// Einseitig per Session-Flag oder per Richtung
    pub fn ist_einseitig(&self) -> bool {
        self.oneway || self.richtung == Direction::OneWay
    }
}

// ---------------------------------------------------------------------------
// SdpConstraints
// ---------------------------------------------------------------------------

/// Angebots-Constraints einer Seite
///
/// Fehlende Felder auf der Leitung gelten als `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SdpConstraints {
    #[serde(rename = "OfferToReceiveAudio", default)]
    pub offer_to_receive_audio: bool,
    #[serde(rename = "OfferToReceiveVideo", default)]
    pub offer_to_receive_video: bool,
}

impl SdpConstraints {
    pub fn new(audio: bool, video: bool) -> Self {
        Self {
            offer_to_receive_audio: audio,
            offer_to_receive_video: video,
        }
    }
}

// ---------------------------------------------------------------------------
// PeerPreferences
// ---------------------------------------------------------------------------

/// Praeferenz-Objekt fuer das Anlegen oder Neuverhandeln eines Peers
///
/// Unbekannte Felder aus `userPreferences` landen in `weitere` und werden
/// beim Serialisieren unveraendert wieder ausgegeben.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerPreferences {
    #[serde(default)]
    pub local_peer_sdp_constraints: SdpConstraints,
    #[serde(default)]
    pub remote_peer_sdp_constraints: SdpConstraints,
    #[serde(default)]
    pub is_one_way: bool,
    #[serde(default)]
    pub is_data_only: bool,
    #[serde(flatten)]
    pub weitere: Map<String, Value>,
}

impl PeerPreferences {
    /// Leitet die Standard-Praeferenzen aus der Medien-Konfiguration ab
    ///
    /// Rein funktional: gleiche Konfiguration ergibt immer das gleiche Objekt.
    pub fn ableiten(config: &MediaConfig) -> Self {
        let lokal = SdpConstraints::new(config.offer_to_receive_audio, config.offer_to_receive_video);

        let remote = if config.oneway {
            SdpConstraints::new(config.audio, config.video || config.screen)
        } else {
            lokal
        };

        Self {
            local_peer_sdp_constraints: lokal,
            remote_peer_sdp_constraints: remote,
            is_one_way: config.ist_einseitig(),
            is_data_only: config.ist_nur_daten(),
            weitere: Map::new(),
        }
    }

    /// Liest `userPreferences` von der Leitung
    ///
    /// Gibt `None` zurueck wenn der Wert fehlt, falsy ist oder keine
    /// gueltige Praeferenz-Struktur hat.
    pub fn aus_wert(wert: Option<&Value>) -> Option<Self> {
        let wert = wert.filter(|w| ist_wahr(Some(w)))?;
        Self::deserialize(wert).ok()
    }
}

// ---------------------------------------------------------------------------
// ParticipationRequest
// ---------------------------------------------------------------------------

/// Anfrage eines entfernten Teilnehmers, eine Verbindung aufzubauen
///
/// Die Constraints sind gegenueber der Anfrage vertauscht: was fuer den
/// Anfragenden "lokal" ist, ist fuer uns "remote".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRequest {
    pub extra: Value,
    pub preferences: PeerPreferences,
    pub dont_get_remote_stream: bool,
    pub dont_attach_local_stream: bool,
    /// Die urspruengliche Nachricht, fuer eine spaetere Antwort
    pub connection_description: SessionMessage,
}

impl ParticipationRequest {
    /// Baut die Anfrage aus einer `newParticipationRequest`-Nachricht
    pub fn aus_nachricht(nachricht: &SessionMessage, standard: &PeerPreferences) -> Self {
        let body = &nachricht.message;

        let constraints = |feld: &str, fallback: SdpConstraints| {
            body.get(feld)
                .filter(|w| ist_wahr(Some(w)))
                .and_then(|w| SdpConstraints::deserialize(w).ok())
                .unwrap_or(fallback)
        };
        let flag = |feld: &str, fallback: bool| match body.get(feld) {
            Some(w) => ist_wahr(Some(w)),
            None => fallback,
        };

        let is_one_way = flag("isOneWay", standard.is_one_way);

        Self {
            extra: if nachricht.extra.is_null() {
                Value::Object(Map::new())
            } else {
                nachricht.extra.clone()
            },
            preferences: PeerPreferences {
                local_peer_sdp_constraints: constraints(
                    "remotePeerSdpConstraints",
                    standard.local_peer_sdp_constraints,
                ),
                remote_peer_sdp_constraints: constraints(
                    "localPeerSdpConstraints",
                    standard.remote_peer_sdp_constraints,
                ),
                is_one_way,
                is_data_only: flag("isDataOnly", standard.is_data_only),
                weitere: Map::new(),
            },
            dont_get_remote_stream: is_one_way,
            dont_attach_local_stream: ist_wahr(body.get("dontGetRemoteStream")),
            connection_description: nachricht.clone(),
        }
    }
}
