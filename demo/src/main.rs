//! rtcmesh Demo – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und laesst mehrere
//! Sitzungen ueber einen In-Memory-Hub ein Mesh aufbauen. Der PeerManager
//! loggt nur, statt echte Verbindungen aufzubauen.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rtcmesh_core::{ExtraDataUpdate, ParticipantId, PeerHandle, UserStatusChange};
use rtcmesh_protocol::PeerPreferences;
use rtcmesh_signaling::{InMemoryHub, PeerManager, SessionCallbacks, SessionConfig, SignalingSession};
use serde_json::{json, Value};

/// Anzahl zusaetzlicher Gast-Sitzungen neben der konfigurierten
const GAESTE: usize = 2;

/// Wartezeit bis der Hub alle Nachrichten zugestellt hat
const ZUSTELLUNG: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    let config_pfad = std::env::var("RTCMESH_CONFIG").unwrap_or_else(|_| "rtcmesh.toml".into());
    let config = SessionConfig::laden(&config_pfad)?;

    rtcmesh_observability::logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        teilnehmer = %config.teilnehmer_id(),
        "rtcmesh Demo wird gestartet"
    );

    let hub = InMemoryHub::neu();
    let mut sitzungen = Vec::with_capacity(GAESTE + 1);

    let mut configs = vec![config.clone()];
    for i in 1..=GAESTE {
        let mut gast = config.clone();
        gast.sitzung.teilnehmer_id = ParticipantId::new(format!("gast-{i}"));
        gast.sitzung.extra = json!({ "name": format!("Gast {i}") });
        configs.push(gast);
    }

    for cfg in configs {
        let protokoll = Arc::new(LogPeers {
            lokal: cfg.teilnehmer_id().clone(),
        });
        let sitzung = SignalingSession::neu(cfg, Arc::new(hub.clone()), protokoll.clone(), protokoll)?;
        sitzung.verbinden()?;
        sitzung.raum_beitreten(json!({ "sessionid": sitzung.config().sitzung.kanal }))?;

        // Bereits anwesende Teilnehmer legen einen Peer fuer uns an
        sitzung.nachricht_senden(json!({ "newParticipant": sitzung.teilnehmer_id() }))?;
        tokio::time::sleep(ZUSTELLUNG).await;
        sitzungen.push(sitzung);
    }

    for sitzung in &sitzungen {
        let roster: Vec<String> = sitzung
            .roster_teilnehmer()
            .iter()
            .map(ToString::to_string)
            .collect();
        tracing::info!(teilnehmer = %sitzung.teilnehmer_id(), roster = ?roster, "Roster");
    }

    for sitzung in &sitzungen {
        sitzung.verlassen()?;
        tokio::time::sleep(ZUSTELLUNG).await;
        sitzung.trennen().await?;
    }

    tracing::info!("rtcmesh Demo beendet");
    Ok(())
}

/// PeerManager und Callbacks, die alles nur loggen
struct LogPeers {
    lokal: ParticipantId,
}

impl PeerManager for LogPeers {
    fn create_peer(&self, participant: &ParticipantId, handle: PeerHandle, preferences: &PeerPreferences) {
        tracing::info!(lokal = %self.lokal, %participant, %handle, one_way = preferences.is_one_way, "create_peer");
    }

    fn renegotiate_peer(&self, participant: &ParticipantId, _preferences: &PeerPreferences) {
        tracing::info!(lokal = %self.lokal, %participant, "renegotiate_peer");
    }

    fn on_participant_left(&self, participant: &ParticipantId) {
        tracing::info!(lokal = %self.lokal, %participant, "Teilnehmer hat verlassen");
    }

    fn forward_negotiation(&self, participant: &ParticipantId, payload: &Value) {
        tracing::debug!(lokal = %self.lokal, %participant, %payload, "forward_negotiation");
    }

    fn drop_peer(&self, participant: &ParticipantId) {
        tracing::info!(lokal = %self.lokal, %participant, "drop_peer");
    }
}

impl SessionCallbacks for LogPeers {
    fn on_extra_data_updated(&self, update: &ExtraDataUpdate) {
        tracing::info!(lokal = %self.lokal, userid = %update.userid, extra = %update.extra, "extra aktualisiert");
    }

    fn on_user_status_changed(&self, change: &UserStatusChange) {
        tracing::info!(lokal = %self.lokal, userid = %change.userid, status = ?change.status, "Online-Status");
    }

    fn on_session_leave(&self) {
        tracing::info!(lokal = %self.lokal, "Sitzung verlassen");
    }
}
