//! Transport-Schnittstelle und In-Memory-Hub
//!
//! Der Transport verschickt opake Leitungsnachrichten auf einem benannten
//! Kanal. Zustellung pro Sender in Sendereihenfolge, mindestens einmal,
//! ohne Ordnung zwischen verschiedenen Sendern. Verbindungsaufbau und
//! Reconnect liegen ausserhalb dieses Crates.
//!
//! [`InMemoryHub`] ist ein prozesslokaler Hub mit dieser Semantik (Fan-out
//! an alle Abonnenten eines Kanals, Sender eingeschlossen). Eine volle
//! Eingangs-Queue verliert die Nachricht nicht still: `send` meldet dann
//! einen Transportfehler, damit der Sender erneut senden kann.

use std::sync::Arc;

use dashmap::DashMap;
use rtcmesh_core::types::SubscriptionId;
use tokio::sync::mpsc;

use crate::error::{SignalingError, SignalingResult};

/// Handle auf ein Kanal-Abonnement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSubscription {
    pub id: SubscriptionId,
    pub kanal: String,
}

/// Publish/Subscribe-Transport
pub trait Transport: Send + Sync + 'static {
    /// Sendet eine Leitungsnachricht auf `kanal` (nicht-blockierend)
    ///
    /// Kann die Nachricht nicht an jeden Abonnenten uebergeben werden, ist
    /// das Ergebnis ein Fehler.
    fn send(&self, kanal: &str, nachricht: String) -> SignalingResult<()>;

    /// Abonniert `kanal`; eingehende Nachrichten landen in `tx`
    fn subscribe(
        &self,
        kanal: &str,
        tx: mpsc::Sender<String>,
    ) -> SignalingResult<TransportSubscription>;

    /// Beendet ein Abonnement
    fn unsubscribe(&self, abo: &TransportSubscription);
}

// ---------------------------------------------------------------------------
// InMemoryHub
// ---------------------------------------------------------------------------

/// Prozesslokaler Hub
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct InMemoryHub {
    kanaele: Arc<DashMap<String, Vec<(SubscriptionId, mpsc::Sender<String>)>>>,
}

impl InMemoryHub {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl der Abonnenten eines Kanals
    pub fn abonnenten(&self, kanal: &str) -> usize {
        self.kanaele.get(kanal).map(|k| k.len()).unwrap_or(0)
    }
}

impl Transport for InMemoryHub {
    fn send(&self, kanal: &str, nachricht: String) -> SignalingResult<()> {
        let empfaenger = match self.kanaele.get(kanal) {
            Some(k) => k.clone(),
            None => {
                tracing::debug!(kanal, "Senden an Kanal ohne Abonnenten");
                return Ok(());
            }
        };

        let mut voll = 0usize;
        for (id, tx) in &empfaenger {
            match tx.try_send(nachricht.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(kanal, abo = %id, "Eingangs-Queue voll – Nachricht nicht zugestellt");
                    voll += 1;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(kanal, abo = %id, "Eingangs-Queue geschlossen");
                }
            }
        }

        if voll > 0 {
            return Err(SignalingError::transport(format!(
                "Eingangs-Queue voll bei {voll} von {} Abonnenten auf '{kanal}'",
                empfaenger.len()
            )));
        }
        Ok(())
    }

    fn subscribe(
        &self,
        kanal: &str,
        tx: mpsc::Sender<String>,
    ) -> SignalingResult<TransportSubscription> {
        if kanal.is_empty() {
            return Err(SignalingError::transport("leerer Kanalname"));
        }
        let id = SubscriptionId::new();
        self.kanaele
            .entry(kanal.to_string())
            .or_default()
            .push((id, tx));
        tracing::debug!(kanal, abo = %id, "Kanal abonniert");
        Ok(TransportSubscription {
            id,
            kanal: kanal.to_string(),
        })
    }

    fn unsubscribe(&self, abo: &TransportSubscription) {
        if let Some(mut eintraege) = self.kanaele.get_mut(&abo.kanal) {
            eintraege.retain(|(id, _)| *id != abo.id);
        }
        self.kanaele.retain(|_, eintraege| !eintraege.is_empty());
        tracing::debug!(kanal = %abo.kanal, abo = %abo.id, "Kanal-Abo beendet");
    }
}
