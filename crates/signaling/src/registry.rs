//! Event-Registry – generisches Pub/Sub ueber Event-Namen
//!
//! Jedes dekodierte Envelope wird hier veroeffentlicht, unabhaengig vom
//! Join-Gate und vom Dispatcher. So koennen andere Teile der Anwendung den
//! rohen Signaling-Verkehr beobachten.
//!
//! Handler werden ausserhalb der Map-Sperre aufgerufen; ein Handler darf
//! also selbst `on`/`off` aufrufen.

use std::sync::Arc;

use dashmap::DashMap;
use rtcmesh_core::types::SubscriptionId;
use serde_json::Value;

/// Handler fuer ein Event
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Registry der Abonnements, indiziert nach Event-Name
///
/// Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct EventRegistry {
    abos: Arc<DashMap<String, Vec<(SubscriptionId, EventHandler)>>>,
}

impl EventRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen Handler fuer `event_name`
    pub fn on<F>(&self, event_name: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.abos
            .entry(event_name.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        tracing::trace!(event = event_name, abo = %id, "Event abonniert");
        id
    }

    /// Entfernt einen Handler
    ///
    /// Gibt `true` zurueck wenn das Abonnement existierte.
    pub fn off(&self, event_name: &str, id: SubscriptionId) -> bool {
        let Some(mut handler) = self.abos.get_mut(event_name) else {
            return false;
        };
        let vorher = handler.len();
        handler.retain(|(abo, _)| *abo != id);
        let entfernt = handler.len() != vorher;
        let ist_leer = handler.is_empty();
        drop(handler);

        if ist_leer {
            self.abos.remove_if(event_name, |_, h| h.is_empty());
        }
        entfernt
    }

    /// Ruft alle Handler fuer `event_name` auf
    ///
    /// Gibt die Anzahl der aufgerufenen Handler zurueck.
    pub fn veroeffentlichen(&self, event_name: &str, data: &Value) -> usize {
        let handler: Vec<EventHandler> = match self.abos.get(event_name) {
            Some(h) => h.iter().map(|(_, f)| Arc::clone(f)).collect(),
            None => return 0,
        };

        for f in &handler {
            f(data);
        }
        handler.len()
    }

    /// Anzahl der Handler fuer `event_name`
    pub fn anzahl(&self, event_name: &str) -> usize {
        self.abos.get(event_name).map(|h| h.len()).unwrap_or(0)
    }
}
