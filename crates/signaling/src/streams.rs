//! Stream-Event-Store
//!
//! Die Anwendung (bzw. der PeerManager) traegt hier jeden Remote-Stream
//! ein, sobald er ankommt. Der Dispatcher liest den Store nur, um
//! Stream-Sync-Anfragen (play/pause/mute/ended) auf das Media-Handle zu
//! routen. Fehlt ein Stream, wird die Anfrage still ignoriert.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use rtcmesh_core::types::{ParticipantId, StreamId};
use serde_json::Value;

/// Handle auf eine Media-Ressource
pub trait MediaStream: Send + Sync {
    /// Fuehrt die benannte Aktion aus (`mute`, `unmute`, `play`, ...)
    ///
    /// `media_type` ist `None` fuer beide Spurarten. Gibt `false` zurueck,
    /// wenn die Aktion nicht unterstuetzt wird.
    fn aktion_ausfuehren(&self, aktion: &str, media_type: Option<&str>) -> bool;
}

/// Eintrag eines Streams
#[derive(Clone)]
pub struct StreamEvent {
    pub streamid: StreamId,
    /// Besitzer des Streams
    pub userid: ParticipantId,
    pub stream: Option<Arc<dyn MediaStream>>,
    pub extra: Value,
}

impl fmt::Debug for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEvent")
            .field("streamid", &self.streamid)
            .field("userid", &self.userid)
            .field("stream", &self.stream.as_ref().map(|_| "<media>"))
            .field("extra", &self.extra)
            .finish()
    }
}

/// Geteilter Store aller bekannten Streams
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct StreamEvents {
    inner: Arc<DashMap<StreamId, StreamEvent>>,
}

impl StreamEvents {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn eintragen(&self, event: StreamEvent) {
        tracing::debug!(streamid = %event.streamid, userid = %event.userid, "Stream eingetragen");
        self.inner.insert(event.streamid.clone(), event);
    }

    pub fn entfernen(&self, streamid: &StreamId) -> Option<StreamEvent> {
        self.inner.remove(streamid).map(|(_, e)| e)
    }

    pub fn get(&self, streamid: &StreamId) -> Option<StreamEvent> {
        self.inner.get(streamid).map(|e| e.clone())
    }

    /// Ueberschreibt `extra` eines vorhandenen Eintrags
    pub fn extra_setzen(&self, streamid: &StreamId, extra: Value) {
        if let Some(mut e) = self.inner.get_mut(streamid) {
            e.extra = extra;
        }
    }

    pub fn anzahl(&self) -> usize {
        self.inner.len()
    }
}
