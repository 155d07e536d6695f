//! Sitzungszustand
//!
//! Roster, Backups, Presence, Join-Gate und die Medien-Flags einer Sitzung
//! liegen in genau einem Objekt hinter genau einer Sperre. Jeder
//! Dispatch-Aufruf haelt die Sperre fuer die gesamte Klassifikation, damit
//! "klassifizieren, dann veraendern" atomar bleibt.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::gate::JoinGate;
use crate::presence::PresenceTracker;
use crate::roster::PeerRoster;

/// Geteilter Sitzungszustand
pub type SharedSessionState = Arc<Mutex<SessionState>>;

/// Zustand einer Sitzung
#[derive(Debug, Default)]
pub struct SessionState {
    pub roster: PeerRoster,
    pub presence: PresenceTracker,
    pub gate: JoinGate,
    /// Anzahl angehaengter lokaler Media-Streams
    pub lokale_medien: usize,
    /// Wartet die Anwendung noch auf lokale Medien?
    pub warte_auf_lokale_medien: bool,
}

impl SessionState {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Erstellt einen neuen geteilten Zustand
    pub fn geteilt() -> SharedSessionState {
        Arc::new(Mutex::new(Self::neu()))
    }
}
