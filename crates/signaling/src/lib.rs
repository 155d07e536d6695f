//! rtcmesh-signaling – Signaling-Dispatch und Peer-Lifecycle
//!
//! Dieser Crate koordiniert den Lebenszyklus von Peer-Verbindungen in einem
//! WebRTC-Mesh. Er interpretiert Signaling-Nachrichten anderer Teilnehmer,
//! fuehrt Roster und Backup-Store und gibt Befehle an einen externen
//! PeerManager. SDP/ICE selbst, Medien und der Transport-Server liegen
//! ausserhalb.
//!
//! ## Architektur
//!
//! ```text
//! Transport (InMemoryHub oder eigene Implementierung)
//!     |
//!     v
//! SignalingSession (pro Sitzung ein Eingangs-Task)
//!     |  Envelope dekodieren, Join-Gate pruefen
//!     |
//!     +-- PresenceTracker   (Online/Offline pro Teilnehmer)
//!     +-- EventRegistry     (roher Verkehr fuer Abonnenten)
//!     +-- SignalingDispatcher
//!             |  klassifiziert unter der Sitzungssperre
//!             +-- PeerRoster + Backups
//!             +-- StreamEvents (nur lesen)
//!             v
//!         Aktionen -> PeerManager / SessionCallbacks
//! ```

pub mod callbacks;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod peer_manager;
pub mod presence;
pub mod registry;
pub mod roster;
pub mod session;
pub mod session_state;
pub mod streams;
pub mod transport;

// Bequeme Re-Exporte
pub use callbacks::{KeineCallbacks, SessionCallbacks};
pub use config::{SessionConfig, STANDARD_NACHRICHTEN_EVENT};
pub use dispatcher::{Aktion, DispatchErgebnis, SignalingDispatcher};
pub use error::{SignalingError, SignalingResult};
pub use gate::JoinGate;
pub use peer_manager::PeerManager;
pub use presence::PresenceTracker;
pub use registry::{EventHandler, EventRegistry};
pub use roster::{Peer, PeerBackup, PeerRoster, Umbenennung};
pub use session::{SignalingSession, RETRY_INTERVALL};
pub use session_state::{SessionState, SharedSessionState};
pub use streams::{MediaStream, StreamEvent, StreamEvents};
pub use transport::{InMemoryHub, Transport, TransportSubscription};
