//! rtcmesh-protocol – Leitungsformat des Signalings
//!
//! Dieses Crate definiert das Envelope-Format `{eventName, data}`, die
//! darin transportierten Payloads (Session-Nachricht, Presence) und die
//! Klassifikation eines Session-Nachrichten-Bodys in einen Tagged Enum.
//!
//! Alle Formen muessen byte-kompatibel zu unveraenderten Peers bleiben,
//! deshalb sind die Feldnamen camelCase wie auf der Leitung.

pub mod envelope;
pub mod error;
pub mod message;
pub mod preferences;
pub mod signal;

pub use envelope::{decode, encode, Envelope, CHANGED_UUID_EVENT, JOIN_ROOM_EVENT, PRESENCE_EVENT};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{PresencePayload, SessionMessage};
pub use preferences::{Direction, MediaConfig, ParticipationRequest, PeerPreferences, SdpConstraints};
pub use signal::{ist_wahr, SignalBody, StreamSync, Stufe, DROP_PEER_CONNECTION};
