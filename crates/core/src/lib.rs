//! rtcmesh-core – Gemeinsame Typen, Fehlertypen und Event-Payloads
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen rtcmesh-Crates gemeinsam genutzt werden.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{MeshError, Result};
pub use event::{ExtraDataUpdate, OnlineStatus, UserStatusChange};
pub use types::{ParticipantId, PeerHandle, StreamId, SubscriptionId};
