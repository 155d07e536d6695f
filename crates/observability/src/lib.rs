//! # rtcmesh-observability
//!
//! Structured Logging fuer rtcmesh via tracing-subscriber
//! (Text oder JSON, Level per Umgebung ueberschreibbar).

pub mod logging;

pub use logging::{logging_initialisieren, test_logging_initialisieren, LogFormat};
