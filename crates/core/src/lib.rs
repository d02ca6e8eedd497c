//! kapellmeister-core – Gemeinsame Typen und Telemetrie-Schnittstelle
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Kapellmeister-Crates gemeinsam genutzt werden.

pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use event::{KeineTelemetrie, Telemetrie, TelemetrieEreignis};
pub use types::{GuildId, NodeName};
