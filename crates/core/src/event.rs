//! Telemetrie-Schnittstelle
//!
//! Definiert die Schnittstelle fuer Observability-Meldungen aus dem Kern.
//! Die Meldungen sind fire-and-forget: die Kernlogik haengt an keiner
//! Stelle vom Erfolg der Telemetrie ab. Die konkrete Implementierung
//! (Prometheus-Collector, Log-Sink) liefert das aeussere System.

use crate::types::{GuildId, NodeName};
use serde::{Deserialize, Serialize};

/// Alle Ereignisse die der Kern an die Telemetrie meldet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetrieEreignis {
    // --- Cluster-Ereignisse ---
    /// Ein Node wurde im Cluster registriert
    NodeRegistriert { node: NodeName },

    // --- Link-Ereignisse ---
    /// Ein Link wurde reserviert, der Aufbau laeuft an
    LinkErstellt { guild_id: GuildId },
    /// Ein Link hat den Zustand Verbunden erreicht
    LinkVerbunden { guild_id: GuildId, node: NodeName },
    /// Ein zwischengespeichertes Voice-Server-Update wurde wiederholt
    ResumeWiederholt { guild_id: GuildId },
    /// Ein Link wurde geschlossen und aus der Tabelle entfernt
    LinkGeschlossen { guild_id: GuildId },
}

/// Trait fuer die Telemetrie-Senke
///
/// Platzhalter-Trait – die konkrete Implementierung wird vom aeusseren
/// System bereitgestellt. Implementierungen muessen nicht-blockierend
/// sein, `melden` wird aus dem Hot Path aufgerufen.
pub trait Telemetrie: Send + Sync + 'static {
    /// Meldet ein Ereignis. Fehler werden von der Implementierung
    /// geschluckt, der Kern wertet keinen Rueckgabewert aus.
    fn melden(&self, ereignis: TelemetrieEreignis);
}

/// No-Op-Telemetrie fuer Tests und Betrieb ohne Observability
pub struct KeineTelemetrie;

impl Telemetrie for KeineTelemetrie {
    fn melden(&self, _ereignis: TelemetrieEreignis) {}
}
