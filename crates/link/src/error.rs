//! Fehlertypen fuer Link-Verwaltung und Event-Routing

use kapellmeister_cluster::ClusterFehler;
use kapellmeister_core::GuildId;
use thiserror::Error;

/// Fehlertyp fuer Link-Verwaltung und Event-Routing
#[derive(Debug, Error)]
pub enum LinkFehler {
    /// Bei der Link-Erstellung konnte kein Node gewaehlt werden
    #[error("Node-Auswahl fehlgeschlagen: {0}")]
    NodeAuswahl(#[from] ClusterFehler),

    /// Eingehendes Voice-Server-Update ohne verwertbare Guild-ID
    #[error("Ungueltiges Voice-Server-Update: {0}")]
    UngueltigesEvent(String),

    /// Voice-Server-Update fuer eine Guild ohne bestehenden Link
    ///
    /// Unter normalen Races zu erwarten: das Event kommt an bevor eine
    /// Wiedergabe-Anforderung den Link erstellt hat.
    #[error("Kein Link fuer {0} vorhanden")]
    UnbekannterGuildLink(GuildId),
}

/// Result-Typ fuer Link-Verwaltung und Event-Routing
pub type LinkResult<T> = Result<T, LinkFehler>;
