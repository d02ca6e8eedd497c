//! Fehlertypen fuer die Cluster-Verwaltung

use kapellmeister_core::NodeName;
use thiserror::Error;

/// Fehlertyp fuer die Cluster-Verwaltung
#[derive(Debug, Error)]
pub enum ClusterFehler {
    /// Node-Name ist bereits registriert (Konfigurationsfehler, fatal beim Start)
    #[error("Node-Name bereits registriert: {0}")]
    DoppelterNode(NodeName),

    /// Cluster ist leer oder alle Nodes sind ausser Betrieb
    #[error("Kein verfuegbarer Node im Cluster")]
    KeinNodeVerfuegbar,
}

/// Result-Typ fuer die Cluster-Verwaltung
pub type ClusterResult<T> = Result<T, ClusterFehler>;
