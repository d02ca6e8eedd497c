//! NodeCluster – besitzt die konfigurierte Node-Menge und waehlt Nodes aus
//!
//! Der Cluster wird einmalig beim Start provisioniert. Danach ist die
//! Node-Menge fest; nur Verfuegbarkeit und Link-Zaehler der einzelnen
//! Nodes bewegen sich noch.
//!
//! Thread-safe durch DashMap und `Arc<Inner>` – der Cluster ist billig
//! klonbar und kann an alle Subsysteme weitergereicht werden.

use crate::error::{ClusterFehler, ClusterResult};
use crate::node::Node;
use dashmap::DashMap;
use kapellmeister_core::{KeineTelemetrie, NodeName, Telemetrie, TelemetrieEreignis};
use std::sync::Arc;
use std::time::Duration;

/// Verwaltet die konfigurierte Menge an Audio-Streaming-Nodes
#[derive(Clone)]
pub struct NodeCluster {
    inner: Arc<NodeClusterInner>,
}

struct NodeClusterInner {
    /// Registrierte Nodes, indexiert nach Namen
    nodes: DashMap<NodeName, Arc<Node>>,
    /// Fire-and-forget Telemetrie-Senke
    telemetrie: Arc<dyn Telemetrie>,
}

impl NodeCluster {
    /// Erstellt einen leeren Cluster ohne Telemetrie
    pub fn neu() -> Self {
        Self::mit_telemetrie(Arc::new(KeineTelemetrie))
    }

    /// Erstellt einen leeren Cluster mit angebundener Telemetrie-Senke
    pub fn mit_telemetrie(telemetrie: Arc<dyn Telemetrie>) -> Self {
        Self {
            inner: Arc::new(NodeClusterInner {
                nodes: DashMap::new(),
                telemetrie,
            }),
        }
    }

    /// Registriert einen Node im Cluster
    ///
    /// Schlaegt mit [`ClusterFehler::DoppelterNode`] fehl wenn der Name
    /// bereits vergeben ist – das ist ein Konfigurationsfehler und beim
    /// Start fatal.
    pub fn node_hinzufuegen(
        &self,
        name: NodeName,
        endpunkt: impl Into<String>,
        passwort: impl Into<String>,
    ) -> ClusterResult<Arc<Node>> {
        use dashmap::mapref::entry::Entry;

        match self.inner.nodes.entry(name.clone()) {
            Entry::Occupied(_) => Err(ClusterFehler::DoppelterNode(name)),
            Entry::Vacant(platz) => {
                let node = Arc::new(Node::neu(name.clone(), endpunkt, passwort));
                platz.insert(node.clone());

                tracing::info!(
                    node = %name,
                    endpunkt = %node.endpunkt(),
                    "Node registriert"
                );
                // Fire-and-forget: die Kernlogik haengt nicht am Erfolg
                self.inner
                    .telemetrie
                    .melden(TelemetrieEreignis::NodeRegistriert { node: name });

                Ok(node)
            }
        }
    }

    /// Setzt die Resume-Parameter eines Nodes
    ///
    /// Muss vor der ersten Verwendung des Nodes geschehen, d.h. waehrend
    /// der Provisionierung beim Start.
    pub fn resume_konfigurieren(
        &self,
        node: &Node,
        label: impl Into<String>,
        timeout: Duration,
    ) {
        let label = label.into();
        tracing::debug!(
            node = %node.name(),
            label = %label,
            timeout_sekunden = timeout.as_secs(),
            "Resume konfiguriert"
        );
        node.resume_setzen(label, timeout);
    }

    /// Waehlt den Node mit den wenigsten aktiven Links aus
    ///
    /// Nodes ausserhalb der Rotation werden uebersprungen. Gibt
    /// [`ClusterFehler::KeinNodeVerfuegbar`] zurueck wenn der Cluster
    /// leer ist oder kein Node verfuegbar ist.
    pub fn node_waehlen(&self) -> ClusterResult<Arc<Node>> {
        self.inner
            .nodes
            .iter()
            .filter(|eintrag| eintrag.ist_verfuegbar())
            .min_by_key(|eintrag| eintrag.aktive_links())
            .map(|eintrag| eintrag.value().clone())
            .ok_or(ClusterFehler::KeinNodeVerfuegbar)
    }

    /// Sucht einen Node anhand seines Namens
    pub fn node_holen(&self, name: &NodeName) -> Option<Arc<Node>> {
        self.inner.nodes.get(name).map(|eintrag| eintrag.value().clone())
    }

    /// Anzahl der registrierten Nodes
    pub fn node_anzahl(&self) -> usize {
        self.inner.nodes.len()
    }
}

impl Default for NodeCluster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn test_cluster_mit_nodes(namen: &[&str]) -> NodeCluster {
        let cluster = NodeCluster::neu();
        for name in namen {
            cluster
                .node_hinzufuegen(NodeName::neu(*name), "ws://localhost:2333", "geheim")
                .expect("Name ist im Test eindeutig");
        }
        cluster
    }

    #[test]
    fn doppelter_name_wird_abgelehnt() {
        let cluster = test_cluster_mit_nodes(&["berlin"]);
        let fehler = cluster
            .node_hinzufuegen(NodeName::neu("berlin"), "ws://anderswo:2333", "geheim")
            .unwrap_err();
        assert!(matches!(fehler, ClusterFehler::DoppelterNode(_)));
        assert_eq!(cluster.node_anzahl(), 1);
    }

    #[test]
    fn auswahl_bevorzugt_wenig_belastete_nodes() {
        let cluster = test_cluster_mit_nodes(&["berlin", "hamburg"]);
        let berlin = cluster.node_holen(&NodeName::neu("berlin")).unwrap();
        berlin.link_zugewiesen();

        let gewaehlt = cluster.node_waehlen().unwrap();
        assert_eq!(gewaehlt.name(), &NodeName::neu("hamburg"));
    }

    #[test]
    fn auswahl_ueberspringt_nicht_verfuegbare_nodes() {
        let cluster = test_cluster_mit_nodes(&["berlin", "hamburg"]);
        let berlin = cluster.node_holen(&NodeName::neu("berlin")).unwrap();
        berlin.verfuegbarkeit_setzen(false);

        for _ in 0..3 {
            let gewaehlt = cluster.node_waehlen().unwrap();
            assert_eq!(gewaehlt.name(), &NodeName::neu("hamburg"));
        }
    }

    #[test]
    fn leerer_cluster_liefert_fehler() {
        let cluster = NodeCluster::neu();
        assert!(matches!(
            cluster.node_waehlen(),
            Err(ClusterFehler::KeinNodeVerfuegbar)
        ));
    }

    #[test]
    fn registrierung_meldet_telemetrie() {
        struct SammelTelemetrie(Mutex<Vec<TelemetrieEreignis>>);
        impl Telemetrie for SammelTelemetrie {
            fn melden(&self, ereignis: TelemetrieEreignis) {
                self.0.lock().push(ereignis);
            }
        }

        let senke = Arc::new(SammelTelemetrie(Mutex::new(Vec::new())));
        let cluster = NodeCluster::mit_telemetrie(senke.clone());
        cluster
            .node_hinzufuegen(NodeName::neu("berlin"), "ws://localhost:2333", "geheim")
            .unwrap();

        let ereignisse = senke.0.lock();
        assert_eq!(ereignisse.len(), 1);
        assert!(matches!(
            ereignisse[0],
            TelemetrieEreignis::NodeRegistriert { .. }
        ));
    }

    #[test]
    fn cluster_clone_teilt_state() {
        let cluster1 = test_cluster_mit_nodes(&["berlin"]);
        let cluster2 = cluster1.clone();
        assert_eq!(cluster2.node_anzahl(), 1);
        assert!(cluster2.node_holen(&NodeName::neu("berlin")).is_some());
    }
}
