//! kapellmeister-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen
//! Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use anyhow::{bail, Result};
use config::ServerConfig;
use kapellmeister_cluster::NodeCluster;
use kapellmeister_core::NodeName;
use kapellmeister_link::{
    GuildResolver, LinkTabelle, PlayerProvisioner, VoiceEventRouter,
};
use std::sync::Arc;
use std::time::Duration;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Node-Cluster aus der Konfiguration provisionieren
    /// 2. Gateway-Anschluss verdrahten (Resolver, Provisioner, Router)
    /// 3. Auf Ctrl-C / SIGTERM warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            instanz = %self.config.server.instanz,
            nodes = self.config.nodes.len(),
            "Server startet"
        );

        let cluster = cluster_provisionieren(&self.config)?;
        tracing::info!(nodes = cluster.node_anzahl(), "Node-Cluster provisioniert");

        // Die Gateway-Kollaborateure (GuildResolver, PlayerProvisioner,
        // Transporte) liefert der aeussere Anschluss; hier wird nur die
        // Bereitschaft gemeldet.
        tracing::info!("Gateway-Anschluss bereit (Platzhalter)");

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        Ok(())
    }
}

/// Provisioniert den Node-Cluster aus der Konfiguration
///
/// Doppelte Node-Namen sind ein Konfigurationsfehler und beim Start
/// fatal. Jeder Node erhaelt das Resume-Label der Instanz und das
/// konfigurierte Timeout.
pub fn cluster_provisionieren(config: &ServerConfig) -> Result<NodeCluster> {
    if config.nodes.is_empty() {
        bail!("Kein Audio-Node konfiguriert ([[nodes]] fehlt)");
    }

    let cluster = NodeCluster::neu();
    let label = config.resume_label();
    let timeout = Duration::from_secs(config.resume.timeout_sekunden);

    for eintrag in &config.nodes {
        let node = cluster
            .node_hinzufuegen(
                NodeName::neu(&eintrag.name),
                &eintrag.endpunkt,
                &eintrag.passwort,
            )
            .map_err(|e| anyhow::anyhow!("Cluster-Provisionierung fehlgeschlagen: {e}"))?;
        cluster.resume_konfigurieren(&node, &label, timeout);
    }

    Ok(cluster)
}

/// Verdrahtet den Link-Kern ueber dem provisionierten Cluster
///
/// Die Kollaborateure (Resolver, Provisioner) liefert der
/// Gateway-Anschluss. Tabelle und Router werden als explizite Instanzen
/// zurueckgegeben und per Handle weitergereicht – es gibt keine globale
/// Instanz.
pub fn kern_verdrahten(
    cluster: NodeCluster,
    resolver: Arc<dyn GuildResolver>,
    provisioner: Arc<dyn PlayerProvisioner>,
) -> (LinkTabelle, VoiceEventRouter) {
    let tabelle = LinkTabelle::neu(cluster, resolver, provisioner);
    let router = VoiceEventRouter::neu(tabelle.clone());
    (tabelle, router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NodeEintrag, ResumeEinstellungen};

    fn config_mit_nodes(namen: &[&str]) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.nodes = namen
            .iter()
            .map(|name| NodeEintrag {
                name: (*name).into(),
                endpunkt: format!("ws://{name}.example:2333"),
                passwort: "geheim".into(),
            })
            .collect();
        config
    }

    #[test]
    fn provisionierung_setzt_resume_parameter() {
        let mut config = config_mit_nodes(&["berlin"]);
        config.resume = ResumeEinstellungen {
            label_praefix: "kapellmeister".into(),
            timeout_sekunden: 60,
        };

        let cluster = cluster_provisionieren(&config).unwrap();
        let node = cluster.node_holen(&NodeName::neu("berlin")).unwrap();
        let resume = node.resume();
        assert_eq!(resume.label.as_deref(), Some("kapellmeister-1"));
        assert_eq!(resume.timeout, Duration::from_secs(60));
    }

    #[test]
    fn doppelter_node_name_ist_fatal() {
        let config = config_mit_nodes(&["berlin", "berlin"]);
        assert!(cluster_provisionieren(&config).is_err());
    }

    #[test]
    fn leere_node_liste_ist_fatal() {
        let config = ServerConfig::default();
        assert!(cluster_provisionieren(&config).is_err());
    }
}
