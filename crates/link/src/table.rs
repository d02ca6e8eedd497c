//! Link-Tabelle – Registry aller Guild-Links
//!
//! Die Tabelle ist die einzige Wahrheitsquelle fuer die Zuordnung
//! Guild -> Link und garantiert hoechstens einen Link (und hoechstens
//! einen laufenden Aufbau) pro Guild. Die Erstellung wird ueber die
//! DashMap-Entry-API serialisiert; der asynchrone Aufbau laeuft als
//! eigener Task und prueft vor jedem Zustandsuebergang ob der Link
//! zwischenzeitlich entfernt wurde.

use crate::error::LinkResult;
use crate::link::Link;
use crate::resolver::{GuildResolver, PlayerProvisioner};
use dashmap::DashMap;
use kapellmeister_cluster::NodeCluster;
use kapellmeister_core::{GuildId, KeineTelemetrie, Telemetrie, TelemetrieEreignis};
use std::sync::Arc;

/// Registry aller Guild-Links
///
/// Thread-safe und `Clone`-faehig (innerer Arc).
#[derive(Clone)]
pub struct LinkTabelle {
    inner: Arc<LinkTabelleInner>,
}

struct LinkTabelleInner {
    /// Aktive Links, indexiert nach GuildId
    links: DashMap<GuildId, Arc<Link>>,
    /// Node-Auswahl fuer die Link-Erstellung
    cluster: NodeCluster,
    /// Asynchrone Guild-Aufloesung (externer Kollaborateur)
    resolver: Arc<dyn GuildResolver>,
    /// Asynchrone Player-Bereitstellung (externer Kollaborateur)
    provisioner: Arc<dyn PlayerProvisioner>,
    /// Fire-and-forget Telemetrie-Senke
    telemetrie: Arc<dyn Telemetrie>,
}

impl LinkTabelle {
    /// Erstellt eine leere Tabelle ohne Telemetrie
    pub fn neu(
        cluster: NodeCluster,
        resolver: Arc<dyn GuildResolver>,
        provisioner: Arc<dyn PlayerProvisioner>,
    ) -> Self {
        Self::mit_telemetrie(cluster, resolver, provisioner, Arc::new(KeineTelemetrie))
    }

    /// Erstellt eine leere Tabelle mit angebundener Telemetrie-Senke
    pub fn mit_telemetrie(
        cluster: NodeCluster,
        resolver: Arc<dyn GuildResolver>,
        provisioner: Arc<dyn PlayerProvisioner>,
        telemetrie: Arc<dyn Telemetrie>,
    ) -> Self {
        Self {
            inner: Arc::new(LinkTabelleInner {
                links: DashMap::new(),
                cluster,
                resolver,
                provisioner,
                telemetrie,
            }),
        }
    }

    /// Gibt den Link der Guild zurueck, erstellt ihn bei Bedarf
    ///
    /// Nebenlaeufige Aufrufe fuer dieselbe Guild liefern denselben Link
    /// und loesen hoechstens einen Aufbau aus. Der zurueckgegebene Handle
    /// reiht Updates ein bis der Aufbau `Verbunden` erreicht.
    ///
    /// Muss auf einem laufenden tokio-Runtime aufgerufen werden: der
    /// Aufbau wird als Task gestartet.
    pub fn holen_oder_erstellen(&self, guild_id: GuildId) -> LinkResult<Arc<Link>> {
        use dashmap::mapref::entry::Entry;

        match self.inner.links.entry(guild_id) {
            Entry::Occupied(eintrag) => Ok(eintrag.get().clone()),
            Entry::Vacant(platz) => {
                let node = self.inner.cluster.node_waehlen()?;
                node.link_zugewiesen();

                let link = Arc::new(Link::neu(guild_id, &node));
                platz.insert(link.clone());

                tracing::info!(
                    guild_id = %guild_id,
                    node = %node.name(),
                    "Link reserviert, Aufbau startet"
                );
                self.inner
                    .telemetrie
                    .melden(TelemetrieEreignis::LinkErstellt { guild_id });

                let tabelle = self.clone();
                let aufbau_link = link.clone();
                tokio::spawn(async move {
                    tabelle.aufbau_durchfuehren(aufbau_link).await;
                });

                Ok(link)
            }
        }
    }

    /// Gibt den bestehenden Link zurueck, ohne einen zu erstellen
    ///
    /// Wird vom Event-Router verwendet – Event-Ankunft darf niemals
    /// implizit einen Link erstellen.
    pub fn bestehenden_holen(&self, guild_id: GuildId) -> Option<Arc<Link>> {
        self.inner.links.get(&guild_id).map(|eintrag| eintrag.value().clone())
    }

    /// Schliesst den Link der Guild und gibt seinen Node-Slot frei
    ///
    /// Ein laufender Aufbau beobachtet das Schliessen bei seinem
    /// naechsten Zustandsuebergang und bricht ab, ohne den Eintrag
    /// wiederzubeleben.
    pub fn entfernen(&self, guild_id: GuildId) -> bool {
        if let Some((_, link)) = self.inner.links.remove(&guild_id) {
            link.schliessen();
            if let Some(node) = link.node() {
                node.link_freigegeben();
            }
            tracing::info!(guild_id = %guild_id, "Link entfernt");
            self.inner
                .telemetrie
                .melden(TelemetrieEreignis::LinkGeschlossen { guild_id });
            true
        } else {
            false
        }
    }

    /// Anzahl der Eintraege in der Tabelle
    pub fn link_anzahl(&self) -> usize {
        self.inner.links.len()
    }

    // -----------------------------------------------------------------------
    // Aufbau
    // -----------------------------------------------------------------------

    /// Fuehrt den asynchronen Link-Aufbau durch
    ///
    /// Feste Folge: Aufloesung -> Bereitstellung -> Verbunden. Jeder
    /// Uebergang schlaegt fehl wenn der Link inzwischen geschlossen
    /// wurde; der Task endet dann kommentarlos. Ein Fehlschlag der
    /// Guild-Aufloesung beendet nur diesen Aufbau, nie den Prozess.
    async fn aufbau_durchfuehren(&self, link: Arc<Link>) {
        let guild_id = link.guild_id();

        if !link.aufloesung_beginnen() {
            return;
        }
        let guild = match self.inner.resolver.aufloesen(guild_id).await {
            Some(guild) => guild,
            None => {
                tracing::warn!(
                    guild_id = %guild_id,
                    "Link fuer nicht aufloesbare Guild – Aufbau verworfen"
                );
                self.platz_freigeben(&link);
                return;
            }
        };

        if !link.bereitstellung_beginnen() {
            return;
        }
        let player = self.inner.provisioner.holen_oder_erstellen(&guild).await;

        // Nach einem Prozess-Neustart liegt das letzte Voice-Server-Update
        // auf der Guild; genau einmal lesen und beim Verbinden wiederholen.
        let zwischengespeichert = guild.zwischengespeichertes_update_nehmen();
        let wiederholt = zwischengespeichert.is_some();

        if !link.verbinden(player.transport(), zwischengespeichert) {
            // Waehrend der Bereitstellung entfernt
            return;
        }

        let node_name = link.node().map(|n| n.name().clone());
        tracing::info!(
            guild_id = %guild_id,
            node = node_name.as_ref().map(|n| n.als_str()).unwrap_or("?"),
            wiederholt,
            "Link verbunden"
        );
        if let Some(node) = node_name {
            self.inner
                .telemetrie
                .melden(TelemetrieEreignis::LinkVerbunden { guild_id, node });
        }
        if wiederholt {
            self.inner
                .telemetrie
                .melden(TelemetrieEreignis::ResumeWiederholt { guild_id });
        }
    }

    /// Gibt den reservierten Slot nach einem gescheiterten Aufbau frei
    ///
    /// Entfernt den Eintrag nur wenn die Tabelle noch genau diesen Link
    /// haelt (Pointer-Identitaet): eine spaetere Neuerstellung fuer
    /// dieselbe Guild darf nicht geloescht werden.
    fn platz_freigeben(&self, link: &Arc<Link>) {
        let entfernt = self
            .inner
            .links
            .remove_if(&link.guild_id(), |_, vorhandener| {
                Arc::ptr_eq(vorhandener, link)
            })
            .is_some();
        link.schliessen();
        if entfernt {
            if let Some(node) = link.node() {
                node.link_freigegeben();
            }
        }
    }
}
