//! Link – der Verbindungs-Handle einer Guild zu ihrem Audio-Node
//!
//! Ein Link durchlaeuft eine feste Zustandsfolge:
//!
//! ```text
//! Ausstehend -> Aufloesung -> Bereitstellung -> Verbunden -> Geschlossen
//! ```
//!
//! Schlaegt die Guild-Aufloesung fehl, endet der Aufbau vorzeitig in
//! `Geschlossen` und der Tabellen-Slot wird freigegeben. Updates die
//! waehrend des Aufbaus eintreffen werden eingereiht und nach Erreichen
//! von `Verbunden` in Ankunftsreihenfolge nachgeliefert – strikt nach
//! dem einmaligen Replay eines zwischengespeicherten Updates.

use crate::resolver::{VoiceServerUpdate, VoiceTransport};
use kapellmeister_cluster::Node;
use kapellmeister_core::GuildId;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Maximale Anzahl eingereihter Updates waehrend des Aufbaus
///
/// Ein haengender Aufbau darf keine unbegrenzte Warteschlange ansammeln;
/// bei Ueberlauf wird das neueste Update verworfen und gewarnt.
pub const WARTESCHLANGE_MAX: usize = 32;

// ---------------------------------------------------------------------------
// LinkStatus
// ---------------------------------------------------------------------------

/// Zustand eines Links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Slot reserviert, Aufbau noch nicht angelaufen
    Ausstehend,
    /// Guild-Aufloesung laeuft
    Aufloesung,
    /// Player-Bereitstellung laeuft
    Bereitstellung,
    /// Node zugewiesen, bereit fuer Voice-Events
    Verbunden,
    /// Aus der Tabelle entfernt, nimmt nichts mehr an
    Geschlossen,
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// Vom Zustands-Lock geschuetzter beweglicher Teil des Links
struct LinkZustand {
    status: LinkStatus,
    /// Transport-Handle, gesetzt beim Uebergang nach `Verbunden`
    transport: Option<Arc<dyn VoiceTransport>>,
    /// Updates die waehrend des Aufbaus eingetroffen sind
    warteschlange: Vec<VoiceServerUpdate>,
}

/// Der Verbindungs-Handle einer Guild
///
/// Wird von der [`LinkTabelle`](crate::LinkTabelle) besessen; die
/// Node-Zuweisung ist eine `Weak`-Referenz, der Node-Lebenszyklus
/// gehoert dem Cluster. Die Zuweisung aendert sich fuer die Lebensdauer
/// des Links nicht – eine Neuzuweisung erfordert einen neuen Link.
pub struct Link {
    guild_id: GuildId,
    node: Weak<Node>,
    zustand: Mutex<LinkZustand>,
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("guild_id", &self.guild_id)
            .finish_non_exhaustive()
    }
}

impl Link {
    pub(crate) fn neu(guild_id: GuildId, node: &Arc<Node>) -> Self {
        Self {
            guild_id,
            node: Arc::downgrade(node),
            zustand: Mutex::new(LinkZustand {
                status: LinkStatus::Ausstehend,
                transport: None,
                warteschlange: Vec::new(),
            }),
        }
    }

    /// Gibt die Guild-ID zurueck
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Gibt den zugewiesenen Node zurueck, sofern er noch existiert
    pub fn node(&self) -> Option<Arc<Node>> {
        self.node.upgrade()
    }

    /// Gibt den aktuellen Zustand zurueck
    pub fn status(&self) -> LinkStatus {
        self.zustand.lock().status
    }

    /// Prueft ob der Link geschlossen ist
    pub fn ist_geschlossen(&self) -> bool {
        self.status() == LinkStatus::Geschlossen
    }

    /// Nimmt ein Voice-Server-Update an
    ///
    /// - `Verbunden`: direkt an die Transportschicht weiterreichen.
    /// - waehrend des Aufbaus: einreihen (bis [`WARTESCHLANGE_MAX`]).
    /// - `Geschlossen`: verwerfen mit Warnung.
    ///
    /// Die Weiterleitung geschieht unter dem Zustands-Lock, damit die
    /// Ankunftsreihenfolge gegenueber dem Warteschlangen-Abfluss beim
    /// Verbinden erhalten bleibt.
    pub fn voice_server_update(&self, update: VoiceServerUpdate) {
        let mut zustand = self.zustand.lock();
        match zustand.status {
            LinkStatus::Verbunden => {
                if let Some(transport) = &zustand.transport {
                    transport.voice_server_update(&update.session_id, &update.raw);
                } else {
                    tracing::error!(
                        guild_id = %self.guild_id,
                        "Link ist Verbunden ohne Transport – Update verworfen"
                    );
                }
            }
            LinkStatus::Ausstehend | LinkStatus::Aufloesung | LinkStatus::Bereitstellung => {
                if zustand.warteschlange.len() >= WARTESCHLANGE_MAX {
                    tracing::warn!(
                        guild_id = %self.guild_id,
                        maximum = WARTESCHLANGE_MAX,
                        "Warteschlange voll – Update verworfen"
                    );
                    return;
                }
                tracing::debug!(
                    guild_id = %self.guild_id,
                    status = ?zustand.status,
                    "Update waehrend des Aufbaus eingereiht"
                );
                zustand.warteschlange.push(update);
            }
            LinkStatus::Geschlossen => {
                tracing::warn!(
                    guild_id = %self.guild_id,
                    "Update fuer geschlossenen Link verworfen"
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Zustandsuebergaenge (nur fuer die Link-Tabelle)
    //
    // Jeder Uebergang prueft auf `Geschlossen`: wird der Link waehrend des
    // Aufbaus entfernt, bricht die laufende Fortsetzung ab und darf den
    // Eintrag nicht wiederbeleben. Rueckgabe `false` = abgebrochen.
    // -----------------------------------------------------------------------

    pub(crate) fn aufloesung_beginnen(&self) -> bool {
        let mut zustand = self.zustand.lock();
        if zustand.status != LinkStatus::Ausstehend {
            return false;
        }
        zustand.status = LinkStatus::Aufloesung;
        true
    }

    pub(crate) fn bereitstellung_beginnen(&self) -> bool {
        let mut zustand = self.zustand.lock();
        if zustand.status != LinkStatus::Aufloesung {
            return false;
        }
        zustand.status = LinkStatus::Bereitstellung;
        true
    }

    /// Schliesst den Aufbau ab: Transport setzen, zwischengespeichertes
    /// Update genau einmal wiederholen, dann die Warteschlange in
    /// Ankunftsreihenfolge abfliessen lassen.
    ///
    /// Alles unter dem Zustands-Lock: ein nebenlaeufig eintreffendes
    /// Update sieht entweder den Aufbau (und reiht sich ein) oder
    /// `Verbunden` (und laeuft nach dem Abfluss).
    pub(crate) fn verbinden(
        &self,
        transport: Arc<dyn VoiceTransport>,
        zwischengespeichert: Option<VoiceServerUpdate>,
    ) -> bool {
        let mut zustand = self.zustand.lock();
        if zustand.status != LinkStatus::Bereitstellung {
            return false;
        }
        zustand.status = LinkStatus::Verbunden;
        zustand.transport = Some(transport.clone());

        if let Some(update) = zwischengespeichert {
            tracing::info!(
                guild_id = %self.guild_id,
                session_id = %update.session_id,
                "Zwischengespeichertes Voice-Server-Update wird wiederholt"
            );
            transport.voice_server_update(&update.session_id, &update.raw);
        }

        for update in zustand.warteschlange.drain(..) {
            transport.voice_server_update(&update.session_id, &update.raw);
        }

        true
    }

    /// Markiert den Link als geschlossen und verwirft alles Eingereihte
    pub(crate) fn schliessen(&self) {
        let mut zustand = self.zustand.lock();
        zustand.status = LinkStatus::Geschlossen;
        zustand.transport = None;
        zustand.warteschlange.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use kapellmeister_cluster::NodeCluster;
    use kapellmeister_core::NodeName;
    use serde_json::json;

    struct SammelTransport(Mutex<Vec<(String, serde_json::Value)>>);

    impl SammelTransport {
        fn neu() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }
        fn empfangen(&self) -> Vec<(String, serde_json::Value)> {
            self.0.lock().clone()
        }
    }

    impl VoiceTransport for SammelTransport {
        fn voice_server_update(&self, session_id: &str, raw: &serde_json::Value) {
            self.0.lock().push((session_id.to_owned(), raw.clone()));
        }
    }

    fn test_link() -> Link {
        let cluster = NodeCluster::neu();
        let node = cluster
            .node_hinzufuegen(NodeName::neu("berlin"), "ws://localhost:2333", "geheim")
            .unwrap();
        Link::neu(GuildId(1), &node)
    }

    fn update(session_id: &str) -> VoiceServerUpdate {
        VoiceServerUpdate::neu(session_id, json!({ "guild_id": "1" }))
    }

    #[test]
    fn zustandsfolge_ist_fest() {
        let link = test_link();
        assert_eq!(link.status(), LinkStatus::Ausstehend);

        // Bereitstellung ohne Aufloesung ist kein gueltiger Uebergang
        assert!(!link.bereitstellung_beginnen());

        assert!(link.aufloesung_beginnen());
        assert_eq!(link.status(), LinkStatus::Aufloesung);
        assert!(link.bereitstellung_beginnen());
        assert_eq!(link.status(), LinkStatus::Bereitstellung);
        assert!(link.verbinden(SammelTransport::neu(), None));
        assert_eq!(link.status(), LinkStatus::Verbunden);
    }

    #[test]
    fn uebergaenge_nach_schliessen_brechen_ab() {
        let link = test_link();
        assert!(link.aufloesung_beginnen());
        link.schliessen();

        assert!(!link.bereitstellung_beginnen());
        assert!(!link.verbinden(SammelTransport::neu(), None));
        assert_eq!(link.status(), LinkStatus::Geschlossen);
    }

    #[test]
    fn eingereihte_updates_fliessen_nach_replay_ab() {
        let link = test_link();
        assert!(link.aufloesung_beginnen());

        // Zwei Updates treffen waehrend des Aufbaus ein
        link.voice_server_update(update("s1"));
        link.voice_server_update(update("s2"));

        let transport = SammelTransport::neu();
        assert!(link.bereitstellung_beginnen());
        assert!(link.verbinden(transport.clone(), Some(update("resume"))));

        // Replay zuerst, dann Warteschlange in Ankunftsreihenfolge
        let sessions: Vec<String> = transport
            .empfangen()
            .into_iter()
            .map(|(sid, _)| sid)
            .collect();
        assert_eq!(sessions, vec!["resume", "s1", "s2"]);
    }

    #[test]
    fn verbundener_link_leitet_direkt_weiter() {
        let link = test_link();
        let transport = SammelTransport::neu();
        assert!(link.aufloesung_beginnen());
        assert!(link.bereitstellung_beginnen());
        assert!(link.verbinden(transport.clone(), None));

        link.voice_server_update(update("live"));
        assert_eq!(transport.empfangen().len(), 1);
        assert_eq!(transport.empfangen()[0].0, "live");
    }

    #[test]
    fn geschlossener_link_verwirft_updates() {
        let link = test_link();
        link.schliessen();
        link.voice_server_update(update("spaet"));

        // Kein Panik, nichts eingereiht
        assert_eq!(link.status(), LinkStatus::Geschlossen);
    }

    #[test]
    fn warteschlange_ist_begrenzt() {
        let link = test_link();
        assert!(link.aufloesung_beginnen());

        for i in 0..(WARTESCHLANGE_MAX + 5) {
            link.voice_server_update(update(&format!("s{i}")));
        }

        let transport = SammelTransport::neu();
        assert!(link.bereitstellung_beginnen());
        assert!(link.verbinden(transport.clone(), None));
        assert_eq!(transport.empfangen().len(), WARTESCHLANGE_MAX);
    }

    #[test]
    fn node_referenz_ist_schwach() {
        let cluster = NodeCluster::neu();
        let node = cluster
            .node_hinzufuegen(NodeName::neu("berlin"), "ws://localhost:2333", "geheim")
            .unwrap();
        let link = Link::neu(GuildId(1), &node);

        assert!(link.node().is_some());
        drop(node);
        drop(cluster);
        assert!(link.node().is_none());
    }
}
