//! Node – ein einzelner Audio-Streaming-Server im Cluster
//!
//! Identitaet (Name, Endpunkt, Zugangsdaten) ist nach der Provisionierung
//! unveraenderlich. Die Resume-Parameter werden einmalig vor der ersten
//! Verwendung gesetzt. Der Link-Zaehler und das Verfuegbarkeits-Flag sind
//! die einzigen beweglichen Teile.

use kapellmeister_core::NodeName;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Standard-Timeout fuer das Resume einer abgerissenen Transport-Session
/// (5 Minuten)
pub const STANDARD_RESUME_TIMEOUT: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// ResumeKonfiguration
// ---------------------------------------------------------------------------

/// Resume-Parameter eines Nodes
///
/// Das Label identifiziert die Session gegenueber dem Node, damit eine
/// neu aufgebaute Transport-Verbindung innerhalb des Timeouts die alte
/// Session uebernehmen kann.
#[derive(Debug, Clone)]
pub struct ResumeKonfiguration {
    /// Session-Label (None = Resume nicht konfiguriert)
    pub label: Option<String>,
    /// Zeitfenster in dem der Node die Session nach einem Abriss haelt
    pub timeout: Duration,
}

impl Default for ResumeKonfiguration {
    fn default() -> Self {
        Self {
            label: None,
            timeout: STANDARD_RESUME_TIMEOUT,
        }
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Ein konfigurierter Audio-Streaming-Node
///
/// Wird ausschliesslich vom [`NodeCluster`](crate::NodeCluster) besessen;
/// Links halten nur eine `Weak`-Referenz.
pub struct Node {
    name: NodeName,
    endpunkt: String,
    passwort: String,
    resume: Mutex<ResumeKonfiguration>,
    /// Anzahl der aktuell zugewiesenen Links (Auswahl-Gewicht)
    aktive_links: AtomicUsize,
    /// Nodes koennen fuer Wartung aus der Rotation genommen werden
    verfuegbar: AtomicBool,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("endpunkt", &self.endpunkt)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub(crate) fn neu(
        name: NodeName,
        endpunkt: impl Into<String>,
        passwort: impl Into<String>,
    ) -> Self {
        Self {
            name,
            endpunkt: endpunkt.into(),
            passwort: passwort.into(),
            resume: Mutex::new(ResumeKonfiguration::default()),
            aktive_links: AtomicUsize::new(0),
            verfuegbar: AtomicBool::new(true),
        }
    }

    /// Gibt den eindeutigen Node-Namen zurueck
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Gibt den Verbindungs-Endpunkt zurueck
    pub fn endpunkt(&self) -> &str {
        &self.endpunkt
    }

    /// Gibt das Zugangs-Passwort zurueck
    pub fn passwort(&self) -> &str {
        &self.passwort
    }

    /// Gibt eine Kopie der aktuellen Resume-Konfiguration zurueck
    pub fn resume(&self) -> ResumeKonfiguration {
        self.resume.lock().clone()
    }

    pub(crate) fn resume_setzen(&self, label: impl Into<String>, timeout: Duration) {
        let mut konfig = self.resume.lock();
        konfig.label = Some(label.into());
        konfig.timeout = timeout;
    }

    /// Anzahl der aktuell zugewiesenen Links
    pub fn aktive_links(&self) -> usize {
        self.aktive_links.load(Ordering::SeqCst)
    }

    /// Verbucht einen neu zugewiesenen Link (aufgerufen von der Link-Tabelle)
    pub fn link_zugewiesen(&self) {
        self.aktive_links.fetch_add(1, Ordering::SeqCst);
    }

    /// Gibt einen Link-Slot wieder frei (aufgerufen von der Link-Tabelle)
    pub fn link_freigegeben(&self) {
        // fetch_update statt fetch_sub: darf bei 0 nicht unterlaufen
        let _ = self
            .aktive_links
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            });
    }

    /// Prueft ob der Node fuer neue Links zur Verfuegung steht
    pub fn ist_verfuegbar(&self) -> bool {
        self.verfuegbar.load(Ordering::SeqCst)
    }

    /// Nimmt den Node in die Rotation auf oder aus ihr heraus
    pub fn verfuegbarkeit_setzen(&self, verfuegbar: bool) {
        self.verfuegbar.store(verfuegbar, Ordering::SeqCst);
        tracing::info!(
            node = %self.name,
            verfuegbar,
            "Node-Verfuegbarkeit geaendert"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_standardwerte() {
        let node = Node::neu(NodeName::neu("berlin"), "ws://localhost:2333", "geheim");
        let resume = node.resume();
        assert!(resume.label.is_none());
        assert_eq!(resume.timeout, STANDARD_RESUME_TIMEOUT);
    }

    #[test]
    fn resume_setzen_ueberschreibt_standard() {
        let node = Node::neu(NodeName::neu("berlin"), "ws://localhost:2333", "geheim");
        node.resume_setzen("kapellmeister-1", Duration::from_secs(60));

        let resume = node.resume();
        assert_eq!(resume.label.as_deref(), Some("kapellmeister-1"));
        assert_eq!(resume.timeout, Duration::from_secs(60));
    }

    #[test]
    fn link_zaehler_unterlaeuft_nicht() {
        let node = Node::neu(NodeName::neu("berlin"), "ws://localhost:2333", "geheim");
        node.link_freigegeben();
        assert_eq!(node.aktive_links(), 0);

        node.link_zugewiesen();
        node.link_zugewiesen();
        node.link_freigegeben();
        assert_eq!(node.aktive_links(), 1);
    }
}
