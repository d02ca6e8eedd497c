//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, nur die Node-Liste muss der Betreiber
//! selbst pflegen.

use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Audio-Node-Cluster
    pub nodes: Vec<NodeEintrag>,
    /// Resume-Einstellungen fuer alle Nodes
    pub resume: ResumeEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename der Instanz
    pub name: String,
    /// Instanz-Kennung, fliesst in das Resume-Label ein
    pub instanz: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Kapellmeister".into(),
            instanz: "1".into(),
        }
    }
}

/// Ein konfigurierter Audio-Node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEintrag {
    /// Eindeutiger Name des Nodes
    pub name: String,
    /// Verbindungs-Endpunkt (WebSocket-URI)
    pub endpunkt: String,
    /// Zugangs-Passwort
    pub passwort: String,
}

/// Resume-Einstellungen fuer alle Nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeEinstellungen {
    /// Praefix fuer das Session-Label; das vollstaendige Label ist
    /// "{praefix}-{instanz}"
    pub label_praefix: String,
    /// Zeitfenster in Sekunden in dem ein Node die Session nach einem
    /// Abriss haelt
    pub timeout_sekunden: u64,
}

impl Default for ResumeEinstellungen {
    fn default() -> Self {
        Self {
            label_praefix: "kapellmeister".into(),
            timeout_sekunden: 300,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt das vollstaendige Resume-Label dieser Instanz zurueck
    pub fn resume_label(&self) -> String {
        format!("{}-{}", self.resume.label_praefix, self.server.instanz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert!(cfg.nodes.is_empty());
        assert_eq!(cfg.resume.timeout_sekunden, 300);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.resume_label(), "kapellmeister-1");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            name = "Mein Orchester"
            instanz = "eu-1"

            [[nodes]]
            name = "berlin"
            endpunkt = "ws://berlin.example:2333"
            passwort = "geheim"

            [[nodes]]
            name = "hamburg"
            endpunkt = "ws://hamburg.example:2333"
            passwort = "geheim"

            [resume]
            timeout_sekunden = 60
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.name, "Mein Orchester");
        assert_eq!(cfg.nodes.len(), 2);
        assert_eq!(cfg.nodes[1].name, "hamburg");
        assert_eq!(cfg.resume.timeout_sekunden, 60);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.resume.label_praefix, "kapellmeister");
        assert_eq!(cfg.resume_label(), "kapellmeister-eu-1");
    }
}
