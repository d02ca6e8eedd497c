//! Kollaborateur-Schnittstellen zum Gateway-Umfeld
//!
//! Definiert die Schnittstellen, die der Link-Kern vom aeusseren System
//! konsumiert: Guild-Aufloesung, Player-Bereitstellung und die
//! Transportschicht zu den Audio-Nodes. Platzhalter-Traits – die
//! konkreten Implementierungen liefert der Gateway-Anschluss.

use async_trait::async_trait;
use kapellmeister_core::GuildId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// VoiceServerUpdate
// ---------------------------------------------------------------------------

/// Ein eingehendes Voice-Server-Update aus dem Gateway
///
/// Die `raw`-Payload ist serverseitig opak (Voice-Endpunkt + Token) und
/// traegt die Guild-ID als String im Feld `guild_id`. Der Kern reicht die
/// Payload unveraendert an die Transportschicht weiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceServerUpdate {
    /// Session-ID der Voice-Gateway-Sitzung
    pub session_id: String,
    /// Opake Server-Payload (enthaelt `guild_id`, Endpunkt, Token)
    pub raw: serde_json::Value,
}

impl VoiceServerUpdate {
    /// Erstellt ein neues Update
    pub fn neu(session_id: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            session_id: session_id.into(),
            raw,
        }
    }
}

// ---------------------------------------------------------------------------
// Guild
// ---------------------------------------------------------------------------

/// Aufgeloeste Guild-Metadaten
///
/// Das Objekt gehoert dem externen Metadaten-Store und wird als `Arc`
/// geteilt: das Leeren des zwischengespeicherten Updates ist damit auch
/// fuer den Store sichtbar.
#[derive(Debug)]
pub struct Guild {
    id: GuildId,
    name: String,
    /// Voice-Server-Update aus einem frueheren Prozess-Leben, genau
    /// einmal lesbar (Read-once-Kontrakt)
    zwischengespeichertes_update: Mutex<Option<VoiceServerUpdate>>,
}

impl Guild {
    /// Erstellt eine Guild ohne zwischengespeichertes Update
    pub fn neu(id: GuildId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            zwischengespeichertes_update: Mutex::new(None),
        }
    }

    /// Erstellt eine Guild mit einem zwischengespeicherten Update
    /// (Neustart-Szenario)
    pub fn mit_zwischengespeichertem_update(
        id: GuildId,
        name: impl Into<String>,
        update: VoiceServerUpdate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            zwischengespeichertes_update: Mutex::new(Some(update)),
        }
    }

    /// Gibt die Guild-ID zurueck
    pub fn id(&self) -> GuildId {
        self.id
    }

    /// Gibt den Anzeigenamen zurueck
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Liest das zwischengespeicherte Update und leert den Speicher
    ///
    /// Read-once: ein zweiter Aufruf gibt `None` zurueck, damit ein
    /// spaeterer Link-Aufbau fuer dieselbe Guild das Update nicht erneut
    /// wiederholt.
    pub fn zwischengespeichertes_update_nehmen(&self) -> Option<VoiceServerUpdate> {
        self.zwischengespeichertes_update.lock().take()
    }

    /// Prueft ob ein zwischengespeichertes Update vorliegt
    pub fn hat_zwischengespeichertes_update(&self) -> bool {
        self.zwischengespeichertes_update.lock().is_some()
    }
}

// ---------------------------------------------------------------------------
// Player & Transport
// ---------------------------------------------------------------------------

/// Transportschicht eines Players zum zugewiesenen Audio-Node
///
/// Implementierungen muessen nicht-blockierend einreihen: die Methode
/// wird unter dem Zustands-Lock des Links aufgerufen. Transportfehler
/// werden asynchron gemeldet und duerfen den Kern nicht zum Absturz
/// bringen.
pub trait VoiceTransport: Send + Sync + 'static {
    /// Reicht Session-ID und Server-Payload an das Resume-/Verbindungs-
    /// Protokoll weiter
    fn voice_server_update(&self, session_id: &str, raw: &serde_json::Value);
}

/// Der Player einer Guild, wie ihn der Provisioner liefert
///
/// Die Business-Logik des Players liegt ausserhalb des Kerns; hier
/// interessiert nur der Transport-Handle.
pub struct Player {
    guild_id: GuildId,
    transport: Arc<dyn VoiceTransport>,
}

impl Player {
    /// Erstellt einen Player mit dem gegebenen Transport-Handle
    pub fn neu(guild_id: GuildId, transport: Arc<dyn VoiceTransport>) -> Self {
        Self {
            guild_id,
            transport,
        }
    }

    /// Gibt die Guild-ID zurueck
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Gibt den Transport-Handle zurueck
    pub fn transport(&self) -> Arc<dyn VoiceTransport> {
        self.transport.clone()
    }
}

// ---------------------------------------------------------------------------
// Asynchrone Kollaborateur-Traits
// ---------------------------------------------------------------------------

/// Asynchrone Guild-Aufloesung (remote Lookup)
///
/// `None` bedeutet: die Guild existiert nicht (oder ist fuer diesen
/// Prozess nicht sichtbar). Transiente Fehler des Lookups bildet die
/// Implementierung ebenfalls auf `None` ab; der Link-Aufbau wird dann
/// verworfen und kann durch erneute Nachfrage wiederholt werden.
#[async_trait]
pub trait GuildResolver: Send + Sync + 'static {
    /// Loest eine Guild-ID zu Metadaten auf
    async fn aufloesen(&self, guild_id: GuildId) -> Option<Arc<Guild>>;
}

/// Asynchrone Player-Bereitstellung
#[async_trait]
pub trait PlayerProvisioner: Send + Sync + 'static {
    /// Gibt den Player der Guild zurueck, erstellt ihn bei Bedarf
    async fn holen_oder_erstellen(&self, guild: &Guild) -> Arc<Player>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zwischengespeichertes_update_nur_einmal_lesbar() {
        let update = VoiceServerUpdate::neu("abc", json!({ "guild_id": "1" }));
        let guild = Guild::mit_zwischengespeichertem_update(GuildId(1), "Testgilde", update);

        assert!(guild.hat_zwischengespeichertes_update());
        let erstes = guild.zwischengespeichertes_update_nehmen();
        assert_eq!(erstes.unwrap().session_id, "abc");

        // Zweiter Zugriff: Speicher ist geleert
        assert!(guild.zwischengespeichertes_update_nehmen().is_none());
        assert!(!guild.hat_zwischengespeichertes_update());
    }

    #[test]
    fn update_ist_serde_kompatibel() {
        let update = VoiceServerUpdate::neu(
            "abc",
            json!({ "guild_id": "42", "endpoint": "voice.example", "token": "t" }),
        );
        let json = serde_json::to_string(&update).unwrap();
        let update2: VoiceServerUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(update2.session_id, "abc");
        assert_eq!(update2.raw["endpoint"], "voice.example");
    }
}
