//! Voice-Event-Router – Eingangspunkt fuer Voice-Server-Updates
//!
//! Extrahiert die Guild-ID aus der Server-Payload, schlaegt den
//! bestehenden Link nach und reicht das Event weiter. Der Router
//! erstellt niemals selbst einen Link: die Erstellung wird durch
//! Wiedergabe-Anforderung ausgeloest, nicht durch Event-Ankunft –
//! sonst werden Races auf die Node-Zuweisung moeglich.

use crate::error::{LinkFehler, LinkResult};
use crate::resolver::VoiceServerUpdate;
use crate::table::LinkTabelle;
use kapellmeister_core::GuildId;

/// Router fuer eingehende Voice-Server-Updates
#[derive(Clone)]
pub struct VoiceEventRouter {
    tabelle: LinkTabelle,
}

impl VoiceEventRouter {
    /// Erstellt einen Router ueber der gegebenen Link-Tabelle
    pub fn neu(tabelle: LinkTabelle) -> Self {
        Self { tabelle }
    }

    /// Einziger Eingangspunkt fuer eingehende Voice-Server-Updates
    ///
    /// Kein Fehler erreicht den Aufrufer: ungueltige Events und Events
    /// fuer Guilds ohne Link werden terminal geloggt und verworfen.
    pub fn voice_server_update_empfangen(&self, update: VoiceServerUpdate) {
        match self.verarbeiten(update) {
            Ok(()) => {}
            Err(fehler @ LinkFehler::UngueltigesEvent(_)) => {
                tracing::error!(fehler = %fehler, "Voice-Server-Update verworfen");
            }
            Err(fehler @ LinkFehler::UnbekannterGuildLink(_)) => {
                // Unter Races normal: das Event kam vor der Wiedergabe-
                // Anforderung an. Der Link entsteht durch Nachfrage.
                tracing::warn!(fehler = %fehler, "Voice-Server-Update verworfen");
            }
            Err(fehler) => {
                tracing::error!(fehler = %fehler, "Voice-Server-Update verworfen");
            }
        }
    }

    /// Innerer Verarbeitungspfad, gibt Fehler statt sie zu loggen
    pub fn verarbeiten(&self, update: VoiceServerUpdate) -> LinkResult<()> {
        let guild_id = Self::guild_id_extrahieren(&update)?;
        let link = self
            .tabelle
            .bestehenden_holen(guild_id)
            .ok_or(LinkFehler::UnbekannterGuildLink(guild_id))?;
        link.voice_server_update(update);
        Ok(())
    }

    /// Liest die Guild-ID aus dem Feld `guild_id` der Server-Payload
    fn guild_id_extrahieren(update: &VoiceServerUpdate) -> LinkResult<GuildId> {
        let roh = update
            .raw
            .get("guild_id")
            .and_then(|wert| wert.as_str())
            .ok_or_else(|| LinkFehler::UngueltigesEvent("Feld 'guild_id' fehlt".into()))?;
        roh.parse().map_err(|_| {
            LinkFehler::UngueltigesEvent(format!("'guild_id' ist keine gueltige ID: {roh}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guild_id_extraktion() {
        let update = VoiceServerUpdate::neu("abc", json!({ "guild_id": "42" }));
        assert_eq!(
            VoiceEventRouter::guild_id_extrahieren(&update).unwrap(),
            GuildId(42)
        );
    }

    #[test]
    fn fehlendes_feld_ist_ungueltig() {
        let update = VoiceServerUpdate::neu("abc", json!({ "endpoint": "voice.example" }));
        assert!(matches!(
            VoiceEventRouter::guild_id_extrahieren(&update),
            Err(LinkFehler::UngueltigesEvent(_))
        ));
    }

    #[test]
    fn nicht_numerische_guild_id_ist_ungueltig() {
        let update = VoiceServerUpdate::neu("abc", json!({ "guild_id": "keine-zahl" }));
        assert!(matches!(
            VoiceEventRouter::guild_id_extrahieren(&update),
            Err(LinkFehler::UngueltigesEvent(_))
        ));
    }
}
