//! Gemeinsame Identifikationstypen fuer Kapellmeister
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

/// Eindeutige Guild-ID (Snowflake)
///
/// Im Gateway-Protokoll wird die ID als String uebertragen, intern
/// arbeiten wir mit dem numerischen Wert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuildId(pub u64);

impl GuildId {
    /// Gibt den inneren numerischen Wert zurueck
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "guild:{}", self.0)
    }
}

impl std::str::FromStr for GuildId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<u64> for GuildId {
    fn from(roh: u64) -> Self {
        Self(roh)
    }
}

/// Eindeutiger Name eines Audio-Nodes im Cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeName(pub String);

impl NodeName {
    /// Erstellt einen neuen NodeName
    pub fn neu(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Gibt den inneren Namen zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guild_id_aus_string_parsen() {
        let id: GuildId = "174820236481134592".parse().unwrap();
        assert_eq!(id, GuildId(174820236481134592));
    }

    #[test]
    fn guild_id_parsen_schlaegt_bei_unsinn_fehl() {
        assert!("keine-zahl".parse::<GuildId>().is_err());
        assert!("".parse::<GuildId>().is_err());
    }

    #[test]
    fn guild_id_display() {
        assert_eq!(GuildId(42).to_string(), "guild:42");
    }

    #[test]
    fn node_name_gleichheit() {
        assert_eq!(NodeName::neu("berlin"), NodeName::from("berlin"));
        assert_ne!(NodeName::neu("berlin"), NodeName::neu("hamburg"));
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let id = GuildId(7);
        let json = serde_json::to_string(&id).unwrap();
        let id2: GuildId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, id2);
    }
}
