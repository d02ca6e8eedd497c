//! kapellmeister-link – Link-Lebenszyklus und Voice-Event-Routing
//!
//! Dieses Crate haelt pro Guild genau eine lebende Zuordnung zu einem
//! Audio-Node aus dem Cluster und routet eingehende Voice-Server-Updates
//! an den richtigen Link. Es koordiniert drei unabhaengige asynchrone
//! Zeitachsen: Cluster-Mitgliedschaft, Guild/Player-Existenz (remote
//! aufgeloest) und out-of-band eintreffende Voice-Gateway-Events.

pub mod error;
pub mod link;
pub mod resolver;
pub mod router;
pub mod table;

pub use error::{LinkFehler, LinkResult};
pub use link::{Link, LinkStatus};
pub use resolver::{
    Guild, GuildResolver, Player, PlayerProvisioner, VoiceServerUpdate, VoiceTransport,
};
pub use router::VoiceEventRouter;
pub use table::LinkTabelle;
