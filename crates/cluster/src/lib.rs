//! kapellmeister-cluster – Verwaltung des Audio-Node-Clusters
//!
//! Dieses Crate besitzt die beim Start konfigurierte Menge an
//! Audio-Streaming-Nodes und stellt die Node-Auswahl fuer den
//! Link-Aufbau bereit. Das Wire-Protokoll zu den Nodes selbst ist
//! nicht Teil dieses Crates.

pub mod cluster;
pub mod error;
pub mod node;

pub use cluster::NodeCluster;
pub use error::{ClusterFehler, ClusterResult};
pub use node::{Node, ResumeKonfiguration, STANDARD_RESUME_TIMEOUT};
