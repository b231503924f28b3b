//! Identifikationstypen fuer den Botschaft-Daemon
//!
//! Die Session-ID verwendet das Newtype-Pattern um Verwechslungen mit
//! beliebigen Strings zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutiger Schluessel einer Client-Session
///
/// Der Wert kommt normalerweise vom Client (Session-Cookie des Frontends);
/// fehlt er, wird eine zufaellige ID erzeugt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Erstellt eine SessionId aus einem vorhandenen Schluessel
    pub fn aus(schluessel: impl Into<String>) -> Self {
        Self(schluessel.into())
    }

    /// Erstellt eine neue zufaellige SessionId
    pub fn zufaellig() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Gibt den inneren Schluessel zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
