//! Session-Events
//!
//! Der Session-Kern versendet diese Events ueber einen Broadcast-Kanal,
//! sobald sich die Session-Tabelle aendert. Beide Listener (oeffentlich und
//! Control-Plane) beobachten damit denselben Zustand.

use crate::types::SessionId;

/// Aenderungen an der Session-Tabelle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Eine neue Session wurde registriert
    Verbunden { id: SessionId },
    /// Eine Session wurde entfernt (Verbindungsabbruch oder Befehl)
    Getrennt { id: SessionId },
}

impl SessionEvent {
    /// Gibt die betroffene Session-ID zurueck
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Verbunden { id } | Self::Getrennt { id } => id,
        }
    }
}
