//! Datensatz-Typen fuer das Datenbank-Crate

use chrono::{DateTime, Utc};

/// Admin-Zugangsdaten aus der Singleton-Konfigurationszeile
///
/// Beide Felder duerfen leer sein solange der Operator sie noch nicht
/// gesetzt hat; das Vorbedingungs-Gate verweigert in dem Fall den Start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminZugang {
    /// Benutzername fuer das Admin-Panel
    pub benutzername: String,
    /// Passwort als PHC-Hash (argon2id), niemals im Klartext
    pub passwort_hash: String,
    /// Zeitpunkt der letzten Aenderung
    pub geaendert_am: DateTime<Utc>,
}

impl AdminZugang {
    /// Gibt true zurueck wenn Benutzername und Passwort-Hash gesetzt sind
    pub fn ist_vollstaendig(&self) -> bool {
        !self.benutzername.is_empty() && !self.passwort_hash.is_empty()
    }
}
