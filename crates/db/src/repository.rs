//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt das Vorbedingungs-Gate von der
//! konkreten Datenbank. Der Daemon kennt nur diese Traits; Tests koennen
//! sie mit Doubles befuellen.

use crate::error::DbError;
use crate::models::AdminZugang;

/// Result-Alias fuer Datenbank-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DbKonfig {
    /// Verbindungs-URL (z.B. "sqlite://botschaft.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DbKonfig {
    fn default() -> Self {
        Self {
            url: "sqlite://botschaft.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Liefert den Migrationsstand des Schemas
///
/// Der Daemon startet nur wenn keine Migrationen ausstehen; das Ausfuehren
/// selbst uebernimmt das `migrate`-Kommando, nicht der Daemon.
#[allow(async_fn_in_trait)]
pub trait MigrationsStatus: Send + Sync {
    /// Anzahl der noch nicht angewandten Migrationen
    async fn ausstehend(&self) -> DbResult<usize>;
}

/// Zugriff auf die Singleton-Konfigurationszeile mit den Admin-Zugangsdaten
///
/// Es gibt genau einen Admin-Zugang pro Instanz. Dass er in der SQLite-
/// Implementierung als Zeile mit id = 1 liegt, ist ein Implementierungs-
/// detail und nicht Teil dieses Traits.
#[allow(async_fn_in_trait)]
pub trait KonfigurationRepository: Send + Sync {
    /// Laedt den Admin-Zugang; legt eine leere Zeile an falls keine existiert
    async fn laden_oder_erstellen(&self) -> DbResult<AdminZugang>;

    /// Ueberschreibt Benutzername und Passwort-Hash des Admin-Zugangs
    async fn speichern(&self, benutzername: &str, passwort_hash: &str) -> DbResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_konfig_standard() {
        let cfg = DbKonfig::default();
        assert_eq!(cfg.url, "sqlite://botschaft.db");
        assert_eq!(cfg.max_verbindungen, 5);
        assert!(cfg.sqlite_wal);
    }
}
