//! SQLite-Implementierung des KonfigurationRepository
//!
//! Die Admin-Zugangsdaten liegen in der Tabelle `konfiguration` als
//! Singleton-Zeile mit id = 1 (per CHECK-Constraint erzwungen).

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::AdminZugang;
use crate::repository::{DbResult, KonfigurationRepository};
use crate::sqlite::pool::SqliteDb;

impl KonfigurationRepository for SqliteDb {
    async fn laden_oder_erstellen(&self) -> DbResult<AdminZugang> {
        let jetzt = Utc::now().to_rfc3339();

        // Leere Zeile anlegen falls noch keine existiert
        sqlx::query(
            "INSERT OR IGNORE INTO konfiguration (id, benutzername, passwort_hash, geaendert_am)
             VALUES (1, '', '', ?)",
        )
        .bind(&jetzt)
        .execute(&self.pool)
        .await?;

        let zeile: (String, String, String) = sqlx::query_as(
            "SELECT benutzername, passwort_hash, geaendert_am FROM konfiguration WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminZugang {
            benutzername: zeile.0,
            passwort_hash: zeile.1,
            geaendert_am: zeit_parsen(&zeile.2)?,
        })
    }

    async fn speichern(&self, benutzername: &str, passwort_hash: &str) -> DbResult<()> {
        let jetzt = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO konfiguration (id, benutzername, passwort_hash, geaendert_am)
             VALUES (1, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                 benutzername = excluded.benutzername,
                 passwort_hash = excluded.passwort_hash,
                 geaendert_am = excluded.geaendert_am",
        )
        .bind(benutzername)
        .bind(passwort_hash)
        .bind(&jetzt)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Parst einen RFC3339-Zeitstempel aus der Datenbank
fn zeit_parsen(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DbError::UngueltigeDaten(format!("Ungueltiger Zeitstempel '{s}': {e}")))
}
