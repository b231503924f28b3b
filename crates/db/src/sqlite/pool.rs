//! SQLite Connection Pool mit WAL-Modus
//!
//! `oeffnen` fuehrt bewusst KEINE Migrationen aus: das Vorbedingungs-Gate
//! muss ausstehende Migrationen erkennen koennen bevor der Daemon startet.
//! Migrationen laufen nur ueber `migrationen_ausfuehren` (das
//! `migrate`-Kommando).

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::migrate::Migrator;
use std::str::FromStr;
use tracing::info;

use crate::repository::{DbKonfig, DbResult, MigrationsStatus};

/// Eingebettete Migrationen des Botschaft-Schemas
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Wrapper um den SQLite Connection Pool
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Erstellt einen neuen Pool ohne Migrationen auszufuehren
    pub async fn oeffnen(konfig: &DbKonfig) -> DbResult<Self> {
        let opts = SqliteConnectOptions::from_str(&konfig.url)?
            .create_if_missing(true)
            .journal_mode(if konfig.sqlite_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(konfig.max_verbindungen)
            .connect_with(opts)
            .await?;

        info!(url = %konfig.url, wal = konfig.sqlite_wal, "SQLite-Pool geoeffnet");

        Ok(Self { pool })
    }

    /// Fuehrt alle ausstehenden Migrationen aus
    pub async fn migrationen_ausfuehren(&self) -> DbResult<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("Datenbank-Migrationen abgeschlossen");
        Ok(())
    }

    /// Gibt den internen Pool zurueck (fuer Tests)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Erstellt eine migrierte In-Memory-Datenbank fuer Tests
    pub async fn in_memory() -> DbResult<Self> {
        let db = Self::in_memory_ohne_migrationen().await?;
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    /// Erstellt eine leere In-Memory-Datenbank ohne Schema (fuer Tests)
    pub async fn in_memory_ohne_migrationen() -> DbResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            // In-Memory benoetigt mindestens 1 persistente Verbindung
            .min_connections(1)
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }
}

impl MigrationsStatus for SqliteDb {
    /// Zaehlt eingebettete Migrationen, die noch nicht angewandt wurden
    async fn ausstehend(&self) -> DbResult<usize> {
        // Die Buchfuehrungstabelle existiert erst nach dem ersten Lauf
        let tabelle: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
        )
        .fetch_optional(&self.pool)
        .await?;

        if tabelle.is_none() {
            return Ok(MIGRATOR.iter().count());
        }

        let angewandt: Vec<i64> =
            sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1")
                .fetch_all(&self.pool)
                .await?;

        Ok(MIGRATOR
            .iter()
            .filter(|m| !angewandt.contains(&m.version))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frische_datenbank_hat_ausstehende_migrationen() {
        let db = SqliteDb::in_memory_ohne_migrationen().await.unwrap();
        let anzahl = db.ausstehend().await.unwrap();
        assert!(anzahl > 0, "eingebettete Migrationen muessen ausstehen");
    }

    #[tokio::test]
    async fn nach_migrationslauf_steht_nichts_aus() {
        let db = SqliteDb::in_memory_ohne_migrationen().await.unwrap();
        db.migrationen_ausfuehren().await.unwrap();
        assert_eq!(db.ausstehend().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn migrationslauf_ist_idempotent() {
        let db = SqliteDb::in_memory().await.unwrap();
        db.migrationen_ausfuehren().await.unwrap();
        assert_eq!(db.ausstehend().await.unwrap(), 0);
    }
}
