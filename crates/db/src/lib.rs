//! botschaft-db – Datenbank-Zugriff fuer den Botschaft-Daemon
//!
//! Der Daemon besitzt selbst keinen persistenten Zustand; er liest nur den
//! Migrationsstand und die Singleton-Konfigurationszeile mit den
//! Admin-Zugangsdaten. Beides ist hier hinter Repository-Traits gekapselt,
//! damit das Vorbedingungs-Gate mit Test-Doubles geprueft werden kann.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use models::AdminZugang;
pub use repository::{DbKonfig, DbResult, KonfigurationRepository, MigrationsStatus};
pub use sqlite::SqliteDb;
