//! SQLite-Implementierung der Repository-Traits

mod konfiguration;
mod pool;

pub use pool::SqliteDb;
