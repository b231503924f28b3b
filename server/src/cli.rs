//! Kommandozeilen-Definition des Botschaft-Daemons
//!
//! Drei Unterkommandos: `start` (der Daemon selbst), `config` (Admin-
//! Zugangsdaten setzen) und `migrate` (Schema-Migrationen ausfuehren).

use clap::{Args, Parser, Subcommand};

/// Botschaft Daemon – Realtime-Messaging-Gateway
#[derive(Debug, Parser)]
#[command(name = "botschaft-server", version)]
pub struct Cli {
    #[command(subcommand)]
    pub kommando: Kommando,
}

#[derive(Debug, Subcommand)]
pub enum Kommando {
    /// Startet den Daemon
    Start(StartOptionen),
    /// Setzt Benutzername und Passwort fuer das Admin-Panel
    Config(ConfigOptionen),
    /// Fuehrt ausstehende Datenbank-Migrationen aus
    Migrate(MigrateOptionen),
}

/// Optionen des `start`-Kommandos
#[derive(Debug, Clone, Args)]
pub struct StartOptionen {
    /// Oeffentliche Basis-URL der Instanz (Pflicht)
    ///
    /// Wird absichtlich nicht von clap erzwungen: das Vorbedingungs-Gate
    /// prueft und meldet den Fehler einheitlich mit den anderen Checks.
    #[arg(long)]
    pub url: Option<String>,

    /// Port des oeffentlichen Listeners
    #[arg(short = 'p', long, default_value_t = 8080)]
    pub port: u16,

    /// Interface des oeffentlichen Listeners
    #[arg(short = 'i', long, default_value = "127.0.0.1")]
    pub interface: String,

    /// Ausfuehrliches Protokoll-Logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Port der lokalen Control-Plane (bindet immer an 127.0.0.1)
    #[arg(long, default_value_t = 1560)]
    pub api_port: u16,

    /// Datenbank-URL
    #[arg(long, default_value = "sqlite://botschaft.db")]
    pub datenbank: String,
}

/// Optionen des `config`-Kommandos
#[derive(Debug, Args)]
pub struct ConfigOptionen {
    /// Benutzername fuer das Admin-Panel
    #[arg(long)]
    pub benutzername: String,

    /// Passwort im Klartext; wird vor dem Speichern mit Argon2id gehasht
    #[arg(long)]
    pub passwort: String,

    /// Datenbank-URL
    #[arg(long, default_value = "sqlite://botschaft.db")]
    pub datenbank: String,
}

/// Optionen des `migrate`-Kommandos
#[derive(Debug, Args)]
pub struct MigrateOptionen {
    /// Datenbank-URL
    #[arg(long, default_value = "sqlite://botschaft.db")]
    pub datenbank: String,
}
