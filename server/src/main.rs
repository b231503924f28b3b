//! Botschaft Daemon – Einstiegspunkt
//!
//! Parst die Kommandozeile, initialisiert das Logging und fuehrt das
//! gewaehlte Unterkommando aus. Beim `start`-Kommando laeuft erst das
//! Vorbedingungs-Gate vollstaendig durch, dann werden beide Listener
//! gebunden und die Schleife laeuft bis zum externen Abbruch.

use anyhow::Result;
use botschaft_db::{DbKonfig, KonfigurationRepository, SqliteDb};
use botschaft_server::cli::{Cli, ConfigOptionen, Kommando, MigrateOptionen, StartOptionen};
use botschaft_server::{passwort, vorbedingungen_pruefen, Daemon};
use clap::Parser;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.kommando {
        Kommando::Start(optionen) => starten(optionen).await,
        Kommando::Config(optionen) => zugang_setzen(optionen).await,
        Kommando::Migrate(optionen) => migrieren(optionen).await,
    }
}

/// `start` – Gate, Bootstrap, Schleife
async fn starten(optionen: StartOptionen) -> Result<()> {
    logging_initialisieren(optionen.debug);

    let db = datenbank_oeffnen(&optionen.datenbank).await?;

    let konfig = match vorbedingungen_pruefen(&optionen, &db, &db).await {
        Ok(konfig) => konfig,
        Err(fehler) => {
            // Operator-Diagnose; Abbruch bevor irgendein Socket gebunden ist
            eprintln!("{fehler}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        basis_url = %konfig.basis_url,
        "Botschaft-Daemon gestartet"
    );

    let daemon = Daemon::neu(konfig).binden().await?;
    tracing::info!(
        oeffentlich = %daemon.oeffentliche_adresse()?,
        control = %daemon.control_adresse()?,
        "Listener gebunden"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown-Signal empfangen");
            let _ = shutdown_tx.send(true);
        }
    });

    daemon.laufen(shutdown_rx).await
}

/// `config` – Admin-Zugangsdaten setzen
async fn zugang_setzen(optionen: ConfigOptionen) -> Result<()> {
    logging_initialisieren(false);

    if optionen.benutzername.is_empty() || optionen.passwort.is_empty() {
        anyhow::bail!("Benutzername und Passwort duerfen nicht leer sein");
    }

    let db = datenbank_oeffnen(&optionen.datenbank).await?;
    // Das Schema muss vorhanden sein bevor die Zeile geschrieben wird
    db.migrationen_ausfuehren().await?;

    let hash = passwort::passwort_hashen(&optionen.passwort)?;
    db.speichern(&optionen.benutzername, &hash).await?;

    println!("Admin-Zugangsdaten gespeichert (Benutzer: {})", optionen.benutzername);
    Ok(())
}

/// `migrate` – ausstehende Schema-Migrationen ausfuehren
async fn migrieren(optionen: MigrateOptionen) -> Result<()> {
    logging_initialisieren(false);

    let db = datenbank_oeffnen(&optionen.datenbank).await?;
    db.migrationen_ausfuehren().await?;

    println!("Datenbank ist auf dem aktuellen Stand");
    Ok(())
}

async fn datenbank_oeffnen(url: &str) -> Result<SqliteDb> {
    let konfig = DbKonfig {
        url: url.to_string(),
        ..DbKonfig::default()
    };
    Ok(SqliteDb::oeffnen(&konfig).await?)
}

/// Initialisiert tracing-subscriber; das Debug-Flag senkt den Standardlevel
fn logging_initialisieren(debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let standard = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(standard));

    fmt().with_env_filter(filter).with_target(true).init();
}
