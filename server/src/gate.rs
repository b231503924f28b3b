//! Vorbedingungs-Gate
//!
//! Prueft vor jedem Socket-Bind, ob der Prozess ueberhaupt starten darf:
//! 1. keine ausstehenden Schema-Migrationen,
//! 2. gueltige absolute Basis-URL (wird normalisiert),
//! 3. Admin-Zugangsdaten vollstaendig gesetzt.
//! Jeder Schritt bricht die Sequenz ab; ein teilweiser Start existiert
//! nicht. Das Gate selbst beendet den Prozess nie – der Aufrufer gibt die
//! Diagnose aus und beendet sich.

use botschaft_db::{DbError, KonfigurationRepository, MigrationsStatus};
use thiserror::Error;
use url::Url;

use crate::cli::StartOptionen;

/// Validierte Startkonfiguration; nach dem Gate unveraenderlich
#[derive(Debug, Clone)]
pub struct StartKonfig {
    /// Normalisierte Basis-URL, endet auf genau ein '/'
    pub basis_url: String,
    /// Interface des oeffentlichen Listeners
    pub interface: String,
    /// Port des oeffentlichen Listeners
    pub port: u16,
    /// Port der lokalen Control-Plane
    pub api_port: u16,
    /// Ausfuehrliches Protokoll-Logging
    pub debug: bool,
}

/// Gruende, aus denen das Gate den Start verweigert
///
/// Die Display-Texte sind die Operator-Diagnosen; sie nennen jeweils das
/// Kommando, mit dem sich der Zustand beheben laesst.
#[derive(Debug, Error)]
pub enum GateFehler {
    #[error(
        "Die Datenbank muss vor dem Start migriert werden ({anzahl} Migration(en) ausstehend)\n\
         Zum Migrieren: botschaft-server migrate"
    )]
    MigrationenAusstehend { anzahl: usize },

    #[error("Ungueltiger oder fehlender url-Parameter: {0}")]
    UngueltigeUrl(String),

    #[error(
        "Bitte Benutzername und Passwort fuer das Admin-Panel setzen ({admin_url})\n\
         Zum Setzen: botschaft-server config --benutzername NAME --passwort PASSWORT"
    )]
    ZugangNichtKonfiguriert { admin_url: String },

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),
}

/// Fuehrt die Gate-Sequenz aus und liefert die validierte Startkonfiguration
pub async fn vorbedingungen_pruefen<M, K>(
    optionen: &StartOptionen,
    migrationen: &M,
    konfiguration: &K,
) -> Result<StartKonfig, GateFehler>
where
    M: MigrationsStatus,
    K: KonfigurationRepository,
{
    let anzahl = migrationen.ausstehend().await?;
    if anzahl > 0 {
        return Err(GateFehler::MigrationenAusstehend { anzahl });
    }

    let roh = optionen
        .url
        .as_deref()
        .ok_or_else(|| GateFehler::UngueltigeUrl("nicht angegeben".into()))?;
    let basis_url = url_normalisieren(roh)?;

    let zugang = konfiguration.laden_oder_erstellen().await?;
    if !zugang.ist_vollstaendig() {
        return Err(GateFehler::ZugangNichtKonfiguriert {
            admin_url: format!("{basis_url}?admin"),
        });
    }

    Ok(StartKonfig {
        basis_url,
        interface: optionen.interface.clone(),
        port: optionen.port,
        api_port: optionen.api_port,
        debug: optionen.debug,
    })
}

/// Validiert eine absolute http(s)-URL und normalisiert sie auf genau
/// einen abschliessenden Schraegstrich
///
/// Die Normalisierung ist idempotent.
pub fn url_normalisieren(roh: &str) -> Result<String, GateFehler> {
    let url =
        Url::parse(roh).map_err(|e| GateFehler::UngueltigeUrl(format!("'{roh}': {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(GateFehler::UngueltigeUrl(format!(
            "'{roh}': Schema muss http oder https sein"
        )));
    }
    if !url.has_host() {
        return Err(GateFehler::UngueltigeUrl(format!("'{roh}': Host fehlt")));
    }

    Ok(format!("{}/", url.as_str().trim_end_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use botschaft_db::{AdminZugang, DbResult};
    use chrono::Utc;

    /// Double fuer den Migrationsstand
    struct MigrationenDouble(usize);

    impl MigrationsStatus for MigrationenDouble {
        async fn ausstehend(&self) -> DbResult<usize> {
            Ok(self.0)
        }
    }

    /// Double fuer das Konfigurations-Repository
    struct KonfigDouble {
        benutzername: &'static str,
        passwort_hash: &'static str,
    }

    impl KonfigurationRepository for KonfigDouble {
        async fn laden_oder_erstellen(&self) -> DbResult<AdminZugang> {
            Ok(AdminZugang {
                benutzername: self.benutzername.into(),
                passwort_hash: self.passwort_hash.into(),
                geaendert_am: Utc::now(),
            })
        }

        async fn speichern(&self, _benutzername: &str, _passwort_hash: &str) -> DbResult<()> {
            Ok(())
        }
    }

    fn optionen(url: Option<&str>) -> StartOptionen {
        StartOptionen {
            url: url.map(String::from),
            port: 8080,
            interface: "127.0.0.1".into(),
            debug: false,
            api_port: 1560,
            datenbank: "sqlite::memory:".into(),
        }
    }

    fn zugang_gesetzt() -> KonfigDouble {
        KonfigDouble {
            benutzername: "admin",
            passwort_hash: "$argon2id$v=19$abc",
        }
    }

    #[tokio::test]
    async fn ausstehende_migrationen_blockieren_den_start() {
        let fehler = vorbedingungen_pruefen(
            &optionen(Some("https://example.org")),
            &MigrationenDouble(3),
            &zugang_gesetzt(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            fehler,
            GateFehler::MigrationenAusstehend { anzahl: 3 }
        ));
        assert!(fehler.to_string().contains("botschaft-server migrate"));
    }

    #[tokio::test]
    async fn fehlende_url_blockiert_den_start() {
        let fehler = vorbedingungen_pruefen(
            &optionen(None),
            &MigrationenDouble(0),
            &zugang_gesetzt(),
        )
        .await
        .unwrap_err();

        assert!(matches!(fehler, GateFehler::UngueltigeUrl(_)));
    }

    #[tokio::test]
    async fn ungueltige_url_blockiert_den_start() {
        for roh in ["kein url", "ftp://example.org", "example.org/pfad", "/nur/pfad"] {
            let fehler = vorbedingungen_pruefen(
                &optionen(Some(roh)),
                &MigrationenDouble(0),
                &zugang_gesetzt(),
            )
            .await
            .unwrap_err();
            assert!(
                matches!(fehler, GateFehler::UngueltigeUrl(_)),
                "'{roh}' muss abgelehnt werden"
            );
        }
    }

    #[tokio::test]
    async fn leere_zugangsdaten_blockieren_den_start() {
        for (benutzername, passwort_hash) in [("", "hash"), ("admin", ""), ("", "")] {
            let fehler = vorbedingungen_pruefen(
                &optionen(Some("https://example.org/movim")),
                &MigrationenDouble(0),
                &KonfigDouble {
                    benutzername,
                    passwort_hash,
                },
            )
            .await
            .unwrap_err();

            // Die Diagnose nennt die normalisierte Admin-Panel-URL
            let text = fehler.to_string();
            assert!(text.contains("https://example.org/movim/?admin"), "{text}");
            assert!(text.contains("botschaft-server config"));
        }
    }

    #[tokio::test]
    async fn erfolgreiche_sequenz_liefert_die_konfiguration() {
        let konfig = vorbedingungen_pruefen(
            &optionen(Some("https://example.org/movim")),
            &MigrationenDouble(0),
            &zugang_gesetzt(),
        )
        .await
        .unwrap();

        assert_eq!(konfig.basis_url, "https://example.org/movim/");
        assert_eq!(konfig.interface, "127.0.0.1");
        assert_eq!(konfig.port, 8080);
        assert_eq!(konfig.api_port, 1560);
        assert!(!konfig.debug);
    }

    #[test]
    fn normalisierung_erzwingt_genau_einen_schraegstrich() {
        assert_eq!(
            url_normalisieren("https://example.org/movim").unwrap(),
            "https://example.org/movim/"
        );
        assert_eq!(
            url_normalisieren("https://example.org/movim///").unwrap(),
            "https://example.org/movim/"
        );
        assert_eq!(
            url_normalisieren("https://example.org").unwrap(),
            "https://example.org/"
        );
    }

    #[test]
    fn normalisierung_ist_idempotent() {
        for roh in [
            "https://example.org",
            "https://example.org/",
            "https://example.org/movim",
            "http://example.org:8080/tief/er/pfad//",
        ] {
            let einmal = url_normalisieren(roh).unwrap();
            let zweimal = url_normalisieren(&einmal).unwrap();
            assert_eq!(einmal, zweimal, "Normalisierung von '{roh}'");
            assert!(einmal.ends_with('/'));
            assert!(!einmal.ends_with("//"));
        }
    }
}
