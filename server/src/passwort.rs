//! Passwort-Hashing fuer die Admin-Zugangsdaten
//!
//! Der Daemon speichert das Admin-Passwort nie im Klartext; das
//! `config`-Kommando hasht es mit Argon2id und legt den PHC-String ab.
//! Die Verifikation uebernimmt das Web-Frontend, nicht der Daemon.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, Params, Version,
};

/// Argon2id-Instanz mit den OWASP-empfohlenen Parametern
fn argon2_instanz() -> anyhow::Result<Argon2<'static>> {
    let params = Params::new(
        64 * 1024, // m_cost: 64 MiB
        3,         // t_cost: 3 Iterationen
        1,         // p_cost: 1 Thread
        None,      // output_len: Standard (32 Bytes)
    )
    .map_err(|e| anyhow!("Argon2-Parameter ungueltig: {e}"))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hasht ein Passwort mit Argon2id und einem zufaelligen Salt
pub fn passwort_hashen(passwort: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2_instanz()?
        .hash_password(passwort.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Passwort-Hashing fehlgeschlagen: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ist_ein_phc_string() {
        let hash = passwort_hashen("geheim123!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn gleiche_passwoerter_unterschiedliche_hashes() {
        let hash1 = passwort_hashen("gleich").unwrap();
        let hash2 = passwort_hashen("gleich").unwrap();
        assert_ne!(hash1, hash2, "Salt muss die Hashes unterscheiden");
    }
}
