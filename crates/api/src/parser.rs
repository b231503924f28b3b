//! Zeilenparser fuer das Control-Protokoll
//!
//! Befehle haben die Form `befehlsname key1=wert1 key2=wert2`. Sonderzeichen
//! in Werten sind Backslash-escaped: \s = Leerzeichen, \n = Newline,
//! \\ = Backslash, \| = Pipe. Antworten verwenden dieselbe Kodierung.

use std::collections::HashMap;

use crate::error::{ApiFehler, ApiResult};

/// Eine geparste Befehlszeile
#[derive(Debug, Clone, PartialEq)]
pub struct Befehlszeile {
    /// Befehlsname, immer kleingeschrieben
    pub name: String,
    /// Key-Value-Parameter
    pub params: HashMap<String, String>,
}

impl Befehlszeile {
    /// Gibt einen Parameter zurueck
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    /// Gibt einen Pflicht-Parameter zurueck oder einen Protokollfehler
    pub fn pflicht_param(&self, key: &str) -> ApiResult<&str> {
        self.param(key)
            .ok_or_else(|| ApiFehler::Protokoll(format!("Pflicht-Parameter fehlt: {key}")))
    }
}

/// Parst eine Befehlszeile
pub fn zeile_parsen(zeile: &str) -> ApiResult<Befehlszeile> {
    let zeile = zeile.trim();
    if zeile.is_empty() {
        return Err(ApiFehler::Protokoll("Leere Befehlszeile".into()));
    }

    let mut teile = zeile.split_whitespace();
    let name = teile
        .next()
        .ok_or_else(|| ApiFehler::Protokoll("Kein Befehlsname".into()))?
        .to_lowercase();

    let mut params = HashMap::new();
    for teil in teile {
        if let Some((key, wert)) = teil.split_once('=') {
            params.insert(key.to_lowercase(), wert_dekodieren(wert));
        }
        // Teile ohne '=' tragen keinen Wert und werden ignoriert
    }

    Ok(Befehlszeile { name, params })
}

/// Dekodiert die Escape-Sequenzen eines Werts
pub fn wert_dekodieren(s: &str) -> String {
    let mut ergebnis = String::with_capacity(s.len());
    let mut zeichen = s.chars();

    while let Some(c) = zeichen.next() {
        if c != '\\' {
            ergebnis.push(c);
            continue;
        }
        match zeichen.next() {
            Some('s') => ergebnis.push(' '),
            Some('n') => ergebnis.push('\n'),
            Some('\\') => ergebnis.push('\\'),
            Some('|') => ergebnis.push('|'),
            Some(anderes) => {
                ergebnis.push('\\');
                ergebnis.push(anderes);
            }
            None => ergebnis.push('\\'),
        }
    }

    ergebnis
}

/// Kodiert einen Wert fuer die Ausgabe
pub fn wert_kodieren(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(' ', "\\s")
        .replace('\n', "\\n")
        .replace('|', "\\|")
}

/// Erstellt eine Erfolgs-Antwortzeile
pub fn ok_antwort(params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        "ok\n".to_string()
    } else {
        let kv: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, wert_kodieren(v)))
            .collect();
        format!("ok {}\n", kv.join(" "))
    }
}

/// Erstellt eine Fehler-Antwortzeile
pub fn fehler_antwort(code: u32, nachricht: &str) -> String {
    format!("error id={} msg={}\n", code, wert_kodieren(nachricht))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn einfacher_befehl() {
        let cmd = zeile_parsen("sessions").unwrap();
        assert_eq!(cmd.name, "sessions");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn befehl_mit_params() {
        let cmd = zeile_parsen("nachricht key=abc text=hallo").unwrap();
        assert_eq!(cmd.name, "nachricht");
        assert_eq!(cmd.param("key"), Some("abc"));
        assert_eq!(cmd.param("text"), Some("hallo"));
    }

    #[test]
    fn escaped_leerzeichen() {
        let cmd = zeile_parsen(r"rundruf text=Hallo\sWelt").unwrap();
        assert_eq!(cmd.param("text"), Some("Hallo Welt"));
    }

    #[test]
    fn befehlsname_wird_kleingeschrieben() {
        let cmd = zeile_parsen("Sessions").unwrap();
        assert_eq!(cmd.name, "sessions");
    }

    #[test]
    fn leere_zeile_gibt_fehler() {
        assert!(zeile_parsen("").is_err());
        assert!(zeile_parsen("   ").is_err());
    }

    #[test]
    fn pflicht_param_fehlt() {
        let cmd = zeile_parsen("existiert").unwrap();
        assert!(cmd.pflicht_param("key").is_err());
    }

    #[test]
    fn kodieren_dekodieren_ist_umkehrbar() {
        let original = "Zeile eins\nZeile zwei | mit Pipe";
        assert_eq!(wert_dekodieren(&wert_kodieren(original)), original);
    }

    #[test]
    fn antwortzeilen() {
        assert_eq!(ok_antwort(&[]), "ok\n");
        let ok = ok_antwort(&[("anzahl", "3")]);
        assert_eq!(ok, "ok anzahl=3\n");
        let fehler = fehler_antwort(1001, "Leere Befehlszeile");
        assert!(fehler.starts_with("error id=1001 msg="));
    }
}
