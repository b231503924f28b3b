//! TCP-Listener der Control-Plane
//!
//! Akzeptiert Verbindungen auf dem Control-Port und behandelt jede in
//! einem eigenen Task: Zeile lesen, Befehl ausfuehren, Antwort schreiben.
//! Alle Befehle laufen ueber dasselbe [`SessionKernHandle`] wie der
//! oeffentliche Listener; die Serialisierung uebernimmt der Kern.

use std::net::SocketAddr;

use botschaft_core::SessionId;
use botschaft_session::SessionKernHandle;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::error::ApiFehler;
use crate::parser::{fehler_antwort, ok_antwort, wert_kodieren, zeile_parsen, Befehlszeile};

/// Obergrenze fuer eine Befehlszeile in Bytes
const ZEILENLIMIT_BYTES: usize = 8192;

/// Control-Plane-Server
///
/// Der Listener wird vom Bootstrap bereits gebunden uebergeben, damit
/// Bind-Fehler den Start abbrechen bevor irgendeine Accept-Schleife laeuft.
pub struct ApiServer {
    listener: TcpListener,
    kern: SessionKernHandle,
}

impl ApiServer {
    /// Erstellt einen neuen ApiServer um einen gebundenen Listener
    pub fn neu(listener: TcpListener, kern: SessionKernHandle) -> Self {
        Self { listener, kern }
    }

    /// Gibt die lokale Adresse des Listeners zurueck
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept-Schleife; laeuft bis `shutdown_rx` ein `true` empfaengt
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        tracing::info!(adresse = %self.listener.local_addr()?, "Control-Plane gestartet");

        loop {
            tokio::select! {
                ergebnis = self.listener.accept() => {
                    match ergebnis {
                        Ok((stream, peer_addr)) => {
                            tracing::debug!(peer = %peer_addr, "Control-Verbindung akzeptiert");
                            let kern = self.kern.clone();
                            tokio::spawn(async move {
                                verbindung_behandeln(stream, peer_addr, kern).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "Control-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                aenderung = shutdown_rx.changed() => {
                    match aenderung {
                        Ok(()) if !*shutdown_rx.borrow() => continue,
                        // true empfangen oder Sender weg: Listener schliessen
                        _ => break,
                    }
                }
            }
        }

        tracing::info!("Control-Plane gestoppt");
        Ok(())
    }
}

/// Behandelt eine einzelne Control-Verbindung
async fn verbindung_behandeln(stream: TcpStream, peer_addr: SocketAddr, kern: SessionKernHandle) {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);

    let mut zeile = String::new();
    loop {
        zeile.clear();
        // Pro Zeile begrenzt lesen, sonst kann eine Verbindung den Puffer
        // unbegrenzt wachsen lassen
        let mut begrenzt = (&mut buf_reader).take(ZEILENLIMIT_BYTES as u64);
        match begrenzt.read_line(&mut zeile).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(peer = %peer_addr, fehler = %e, "Lesefehler auf Control-Verbindung");
                break;
            }
        }

        // Limit erreicht ohne Newline: Zeile ist abgeschnitten. Fehler
        // melden, den Rest der Zeile ungepuffert verwerfen und weitermachen.
        if zeile.len() >= ZEILENLIMIT_BYTES && !zeile.ends_with('\n') {
            let fehler = ApiFehler::Protokoll(format!(
                "Befehlszeile laenger als {ZEILENLIMIT_BYTES} Bytes"
            ));
            let antwort = fehler_antwort(fehler.fehler_code(), &fehler.to_string());
            if writer.write_all(antwort.as_bytes()).await.is_err() {
                break;
            }
            if zeilenrest_verwerfen(&mut buf_reader).await.is_err() {
                break;
            }
            continue;
        }

        let (antwort, ende) = befehl_verarbeiten(&zeile, &kern).await;
        if writer.write_all(antwort.as_bytes()).await.is_err() || ende {
            break;
        }
    }

    tracing::debug!(peer = %peer_addr, "Control-Verbindung beendet");
}

/// Verwirft Eingabe bis zum naechsten Newline ohne sie zu puffern
async fn zeilenrest_verwerfen<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> std::io::Result<()> {
    loop {
        let puffer = reader.fill_buf().await?;
        if puffer.is_empty() {
            return Ok(());
        }
        match puffer.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let geleert = puffer.len();
                reader.consume(geleert);
            }
        }
    }
}

/// Verarbeitet eine Befehlszeile und gibt die Antwortzeile zurueck;
/// `true` als zweiter Wert beendet die Verbindung
async fn befehl_verarbeiten(zeile: &str, kern: &SessionKernHandle) -> (String, bool) {
    let befehl = match zeile_parsen(zeile) {
        Ok(b) => b,
        Err(e) => return (fehler_antwort(e.fehler_code(), &e.to_string()), false),
    };

    if befehl.name == "quit" {
        return (ok_antwort(&[("msg", "bye")]), true);
    }

    match ausfuehren(&befehl, kern).await {
        Ok(antwort) => (antwort, false),
        Err(e) => (fehler_antwort(e.fehler_code(), &e.to_string()), false),
    }
}

/// Fuehrt einen geparsten Befehl gegen den Session-Kern aus
async fn ausfuehren(befehl: &Befehlszeile, kern: &SessionKernHandle) -> Result<String, ApiFehler> {
    match befehl.name.as_str() {
        "sessions" => {
            let anzahl = kern.anzahl().await?;
            Ok(ok_antwort(&[("anzahl", &anzahl.to_string())]))
        }
        "liste" => {
            let liste = kern.liste().await?;
            if liste.is_empty() {
                return Ok(ok_antwort(&[]));
            }
            let eintraege: Vec<String> = liste
                .iter()
                .map(|id| format!("sid={}", wert_kodieren(id.als_str())))
                .collect();
            Ok(format!("ok {}\n", eintraege.join("|")))
        }
        "existiert" => {
            let id = SessionId::aus(befehl.pflicht_param("key")?);
            let vorhanden = kern.existiert(id).await?;
            Ok(ok_antwort(&[("existiert", bool_wert(vorhanden))]))
        }
        "trennen" => {
            let id = SessionId::aus(befehl.pflicht_param("key")?);
            let getrennt = kern.trennen(id).await?;
            Ok(ok_antwort(&[("getrennt", bool_wert(getrennt))]))
        }
        "nachricht" => {
            let id = SessionId::aus(befehl.pflicht_param("key")?);
            let text = befehl.pflicht_param("text")?.to_string();
            let zugestellt = kern.nachricht(id, text).await?;
            Ok(ok_antwort(&[("zugestellt", bool_wert(zugestellt))]))
        }
        "rundruf" => {
            let text = befehl.pflicht_param("text")?.to_string();
            let anzahl = kern.rundruf(text).await?;
            Ok(ok_antwort(&[("zugestellt", &anzahl.to_string())]))
        }
        anderes => Err(ApiFehler::UnbekannterBefehl(anderes.to_string())),
    }
}

fn bool_wert(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}
