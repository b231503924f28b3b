//! Session-Kern – die gemeinsame Session-Tabelle als Aktor
//!
//! Genau ein Task besitzt die Tabelle; alle anderen Komponenten (der
//! oeffentliche WebSocket-Listener und die Control-Plane) sprechen ihn
//! ueber [`SessionKernHandle`] an. Befehle werden in Ankunftsreihenfolge
//! abgearbeitet, ohne Praeemption. Das ersetzt das Locking, das eine
//! geteilte Tabelle sonst braeuchte.

use std::collections::HashMap;
use std::time::Instant;

use botschaft_core::{SessionEvent, SessionId};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::{SessionFehler, SessionResult};

/// Groesse des Broadcast-Kanals fuer Session-Events
const EVENT_KANAL_GROESSE: usize = 256;

/// Eintrag in der Session-Tabelle
struct SessionEintrag {
    /// Sender zur Schreibschleife der WebSocket-Verbindung
    sender: mpsc::UnboundedSender<String>,
    /// Laufende Nummer der Registrierung; unterscheidet unter demselben
    /// Schluessel den Vorgaenger vom Nachfolger
    generation: u64,
    /// Zeitpunkt der Registrierung
    verbunden_seit: Instant,
    /// Zeitpunkt der letzten eingehenden Nachricht
    letzte_aktivitaet: Instant,
}

/// Befehle an den Kern-Task
enum Befehl {
    Registrieren {
        id: SessionId,
        sender: mpsc::UnboundedSender<String>,
        antwort: oneshot::Sender<u64>,
    },
    Abmelden {
        id: SessionId,
        generation: u64,
    },
    Eingehend {
        id: SessionId,
        text: String,
    },
    Anzahl {
        antwort: oneshot::Sender<usize>,
    },
    Liste {
        antwort: oneshot::Sender<Vec<SessionId>>,
    },
    Existiert {
        id: SessionId,
        antwort: oneshot::Sender<bool>,
    },
    Trennen {
        id: SessionId,
        antwort: oneshot::Sender<bool>,
    },
    Senden {
        id: SessionId,
        text: String,
        antwort: oneshot::Sender<bool>,
    },
    Rundruf {
        text: String,
        antwort: oneshot::Sender<usize>,
    },
}

/// Der Kern-Task: besitzt die Session-Tabelle exklusiv
pub struct SessionKern {
    /// Normalisierte Basis-URL der Instanz (endet auf genau ein '/')
    basis_url: String,
    /// Ausfuehrliches Protokoll-Logging (CLI-Flag -d)
    debug: bool,
    sessions: HashMap<SessionId, SessionEintrag>,
    naechste_generation: u64,
    befehl_rx: mpsc::UnboundedReceiver<Befehl>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionKern {
    /// Startet den Kern-Task und gibt das Handle zurueck
    ///
    /// Wird genau einmal pro Prozess aufgerufen; beide Listener erhalten
    /// Klone desselben Handles, nie eine zweite Instanz.
    pub fn starten(basis_url: impl Into<String>, debug: bool) -> SessionKernHandle {
        let basis_url = basis_url.into();
        let (befehl_tx, befehl_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(EVENT_KANAL_GROESSE);

        let kern = Self {
            basis_url,
            debug,
            sessions: HashMap::new(),
            naechste_generation: 0,
            befehl_rx,
            event_tx: event_tx.clone(),
        };

        tracing::info!(basis_url = %kern.basis_url, debug = kern.debug, "Session-Kern gestartet");
        tokio::spawn(kern.laufen());

        SessionKernHandle { befehl_tx, event_tx }
    }

    /// Befehlsschleife; endet wenn alle Handles fallen gelassen wurden
    async fn laufen(mut self) {
        while let Some(befehl) = self.befehl_rx.recv().await {
            self.verarbeiten(befehl);
        }
        tracing::info!("Session-Kern beendet");
    }

    fn verarbeiten(&mut self, befehl: Befehl) {
        match befehl {
            Befehl::Registrieren { id, sender, antwort } => {
                let jetzt = Instant::now();
                let generation = self.naechste_generation;
                self.naechste_generation += 1;
                let alt = self.sessions.insert(
                    id.clone(),
                    SessionEintrag {
                        sender,
                        generation,
                        verbunden_seit: jetzt,
                        letzte_aktivitaet: jetzt,
                    },
                );
                // Eine zweite Verbindung mit demselben Schluessel verdraengt
                // die alte; deren Sender faellt hier und die Schreibschleife
                // der alten Verbindung endet.
                if alt.is_some() {
                    tracing::warn!(session = %id, "Bestehende Session verdraengt");
                    let _ = self.event_tx.send(SessionEvent::Getrennt { id: id.clone() });
                }
                tracing::info!(session = %id, online = self.sessions.len(), "Session registriert");
                let _ = self.event_tx.send(SessionEvent::Verbunden { id });
                let _ = antwort.send(generation);
            }
            Befehl::Abmelden { id, generation } => {
                // Nur die eigene Registrierung entfernen: nach einer
                // Verdraengung gehoert der Eintrag bereits dem Nachfolger.
                let gehoert_uns = self
                    .sessions
                    .get(&id)
                    .is_some_and(|eintrag| eintrag.generation == generation);
                if gehoert_uns {
                    if let Some(eintrag) = self.sessions.remove(&id) {
                        tracing::info!(
                            session = %id,
                            online = self.sessions.len(),
                            dauer_s = eintrag.verbunden_seit.elapsed().as_secs(),
                            "Session abgemeldet"
                        );
                        let _ = self.event_tx.send(SessionEvent::Getrennt { id });
                    }
                }
            }
            Befehl::Eingehend { id, text } => {
                if let Some(eintrag) = self.sessions.get_mut(&id) {
                    eintrag.letzte_aktivitaet = Instant::now();
                    if self.debug {
                        tracing::debug!(session = %id, nachricht = %text, "Eingehende Nachricht");
                    }
                }
            }
            Befehl::Anzahl { antwort } => {
                let _ = antwort.send(self.sessions.len());
            }
            Befehl::Liste { antwort } => {
                let _ = antwort.send(self.sessions.keys().cloned().collect());
            }
            Befehl::Existiert { id, antwort } => {
                let _ = antwort.send(self.sessions.contains_key(&id));
            }
            Befehl::Trennen { id, antwort } => {
                let entfernt = self.sessions.remove(&id);
                if let Some(eintrag) = &entfernt {
                    tracing::info!(
                        session = %id,
                        inaktiv_s = eintrag.letzte_aktivitaet.elapsed().as_secs(),
                        "Session per Befehl getrennt"
                    );
                    let _ = self.event_tx.send(SessionEvent::Getrennt { id });
                }
                let _ = antwort.send(entfernt.is_some());
            }
            Befehl::Senden { id, text, antwort } => {
                let ok = match self.sessions.get(&id) {
                    Some(eintrag) => eintrag.sender.send(text).is_ok(),
                    None => false,
                };
                let _ = antwort.send(ok);
            }
            Befehl::Rundruf { text, antwort } => {
                let mut zugestellt = 0;
                for eintrag in self.sessions.values() {
                    if eintrag.sender.send(text.clone()).is_ok() {
                        zugestellt += 1;
                    }
                }
                if self.debug {
                    tracing::debug!(zugestellt, nachricht = %text, "Rundruf");
                }
                let _ = antwort.send(zugestellt);
            }
        }
    }
}

/// Handle auf den Session-Kern (billig klonbar)
///
/// Alle Methoden sind asynchron und liefern [`SessionFehler::KernGestoppt`]
/// wenn der Kern-Task nicht mehr laeuft.
#[derive(Clone)]
pub struct SessionKernHandle {
    befehl_tx: mpsc::UnboundedSender<Befehl>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionKernHandle {
    /// Registriert eine neue Verbindung unter der gegebenen Session-ID
    ///
    /// Gibt die Generation der Registrierung zurueck; [`Self::abmelden`]
    /// entfernt den Eintrag nur, wenn er noch zu dieser Generation gehoert.
    pub async fn registrieren(
        &self,
        id: SessionId,
        sender: mpsc::UnboundedSender<String>,
    ) -> SessionResult<u64> {
        let (tx, rx) = oneshot::channel();
        self.senden_intern(Befehl::Registrieren {
            id,
            sender,
            antwort: tx,
        })?;
        rx.await.map_err(|_| SessionFehler::KernGestoppt)
    }

    /// Meldet eine Session ab (Verbindungsende); wirkt nur auf die eigene
    /// Generation, eine Verdraengung durch den Nachfolger bleibt bestehen
    pub fn abmelden(&self, id: SessionId, generation: u64) -> SessionResult<()> {
        self.senden_intern(Befehl::Abmelden { id, generation })
    }

    /// Meldet eine eingehende Client-Nachricht (Aktivitaets-Update)
    pub fn eingehend(&self, id: SessionId, text: String) -> SessionResult<()> {
        self.senden_intern(Befehl::Eingehend { id, text })
    }

    /// Anzahl der aktiven Sessions
    pub async fn anzahl(&self) -> SessionResult<usize> {
        self.abfragen(|antwort| Befehl::Anzahl { antwort }).await
    }

    /// Alle aktiven Session-IDs
    pub async fn liste(&self) -> SessionResult<Vec<SessionId>> {
        self.abfragen(|antwort| Befehl::Liste { antwort }).await
    }

    /// Prueft ob eine Session existiert
    pub async fn existiert(&self, id: SessionId) -> SessionResult<bool> {
        self.abfragen(|antwort| Befehl::Existiert { id, antwort }).await
    }

    /// Trennt eine Session; true wenn sie existierte
    pub async fn trennen(&self, id: SessionId) -> SessionResult<bool> {
        self.abfragen(|antwort| Befehl::Trennen { id, antwort }).await
    }

    /// Stellt einer Session eine Textnachricht zu; true bei Erfolg
    pub async fn nachricht(&self, id: SessionId, text: String) -> SessionResult<bool> {
        self.abfragen(|antwort| Befehl::Senden { id, text, antwort })
            .await
    }

    /// Sendet eine Textnachricht an alle Sessions; gibt die Zustellanzahl zurueck
    pub async fn rundruf(&self, text: String) -> SessionResult<usize> {
        self.abfragen(|antwort| Befehl::Rundruf { text, antwort }).await
    }

    /// Abonniert die Session-Events (Verbunden/Getrennt)
    pub fn ereignisse(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    fn senden_intern(&self, befehl: Befehl) -> SessionResult<()> {
        self.befehl_tx
            .send(befehl)
            .map_err(|_| SessionFehler::KernGestoppt)
    }

    async fn abfragen<T>(
        &self,
        bauen: impl FnOnce(oneshot::Sender<T>) -> Befehl,
    ) -> SessionResult<T> {
        let (tx, rx) = oneshot::channel();
        self.senden_intern(bauen(tx))?;
        rx.await.map_err(|_| SessionFehler::KernGestoppt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_kern() -> SessionKernHandle {
        SessionKern::starten("https://example.org/", false)
    }

    #[tokio::test]
    async fn registrieren_und_abfragen() {
        let kern = test_kern();
        let (tx, _rx) = mpsc::unbounded_channel();

        kern.registrieren(SessionId::aus("a"), tx).await.unwrap();

        assert_eq!(kern.anzahl().await.unwrap(), 1);
        assert!(kern.existiert(SessionId::aus("a")).await.unwrap());
        assert!(!kern.existiert(SessionId::aus("b")).await.unwrap());
        assert_eq!(kern.liste().await.unwrap(), vec![SessionId::aus("a")]);
    }

    #[tokio::test]
    async fn nachricht_erreicht_die_verbindung() {
        let kern = test_kern();
        let (tx, mut rx) = mpsc::unbounded_channel();
        kern.registrieren(SessionId::aus("a"), tx).await.unwrap();

        let ok = kern
            .nachricht(SessionId::aus("a"), "hallo".into())
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(rx.recv().await.as_deref(), Some("hallo"));
    }

    #[tokio::test]
    async fn nachricht_an_unbekannte_session_schlaegt_fehl() {
        let kern = test_kern();
        let ok = kern
            .nachricht(SessionId::aus("fehlt"), "hallo".into())
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn trennen_schliesst_den_kanal() {
        let kern = test_kern();
        let (tx, mut rx) = mpsc::unbounded_channel();
        kern.registrieren(SessionId::aus("a"), tx).await.unwrap();

        assert!(kern.trennen(SessionId::aus("a")).await.unwrap());
        assert_eq!(kern.anzahl().await.unwrap(), 0);
        // Der Sender wurde fallen gelassen, der Kanal ist zu
        assert_eq!(rx.recv().await, None);
        // Zweites Trennen ist ein No-op
        assert!(!kern.trennen(SessionId::aus("a")).await.unwrap());
    }

    #[tokio::test]
    async fn rundruf_zaehlt_zustellungen() {
        let kern = test_kern();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        kern.registrieren(SessionId::aus("a"), tx1).await.unwrap();
        kern.registrieren(SessionId::aus("b"), tx2).await.unwrap();

        let anzahl = kern.rundruf("an alle".into()).await.unwrap();
        assert_eq!(anzahl, 2);
        assert_eq!(rx1.recv().await.as_deref(), Some("an alle"));
        assert_eq!(rx2.recv().await.as_deref(), Some("an alle"));
    }

    #[tokio::test]
    async fn doppelte_registrierung_verdraengt_die_alte() {
        let kern = test_kern();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        kern.registrieren(SessionId::aus("a"), tx1).await.unwrap();
        kern.registrieren(SessionId::aus("a"), tx2).await.unwrap();

        assert_eq!(kern.anzahl().await.unwrap(), 1);
        // Alte Verbindung ist tot, neue erreicht den Client
        assert_eq!(rx1.recv().await, None);
        kern.nachricht(SessionId::aus("a"), "x".into()).await.unwrap();
        assert_eq!(rx2.recv().await.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn abmelden_der_verdraengten_generation_ist_ein_noop() {
        let kern = test_kern();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let alt = kern.registrieren(SessionId::aus("a"), tx1).await.unwrap();
        let neu = kern.registrieren(SessionId::aus("a"), tx2).await.unwrap();
        assert_ne!(alt, neu);

        // Aufraeumpfad des verdraengten Verbindungs-Tasks
        kern.abmelden(SessionId::aus("a"), alt).unwrap();

        // Der Nachfolger bleibt registriert und erreichbar
        assert!(kern.existiert(SessionId::aus("a")).await.unwrap());
        assert!(kern
            .nachricht(SessionId::aus("a"), "noch da".into())
            .await
            .unwrap());
        assert_eq!(rx2.recv().await.as_deref(), Some("noch da"));

        // Die eigene Generation raeumt weiterhin auf
        kern.abmelden(SessionId::aus("a"), neu).unwrap();
        assert!(!kern.existiert(SessionId::aus("a")).await.unwrap());
    }

    #[tokio::test]
    async fn events_spiegeln_die_tabelle() {
        let kern = test_kern();
        let mut ereignisse = kern.ereignisse();
        let (tx, _rx) = mpsc::unbounded_channel();

        kern.registrieren(SessionId::aus("a"), tx).await.unwrap();
        kern.trennen(SessionId::aus("a")).await.unwrap();

        assert_eq!(
            ereignisse.recv().await.unwrap(),
            SessionEvent::Verbunden { id: SessionId::aus("a") }
        );
        assert_eq!(
            ereignisse.recv().await.unwrap(),
            SessionEvent::Getrennt { id: SessionId::aus("a") }
        );
    }

    #[tokio::test]
    async fn gleichzeitige_befehle_werden_serialisiert() {
        // Viele Registrierungen und Trennungen aus parallelen Tasks; am Ende
        // muss die Tabelle konsistent sein: jede nicht getrennte Session
        // existiert, jede getrennte nicht.
        let kern = test_kern();
        let mut tasks = Vec::new();

        for i in 0..50 {
            let kern = kern.clone();
            tasks.push(tokio::spawn(async move {
                let id = SessionId::aus(format!("s{i}"));
                let (tx, _rx) = mpsc::unbounded_channel();
                kern.registrieren(id.clone(), tx).await.unwrap();
                if i % 2 == 0 {
                    kern.trennen(id).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(kern.anzahl().await.unwrap(), 25);
        let liste = kern.liste().await.unwrap();
        assert_eq!(liste.len(), 25);
        for id in liste {
            assert!(kern.existiert(id).await.unwrap());
        }
    }
}
