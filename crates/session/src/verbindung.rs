//! Verbindungs-Treiber fuer eine einzelne WebSocket-Verbindung
//!
//! Pro Verbindung laufen zwei Tasks: die Leseschleife (dieser Task) und
//! eine Schreibschleife, die Nachrichten aus dem Kern an den Socket
//! weiterreicht. Keiner von beiden fasst die Session-Tabelle direkt an.

use axum::extract::ws::{Message, WebSocket};
use botschaft_core::SessionId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::kern::SessionKernHandle;

/// Treibt eine aufgewertete WebSocket-Verbindung bis zum Ende
pub async fn verarbeiten(socket: WebSocket, kern: SessionKernHandle, id: SessionId) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let generation = match kern.registrieren(id.clone(), tx).await {
        Ok(generation) => generation,
        // Kern ist bereits in Abwicklung; Verbindung sofort schliessen
        Err(_) => return,
    };

    // Schreibschleife: endet wenn der Kern den Sender fallen laesst
    // (Trennen-Befehl oder Verdraengung) oder der Socket stirbt.
    let schreib_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // Leseschleife
    while let Some(ergebnis) = ws_rx.next().await {
        match ergebnis {
            Ok(Message::Text(text)) => {
                if kern.eingehend(id.clone(), text).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // Ping/Pong beantwortet axum selbst, Binaerframes kennt das
            // Protokoll nicht
            Ok(_) => {}
        }
    }

    // Abmelden mit der eigenen Generation: wurde dieser Eintrag inzwischen
    // von einer neuen Verbindung mit demselben Schluessel verdraengt, darf
    // das Aufraeumen den Nachfolger nicht entfernen.
    let _ = kern.abmelden(id.clone(), generation);
    schreib_task.abort();
    tracing::debug!(session = %id, "Verbindung beendet");
}
