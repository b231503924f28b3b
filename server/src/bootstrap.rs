//! Dual-Listener-Bootstrap
//!
//! Verdrahtet nach bestandenem Gate die Laufzeit-Topologie: genau ein
//! Session-Kern, ein oeffentlicher WebSocket-Listener und die lokale
//! Control-Plane, beide mit Handles auf denselben Kern.
//!
//! `binden` und `laufen` sind getrennt, damit Bind-Fehler den Start
//! abbrechen bevor irgendeine Accept-Schleife laeuft: entweder sind beide
//! Ports gebunden oder keiner. Ein halb gestarteter Daemon existiert nicht.

use std::net::SocketAddr;

use anyhow::Result;
use botschaft_api::ApiServer;
use botschaft_session::{oeffentlicher_router, SessionKern, SessionKernHandle};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::gate::StartKonfig;

/// Noch nicht gebundener Daemon
pub struct Daemon {
    konfig: StartKonfig,
}

impl Daemon {
    /// Erstellt einen Daemon aus der validierten Startkonfiguration
    pub fn neu(konfig: StartKonfig) -> Self {
        Self { konfig }
    }

    /// Startet den Session-Kern und bindet beide Listener
    ///
    /// Der Kern wird genau einmal erstellt; beide Listener erhalten Klone
    /// desselben Handles. Schlaegt einer der Binds fehl, werden bereits
    /// gebundene Listener hier fallen gelassen – es bleibt kein Port offen.
    pub async fn binden(self) -> std::io::Result<GebundenerDaemon> {
        let kern = SessionKern::starten(self.konfig.basis_url.clone(), self.konfig.debug);

        let oeffentlich =
            TcpListener::bind((self.konfig.interface.as_str(), self.konfig.port)).await?;
        // Control-Plane bindet bewusst nur an den Loopback
        let control = TcpListener::bind(("127.0.0.1", self.konfig.api_port)).await?;

        Ok(GebundenerDaemon {
            kern,
            oeffentlich,
            control,
        })
    }
}

/// Gebundener, aber noch nicht laufender Daemon
pub struct GebundenerDaemon {
    kern: SessionKernHandle,
    oeffentlich: TcpListener,
    control: TcpListener,
}

impl GebundenerDaemon {
    /// Gibt ein Handle auf den gemeinsamen Session-Kern zurueck
    pub fn kern(&self) -> SessionKernHandle {
        self.kern.clone()
    }

    /// Lokale Adresse des oeffentlichen Listeners
    pub fn oeffentliche_adresse(&self) -> std::io::Result<SocketAddr> {
        self.oeffentlich.local_addr()
    }

    /// Lokale Adresse der Control-Plane
    pub fn control_adresse(&self) -> std::io::Result<SocketAddr> {
        self.control.local_addr()
    }

    /// Treibt beide Listener bis zum ersten fatalen Fehler oder Shutdown
    ///
    /// Es gibt keinen Drain: laufende Sessions werden beim Ende abrupt
    /// getrennt. Der Shutdown-Kanal existiert damit Tests einen gebundenen
    /// Daemon wieder stoppen koennen.
    pub async fn laufen(self, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let router = oeffentlicher_router(self.kern.clone());
        let api = ApiServer::neu(self.control, self.kern);

        let oeffentlich_laufen = async move { axum::serve(self.oeffentlich, router).await };
        let api_laufen = api.starten(shutdown_rx.clone());
        let mut shutdown = shutdown_rx;

        tokio::select! {
            ergebnis = oeffentlich_laufen => {
                ergebnis?;
            }
            ergebnis = api_laufen => {
                ergebnis?;
            }
            () = shutdown_warten(&mut shutdown) => {
                tracing::info!("Shutdown: Listener werden geschlossen");
            }
        }

        Ok(())
    }
}

/// Wartet bis der Shutdown-Kanal `true` liefert oder der Sender wegfaellt
async fn shutdown_warten(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
