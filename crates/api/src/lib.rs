//! botschaft-api – Control-Plane des Botschaft-Daemons
//!
//! Vertraute lokale Prozesse (das Web-Frontend) steuern ueber diesen
//! Listener die Client-Sessions: zaehlen, auflisten, trennen, Nachrichten
//! zustellen. Das Protokoll ist zeilenbasiert (`befehl key=wert ...`),
//! Antworten sind `ok [k=v ...]` oder `error id=N msg=...`.
//!
//! Der Listener ist fuer den Loopback gedacht und spricht Klartext; er
//! gehoert nie ans oeffentliche Netz.

pub mod error;
pub mod parser;
pub mod server;

pub use error::{ApiFehler, ApiResult};
pub use server::ApiServer;
