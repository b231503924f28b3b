//! botschaft-session – Session-Kern und oeffentlicher Listener
//!
//! Dieser Crate implementiert das Herzstueck des Daemons: die gemeinsame
//! Session-Tabelle aller verbundenen Clients und den oeffentlichen
//! HTTP/WebSocket-Endpunkt, der neue Verbindungen in diese Tabelle
//! einhaengt.
//!
//! ## Architektur
//!
//! ```text
//! Axum-Router (GET /ws)            Control-Plane (botschaft-api)
//!     |                                 |
//!     v                                 v
//! SessionKernHandle  ----mpsc---->  SessionKern (ein Task, besitzt die Tabelle)
//!     |
//!     v
//! Verbindungs-Tasks (pro WebSocket ein Lese- und ein Schreib-Task)
//! ```
//!
//! Die Tabelle wird ausschliesslich vom Kern-Task veraendert. Beide
//! Listener sprechen denselben Kern ueber Handles an; die Reihenfolge der
//! Mutationen ist die Ankunftsreihenfolge der Befehle in der Queue. Damit
//! braucht die Tabelle kein Lock.

pub mod error;
pub mod kern;
pub mod verbindung;
pub mod ws;

pub use error::{SessionFehler, SessionResult};
pub use kern::{SessionKern, SessionKernHandle};
pub use ws::oeffentlicher_router;
