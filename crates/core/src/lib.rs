//! botschaft-core – Gemeinsame Typen fuer den Botschaft-Daemon
//!
//! Enthaelt die Identifikationstypen und die Session-Events, die sowohl
//! vom Session-Kern als auch vom Control-Plane-Crate verwendet werden.

pub mod event;
pub mod types;

pub use event::SessionEvent;
pub use types::SessionId;
