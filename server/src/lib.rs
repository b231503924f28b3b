//! botschaft-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt Gate und Bootstrap fuer
//! Integrationstests bereit.

pub mod bootstrap;
pub mod cli;
pub mod gate;
pub mod passwort;

pub use bootstrap::{Daemon, GebundenerDaemon};
pub use gate::{vorbedingungen_pruefen, GateFehler, StartKonfig};
