//! Fehlertypen fuer den Session-Crate

use thiserror::Error;

/// Result-Alias fuer Session-Operationen
pub type SessionResult<T> = Result<T, SessionFehler>;

/// Alle moeglichen Fehler im Session-Crate
#[derive(Debug, Error)]
pub enum SessionFehler {
    /// Der Kern-Task laeuft nicht mehr; der Daemon ist in Abwicklung
    #[error("Session-Kern gestoppt")]
    KernGestoppt,
}
