//! Fehlertypen fuer die Control-Plane

use thiserror::Error;

/// Result-Alias fuer Control-Plane-Operationen
pub type ApiResult<T> = Result<T, ApiFehler>;

/// Alle moeglichen Fehler der Control-Plane
#[derive(Debug, Error)]
pub enum ApiFehler {
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    #[error("Unbekannter Befehl: {0}")]
    UnbekannterBefehl(String),

    #[error("Session-Kern nicht erreichbar: {0}")]
    Session(#[from] botschaft_session::SessionFehler),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiFehler {
    /// Fehler-Code fuer Protokoll-Antworten (`error id=N msg=...`)
    pub fn fehler_code(&self) -> u32 {
        match self {
            Self::Protokoll(_) => 1001,
            Self::UnbekannterBefehl(_) => 1002,
            Self::Session(_) => 2001,
            Self::Io(_) => 5001,
        }
    }
}
