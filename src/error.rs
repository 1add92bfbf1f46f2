//! The one error type every public entry point returns.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadlineError {
    /// Ctrl-C was pressed during a `readline`/`input` call.
    #[error("interrupted")]
    Interrupted,

    /// Ctrl-D was pressed on an input line (empty or not).
    #[error("end of input")]
    Eof,

    /// No `RawSource` implementation exists for the current OS.
    #[error("platform not supported: {0}")]
    PlatformNotSupported(String),

    /// The raw byte source failed in a way that isn't a plain I/O error
    /// (e.g. the tty fd reported an exceptional condition).
    #[error("failed to read a key: {0}")]
    ReadKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReadlineError>;
