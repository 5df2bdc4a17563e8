use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CharacterError {
    #[error("Movement settings file {path:?} does not exist")]
    ConfigMissing { path: PathBuf },

    /// The file exists, but reading it failed.
    #[error("Movement settings file {path:?} could not be read")]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A required key is absent or not a number (or the document isn't JSON at all).
    #[error("Movement settings file {path:?} is invalid: {source}")]
    ConfigFieldInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("There is no level or physics world to bind to yet")]
    WorldUnavailable,

    #[error("The character controller has not been built yet")]
    ControllerUnbound,
}
