use crate::q_table::StateKey;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no legal action available in state {0}")]
    InvalidState(StateKey),

    #[error("failed to {operation} value table {path}: {source}")]
    Persistence {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: PersistenceError,
    },

    #[error("cell ({row}, {col}) is already occupied")]
    OccupiedCell { row: usize, col: usize },

    #[error("cell ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("player I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("player input closed before the game ended")]
    InputClosed,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Underlying cause of a failed value table load or save.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pickle error: {0}")]
    Pickle(#[from] serde_pickle::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_invalid_state_display_working() {
        let err = Error::InvalidState(StateKey::new([1, -1, 1, -1, 1, -1, -1, 1, -1]));
        assert_eq!(
            err.to_string(),
            "no legal action available in state (1, -1, 1, -1, 1, -1, -1, 1, -1)"
        );
    }

    #[test]
    fn is_persistence_display_working() {
        let err = Error::Persistence {
            operation: "read",
            path: PathBuf::from("a1_data.json"),
            source: PersistenceError::Io(io::Error::new(io::ErrorKind::NotFound, "missing")),
        };
        assert_eq!(
            err.to_string(),
            "failed to read value table a1_data.json: I/O error: missing"
        );
    }
}
