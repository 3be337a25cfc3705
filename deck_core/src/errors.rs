use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read deck file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Deck JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type DeckResult<T> = Result<T, DeckError>;
