use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcilerError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Fighter already exists: {first_name} {last_name}")]
    DuplicateFighter {
        first_name: String,
        last_name: String,
    },
}

pub type Result<T> = std::result::Result<T, ReconcilerError>;
