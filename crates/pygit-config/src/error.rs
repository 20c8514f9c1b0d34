use std::path::PathBuf;

/// Errors that can occur reading or writing `.pygit/config`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config key: {0}")]
    InvalidKey(String),

    #[error("parse error in {file}:{line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("invalid boolean value: {0}")]
    InvalidBool(String),

    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("lock error: {0}")]
    Lock(#[from] pygit_utils::UtilError),
}
