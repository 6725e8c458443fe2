use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum KvError {
    KeyNotFound(String),
    KeyExists(String),
    EmptyKey,
    MissingValue,
    MissingCachePath,
    InvalidJson(String),
    NotAnObject { path: PathBuf, found: &'static str },
    InputFile { path: PathBuf, source: std::io::Error },
    InvalidInput(String),
    StoreNotOpen,
    UnhandledCommand(String),
    Database(String),
    Io(std::io::Error),
}

impl KvError {
    /// Store-level failures end the interactive loop; everything else is the user's to fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, KvError::Database(_) | KvError::Io(_))
    }
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvError::KeyNotFound(key) => write!(f, "key not found: {}", key),
            KvError::KeyExists(key) => write!(f, "key already exists: {}", key),
            KvError::EmptyKey => write!(f, "at least one key element is required"),
            KvError::MissingValue => write!(f, "one of --value or --json-value is required"),
            KvError::MissingCachePath => write!(f, "no store selected (use --cache <path>)"),
            KvError::InvalidJson(msg) => write!(f, "invalid JSON: {}", msg),
            KvError::NotAnObject { path, found } => write!(
                f,
                "{} must contain a JSON object at the top level, found {}",
                path.display(),
                found
            ),
            KvError::InputFile { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            KvError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            KvError::StoreNotOpen => write!(f, "store is not open"),
            KvError::UnhandledCommand(name) => write!(f, "no handler registered for '{}'", name),
            KvError::Database(msg) => write!(f, "database error: {}", msg),
            KvError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for KvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KvError::Io(err) => Some(err),
            KvError::InputFile { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KvError {
    fn from(err: std::io::Error) -> Self {
        KvError::Io(err)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(err: rusqlite::Error) -> Self {
        KvError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for KvError {
    fn from(err: serde_json::Error) -> Self {
        KvError::InvalidJson(err.to_string())
    }
}
