use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// A required structural key (`result`, `houses`, `thermostats`) is missing
    /// or has the wrong shape.
    MissingKey(&'static str),
    HouseNotFound(i64),
    Json(serde_json::Error),
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingKey(key) => write!(f, "snapshot is missing required key: {key}"),
            Error::HouseNotFound(id) => write!(f, "house {id} not present in snapshot"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Source(e) => write!(f, "snapshot source error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(e) => Some(e),
            Error::Source(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
