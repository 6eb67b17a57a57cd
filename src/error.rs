use std::fmt;

/// Failure to ingest an institution or seat table.
#[derive(Debug)]
pub enum DataError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn(&'static str),
    UnknownColumn(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(err) => write!(f, "failed to read table: {}", err),
            DataError::Csv(err) => write!(f, "invalid CSV data: {}", err),
            DataError::MissingColumn(column) => write!(f, "missing required column: {}", column),
            DataError::UnknownColumn(column) => write!(f, "unknown column: {}", column),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(err) => Some(err),
            DataError::Csv(err) => Some(err),
            DataError::MissingColumn(_) | DataError::UnknownColumn(_) => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}
