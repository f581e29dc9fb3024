use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataConsumerError {
    #[error("failed to read data file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse data file {path}: {source}")]
    Parse { path: PathBuf, source: csv::Error },

    #[error("data file {path} has no header row")]
    MissingHeader { path: PathBuf },

    #[error("failed to persist data file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// `%Name%` appeared in a step's target or value but no column of that name
/// exists in the reserved row (spec.md §4.6, `UnknownPlaceholder`).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("placeholder '%{0}%' has no matching dataset column")]
pub struct UnknownPlaceholder(pub String);
