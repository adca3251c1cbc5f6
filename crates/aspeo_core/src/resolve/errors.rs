//! Errors raised while resolving sources, pairs and metadata.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::Pair;

/// Configuration and resolution errors. All of them are fatal to the run.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source file is empty: {0}")]
    EmptySourceFile(PathBuf),

    #[error("Source file {path} has inconsistent lines: line {line} has {found} columns, expected {expected}")]
    InconsistentRows {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Source file {path} has {found} columns, at most {max} are known")]
    TooManyColumns {
        path: PathBuf,
        found: usize,
        max: usize,
    },

    #[error("No id column in source file header: {0}")]
    MissingIdColumn(PathBuf),

    #[error("Unknown column '{column}' in source file header: {path}")]
    UnknownColumn { path: PathBuf, column: String },

    #[error("Duplicate source id '{0}'")]
    DuplicateId(String),

    #[error("No sources: set `source` or `pairs`")]
    NoSources,

    #[error("Pairs file {path} is invalid at line {line}: pairs involve 2 or 3 ids, found {found}")]
    InvalidPairWidth {
        path: PathBuf,
        line: usize,
        found: usize,
    },

    #[error("Unknown id '{id}' in pair {pair}")]
    UnknownPairId { id: String, pair: Pair },

    #[error("No pairs to process")]
    EmptyPairs,

    #[error("Pairs {first} and {second} share the output fragment '{stem}'")]
    FragmentCollision {
        first: Pair,
        second: Pair,
        stem: String,
    },

    #[error("Unknown source id '{0}'")]
    UnknownSource(String),

    #[error("Cannot resolve DIM in {path}: found {found} DIM*.XML files")]
    DimNotResolved { path: PathBuf, found: usize },

    #[error("Neither a folder nor a file: {0}")]
    NotFolderOrFile(PathBuf),

    #[error("Malformed DIM {path}: {message}")]
    MalformedDim { path: PathBuf, message: String },

    #[error("Source '{0}' has no DIM descriptor, needed for the bounding box")]
    MissingDim(String),

    #[error("No footprint vertices in DIM {0}")]
    MissingVertices(PathBuf),

    #[error("No map projected image for source '{id}' (looked for {looked_for})")]
    MapProjectedMissing { id: String, looked_for: String },
}

impl ResolveError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn malformed_dim(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedDim {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;
