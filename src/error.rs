use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions raised while loading an order-line source.
///
/// Malformed individual cells never surface here; they are coerced to null.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Source {path:?} is unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Source {path:?} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
    #[error("Source {path:?} has no header row")]
    EmptySource { path: PathBuf },
    #[error("Malformed CSV in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
