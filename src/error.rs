use crate::downloader::ExportFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading table configuration.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid table configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Failures while producing an export artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,

    #[error("{0} export is disabled for this table")]
    Disabled(ExportFormat),

    #[error("spreadsheet export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("document export failed: {0}")]
    Pdf(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
