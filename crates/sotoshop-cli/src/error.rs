use std::path::PathBuf;

use sotoshop_core::ConfigError;
use sotoshop_render::ExportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid session: {0}")]
    Session(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

pub type CliResult<T> = Result<T, CliError>;
