use thiserror::Error;

use crate::symrec::Visibility;

/// Fatal conditions. Any of these means the core itself is in a bad state,
/// so the driver must stop the run instead of collecting more diagnostics.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Internal error: got empty bytecode in parser finalize")]
    EmptyBytecode,

    #[error("Internal error: unexpected visibility `{0}` for object format data")]
    UnexpectedVisibility(Visibility),

    #[error("Internal error: object format is not set")]
    NoObjectFormat,

    #[error("Failed to read config: {0}")]
    ConfigRead(String, #[source] std::io::Error),

    #[error("Failed to parse config")]
    ConfigParse(#[from] serde_yaml::Error),
}
