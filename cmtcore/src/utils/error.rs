use thiserror::Error;

use crate::runtime::DynError;

#[derive(Debug, Error)]
pub enum CmtError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),

    /// An operation on a dynamic value failed inside the dynamic runtime (for
    /// example a value's equality operator raised).
    #[error("Dynamic runtime error: {0}")]
    Dynamic(#[from] DynError),

    #[error("Static type error: {0}")]
    Type(#[from] cmtypes::utils::Error),

    #[error("No RPC handler has been installed in this process")]
    RpcHandlerMissing,

    #[error("The RPC handler has been cleaned up and can no longer forward calls")]
    RpcHandlerReleased,
}

pub type CmtResult<T> = Result<T, CmtError>;
