//! Errors raised while loading, saving, or validating `config.ron`.

/// Configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read config file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config directory or file could not be written.
    #[error("cannot write config file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The file is not valid RON for [`Config`](crate::Config).
    #[error("malformed config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// The in-memory config could not be encoded.
    #[error("cannot encode config: {0}")]
    SerializeError(#[source] ron::Error),

    /// A value parsed fine but makes no sense for the globe.
    #[error("invalid `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}
