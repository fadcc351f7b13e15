//! Error types for the interface registry, codec and configuration layer.

use thiserror::Error;

/// Errors raised while encoding calls or decoding contract data.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("function '{name}' taking {arity} argument(s) not found in {contract}")]
    FunctionNotFound {
        contract: &'static str,
        name: String,
        arity: usize,
    },

    #[error("event '{name}' not found in {contract}")]
    EventNotFound {
        contract: &'static str,
        name: String,
    },

    #[error("invalid ABI JSON for {contract}: {reason}")]
    InvalidAbi {
        contract: &'static str,
        reason: String,
    },

    #[error("unresolvable ABI type '{ty}': {reason}")]
    InvalidType { ty: String, reason: String },

    #[error("argument count mismatch for {function}: ABI has {expected}, got {got}")]
    ArgumentCount {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("argument '{param}' of {function}: {reason}")]
    Argument {
        function: String,
        param: String,
        reason: String,
    },

    #[error("ABI decode failed: {reason}")]
    AbiDecodeFailed { reason: String },

    #[error("field '{field}': expected {expected}")]
    UnexpectedValue {
        field: String,
        expected: &'static str,
    },
}

/// Errors raised while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown network '{name}' (configured: {known})")]
    UnknownNetwork { name: String, known: String },

    #[error("invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("no address configured for {contract} on network '{network}'")]
    MissingAddress {
        network: String,
        contract: &'static str,
    },

    #[error("{contract} appears under several modules in {origin}: {}", .keys.join(", "))]
    AmbiguousAddress {
        origin: String,
        contract: &'static str,
        keys: Vec<String>,
    },
}

impl ConfigError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
