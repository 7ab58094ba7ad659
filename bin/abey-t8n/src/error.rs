use abey_processor::{ConfigError, SignerError};

/// Errors of the t8n tool.
#[derive(Debug, thiserror::Error)]
pub enum T8nError {
    /// Failed to load an input file
    #[error("Failed to load input file '{file}': {source}")]
    InputLoad {
        /// The file path that failed to load
        file: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse or serialize JSON content
    #[error("Failed to parse JSON from '{file}': {source}")]
    JsonParse {
        /// The file path where JSON parsing failed
        file: String,
        /// The underlying JSON error
        source: serde_json::Error,
    },

    /// Failed to write an output file
    #[error("Failed to write output file '{file}': {source}")]
    OutputWrite {
        /// The file path that failed to write
        file: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The chain configuration is inconsistent
    #[error("Invalid chain config: {0}")]
    Config(#[from] ConfigError),

    /// A transaction carries neither a signature nor a secret key
    #[error("Transaction {0} has neither a signature nor a secret key")]
    MissingSignature(usize),

    /// A secret key is not a valid secp256k1 scalar
    #[error("Transaction {index} has an invalid secret key: {source}")]
    InvalidSecretKey {
        /// Index of the transaction
        index: usize,
        /// The underlying key error
        source: k256::ecdsa::Error,
    },

    /// Signing a transaction failed
    #[error("Failed to sign transaction {index}: {source}")]
    Signing {
        /// Index of the transaction
        index: usize,
        /// The underlying signer error
        source: SignerError,
    },
}

/// Result type alias for t8n operations
pub type Result<T> = std::result::Result<T, T8nError>;
