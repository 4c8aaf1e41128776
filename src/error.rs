use thiserror::Error;

/// Represents errors that can occur while running the certificate lifecycle.
///
/// Every variant carries enough context to tell the caller which step failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaError {
    /// The subject or issuer string could not be parsed as a distinguished name.
    #[error("Invalid subject name: {0}")]
    InvalidSubject(String),

    /// The certification request is not signed by the key it carries.
    #[error("Invalid CSR signature")]
    InvalidCsrSignature,

    /// The underlying crypto provider failed to generate key material or sign.
    #[error("Crypto provider error: {0}")]
    CryptoProvider(String),

    /// A certificate or revocation list signature did not verify.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// The serial number already appears in the revocation list.
    #[error("Certificate already revoked: serial {0}")]
    AlreadyRevoked(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    Encoding(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    Decoding(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CaError>;

impl From<der::Error> for CaError {
    /// Converts a `der::Error` into a `CaError`.
    fn from(err: der::Error) -> Self {
        CaError::Encoding(err.to_string())
    }
}

impl From<spki::Error> for CaError {
    fn from(err: spki::Error) -> Self {
        CaError::Encoding(err.to_string())
    }
}

impl From<rsa::Error> for CaError {
    fn from(err: rsa::Error) -> Self {
        CaError::CryptoProvider(err.to_string())
    }
}

impl From<rsa::signature::Error> for CaError {
    fn from(err: rsa::signature::Error) -> Self {
        CaError::CryptoProvider(err.to_string())
    }
}

impl From<pem::PemError> for CaError {
    fn from(err: pem::PemError) -> Self {
        CaError::Decoding(err.to_string())
    }
}
