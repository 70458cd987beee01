//! Error type shared by the codec and the authority builder.

use openssl::error::ErrorStack;
use thiserror::Error;

/// Errors produced while building, loading or saving an authority.
#[derive(Debug, Error)]
pub enum CaError {
    /// A filesystem operation failed. `context` names the step (open, read, write, chmod).
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The key armor block was absent, mislabeled, or its payload was not a PKCS#1 key.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// The certificate armor block was absent, mislabeled, or its payload was not DER.
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// OpenSSL rejected one of the steps of building or signing a certificate.
    #[error("sign certificate: failed to {step}: {source}")]
    Signing {
        step: &'static str,
        #[source]
        source: ErrorStack,
    },

    /// Only freshly signed authorities carry the bytes needed to persist them.
    #[error("cannot save imported certificate authority")]
    NoSignedBytes,

    /// The secure random source could not deliver. Callers must not continue.
    #[error("secure random source exhausted: {0}")]
    EntropyExhausted(String),
}

impl CaError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CaError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn signing(step: &'static str) -> impl FnOnce(ErrorStack) -> Self {
        move |source| CaError::Signing { step, source }
    }

    /// True for the error kinds a caller must treat as unrecoverable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CaError::EntropyExhausted(_))
    }
}
