use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Failure taxonomy for exchange operations.
///
/// Adapters never retry; every failure is returned to the caller, which owns
/// retry and backoff policy. The variants keep upstream rejections, transport
/// faults and contract drift distinguishable.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Connection failure, timeout, or a non-2xx HTTP response.
    #[error("transport failure{}: {message}", .status.map(|s| format!(" (http {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status code when the request reached the server.
        status: Option<u16>,
        message: String,
    },

    /// The response body does not match the expected envelope or field shape,
    /// including unparsable numerics on financial fields.
    #[error("malformed response: {0}")]
    Protocol(String),

    /// The exchange refused the request. The message is the first element of
    /// the upstream error list, verbatim (e.g. "EOrder:Insufficient funds").
    #[error("{0}")]
    Rejected(String),

    /// The requested order id has no matching record on the exchange.
    #[error("no record found for order {0}")]
    NotFound(String),

    /// The operation is not implemented by this adapter.
    #[error("{operation} is not supported by {exchange}")]
    NotSupported {
        exchange: &'static str,
        operation: &'static str,
    },

    /// Malformed credential material. Raised before any network call.
    #[error("invalid credentials: {0}")]
    Configuration(String),
}

impl ExchangeError {
    pub fn protocol(message: impl Into<String>) -> Self {
        ExchangeError::Protocol(message.into())
    }

    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        ExchangeError::Transport {
            status,
            message: message.into(),
        }
    }
}
