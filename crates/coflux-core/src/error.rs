//! Error types for coflux.
//!
//! [`BridgeError`] is the error every async bridge resolves to. Errors that
//! travel through the reactive error channel are carried as
//! [`UpstreamError`] so that one signal can be observed by several parties
//! without losing the original error value.
//!
//! | Variant | Raised by | Meaning |
//! |---------|-----------|---------|
//! | `NoReader` | codec lookup | No reader for a (media type, target type) pair |
//! | `Upstream` | any bridge | Error signal emitted by the publisher |
//! | `Decode` | readers | Payload could not be decoded |
//! | `InvalidRequest` | request builders | Invalid URI, header name or value |
//! | `AlreadySubscribed` | one-shot publishers | Second subscription attempt |
//! | `Cancelled` | any bridge | Subscriber dropped without a terminal signal |
//! | `NoRuntime` | reference publishers | No tokio runtime to drive emission |

use std::sync::Arc;
use thiserror::Error;

/// An error carried by a reactive `on_error` signal.
///
/// Shared so that it can be cloned into several subscribers or re-emitted
/// without being re-created.
pub type UpstreamError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`BridgeError`].
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced at the await points of the bridging layer.
///
/// # Example
///
/// ```
/// use coflux_core::BridgeError;
///
/// let err = BridgeError::no_reader("application/xml", "alloc::string::String");
/// assert!(err.to_string().contains("application/xml"));
/// assert!(err.to_string().contains("alloc::string::String"));
/// assert!(err.is_configuration());
/// ```
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// No registered message reader supports the requested media type and
    /// target type.
    #[error("could not find a message reader that supports \"{media_type}\" and \"{target}\"")]
    NoReader {
        /// The negotiated media type.
        media_type: String,
        /// The requested target type name.
        target: String,
    },

    /// An error signalled by the upstream publisher, passed through unchanged.
    #[error(transparent)]
    Upstream(UpstreamError),

    /// The payload could not be decoded into the target type.
    #[error("failed to decode \"{media_type}\" into \"{target}\": {message}")]
    Decode {
        /// Media type of the payload.
        media_type: String,
        /// The requested target type name.
        target: String,
        /// Decoder error message.
        message: String,
    },

    /// The request specification is invalid (URI, header name or value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A one-shot publisher was subscribed more than once.
    #[error("publisher allows a single subscriber and was already subscribed")]
    AlreadySubscribed,

    /// The publisher dropped its subscriber without a terminal signal.
    #[error("subscription was cancelled before a terminal signal")]
    Cancelled,

    /// A publisher needs a tokio runtime to emit and none is running.
    #[error("no tokio runtime available to drive the publisher")]
    NoRuntime,
}

impl BridgeError {
    /// Creates a missing-reader error.
    #[must_use]
    pub fn no_reader(media_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self::NoReader {
            media_type: media_type.into(),
            target: target.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(
        media_type: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Decode {
            media_type: media_type.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Wraps an arbitrary error as an upstream error.
    #[must_use]
    pub fn upstream<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream(Arc::new(error))
    }

    /// Returns true for lookup/configuration errors.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::NoReader { .. } | Self::InvalidRequest(_))
    }

    /// Returns the upstream error, if this error came from an error signal.
    #[must_use]
    pub fn as_upstream(&self) -> Option<&UpstreamError> {
        match self {
            Self::Upstream(err) => Some(err),
            _ => None,
        }
    }

    /// Converts this error into a value that can travel through `on_error`.
    ///
    /// Upstream errors are unwrapped so that re-emitting never nests them.
    #[must_use]
    pub fn into_upstream(self) -> UpstreamError {
        match self {
            Self::Upstream(err) => err,
            other => Arc::new(other),
        }
    }

    /// Recovers a bridge error that travelled through an error signal.
    ///
    /// [`into_upstream`](Self::into_upstream) wraps non-upstream variants so
    /// they can be emitted; this turns `Upstream(Arc<BridgeError>)` back
    /// into the original variant. Foreign upstream errors are kept as is.
    #[must_use]
    pub fn flatten(self) -> Self {
        match self {
            Self::Upstream(err) => match err.downcast_ref::<Self>() {
                Some(inner) => inner.clone(),
                None => Self::Upstream(err),
            },
            other => other,
        }
    }
}

impl From<UpstreamError> for BridgeError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(err)
    }
}
