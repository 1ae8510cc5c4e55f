use thiserror::Error;

/// Result type for link operations.
pub type LinkResult<T, E = LinkError> = std::result::Result<T, E>;

/// Error outputs from `LinkKit`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum LinkError {
    /// No service access token is set on the session.
    #[error("missing_access_token")]
    MissingAccessToken,
    /// The operation involves the active user but no user ID is set on the session.
    #[error("missing_user_id")]
    MissingUserId,
    /// The operation involves the active link request but there is none.
    #[error("no_active_link_request")]
    NoActiveLinkRequest,
    /// A polling monitor is already running for this session.
    #[error("monitor_already_running")]
    MonitorAlreadyRunning,
    /// The configured base URL cannot be turned into a request URL.
    #[error("invalid_url: {url}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The service configuration could not be parsed.
    #[error("invalid_config: {0}")]
    InvalidConfig(String),
    /// The HTTP exchange itself could not complete (connectivity, DNS, body decoding).
    #[error("transport_error: {error}")]
    Transport {
        /// Transport-level description of the failure.
        error: String,
    },
    /// The service answered with something other than a success.
    #[error("service_error ({status}): {message}")]
    Service {
        /// HTTP status code of the response.
        status: u16,
        /// Message extracted from the failure envelope, or the fallback message.
        message: String,
    },
}

impl LinkError {
    /// Returns `true` for errors raised before any network exchange, which
    /// indicate misuse by the caller rather than a runtime condition.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingAccessToken
                | Self::MissingUserId
                | Self::NoActiveLinkRequest
                | Self::MonitorAlreadyRunning
                | Self::InvalidUrl { .. }
        )
    }

    /// The plain message a host would show for this error.
    ///
    /// For transport and service failures this is the message reported by the
    /// transport or the remote peer, without any prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transport { error } => error.clone(),
            Self::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status of the response that caused this error, if there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}
