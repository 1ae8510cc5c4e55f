//! Identity and cached state shared by every call a [`crate::LinkService`] makes.
//!
//! Fields are plain settable values: any string (or `None`) is accepted and
//! nothing is validated until an operation needs it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;

use crate::error::{LinkError, LinkResult};
use crate::types::UserInfo;

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) access_token: Option<SecretString>,
    pub(crate) user_id: Option<String>,
    pub(crate) link_request_id: Option<String>,
    pub(crate) user_info: Option<UserInfo>,
    pub(crate) monitor: Option<CancellationToken>,
}

impl SessionState {
    pub(crate) fn is_monitoring(&self) -> bool {
        self.monitor
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

/// Snapshot of the identity an operation runs with, taken before it starts.
pub(crate) struct Credentials {
    pub(crate) access_token: SecretString,
    pub(crate) user_id: Option<String>,
    pub(crate) link_request_id: Option<String>,
}

impl Credentials {
    pub(crate) fn token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub(crate) fn user_id(&self) -> LinkResult<&str> {
        self.user_id.as_deref().ok_or(LinkError::MissingUserId)
    }

    pub(crate) fn link_request_id(&self) -> LinkResult<&str> {
        self.link_request_id
            .as_deref()
            .ok_or(LinkError::NoActiveLinkRequest)
    }
}

/// Session state for one host: the service access token, the active user, the
/// active link request, the last fetched user information and whether a
/// polling monitor is running.
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        // every critical section leaves the state consistent, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets (or clears) the service access token used for every call.
    pub fn set_access_token(&self, access_token: Option<String>) {
        self.lock().access_token = access_token.map(SecretString::from);
    }

    /// Whether an access token is set. The token itself is never handed back out.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.lock().access_token.is_some()
    }

    /// ID of the active user.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.lock().user_id.clone()
    }

    /// Sets (or clears) the active user.
    pub fn set_user_id(&self, user_id: Option<String>) {
        self.lock().user_id = user_id;
    }

    /// ID of the active link request.
    #[must_use]
    pub fn link_request_id(&self) -> Option<String> {
        self.lock().link_request_id.clone()
    }

    /// Sets (or clears) the active link request, e.g. to resume one created earlier.
    pub fn set_link_request_id(&self, link_request_id: Option<String>) {
        self.lock().link_request_id = link_request_id;
    }

    /// The outcome of the last user information fetch. `None` if it failed or never ran.
    #[must_use]
    pub fn user_info(&self) -> Option<UserInfo> {
        self.lock().user_info.clone()
    }

    /// Whether a polling monitor is currently active for this session.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.lock().is_monitoring()
    }

    /// Checks the preconditions of an operation and snapshots the identity it needs.
    ///
    /// The access token is checked first, then the link request and user as requested.
    pub(crate) fn credentials(
        &self,
        needs_link_request: bool,
        needs_user: bool,
    ) -> LinkResult<Credentials> {
        let state = self.lock();
        let access_token = state
            .access_token
            .as_ref()
            .map(|token| SecretString::from(token.expose_secret().to_owned()))
            .ok_or(LinkError::MissingAccessToken)?;
        if needs_link_request && state.link_request_id.is_none() {
            return Err(LinkError::NoActiveLinkRequest);
        }
        if needs_user && state.user_id.is_none() {
            return Err(LinkError::MissingUserId);
        }

        Ok(Credentials {
            access_token,
            user_id: state.user_id.clone(),
            link_request_id: state.link_request_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_accept_any_value() {
        let session = Session::new();
        assert!(!session.has_access_token());

        session.set_access_token(Some(String::new()));
        session.set_user_id(Some("  ".to_string()));
        session.set_link_request_id(Some("lr-1".to_string()));

        assert!(session.has_access_token());
        assert_eq!(session.user_id().as_deref(), Some("  "));
        assert_eq!(session.link_request_id().as_deref(), Some("lr-1"));

        session.set_link_request_id(None);
        assert_eq!(session.link_request_id(), None);
    }

    #[test]
    fn test_access_token_is_redacted() {
        let session = Session::new();
        session.set_access_token(Some("super-secret".to_string()));
        assert!(!format!("{session:?}").contains("super-secret"));
    }

    #[test]
    fn test_credentials_check_token_first() {
        let session = Session::new();
        assert_eq!(
            session.credentials(true, true).err(),
            Some(LinkError::MissingAccessToken)
        );

        session.set_access_token(Some("tok".to_string()));
        assert_eq!(
            session.credentials(true, false).err(),
            Some(LinkError::NoActiveLinkRequest)
        );
        assert_eq!(
            session.credentials(false, true).err(),
            Some(LinkError::MissingUserId)
        );

        let credentials = session.credentials(false, false).unwrap();
        assert_eq!(credentials.token(), "tok");
        assert_eq!(credentials.user_id().err(), Some(LinkError::MissingUserId));
    }

    #[test]
    fn test_monitoring_follows_token() {
        let session = Session::new();
        assert!(!session.is_monitoring());

        let token = CancellationToken::new();
        session.lock().monitor = Some(token.clone());
        assert!(session.is_monitoring());

        token.cancel();
        assert!(!session.is_monitoring());
    }
}
