//! The link service: creating, inspecting and deleting link requests, and the
//! user-scoped calls that become possible once an account is linked.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::config::{Endpoint, ServiceConfig};
use crate::envelope::{decode_data, decode_envelope, decode_failure_message, SUCCESS_STATUS};
use crate::error::{LinkError, LinkResult};
use crate::http_request::{HttpResponse, HttpTransport, Transport};
use crate::session::Session;
use crate::types::{LinkRequestStatus, QrCodeImage, UserInfo};

const USER_INFO_CHANNEL_CAPACITY: usize = 16;

pub(crate) struct ServiceInner {
    pub(crate) config: ServiceConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) session: Session,
    pub(crate) user_info_updates: broadcast::Sender<Option<UserInfo>>,
}

/// Client for the Fitcoin link service, bound to one [`Session`].
///
/// Cloning is cheap and every clone shares the same session. Precondition
/// errors (see [`LinkError::is_precondition`]) are returned before any network
/// exchange takes place.
///
/// Operations may overlap: each reads the session when it starts and writes
/// it when its response arrives, so the last response to arrive wins.
#[derive(Clone)]
pub struct LinkService {
    pub(crate) inner: Arc<ServiceInner>,
}

impl LinkService {
    /// Creates a service talking HTTP to the configured base URL.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(config.timeout()));
        Self::with_transport(config, transport)
    }

    /// Creates a service that performs its exchanges through `transport`.
    #[must_use]
    pub fn with_transport(config: ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        let (user_info_updates, _) = broadcast::channel(USER_INFO_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(ServiceInner {
                config,
                transport,
                session: Session::new(),
                user_info_updates,
            }),
        }
    }

    /// The session this service reads identities from and records results into.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Subscribes to user information updates.
    ///
    /// Every completed [`Self::fetch_user_info`] publishes exactly one update
    /// carrying the new cached value: the fetched info, or `None` if the fetch
    /// failed.
    #[must_use]
    pub fn subscribe_user_info(&self) -> broadcast::Receiver<Option<UserInfo>> {
        self.inner.user_info_updates.subscribe()
    }

    /// Creates a new link request and makes it the active one.
    ///
    /// Any existing active link request is replaced without being deleted.
    /// Whatever the outcome, the active link request afterwards is the one just
    /// created, or none.
    ///
    /// # Errors
    /// [`LinkError::MissingAccessToken`] without a network call; otherwise the
    /// transport or service error.
    pub async fn create_link_request(&self) -> LinkResult<String> {
        let credentials = self.inner.session.credentials(false, false)?;
        let url = self.url(Endpoint::CreateLinkRequest, &[])?;

        log::debug!("creating link request");
        let result = match self
            .inner
            .transport
            .post(&url, &[("access_token", credentials.token())])
            .await
        {
            Ok(response) => decode::<String>(&response),
            Err(err) => Err(err.into()),
        };

        self.inner.session.lock().link_request_id = result.as_ref().ok().cloned();

        match &result {
            Ok(id) => log::info!("created link request {id}"),
            Err(err) => log::warn!("failed to create link request: {err}"),
        }
        result
    }

    /// Fetches the QR code image for the active link request.
    ///
    /// # Errors
    /// [`LinkError::MissingAccessToken`] or [`LinkError::NoActiveLinkRequest`]
    /// without a network call; a transport error; or, for any status other
    /// than `200`, a service error with the message `"Error code <status>"`.
    pub async fn fetch_qr_code(&self) -> LinkResult<QrCodeImage> {
        let credentials = self.inner.session.credentials(true, false)?;
        let url = self.url(
            Endpoint::LinkRequestQrCode,
            &[("link_request_id", credentials.link_request_id()?)],
        )?;

        let response = self.inner.transport.get_binary(&url).await?;
        if response.status != SUCCESS_STATUS {
            return Err(LinkError::Service {
                status: response.status,
                message: format!("Error code {}", response.status),
            });
        }

        Ok(QrCodeImage {
            bytes: response.body.bytes,
            content_type: response.body.content_type,
        })
    }

    /// Queries the status of the active link request.
    ///
    /// The active link request is left in place whatever the outcome: a
    /// pending or denied request is still a valid request.
    ///
    /// # Errors
    /// [`LinkError::MissingAccessToken`] or [`LinkError::NoActiveLinkRequest`]
    /// without a network call; otherwise the transport or service error.
    pub async fn query_link_request_status(&self) -> LinkResult<LinkRequestStatus> {
        let credentials = self.inner.session.credentials(true, false)?;
        let link_request_id = credentials.link_request_id()?;
        let url = self.url(
            Endpoint::LinkRequestStatus,
            &[("link_request_id", link_request_id)],
        )?;

        let response = self.inner.transport.get(&url).await?;
        let status = decode::<LinkRequestStatus>(&response)?;
        log::debug!(
            "link request {link_request_id} is {}",
            status.status()
        );
        Ok(status)
    }

    /// Deletes the active link request. Use this once a request has been
    /// approved or denied.
    ///
    /// As soon as the service answers, with success or not, the session no
    /// longer has an active link request. A transport failure leaves it set.
    ///
    /// # Errors
    /// [`LinkError::MissingAccessToken`] or [`LinkError::NoActiveLinkRequest`]
    /// without a network call; otherwise the transport or service error.
    pub async fn delete_link_request(&self) -> LinkResult<()> {
        let credentials = self.inner.session.credentials(true, false)?;
        let link_request_id = credentials.link_request_id()?;
        let url = self.url(
            Endpoint::ClearLinkRequest,
            &[("link_request_id", link_request_id)],
        )?;

        let response = self.inner.transport.post(&url, &[]).await?;
        self.inner.session.lock().link_request_id = None;

        if response.status == SUCCESS_STATUS {
            log::info!("deleted link request {link_request_id}");
            Ok(())
        } else {
            let message = decode_failure_message(&response.body);
            log::warn!("failed to delete link request {link_request_id}: {message}");
            Err(LinkError::Service {
                status: response.status,
                message,
            })
        }
    }

    /// Fetches the active user's information and caches it in the session.
    ///
    /// On failure the cached value is cleared. Either way one update is then
    /// published to [`Self::subscribe_user_info`] subscribers.
    ///
    /// # Errors
    /// [`LinkError::MissingAccessToken`] or [`LinkError::MissingUserId`]
    /// without a network call; otherwise the transport or service error.
    pub async fn fetch_user_info(&self) -> LinkResult<UserInfo> {
        let credentials = self.inner.session.credentials(false, true)?;
        let url = self.url(
            Endpoint::UserInfo,
            &[
                ("access_token", credentials.token()),
                ("user_id", credentials.user_id()?),
            ],
        )?;

        let result = match self.inner.transport.get(&url).await {
            Ok(response) => decode::<UserInfo>(&response),
            Err(err) => Err(err.into()),
        };

        {
            let mut state = self.inner.session.lock();
            state.user_info = result.as_ref().ok().cloned();
            // no subscribers is fine
            let _ = self.inner.user_info_updates.send(state.user_info.clone());
        }

        if let Err(err) = &result {
            log::warn!("failed to fetch user info: {err}");
        }
        result
    }

    /// Refreshes the cached user information in the background, for hosts that
    /// only consume [`Session::user_info`] or [`Self::subscribe_user_info`].
    ///
    /// # Errors
    /// [`LinkError::MissingAccessToken`] or [`LinkError::MissingUserId`]; the
    /// outcome of the fetch itself is only visible through the session.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn refresh_user_info(&self) -> LinkResult<()> {
        self.inner.session.credentials(false, true)?;

        let service = self.clone();
        tokio::spawn(async move {
            // the outcome is recorded in the session and published to subscribers
            let _ = service.fetch_user_info().await;
        });
        Ok(())
    }

    /// Makes a purchase on behalf of the active user and returns their new balance.
    ///
    /// `amount` is forwarded as is; the service decides what amounts are acceptable.
    /// A success response without a readable balance yields `0`. The cached
    /// user information is not updated.
    ///
    /// # Errors
    /// [`LinkError::MissingAccessToken`] or [`LinkError::MissingUserId`]
    /// without a network call; otherwise the transport or service error.
    pub async fn make_purchase(&self, amount: i64) -> LinkResult<i64> {
        let credentials = self.inner.session.credentials(false, true)?;
        let amount = amount.to_string();
        let url = self.url(
            Endpoint::Purchase,
            &[
                ("access_token", credentials.token()),
                ("user_id", credentials.user_id()?),
                ("amount", &amount),
            ],
        )?;

        let response = self.inner.transport.post(&url, &[]).await?;
        if response.status == SUCCESS_STATUS {
            let balance = decode_data::<i64>(&response.body).unwrap_or_default();
            log::info!("purchase of {amount} succeeded, new balance {balance}");
            Ok(balance)
        } else {
            Err(LinkError::Service {
                status: response.status,
                message: decode_failure_message(&response.body),
            })
        }
    }

    fn url(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> LinkResult<String> {
        self.inner.config.endpoint_url(endpoint, query)
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse<String>) -> LinkResult<T> {
    decode_envelope(response.status, &response.body).map_err(|message| LinkError::Service {
        status: response.status,
        message,
    })
}
