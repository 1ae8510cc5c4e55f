//! Periodic polling of the active link request's status.
//!
//! A monitor is a background task that waits for the interval, queries the
//! status once, hands the outcome to the caller and starts waiting again. It
//! never stops by itself, whatever the status: the caller decides when an
//! approved or denied request is done with and calls
//! [`LinkService::stop_monitoring`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{LinkError, LinkResult};
use crate::service::LinkService;
use crate::types::LinkRequestStatus;

/// Interval used by [`LinkService::monitor_with_default_interval`].
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(5);

/// Outcomes of each status query made by a monitor, in completion order.
///
/// Dropping the receiver stops the monitor.
pub type MonitorEvents = mpsc::UnboundedReceiver<LinkResult<LinkRequestStatus>>;

impl LinkService {
    /// Starts polling the status of the active link request every `interval`.
    ///
    /// The interval is measured from the completion of the previous query (or
    /// from the start). Every query delivers exactly one event, success or
    /// error, and an error does not stop the monitor.
    ///
    /// # Errors
    /// [`LinkError::MissingAccessToken`] or [`LinkError::NoActiveLinkRequest`]
    /// as for [`Self::query_link_request_status`], and
    /// [`LinkError::MonitorAlreadyRunning`] if this session already has a monitor.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn monitor(&self, interval: Duration) -> LinkResult<MonitorEvents> {
        self.inner.session.credentials(true, false)?;

        let token = CancellationToken::new();
        {
            let mut state = self.inner.session.lock();
            if state.is_monitoring() {
                return Err(LinkError::MonitorAlreadyRunning);
            }
            state.monitor = Some(token.clone());
        }

        let (events, receiver) = mpsc::unbounded_channel();
        tokio::spawn(self.clone().run_monitor(interval, token, events));

        log::info!("started monitoring link request every {interval:?}");
        Ok(receiver)
    }

    /// Starts polling with [`DEFAULT_MONITOR_INTERVAL`].
    ///
    /// # Errors
    /// See [`Self::monitor`].
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn monitor_with_default_interval(&self) -> LinkResult<MonitorEvents> {
        self.monitor(DEFAULT_MONITOR_INTERVAL)
    }

    /// Stops the running monitor, if any.
    ///
    /// No further query is started. A query already in flight still delivers
    /// its outcome.
    pub fn stop_monitoring(&self) {
        if let Some(token) = self.inner.session.lock().monitor.take() {
            token.cancel();
            log::info!("stopped monitoring link request");
        }
    }

    async fn run_monitor(
        self,
        interval: Duration,
        token: CancellationToken,
        events: mpsc::UnboundedSender<LinkResult<LinkRequestStatus>>,
    ) {
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }

            let outcome = self.query_link_request_status().await;
            if let Err(err) = &outcome {
                log::debug!("link request monitor query failed: {err}");
            }
            if events.send(outcome).is_err() {
                log::debug!("link request monitor receiver dropped");
                token.cancel();
                break;
            }
        }
    }
}
