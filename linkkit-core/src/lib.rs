//! `linkkit-core` lets a third-party app link user accounts with the Fitcoin
//! service and act on them.
//!
//! The app creates a link request, shows its QR code to the user, and waits
//! (by polling, see [`LinkService::monitor`]) for the user to approve or deny
//! it in the Fitcoin app. Once approved, the linked user's ID unlocks
//! [`LinkService::fetch_user_info`] and [`LinkService::make_purchase`].
//!
//! ```rust,no_run
//! use linkkit_core::{LinkService, LinkStatusKind, ServiceConfig};
//!
//! # async fn run() -> linkkit_core::LinkResult<()> {
//! let service = LinkService::new(ServiceConfig::new("https://fitcoin.example/api"));
//! service.session().set_access_token(Some("app-token".to_string()));
//!
//! service.create_link_request().await?;
//! let qr = service.fetch_qr_code().await?;
//! # let _ = qr;
//!
//! let mut events = service.monitor_with_default_interval()?;
//! while let Some(event) = events.recv().await {
//!     let Ok(status) = event else { continue };
//!     if status.status() != LinkStatusKind::Pending {
//!         service.stop_monitoring();
//!         service.session().set_user_id(status.approved_user_id().map(str::to_string));
//!         break;
//!     }
//! }
//! service.delete_link_request().await?;
//! # Ok(())
//! # }
//! ```
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod config;
pub use config::*;

pub mod envelope;

mod error;
pub use error::*;

mod http_request;
pub use http_request::*;

pub mod logger;

mod monitor;
pub use monitor::*;

mod service;
pub use service::*;

mod session;
pub use session::*;

mod types;
pub use types::*;

#[cfg(test)]
mod test_utils;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("linkkit_core");
