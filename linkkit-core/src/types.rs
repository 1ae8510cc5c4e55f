//! Domain payloads exchanged with the Fitcoin service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Information about a linked Fitcoin user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct UserInfo {
    /// The user's display name.
    pub username: String,
    /// The user's current balance. The service keeps this non-negative; it is not validated here.
    pub balance: i64,
}

/// The bare status of a link request, as it appears on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, Serialize, Deserialize,
)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LinkStatusKind {
    /// Waiting for the user to approve or deny the request.
    Pending,
    /// The user approved the request.
    Approved,
    /// The user denied the request.
    Denied,
}

/// Where a link request stands. The approving user is only known once approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRequestState {
    /// Waiting for the user to approve or deny the request.
    Pending,
    /// The user approved the request and their account is now bound.
    Approved {
        /// ID of the user that approved the request.
        user_id: String,
    },
    /// The user denied the request.
    Denied,
}

impl LinkRequestState {
    /// The bare status, without the approving user.
    #[must_use]
    pub const fn kind(&self) -> LinkStatusKind {
        match self {
            Self::Pending => LinkStatusKind::Pending,
            Self::Approved { .. } => LinkStatusKind::Approved,
            Self::Denied => LinkStatusKind::Denied,
        }
    }
}

/// The status of a link request as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireLinkRequestStatus", into = "WireLinkRequestStatus")]
pub struct LinkRequestStatus {
    /// When the link request was created.
    pub created_at: DateTime<Utc>,
    /// Current state of the request.
    pub state: LinkRequestState,
}

impl LinkRequestStatus {
    /// The bare status of the request.
    #[must_use]
    pub const fn status(&self) -> LinkStatusKind {
        self.state.kind()
    }

    /// ID of the user that approved the request. `None` unless the request is approved.
    #[must_use]
    pub fn approved_user_id(&self) -> Option<&str> {
        match &self.state {
            LinkRequestState::Approved { user_id } => Some(user_id),
            LinkRequestState::Pending | LinkRequestState::Denied => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireLinkRequestStatus {
    creation_date: DateTime<Utc>,
    status: LinkStatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl TryFrom<WireLinkRequestStatus> for LinkRequestStatus {
    type Error = String;

    fn try_from(wire: WireLinkRequestStatus) -> Result<Self, Self::Error> {
        let state = match (wire.status, wire.user_id) {
            (LinkStatusKind::Approved, Some(user_id)) => {
                LinkRequestState::Approved { user_id }
            }
            (LinkStatusKind::Approved, None) => {
                return Err("approved link request is missing `user_id`".to_string());
            }
            // a stray user id on an unapproved request carries no meaning
            (LinkStatusKind::Pending, _) => LinkRequestState::Pending,
            (LinkStatusKind::Denied, _) => LinkRequestState::Denied,
        };

        Ok(Self {
            created_at: wire.creation_date,
            state,
        })
    }
}

impl From<LinkRequestStatus> for WireLinkRequestStatus {
    fn from(status: LinkRequestStatus) -> Self {
        let kind = status.state.kind();
        let user_id = match status.state {
            LinkRequestState::Approved { user_id } => Some(user_id),
            LinkRequestState::Pending | LinkRequestState::Denied => None,
        };

        Self {
            creation_date: status.created_at,
            status: kind,
            user_id,
        }
    }
}

/// A QR code image for a link request, as served by the service.
///
/// The bytes are left encoded; decoding and rendering them is up to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct QrCodeImage {
    /// The encoded image.
    pub bytes: Vec<u8>,
    /// The `Content-Type` the service reported for the image, if any.
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap()
    }

    #[test]
    fn test_approved_status_round_trip() {
        let status = LinkRequestStatus {
            created_at: created_at(),
            state: LinkRequestState::Approved {
                user_id: "u1".to_string(),
            },
        };

        let encoded = serde_json::to_value(&status).unwrap();
        assert_eq!(encoded["status"], "approved");
        assert_eq!(encoded["user_id"], "u1");

        let decoded: LinkRequestStatus = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, status);
        assert_eq!(decoded.approved_user_id(), Some("u1"));
    }

    #[test]
    fn test_pending_status_omits_user_id() {
        let status = LinkRequestStatus {
            created_at: created_at(),
            state: LinkRequestState::Pending,
        };

        let encoded = serde_json::to_value(&status).unwrap();
        assert!(encoded.get("user_id").is_none());

        let decoded: LinkRequestStatus = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.status(), LinkStatusKind::Pending);
        assert_eq!(decoded.approved_user_id(), None);
    }

    #[test]
    fn test_approved_without_user_id_is_rejected() {
        let wire = json!({
            "creation_date": "2024-03-09T18:30:00Z",
            "status": "approved",
        });
        assert!(serde_json::from_value::<LinkRequestStatus>(wire).is_err());
    }

    #[test]
    fn test_denied_ignores_stray_user_id() {
        let wire = json!({
            "creation_date": "2024-03-09T18:30:00Z",
            "status": "denied",
            "user_id": "u1",
        });
        let decoded: LinkRequestStatus = serde_json::from_value(wire).unwrap();
        assert_eq!(decoded.state, LinkRequestState::Denied);
        assert_eq!(decoded.approved_user_id(), None);
    }

    #[test]
    fn test_status_kind_strings() {
        assert_eq!(LinkStatusKind::Approved.to_string(), "approved");
        assert_eq!(
            LinkStatusKind::from_str("denied").unwrap(),
            LinkStatusKind::Denied
        );
        assert!(LinkStatusKind::from_str("expired").is_err());
    }
}
