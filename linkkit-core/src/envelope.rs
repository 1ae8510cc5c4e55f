//! Response envelopes used by the Fitcoin service.
//!
//! Every reply carries a `message`. Successful replies additionally carry the
//! payload under `data`:
//!
//! ```json
//! { "message": "Link request created", "data": "6f1c..." }
//! { "message": "Invalid access token" }
//! ```

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Message reported when a failed response carries no readable message.
pub const FALLBACK_ERROR_MESSAGE: &str = "No error message";

/// The only status code the service uses for success.
pub const SUCCESS_STATUS: u16 = 200;

/// A successful reply from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Human readable description of the outcome.
    pub message: String,
    /// The payload of the reply.
    pub data: T,
}

/// A failed reply from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEnvelope {
    /// Why the request failed.
    pub message: String,
}

#[derive(Deserialize)]
struct LenientFailure {
    message: Option<String>,
}

#[derive(Deserialize)]
struct LenientSuccess<T> {
    data: Option<T>,
}

/// Decodes the `data` of a success envelope, if the body holds one.
///
/// Returns `None` for malformed bodies and for envelopes whose `data` is
/// absent, `null`, or of the wrong shape.
#[must_use]
pub fn decode_data<T: DeserializeOwned>(body: &str) -> Option<T> {
    serde_json::from_str::<LenientSuccess<T>>(body)
        .ok()
        .and_then(|envelope| envelope.data)
}

/// Extracts the message of a failure envelope.
///
/// Never fails: a malformed body or a missing message yields
/// [`FALLBACK_ERROR_MESSAGE`].
#[must_use]
pub fn decode_failure_message(body: &str) -> String {
    serde_json::from_str::<LenientFailure>(body)
        .ok()
        .and_then(|failure| failure.message)
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}

/// Classifies a response by status and decodes the matching envelope.
///
/// A `200` yields the decoded `data`; any other status yields the failure
/// message. A `200` whose body does not hold a decodable `data` is reported
/// the same way as a malformed failure body.
///
/// # Errors
/// Returns the message to surface to the caller when the response is not a
/// decodable success.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, String> {
    if status == SUCCESS_STATUS {
        decode_data(body).ok_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
    } else {
        Err(decode_failure_message(body))
    }
}
