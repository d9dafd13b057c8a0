//! The response envelope shared by every API response.
//!
//! # Design
//! Doppler answers with a JSON object whose domain fields sit next to
//! `success`, `messages` and `page`. Each typed response flattens an
//! [`ApiResponse`] to pick those up, and the backend binds the HTTP metadata
//! (status, headers, request id, rate limit) into the same envelope after
//! decoding. A server that reports messages is failing, whatever the status.

use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Rate-limit state reported with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per period.
    pub limit: i64,
    /// Requests left in the current period.
    pub remaining: i64,
    /// When the current period ends.
    pub reset: DateTime<Utc>,
}

impl RateLimit {
    /// Read the three rate-limit headers. Returns `None` unless all three are
    /// present and well-formed.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let limit = header_number(headers, HEADER_RATE_LIMIT_LIMIT)?;
        let remaining = header_number(headers, HEADER_RATE_LIMIT_REMAINING)?;
        let reset = header_number(headers, HEADER_RATE_LIMIT_RESET)?;
        Some(Self {
            limit,
            remaining,
            reset: DateTime::from_timestamp(reset, 0)?,
        })
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Deserialize `null` as the type's default, for list and map fields.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Metadata attached to every API response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiResponse {
    /// Status line, e.g. `200 OK`.
    #[serde(skip)]
    pub status: String,
    #[serde(skip)]
    pub status_code: u16,
    #[serde(skip)]
    pub headers: HeaderMap,
    /// Identifies the request in Doppler's logs.
    #[serde(skip)]
    pub request_id: Option<String>,
    #[serde(skip)]
    pub rate_limit: Option<RateLimit>,

    /// Set by Doppler in the response body.
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<String>,
}

impl ApiResponse {
    /// Copy status and header metadata from an HTTP response.
    pub fn bind<B>(&mut self, response: Option<&http::Response<B>>) {
        let Some(response) = response else {
            return;
        };

        let status = response.status();
        self.status = match status.canonical_reason() {
            Some(reason) => format!("{} {reason}", status.as_str()),
            None => status.as_str().to_string(),
        };
        self.status_code = status.as_u16();
        self.headers = response.headers().clone();
        self.request_id = response
            .headers()
            .get(HEADER_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.rate_limit = RateLimit::from_headers(response.headers());
    }

    /// Whether the server reported a failure through its message list.
    pub fn is_error(&self) -> bool {
        !self.messages.is_empty()
    }

    /// The server's messages joined into one line.
    pub fn message(&self) -> String {
        self.messages.join(": ")
    }
}

/// A typed response body carrying an [`ApiResponse`].
pub trait Response: DeserializeOwned + Default {
    fn envelope(&self) -> &ApiResponse;

    fn envelope_mut(&mut self) -> &mut ApiResponse;

    fn into_envelope(self) -> ApiResponse;
}

impl Response for ApiResponse {
    fn envelope(&self) -> &ApiResponse {
        self
    }

    fn envelope_mut(&mut self) -> &mut ApiResponse {
        self
    }

    fn into_envelope(self) -> ApiResponse {
        self
    }
}

/// Implement [`Response`] for types holding the envelope in an `api` field.
macro_rules! impl_response {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::response::Response for $ty {
                fn envelope(&self) -> &$crate::response::ApiResponse {
                    &self.api
                }

                fn envelope_mut(&mut self) -> &mut $crate::response::ApiResponse {
                    &mut self.api
                }

                fn into_envelope(self) -> $crate::response::ApiResponse {
                    self.api
                }
            }
        )*
    };
}

pub(crate) use impl_response;

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use proptest::prelude::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn rate_limit_from_complete_headers() {
        let map = headers(&[
            ("X-RateLimit-Limit", "100"),
            ("X-RateLimit-Remaining", " 50 "),
            ("X-RateLimit-Reset", "1234567890"),
        ]);
        let rate_limit = RateLimit::from_headers(&map).unwrap();
        assert_eq!(rate_limit.limit, 100);
        assert_eq!(rate_limit.remaining, 50);
        assert_eq!(rate_limit.reset.timestamp(), 1_234_567_890);
        assert_eq!(rate_limit.reset.to_rfc3339(), "2009-02-13T23:31:30+00:00");
    }

    #[test]
    fn rate_limit_is_all_or_nothing() {
        let missing = headers(&[("X-RateLimit-Limit", "100"), ("X-RateLimit-Remaining", "50")]);
        assert!(RateLimit::from_headers(&missing).is_none());

        let malformed = headers(&[
            ("X-RateLimit-Limit", "100"),
            ("X-RateLimit-Remaining", "fifty"),
            ("X-RateLimit-Reset", "1234567890"),
        ]);
        assert!(RateLimit::from_headers(&malformed).is_none());

        let bad_reset = headers(&[
            ("X-RateLimit-Limit", "100"),
            ("X-RateLimit-Remaining", "50"),
            ("X-RateLimit-Reset", "soon"),
        ]);
        assert!(RateLimit::from_headers(&bad_reset).is_none());
    }

    #[test]
    fn bind_copies_http_metadata() {
        let response = http::Response::builder()
            .status(200)
            .header("X-Request-Id", "req-123")
            .header("X-RateLimit-Limit", "240")
            .header("X-RateLimit-Remaining", "239")
            .header("X-RateLimit-Reset", "1700000000")
            .body(())
            .unwrap();

        let mut envelope = ApiResponse::default();
        envelope.bind(Some(&response));
        assert_eq!(envelope.status, "200 OK");
        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.request_id.as_deref(), Some("req-123"));
        assert_eq!(envelope.rate_limit.map(|r| r.remaining), Some(239));
        assert!(envelope.headers.contains_key("x-request-id"));
    }

    #[test]
    fn bind_none_is_noop() {
        let mut envelope = ApiResponse::default();
        envelope.bind::<()>(None);
        assert_eq!(envelope, ApiResponse::default());
    }

    #[test]
    fn messages_make_an_error_even_on_success() {
        let mut envelope: ApiResponse =
            serde_json::from_str(r#"{"success":false,"messages":["bad config","try again"]}"#).unwrap();
        envelope.status_code = 200;
        assert!(envelope.is_error());
        assert_eq!(envelope.message(), "bad config: try again");
        assert_eq!(envelope.success, Some(false));
    }

    #[test]
    fn null_messages_decode_as_empty() {
        let envelope: ApiResponse = serde_json::from_str(r#"{"messages":null,"page":3}"#).unwrap();
        assert!(!envelope.is_error());
        assert_eq!(envelope.page, Some(3));
    }

    const RATE_LIMIT_HEADERS: [&str; 3] = [
        HEADER_RATE_LIMIT_LIMIT,
        HEADER_RATE_LIMIT_REMAINING,
        HEADER_RATE_LIMIT_RESET,
    ];

    proptest! {
        #[test]
        fn rate_limit_needs_all_three_headers(
            limit in any::<i64>(),
            remaining in any::<i64>(),
            reset in 0i64..=4_102_444_800,
            present in prop::array::uniform3(any::<bool>()),
        ) {
            let mut map = HeaderMap::new();
            for ((name, value), present) in RATE_LIMIT_HEADERS.iter().zip([limit, remaining, reset]).zip(present) {
                if present {
                    map.insert(*name, HeaderValue::from(value));
                }
            }

            let parsed = RateLimit::from_headers(&map);
            prop_assert_eq!(parsed.is_some(), present.iter().all(|p| *p));
            if let Some(rate_limit) = parsed {
                prop_assert_eq!(rate_limit.limit, limit);
                prop_assert_eq!(rate_limit.remaining, remaining);
                prop_assert_eq!(rate_limit.reset.timestamp(), reset);
            }
        }

        #[test]
        fn rate_limit_rejects_non_numeric_values(garbage in "[a-zA-Z ]{1,12}", slot in 0usize..3) {
            let mut map = HeaderMap::new();
            for (index, name) in RATE_LIMIT_HEADERS.iter().enumerate() {
                let value = if index == slot { garbage.as_str() } else { "1" };
                map.insert(*name, value.parse::<HeaderValue>().unwrap());
            }
            prop_assert!(RateLimit::from_headers(&map).is_none());
        }
    }
}
