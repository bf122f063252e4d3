//! Uniform result envelope and response normalization.
//!
//! Every response from the IFS API, successful or not, is mapped onto a
//! [`ResultEnvelope`] by [`normalize`]. The mapping is a pure function of the
//! status code, headers and parsed body.
//!
//! ```
//! use std::collections::BTreeMap;
//! use ifs_common::envelope::normalize;
//! use serde_json::json;
//!
//! let envelope = normalize(
//!     json!({"value": [{"a": 1}], "message": "ok"}),
//!     BTreeMap::new(),
//!     200,
//! );
//!
//! assert!(envelope.is_success());
//! assert_eq!(envelope.data(), &json!([{"a": 1}]));
//! assert_eq!(envelope.message(), Some("ok"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;

/// Normalized view of a single API response.
///
/// Immutable once constructed. `success` is derived from the status code
/// alone when built through [`normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, TypedBuilder)]
pub struct ResultEnvelope {
    success: bool,
    #[builder(default)]
    data: Value,
    #[builder(default, setter(strip_option, into))]
    message: Option<String>,
    #[builder(default)]
    meta: Map<String, Value>,
    /// Response headers keyed by lowercase name.
    #[serde(skip)]
    #[builder(default)]
    headers: BTreeMap<String, String>,
    status_code: u16,
}

impl ResultEnvelope {
    /// Whether the status code was in `200..300`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// The unwrapped payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Consumes the envelope and returns the payload.
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Deserializes the payload into a typed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data)
    }

    /// The `message` field of the response body, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The `meta` object of the response body, or an empty map.
    #[must_use]
    pub const fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    /// Looks up a single metadata value.
    #[must_use]
    pub fn meta_value(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// All response headers, keyed by lowercase name.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The HTTP status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Pagination figures from the `meta` object.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::from_meta(&self.meta)
    }
}

impl fmt::Display for ResultEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "ResultEnvelope(status={})", self.status_code),
        }
    }
}

/// Returns true for status codes in `200..300`.
#[must_use]
pub const fn is_success_status(status_code: u16) -> bool {
    status_code >= 200 && status_code < 300
}

/// Maps a raw response onto a [`ResultEnvelope`].
///
/// - `success` is `200 <= status_code < 300`
/// - `message` is `body.message` when it is a string
/// - `data` is `body.value` when present, otherwise the whole body
/// - `meta` is `body.meta` when it is an object, otherwise empty
///
/// Header names are lowercased.
#[must_use]
pub fn normalize(body: Value, headers: BTreeMap<String, String>, status_code: u16) -> ResultEnvelope {
    let headers = headers
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect();

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    let meta = match body.get("meta") {
        Some(Value::Object(meta)) => meta.clone(),
        _ => Map::new(),
    };

    let data = match body {
        Value::Object(mut object) if object.contains_key("value") => {
            object.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    };

    ResultEnvelope {
        success: is_success_status(status_code),
        data,
        message,
        meta,
        headers,
        status_code,
    }
}

/// Pagination figures reported in a response's `meta` object.
///
/// Absent fields default to `0`, except `current_page` and `last_page`
/// which default to `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Total number of records.
    pub total: u64,
    /// Records per page.
    pub per_page: u64,
    /// Current page, starting at 1.
    pub current_page: u64,
    /// Last page, starting at 1.
    pub last_page: u64,
    /// Index of the first record on this page.
    pub from: u64,
    /// Index of the last record on this page.
    pub to: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total: 0,
            per_page: 0,
            current_page: 1,
            last_page: 1,
            from: 0,
            to: 0,
        }
    }
}

impl Pagination {
    /// Extracts pagination from a full response body's `meta` object.
    ///
    /// ```
    /// use ifs_common::Pagination;
    /// use serde_json::json;
    ///
    /// let page = Pagination::from_body(&json!({
    ///     "meta": {"total": 50, "per_page": 10, "current_page": 2}
    /// }));
    /// assert_eq!(page.total, 50);
    /// assert_eq!(page.last_page, 1);
    /// assert_eq!(page.to, 0);
    /// ```
    #[must_use]
    pub fn from_body(body: &Value) -> Self {
        match body.get("meta") {
            Some(Value::Object(meta)) => Self::from_meta(meta),
            _ => Self::default(),
        }
    }

    /// Extracts pagination from a `meta` object.
    #[must_use]
    pub fn from_meta(meta: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        let field = |key: &str, default: u64| meta.get(key).and_then(as_count).unwrap_or(default);

        Self {
            total: field("total", defaults.total),
            per_page: field("per_page", defaults.per_page),
            current_page: field("current_page", defaults.current_page),
            last_page: field("last_page", defaults.last_page),
            from: field("from", defaults.from),
            to: field("to", defaults.to),
        }
    }
}

// Counts may arrive as numbers or numeric strings.
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
