use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, error};
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;

use ifs_common::{Config, ResultEnvelope, normalize};

use crate::clock::{Clock, SystemClock};
use crate::error::{ClientError, GENERIC_FAILURE_MESSAGE};
use crate::token::{TokenCache, TokenManager};

/// Per-call request options.
///
/// # Examples
///
/// ```
/// use ifs_client::RequestOptions;
/// use serde_json::json;
///
/// let options = RequestOptions::builder()
///     .query(vec![("$top".to_string(), "10".to_string())])
///     .body(json!({"Name": "Acme"}))
///     .build();
/// assert_eq!(options.query.len(), 1);
/// ```
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct RequestOptions {
    /// Query parameters, encoded as `k=v` pairs joined by `&`.
    #[builder(default)]
    pub query: Vec<(String, String)>,
    /// JSON request body.
    #[builder(default, setter(strip_option))]
    pub body: Option<Value>,
    /// Extra headers for this call only, overriding the defaults.
    #[builder(default)]
    pub headers: BTreeMap<String, String>,
}

/// Authenticated client for the IFS REST API.
///
/// Each call obtains a bearer token from the shared [`TokenManager`], sends
/// exactly one HTTP request and normalizes the response into a
/// [`ResultEnvelope`]. Cloning is cheap; clones share the token.
///
/// # Examples
///
/// ```no_run
/// use ifs_client::IfsClient;
/// use ifs_common::Config;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = IfsClient::new(Config::from_env()?)?;
/// let envelope = client
///     .get("/CustomersHandling.svc/CustomerInfoSet", &[("$top", "5")])
///     .await?;
/// println!("{}", envelope.data());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IfsClient {
    http: reqwest::Client,
    tokens: Arc<TokenManager>,
    config: Arc<Config>,
    default_headers: HeaderMap,
}

impl std::fmt::Debug for IfsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IfsClient")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

/// Builder for [`IfsClient`] with an optional external token cache and clock.
pub struct IfsClientBuilder {
    config: Config,
    cache: Option<Arc<dyn TokenCache>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for IfsClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IfsClientBuilder")
            .field("config", &self.config)
            .field("has_external_cache", &self.cache.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}

impl IfsClientBuilder {
    /// Mirrors tokens into `cache` so other clients and processes can reuse
    /// them.
    #[must_use]
    pub fn with_token_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Uses `clock` for token expiry decisions.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validates the configuration and builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConfigurationError`] if the configuration is
    /// invalid, a default header is malformed, or an HTTP client cannot be
    /// built.
    pub fn build(self) -> Result<IfsClient, ClientError> {
        self.config
            .validate()
            .map_err(|e| ClientError::ConfigurationError(format!("{e:#}")))?;

        let default_headers = header_map(&self.config.headers)?;

        let http = reqwest::Client::builder()
            .timeout(self.config.timeout())
            .build()
            .map_err(|e| {
                ClientError::ConfigurationError(format!("Failed to build HTTP client: {e}"))
            })?;

        let tokens = TokenManager::new(&self.config, self.cache, self.clock)?;

        Ok(IfsClient {
            http,
            tokens: Arc::new(tokens),
            config: Arc::new(self.config),
            default_headers,
        })
    }
}

impl IfsClient {
    /// Creates a client without an external token cache.
    ///
    /// # Errors
    ///
    /// See [`IfsClientBuilder::build`].
    pub fn new(config: Config) -> Result<Self, ClientError> {
        Self::builder(config).build()
    }

    /// Starts building a client from `config`.
    #[must_use]
    pub fn builder(config: Config) -> IfsClientBuilder {
        IfsClientBuilder {
            config,
            cache: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared token manager.
    #[must_use]
    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    /// Sends one authenticated request and normalizes the response.
    ///
    /// `path` is joined onto the base URI with a single `/`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::TokenAcquisitionFailed`] if no token could be
    ///   obtained; no API request is sent in that case
    /// - [`ClientError::TransportFailure`] if no response was received
    /// - [`ClientError::RequestFailed`] if the status is outside `200..300`
    /// - [`ClientError::SerializationError`] if the body cannot be encoded
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<ResultEnvelope, ClientError> {
        let token = self.tokens.token().await?;
        let url = self.config.endpoint_url(path);

        debug!("{method} {url}");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .headers(self.default_headers.clone())
            .bearer_auth(token);

        if !options.headers.is_empty() {
            builder = builder.headers(header_map(&options.headers)?);
        }
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            let has_content_type = self.default_headers.contains_key(CONTENT_TYPE)
                || options
                    .headers
                    .keys()
                    .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
            if !has_content_type {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let transport_error = |e: reqwest::Error| {
            error!("{method} {url} failed: {e}");
            ClientError::TransportFailure {
                message: e.to_string(),
                source: e,
            }
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let text = response.text().await.map_err(transport_error)?;

        let (body, raw) = parse_body(&text);
        let envelope = normalize(body, headers, status);

        if envelope.is_success() {
            debug!("{method} {url} -> {status}");
            return Ok(envelope);
        }

        let message = envelope
            .message()
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
            .to_string();
        error!("{method} {url} returned status {status}: {message}");

        let mut context = Map::new();
        context.insert("response".to_string(), raw);
        Err(ClientError::RequestFailed {
            message,
            status,
            context,
        })
    }

    /// `GET` with query parameters.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ResultEnvelope, ClientError> {
        let query = query
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.request(
            Method::GET,
            path,
            RequestOptions::builder().query(query).build(),
        )
        .await
    }

    /// `POST` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ResultEnvelope, ClientError> {
        self.send_json(Method::POST, path, body).await
    }

    /// `PUT` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ResultEnvelope, ClientError> {
        self.send_json(Method::PUT, path, body).await
    }

    /// `PATCH` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ResultEnvelope, ClientError> {
        self.send_json(Method::PATCH, path, body).await
    }

    /// `DELETE` without a body.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn delete(&self, path: &str) -> Result<ResultEnvelope, ClientError> {
        self.request(Method::DELETE, path, RequestOptions::default())
            .await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ResultEnvelope, ClientError> {
        let body = serde_json::to_value(body)?;
        self.request(method, path, RequestOptions::builder().body(body).build())
            .await
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::ConfigurationError(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ClientError::ConfigurationError(format!("Invalid value for header '{name}': {e}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

// Repeated headers are joined with ", ". Non-UTF-8 values are dropped.
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}

/// Returns the body to normalize and the raw body to report on failure.
///
/// Empty and non-JSON bodies normalize as `{}`; the raw text is kept.
fn parse_body(text: &str) -> (Value, Value) {
    if text.trim().is_empty() {
        return (Value::Object(Map::new()), Value::Null);
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => (value.clone(), value),
        Err(e) => {
            debug!("Response body is not JSON: {e}");
            (Value::Object(Map::new()), Value::String(text.to_string()))
        }
    }
}
