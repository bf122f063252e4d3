//! Client configuration.
//!
//! Configuration is normally read from the environment with [`Config::from_env`]
//! or from a TOML file with [`Config::load`].
//!
//! ## Example Configuration
//!
//! ```toml
//! base_uri = "https://ifs.example.com/main/ifsapplications/projection/v1"
//! client_id = "IFS_connect"
//! client_secret = "..."
//! token_endpoint = "https://ifs.example.com/auth/realms/main/protocol/openid-connect/token"
//! timeout = 60
//! token_ttl = 3600
//!
//! [headers]
//! Accept = "application/json"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Cache key used for the bearer token when none is configured.
pub const DEFAULT_TOKEN_CACHE_KEY: &str = "ifs_oauth_token";

/// Seconds before expiry at which a token stops being handed out.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;

const ENV_BASE_URI: &str = "IFS_BASE_URI";
const ENV_CLIENT_ID: &str = "IFS_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "IFS_CLIENT_SECRET";
const ENV_TOKEN_ENDPOINT: &str = "IFS_TOKEN_ENDPOINT";
const ENV_TIMEOUT: &str = "IFS_TIMEOUT";
const ENV_TOKEN_TIMEOUT: &str = "IFS_TOKEN_TIMEOUT";
const ENV_TOKEN_TTL: &str = "IFS_TOKEN_TTL";
const ENV_TOKEN_CACHE_KEY: &str = "IFS_TOKEN_CACHE_KEY";

/// OAuth2 client-credentials used to obtain bearer tokens.
///
/// Immutable once built from a [`Config`]. The secret is wrapped in a
/// [`SecretString`] and is redacted from `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: SecretString,
    /// Absolute URL of the token endpoint.
    pub token_endpoint: String,
}

impl Credentials {
    /// Creates a new set of credentials.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into().into()),
            token_endpoint: token_endpoint.into(),
        }
    }

    /// Form parameters for a client-credentials grant.
    #[must_use]
    pub fn grant_form(&self) -> [(&'static str, &str); 3] {
        [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .finish()
    }
}

/// Configuration for an IFS API client.
///
/// Secrets are stored as [`SecretString`] and are never serialized.
///
/// # Examples
///
/// ```
/// use ifs_common::Config;
///
/// let config = Config::new("https://ifs.example.com/projection/v1")
///     .with_credentials("client", "secret", "https://ifs.example.com/token")
///     .with_timeout(30);
///
/// assert_eq!(config.timeout_seconds, 30);
/// assert_eq!(config.token_ttl_seconds, 3600);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URI every request path is joined onto.
    pub base_uri: String,
    /// OAuth client identifier.
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret.
    #[serde(skip_serializing, default)]
    pub client_secret: Option<SecretString>,
    /// Token endpoint for the client-credentials grant.
    #[serde(default)]
    pub token_endpoint: String,
    /// Timeout for API requests in seconds.
    #[serde(rename = "timeout", default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Timeout for token requests in seconds.
    #[serde(rename = "token_timeout", default = "default_token_timeout")]
    pub token_timeout_seconds: u64,
    /// Lifetime assumed for a token when the endpoint omits `expires_in`.
    #[serde(rename = "token_ttl", default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
    /// Key under which the token is mirrored in an external cache.
    #[serde(default = "default_token_cache_key")]
    pub token_cache_key: String,
    /// Headers sent with every API request.
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
}

const fn default_timeout() -> u64 {
    60
}

const fn default_token_timeout() -> u64 {
    50
}

const fn default_token_ttl() -> u64 {
    3600 // 1 hour
}

fn default_token_cache_key() -> String {
    DEFAULT_TOKEN_CACHE_KEY.to_string()
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Accept".to_string(), "application/json".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            client_id: String::new(),
            client_secret: None,
            token_endpoint: String::new(),
            timeout_seconds: default_timeout(),
            token_timeout_seconds: default_token_timeout(),
            token_ttl_seconds: default_token_ttl(),
            token_cache_key: default_token_cache_key(),
            headers: default_headers(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_uri", &self.base_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_endpoint", &self.token_endpoint)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("token_timeout_seconds", &self.token_timeout_seconds)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("token_cache_key", &self.token_cache_key)
            .field("headers", &self.headers)
            .finish()
    }
}

impl Config {
    /// Creates a configuration for the given base URI with default settings.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            ..Default::default()
        }
    }

    /// Reads configuration from `IFS_*` environment variables.
    ///
    /// `IFS_BASE_URI`, `IFS_CLIENT_ID`, `IFS_CLIENT_SECRET` and
    /// `IFS_TOKEN_ENDPOINT` are required. `IFS_TIMEOUT`, `IFS_TOKEN_TIMEOUT`,
    /// `IFS_TOKEN_TTL` and `IFS_TOKEN_CACHE_KEY` are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// [`Config::from_env`] uses this with the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or a numeric value does
    /// not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("environment variable {key} is not set"))
        };
        let number = |key: &str, default: u64| -> Result<u64> {
            lookup(key).map_or(Ok(default), |raw| {
                raw.trim()
                    .parse()
                    .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))
            })
        };

        let mut config = Self::new(required(ENV_BASE_URI)?).with_credentials(
            required(ENV_CLIENT_ID)?,
            required(ENV_CLIENT_SECRET)?,
            required(ENV_TOKEN_ENDPOINT)?,
        );
        config.timeout_seconds = number(ENV_TIMEOUT, default_timeout())?;
        config.token_timeout_seconds = number(ENV_TOKEN_TIMEOUT, default_token_timeout())?;
        config.token_ttl_seconds = number(ENV_TOKEN_TTL, default_token_ttl())?;
        if let Some(key) = lookup(ENV_TOKEN_CACHE_KEY).filter(|k| !k.is_empty()) {
            config.token_cache_key = key;
        }

        Ok(config)
    }

    /// Parses configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or lacks `base_uri`.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse IFS configuration")
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    /// Sets the OAuth client credentials and token endpoint.
    #[must_use]
    pub fn with_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = Some(SecretString::new(client_secret.into().into()));
        self.token_endpoint = token_endpoint.into();
        self
    }

    /// Sets the API request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Sets the token request timeout.
    #[must_use]
    pub const fn with_token_timeout(mut self, token_timeout_seconds: u64) -> Self {
        self.token_timeout_seconds = token_timeout_seconds;
        self
    }

    /// Sets the fallback token lifetime.
    #[must_use]
    pub const fn with_token_ttl(mut self, token_ttl_seconds: u64) -> Self {
        self.token_ttl_seconds = token_ttl_seconds;
        self
    }

    /// Sets the external cache key for the token.
    #[must_use]
    pub fn with_token_cache_key(mut self, key: impl Into<String>) -> Self {
        self.token_cache_key = key.into();
        self
    }

    /// Adds or replaces a default request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// API request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Token request timeout as a [`Duration`].
    #[must_use]
    pub const fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout_seconds)
    }

    /// Extracts the immutable credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the client secret is missing.
    pub fn credentials(&self) -> Result<Credentials> {
        let secret = self
            .client_secret
            .as_ref()
            .context("client_secret is required")?;
        Ok(Credentials {
            client_id: self.client_id.clone(),
            client_secret: secret.clone(),
            token_endpoint: self.token_endpoint.clone(),
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `base_uri` or `token_endpoint` is empty or not an absolute URL
    /// - `client_id` or `client_secret` is empty
    /// - either timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.base_uri.trim().is_empty() {
            bail!("base_uri is required");
        }
        url::Url::parse(&self.base_uri)
            .with_context(|| format!("base_uri is not a valid URL: {}", self.base_uri))?;

        if self.token_endpoint.trim().is_empty() {
            bail!("token_endpoint is required");
        }
        url::Url::parse(&self.token_endpoint).with_context(|| {
            format!("token_endpoint is not a valid URL: {}", self.token_endpoint)
        })?;

        if self.client_id.trim().is_empty() {
            bail!("client_id is required");
        }
        if self
            .client_secret
            .as_ref()
            .is_none_or(|s| s.expose_secret().is_empty())
        {
            bail!("client_secret is required");
        }

        if self.timeout_seconds == 0 {
            bail!("timeout must be greater than zero");
        }
        if self.token_timeout_seconds == 0 {
            bail!("token_timeout must be greater than zero");
        }

        Ok(())
    }

    /// Joins `path` onto the base URI with exactly one `/` between them.
    ///
    /// ```
    /// use ifs_common::Config;
    ///
    /// let config = Config::new("https://ifs.example.com/v1/");
    /// assert_eq!(
    ///     config.endpoint_url("/CustomersHandling.svc/CustomerInfoSet"),
    ///     "https://ifs.example.com/v1/CustomersHandling.svc/CustomerInfoSet"
    /// );
    /// ```
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_uri.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::collections::HashMap;

    use super::*;

    fn valid_config() -> Config {
        Config::new("https://ifs.example.com/projection/v1").with_credentials(
            "client",
            "secret",
            "https://ifs.example.com/token",
        )
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.token_timeout_seconds, 50);
        assert_eq!(config.token_ttl_seconds, 3600);
        assert_eq!(config.token_cache_key, "ifs_oauth_token");
        assert_eq!(config.headers.get("Accept").unwrap(), "application/json");
        assert_eq!(
            config.headers.get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_endpoint_url_single_slash() {
        let config = Config::new("https://ifs.example.com/v1///");
        assert_eq!(
            config.endpoint_url("//Set"),
            "https://ifs.example.com/v1/Set"
        );
        assert_eq!(config.endpoint_url("Set"), "https://ifs.example.com/v1/Set");
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(Config::new("").validate().is_err());
        assert!(Config::new("not a url").validate().is_err());
        assert!(
            Config::new("https://ifs.example.com")
                .validate()
                .unwrap_err()
                .to_string()
                .contains("token_endpoint")
        );
        assert!(valid_config().with_timeout(0).validate().is_err());
        assert!(valid_config().with_token_timeout(0).validate().is_err());

        let mut no_secret = valid_config();
        no_secret.client_secret = None;
        assert!(no_secret.validate().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("IFS_BASE_URI", "https://ifs.example.com/v1"),
            ("IFS_CLIENT_ID", "IFS_connect"),
            ("IFS_CLIENT_SECRET", "s3cret"),
            ("IFS_TOKEN_ENDPOINT", "https://ifs.example.com/token"),
            ("IFS_TIMEOUT", "30"),
        ]);
        let config = Config::from_lookup(|k| vars.get(k).map(ToString::to_string)).unwrap();

        assert_eq!(config.base_uri, "https://ifs.example.com/v1");
        assert_eq!(config.client_id, "IFS_connect");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.token_timeout_seconds, 50);
        assert_eq!(config.token_cache_key, DEFAULT_TOKEN_CACHE_KEY);
        assert_eq!(
            config.credentials().unwrap().client_secret.expose_secret(),
            "s3cret"
        );
    }

    #[test]
    fn test_from_lookup_missing_and_malformed() {
        let err = Config::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("IFS_BASE_URI"));

        let vars: HashMap<&str, &str> = HashMap::from([
            ("IFS_BASE_URI", "https://ifs.example.com/v1"),
            ("IFS_CLIENT_ID", "id"),
            ("IFS_CLIENT_SECRET", "secret"),
            ("IFS_TOKEN_ENDPOINT", "https://ifs.example.com/token"),
            ("IFS_TOKEN_TTL", "one hour"),
        ]);
        let err = Config::from_lookup(|k| vars.get(k).map(ToString::to_string)).unwrap_err();
        assert!(err.to_string().contains("IFS_TOKEN_TTL"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            base_uri = "https://ifs.example.com/v1"
            client_id = "IFS_connect"
            client_secret = "secret"
            token_endpoint = "https://ifs.example.com/token"
            timeout = 5

            [headers]
            Accept = "application/json"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.token_ttl_seconds, 3600);
        assert_eq!(config.headers.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_not_serialized_or_debugged() {
        let config = valid_config();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret\""));
        assert!(!json.contains("client_secret"));

        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("\"secret\""));

        let creds = format!("{:?}", config.credentials().unwrap());
        assert!(creds.contains("[REDACTED]"));
    }

    #[test]
    fn test_grant_form() {
        let creds = Credentials::new("id", "secret", "https://ifs.example.com/token");
        let form = creds.grant_form();
        assert_eq!(form[0], ("grant_type", "client_credentials"));
        assert_eq!(form[1], ("client_id", "id"));
        assert_eq!(form[2], ("client_secret", "secret"));
    }
}
