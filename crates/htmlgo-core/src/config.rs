//! Client configuration: TOML file, then `HTMLGO_*` environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::environment::{Environment, HostIdentity, resolve};
use crate::error::ConfigError;
use crate::prefix::PrefixConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit conversion URL. Overrides environment-based resolution.
    pub endpoint: Option<String>,
    pub local_endpoint: String,
    pub production_endpoint: String,
    /// Path of the conversion handler on the production deployment.
    pub api_path: String,
    /// Path of the conversion handler on the local dev server.
    pub local_path: String,
    /// `prod` or `local`. Anything else is ignored with a warning.
    pub environment: Option<String>,
    pub prefixes: PrefixConfig,
    pub children_mode: bool,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            local_endpoint: Self::DEFAULT_LOCAL_ENDPOINT.into(),
            production_endpoint: Self::DEFAULT_PRODUCTION_ENDPOINT.into(),
            api_path: "/api/convert".into(),
            local_path: "/convert".into(),
            environment: None,
            prefixes: PrefixConfig::default(),
            children_mode: false,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_LOCAL_ENDPOINT: &'static str = "http://localhost:8080";
    pub const DEFAULT_PRODUCTION_ENDPOINT: &'static str = "https://htmlgo-convert.vercel.app";

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay variables from the process environment.
    ///
    /// Recognised variables:
    /// - `HTMLGO_ENDPOINT`: explicit conversion URL
    /// - `HTMLGO_ENV`: `prod` or `local`
    /// - `HTMLGO_PACKAGE_PREFIX`, `HTMLGO_VUETIFY_PREFIX`, `HTMLGO_VUETIFY_X_PREFIX`
    /// - `HTMLGO_CHILDREN_MODE`: `true`/`false`/`1`/`0`
    /// - `HTMLGO_TIMEOUT_SECS`: request timeout in seconds
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay variables from `lookup`. Unset and empty variables are ignored.
    pub fn apply_vars(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(endpoint) = var("HTMLGO_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(environment) = var("HTMLGO_ENV") {
            self.environment = Some(environment);
        }
        if let Some(prefix) = var("HTMLGO_PACKAGE_PREFIX") {
            self.prefixes.package_prefix = prefix.into();
        }
        if let Some(prefix) = var("HTMLGO_VUETIFY_PREFIX") {
            self.prefixes.component_prefix_primary = prefix.into();
        }
        if let Some(prefix) = var("HTMLGO_VUETIFY_X_PREFIX") {
            self.prefixes.component_prefix_extended = prefix.into();
        }
        if let Some(value) = var("HTMLGO_CHILDREN_MODE") {
            self.children_mode = parse_flag(&value).ok_or(ConfigError::InvalidValue {
                var: "HTMLGO_CHILDREN_MODE",
                value,
            })?;
        }
        if let Some(value) = var("HTMLGO_TIMEOUT_SECS") {
            self.timeout_secs = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "HTMLGO_TIMEOUT_SECS",
                value,
            })?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Host identity to classify when the caller has none: the explicit
    /// endpoint's host, or `localhost`.
    pub fn default_host(&self) -> HostIdentity {
        self.endpoint
            .as_deref()
            .and_then(|endpoint| Url::parse(endpoint).ok())
            .map(|url| HostIdentity::from_url(&url))
            .filter(|host| !host.hostname.is_empty())
            .unwrap_or_else(|| HostIdentity::new("localhost", None))
    }

    /// Resolve the environment for `host`, honouring the configured override.
    ///
    /// An unrecognised override falls through to host classification.
    pub fn environment(&self, host: &HostIdentity) -> Environment {
        let explicit = self.environment.as_deref().and_then(|value| {
            value
                .parse::<Environment>()
                .inspect_err(|_| {
                    tracing::warn!(value, "unknown environment override, classifying host instead")
                })
                .ok()
        });
        resolve(explicit.map(Environment::as_str), host)
    }

    /// URL conversions are POSTed to in `environment`.
    ///
    /// An explicit endpoint with a path is used as is; a bare origin gets the
    /// environment's handler path. Without an endpoint, the environment picks
    /// both origin and path.
    pub fn conversion_url(&self, environment: Environment) -> Result<Url, ConfigError> {
        let path = match environment {
            Environment::Local => &self.local_path,
            Environment::Production => &self.api_path,
        };

        if let Some(endpoint) = &self.endpoint {
            let url = parse_url(endpoint)?;
            if url.path().trim_matches('/').is_empty() {
                return join(&url, path);
            }
            return Ok(url);
        }

        let origin = match environment {
            Environment::Local => &self.local_endpoint,
            Environment::Production => &self.production_endpoint,
        };
        join(&parse_url(origin)?, path)
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::UrlParse {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

fn join(origin: &Url, path: &str) -> Result<Url, ConfigError> {
    origin.join(path).map_err(|e| ConfigError::UrlParse {
        url: format!("{origin}{path}"),
        message: e.to_string(),
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
