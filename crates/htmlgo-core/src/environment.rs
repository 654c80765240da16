//! Runtime environment resolution.
//!
//! Decides whether the client talks to a local development server or the
//! production deployment, from an explicit override and the host identity.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;
use url::Url;

use crate::error::ConfigError;

/// Ports the local development servers listen on.
pub const DEV_PORTS: [u16; 4] = [3000, 5000, 8000, 8080];

/// Runtime mode of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    Local,
    #[default]
    Production,
}

impl Environment {
    /// The token accepted as an explicit override for this environment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Production => "prod",
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidEnvironment {
                value: other.to_string(),
            }),
        }
    }
}

/// Hostname and port the client is served from (or talks to).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostIdentity {
    pub hostname: SmolStr,
    pub port: Option<u16>,
}

impl HostIdentity {
    pub fn new(hostname: impl Into<SmolStr>, port: Option<u16>) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    /// Host identity of a URL. Default ports are not reported.
    pub fn from_url(url: &Url) -> Self {
        Self {
            hostname: url.host_str().unwrap_or_default().into(),
            port: url.port(),
        }
    }
}

impl FromStr for HostIdentity {
    type Err = ConfigError;

    /// Parse `hostname`, `hostname:port`, `[v6]` or `[v6]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidValue {
            var: "host",
            value: s.to_string(),
        };
        if s.is_empty() {
            return Err(invalid());
        }
        // Bracketed hosts keep their brackets, like `Url::host_str`.
        if s.starts_with('[') {
            let end = s.find(']').ok_or_else(invalid)?;
            let (host, rest) = s.split_at(end + 1);
            if host.len() == 2 {
                return Err(invalid());
            }
            return match rest {
                "" => Ok(Self::new(host, None)),
                _ => {
                    let port = rest
                        .strip_prefix(':')
                        .and_then(|port| port.parse::<u16>().ok())
                        .ok_or_else(invalid)?;
                    Ok(Self::new(host, Some(port)))
                }
            };
        }
        match s.rsplit_once(':') {
            // Bare IPv6 addresses contain colons but carry no port.
            Some((host, port)) if !host.contains(':') => {
                let port = port.parse::<u16>().map_err(|_| invalid())?;
                Ok(Self::new(host, Some(port)))
            }
            _ => Ok(Self::new(s, None)),
        }
    }
}

/// Resolve the runtime environment.
///
/// An override of exactly `"prod"` or `"local"` wins. Otherwise the host is
/// classified as local when it is a loopback or private-network address, uses
/// one of the [`DEV_PORTS`], or carries a development/preview marker.
pub fn resolve(explicit_override: Option<&str>, host: &HostIdentity) -> Environment {
    match explicit_override {
        Some("prod") => return Environment::Production,
        Some("local") => return Environment::Local,
        _ => {}
    }

    let hostname = host.hostname.as_str();
    let port_is_dev = host.port.is_some_and(|port| DEV_PORTS.contains(&port));

    if is_private_host(hostname) || port_is_dev || has_dev_marker(hostname) {
        Environment::Local
    } else {
        Environment::Production
    }
}

fn is_private_host(hostname: &str) -> bool {
    if matches!(hostname, "localhost" | "::1" | "[::1]") {
        return true;
    }
    if hostname.starts_with("127.") || hostname.starts_with("10.") || hostname.starts_with("192.168.") {
        return true;
    }
    // 172.16.0.0/12
    hostname
        .strip_prefix("172.")
        .and_then(|rest| rest.split('.').next())
        .and_then(|octet| octet.parse::<u8>().ok())
        .is_some_and(|octet| (16..=31).contains(&octet))
}

fn has_dev_marker(hostname: &str) -> bool {
    hostname.contains("dev.")
        || hostname.contains("-dev")
        || (hostname.contains("vercel.app")
            && (hostname.contains("preview") || hostname.contains("dev-")))
}
