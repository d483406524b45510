//! Client configuration and derived connection state

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::HeaderValue;
use reqwest::Url;
use rovio_core::{Result, RovioError, SPEED_RANGE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Only plain HTTP is served by the device
pub const PROTOCOL: &str = "http";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and as whom to connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Hostname or IP address of the device
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// HTTP Basic user name
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_port() -> u16 {
    80
}

impl ConnectionSettings {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: None,
            password: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// State computed from [`ConnectionSettings`]
#[derive(Debug, Clone)]
struct Derived {
    base_url: Url,
    authorization: Option<HeaderValue>,
}

impl Derived {
    fn compute(settings: &ConnectionSettings) -> Result<Self> {
        if settings.host.trim().is_empty() {
            return Err(RovioError::invalid_parameter("host", "must not be empty"));
        }
        if settings.port == 0 {
            return Err(RovioError::invalid_parameter("port", "must be in 1..=65535"));
        }

        let base_url = Url::parse(&format!("{}://{}:{}/", PROTOCOL, settings.host, settings.port))
            .map_err(|e| RovioError::invalid_parameter("host", e.to_string()))?;

        let authorization = match (&settings.username, &settings.password) {
            (Some(user), Some(pass)) => {
                let token = STANDARD.encode(format!("{}:{}", user, pass));
                let mut value = HeaderValue::from_str(&format!("Basic {}", token))
                    .map_err(|e| RovioError::invalid_parameter("username", e.to_string()))?;
                value.set_sensitive(true);
                Some(value)
            }
            _ => None,
        };

        Ok(Self {
            base_url,
            authorization,
        })
    }
}

/// Configuration owned by one device client
///
/// Host, port and credentials only change through [`ClientConfig::reconfigure`],
/// which rebuilds the base URL and auth token in the same step.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    settings: ConnectionSettings,
    derived: Derived,
    default_speed: u8,
    timeout: Duration,
}

impl ClientConfig {
    pub fn new(settings: ConnectionSettings) -> Result<Self> {
        let derived = Derived::compute(&settings)?;
        Ok(Self {
            settings,
            derived,
            default_speed: *SPEED_RANGE.start(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace host/port/credentials; the old state is kept if `settings` is invalid
    pub fn reconfigure(&mut self, settings: ConnectionSettings) -> Result<()> {
        let derived = Derived::compute(&settings)?;
        debug!(host = %settings.host, port = settings.port, "Reconfigured device connection");
        self.settings = settings;
        self.derived = derived;
        Ok(())
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn host(&self) -> &str {
        &self.settings.host
    }

    pub fn port(&self) -> u16 {
        self.settings.port
    }

    pub fn protocol(&self) -> &'static str {
        PROTOCOL
    }

    pub fn username(&self) -> Option<&str> {
        self.settings.username.as_deref()
    }

    /// `http://host:port/`
    pub fn base_url(&self) -> &Url {
        &self.derived.base_url
    }

    /// Cached `Basic ...` header value, present only when both credentials are set
    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.derived.authorization.as_ref()
    }

    /// Speed used when a movement command gets none, or one outside 1..=10
    pub fn default_speed(&self) -> u8 {
        self.default_speed
    }

    pub fn set_default_speed(&mut self, speed: u8) -> Result<()> {
        if !SPEED_RANGE.contains(&speed) {
            return Err(RovioError::invalid_parameter(
                "default_speed",
                format!("{} is outside 1..=10", speed),
            ));
        }
        self.default_speed = speed;
        Ok(())
    }

    pub fn with_default_speed(mut self, speed: u8) -> Result<Self> {
        self.set_default_speed(speed)?;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
