//! Request construction
//!
//! Turns a catalog entry plus arguments into a fully formed GET request:
//! `rev.cgi?Cmd=nav&action=<id>[&drive=<id>][&speed=<n>][&<param>=<value>...]`
//! for navigation, `<Script>.cgi?<Param>=<value>[&RedirectURL=<url>]` for
//! camera/audio settings and `Jpeg/CamImg[<id>].jpg` for snapshots.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use rovio_core::{CommandSpec, Endpoint, Result, RovioError, Value, SPEED_RANGE};

use crate::config::ClientConfig;

/// Fixed client identifier sent with every request
pub const CLIENT_USER_AGENT: &str = concat!("rovio-client/", env!("CARGO_PKG_VERSION"));

/// CGI script serving every navigation command
pub const NAV_SCRIPT: &str = "rev.cgi";

/// Arguments for one command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    /// Requested speed; values outside 1..=10 fall back to the default speed
    pub speed: Option<u8>,
    /// Positional values matching the command's parameter list
    pub values: Vec<Value>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speed(mut self, speed: Option<u8>) -> Self {
        self.speed = speed;
        self
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Push `value` only when present
    pub fn opt_arg<V: Into<Value>>(self, value: Option<V>) -> Self {
        match value {
            Some(v) => self.arg(v),
            None => self,
        }
    }
}

/// A request ready for the transport
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: Url,
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    /// Host the request targets, for diagnostics
    pub fn host(&self) -> String {
        self.url.host_str().unwrap_or_default().to_string()
    }
}

/// Speed actually sent: the requested one when in 1..=10, otherwise the default
pub fn effective_speed(requested: Option<u8>, default_speed: u8) -> u8 {
    match requested {
        Some(speed) if SPEED_RANGE.contains(&speed) => speed,
        _ => default_speed,
    }
}

/// Build the request for `spec` with `args`
///
/// Pure: validates arguments and assembles URL and headers without I/O.
pub fn build(
    config: &ClientConfig,
    spec: &CommandSpec,
    args: &CommandArgs,
) -> Result<RequestDescriptor> {
    let params = spec.render_params(&args.values)?;

    let url = match spec.endpoint {
        Endpoint::Nav { action } => {
            let mut url = join(config, NAV_SCRIPT)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("Cmd", "nav");
                query.append_pair("action", &action.to_string());
                if let Some(drive) = spec.drive {
                    query.append_pair("drive", &drive.to_string());
                }
                if spec.requires_speed_param() {
                    let speed = effective_speed(args.speed, config.default_speed());
                    query.append_pair("speed", &speed.to_string());
                }
                for (name, value) in &params {
                    query.append_pair(name, value);
                }
            }
            url
        }
        Endpoint::Script(script) => {
            let mut url = join(config, script)?;
            url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
            url
        }
        Endpoint::Image => {
            let file = match params.first() {
                Some((_, id)) => format!("Jpeg/CamImg{}.jpg", id),
                None => "Jpeg/CamImg.jpg".to_string(),
            };
            join(config, &file)?
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
    if let Some(auth) = config.authorization() {
        headers.insert(AUTHORIZATION, auth.clone());
    }

    Ok(RequestDescriptor { url, headers })
}

fn join(config: &ClientConfig, path: &str) -> Result<Url> {
    config
        .base_url()
        .join(path)
        .map_err(|e| RovioError::invalid_parameter("path", e.to_string()))
}
