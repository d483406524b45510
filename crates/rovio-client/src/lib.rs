//! Rovio Client - HTTP access to a Rovio mobile webcam
//!
//! Wraps the device's CGI interface in typed async calls. Requests are
//! built from the command catalog in `rovio-core` and sent with reqwest.

pub mod client;
pub mod config;
pub mod request;
pub mod transport;

pub use client::DeviceClient;
pub use config::{ClientConfig, ConnectionSettings, DEFAULT_TIMEOUT, PROTOCOL};
pub use request::{build, effective_speed, CommandArgs, RequestDescriptor, CLIENT_USER_AGENT};
pub use transport::{HttpTransport, Transport};
