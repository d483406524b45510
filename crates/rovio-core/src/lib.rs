//! Rovio Core - Command catalog, response parsing, and telemetry decoding
//!
//! This crate holds the I/O-free part of the Rovio client:
//! - Command catalog mapping commands to CGI endpoints and numeric ids
//! - Parser for the device's `key=value|key=value` response text
//! - Fixed response code table
//! - Decoders for navigation reports and MCU packets

pub mod command;
pub mod error;
pub mod mcu;
pub mod response;
pub mod response_code;
pub mod telemetry;

pub use command::{
    catalog, lookup, Command, CommandSpec, Endpoint, ParamKind, ParamSpec, MANUAL_DRIVE_ACTION,
    SPEED_RANGE,
};
pub use error::{Result, RovioError};
pub use mcu::{ChargerStatus, McuReport, McuStatus, McuTelemetry, WheelReading};
pub use response::{parse_response, ResponseMap, Value, RESPONSES_KEY};
pub use response_code::ResponseCode;
pub use telemetry::{
    AcFrequency, BatteryLevel, ChargingState, HeadPosition, NavState, ReportFlags, Resolution,
    TelemetryReport,
};
