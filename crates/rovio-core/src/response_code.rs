//! Device response codes
//!
//! Most CGI commands answer with a `responses` field holding one of these
//! codes. The numeric value, name and description of each entry are fixed;
//! callers match on them. Code 20 is not assigned by the firmware.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResponseCode {
    Success = 0,
    Failure = 1,
    RobotBusy = 2,
    FeatureNotImplemented = 3,
    UnknownCgiAction = 4,
    NoNsSignal = 5,
    NoEmptyPathAvailable = 6,
    FailedToReadPath = 7,
    PathBaseaddressNotInitialized = 8,
    PathNotFound = 9,
    PathNameNotSpecified = 10,
    NotRecordingPath = 11,
    FlashNotInitialized = 12,
    FailedToDeletePath = 13,
    FailedToReadFromFlash = 14,
    FailedToWriteToFlash = 15,
    FlashNotReady = 16,
    NoMemoryAvailable = 17,
    NoMcuPortAvailable = 18,
    NoNsPortAvailable = 19,
    NsUartReadError = 21,
    ParameterOutOfRange = 22,
    NoParameter = 23,
}

/// (code, name, description) for every assigned response code
static RESPONSE_CODES: [(ResponseCode, &str, &str); 23] = [
    (ResponseCode::Success, "SUCCESS", "CGI command successful"),
    (ResponseCode::Failure, "FAILURE", "CGI command general failure"),
    (ResponseCode::RobotBusy, "ROBOT_BUSY", "robot is executing autonomous function"),
    (ResponseCode::FeatureNotImplemented, "FEATURE_NOT_IMPLEMENTED", "CGI command not implemented"),
    (
        ResponseCode::UnknownCgiAction,
        "UNKNOWN_CGI_ACTION",
        "CGI nav command: unknown action requested",
    ),
    (ResponseCode::NoNsSignal, "NO_NS_SIGNAL", "no navigation signal available"),
    (ResponseCode::NoEmptyPathAvailable, "NO_EMPTY_PATH_AVAILABLE", "path memory is full"),
    (ResponseCode::FailedToReadPath, "FAILED_TO_READ_PATH", "failed to read Flash memory"),
    (
        ResponseCode::PathBaseaddressNotInitialized,
        "PATH_BASEADDRESS_NOT_INITIALIZED",
        "Flash error",
    ),
    (ResponseCode::PathNotFound, "PATH_NOT_FOUND", "no path with such name"),
    (
        ResponseCode::PathNameNotSpecified,
        "PATH_NAME_NOT_SPECIFIED",
        "path name parameter is missing",
    ),
    (
        ResponseCode::NotRecordingPath,
        "NOT_RECORDING_PATH",
        "save path command received while not in recording mode",
    ),
    (ResponseCode::FlashNotInitialized, "FLASH_NOT_INITIALIZED", "Flash subsystem failure"),
    (ResponseCode::FailedToDeletePath, "FAILED_TO_DELETE_PATH", "Flash operation failed"),
    (ResponseCode::FailedToReadFromFlash, "FAILED_TO_READ_FROM_FLASH", "Flash operation failed"),
    (ResponseCode::FailedToWriteToFlash, "FAILED_TO_WRITE_TO_FLASH", "Flash operation failed"),
    (ResponseCode::FlashNotReady, "FLASH_NOT_READY", "Flash failed"),
    (ResponseCode::NoMemoryAvailable, "NO_MEMORY_AVAILABLE", "N/A"),
    (ResponseCode::NoMcuPortAvailable, "NO_MCU_PORT_AVAILABLE", "N/A"),
    (ResponseCode::NoNsPortAvailable, "NO_NS_PORT_AVAILABLE", "N/A"),
    (ResponseCode::NsUartReadError, "NS_UART_READ_ERROR", "N/A"),
    (
        ResponseCode::ParameterOutOfRange,
        "PARAMETER_OUTOFRANGE",
        "one or more CGI parameters are out of expected range",
    ),
    (ResponseCode::NoParameter, "NO_PARAMETER", "one or more CGI parameters are missing"),
];

impl ResponseCode {
    /// Look up an assigned code; `None` for anything outside the table
    pub fn from_code(code: i64) -> Option<Self> {
        RESPONSE_CODES
            .iter()
            .find(|(rc, _, _)| i64::from(*rc as u8) == code)
            .map(|(rc, _, _)| *rc)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Table name, e.g. `ROBOT_BUSY`
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    pub fn description(self) -> &'static str {
        self.entry().2
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Busy states that clear once the device finishes its current task
    pub fn is_transient(self) -> bool {
        self == Self::RobotBusy
    }

    fn entry(self) -> &'static (ResponseCode, &'static str, &'static str) {
        // Every variant has exactly one row, so the fallback row is never used
        RESPONSE_CODES
            .iter()
            .find(|(rc, _, _)| *rc == self)
            .unwrap_or(&RESPONSE_CODES[1])
    }
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.name())
    }
}
