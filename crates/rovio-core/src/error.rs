//! Error taxonomy shared by every Rovio crate

use thiserror::Error;

use crate::response_code::ResponseCode;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RovioError {
    /// Network-level failure talking to the device (DNS, refused, timeout, HTTP status)
    #[error("Error connecting to {host}: {reason}")]
    Connect { host: String, reason: String },
    /// Response text did not follow the key=value grammar
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// The device answered with a non-SUCCESS response code
    #[error("Response error from {command}: code {code} {name} ({description})")]
    Response {
        command: &'static str,
        code: i64,
        name: &'static str,
        description: &'static str,
    },
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, RovioError>;

impl RovioError {
    /// Build a response error for `code`, looking up its table entry
    pub fn response(command: &'static str, code: i64) -> Self {
        let (name, description) = match ResponseCode::from_code(code) {
            Some(rc) => (rc.name(), rc.description()),
            None => ("UNKNOWN", "unrecognized response code"),
        };
        Self::Response {
            command,
            code,
            name,
            description,
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Device response code carried by this error, if any
    pub fn response_code(&self) -> Option<i64> {
        match self {
            Self::Response { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True when the device reported a busy state that may clear on its own
    pub fn is_transient(&self) -> bool {
        self.response_code()
            .and_then(ResponseCode::from_code)
            .map(ResponseCode::is_transient)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_error_carries_table_entry() {
        let err = RovioError::response("GetReport", 2);
        match &err {
            RovioError::Response { code, name, .. } => {
                assert_eq!(*code, 2);
                assert_eq!(*name, "ROBOT_BUSY");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
        assert!(err.to_string().contains("robot is executing autonomous function"));
    }

    #[test]
    fn test_unassigned_code() {
        let err = RovioError::response("Forward", 20);
        assert_eq!(err.response_code(), Some(20));
        assert!(!err.is_transient());
        assert!(err.to_string().contains("UNKNOWN"));
    }

    #[test]
    fn test_path_not_found_is_not_transient() {
        assert!(!RovioError::response("DeletePath", 9).is_transient());
        assert!(!RovioError::MalformedResponse("x".into()).is_transient());
    }
}
