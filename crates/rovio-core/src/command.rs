//! Command catalog
//!
//! Static table mapping each device command to the CGI endpoint, numeric
//! action/drive identifiers and parameters it needs. All wheel and camera
//! head movement goes through the ManualDrive action with a drive id.

use serde::Serialize;

use crate::error::{Result, RovioError};
use crate::response::Value;

/// ManualDrive navigation action shared by every movement command
pub const MANUAL_DRIVE_ACTION: u8 = 18;

/// Slowest/fastest accepted speed values (1 is fastest)
pub const SPEED_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Command {
    Stop,
    Forward,
    Backward,
    Left,
    Right,
    RotateLeft,
    RotateRight,
    DiagForwardLeft,
    DiagForwardRight,
    DiagBackLeft,
    DiagBackRight,
    HeadUp,
    HeadDown,
    HeadMiddle,
    RotateLeft20,
    RotateRight20,
    GetReport,
    StartRecording,
    AbortRecording,
    StopRecording,
    DeletePath,
    GetPathList,
    PlayPathForward,
    PlayPathBackward,
    StopPlaying,
    PausePlaying,
    RenamePath,
    GoHome,
    GoHomeAndDock,
    UpdateHomePosition,
    SetTuningParameters,
    GetTuningParameters,
    ResetNavStateMachine,
    GetMcuReport,
    ClearAllPaths,
    GetStatus,
    SaveParameter,
    ReadParameter,
    GetLibNsVersion,
    EmailImage,
    ResetHomeLocation,
    GetImage,
    ChangeResolution,
    ChangeCompressRatio,
    ChangeFramerate,
    ChangeBrightness,
    ChangeSpeakerVolume,
    ChangeMicVolume,
    SetCamera,
}

impl Command {
    /// Every command, in catalog order
    pub const ALL: [Command; 49] = [
        Command::Stop,
        Command::Forward,
        Command::Backward,
        Command::Left,
        Command::Right,
        Command::RotateLeft,
        Command::RotateRight,
        Command::DiagForwardLeft,
        Command::DiagForwardRight,
        Command::DiagBackLeft,
        Command::DiagBackRight,
        Command::HeadUp,
        Command::HeadDown,
        Command::HeadMiddle,
        Command::RotateLeft20,
        Command::RotateRight20,
        Command::GetReport,
        Command::StartRecording,
        Command::AbortRecording,
        Command::StopRecording,
        Command::DeletePath,
        Command::GetPathList,
        Command::PlayPathForward,
        Command::PlayPathBackward,
        Command::StopPlaying,
        Command::PausePlaying,
        Command::RenamePath,
        Command::GoHome,
        Command::GoHomeAndDock,
        Command::UpdateHomePosition,
        Command::SetTuningParameters,
        Command::GetTuningParameters,
        Command::ResetNavStateMachine,
        Command::GetMcuReport,
        Command::ClearAllPaths,
        Command::GetStatus,
        Command::SaveParameter,
        Command::ReadParameter,
        Command::GetLibNsVersion,
        Command::EmailImage,
        Command::ResetHomeLocation,
        Command::GetImage,
        Command::ChangeResolution,
        Command::ChangeCompressRatio,
        Command::ChangeFramerate,
        Command::ChangeBrightness,
        Command::ChangeSpeakerVolume,
        Command::ChangeMicVolume,
        Command::SetCamera,
    ];

    pub fn spec(self) -> &'static CommandSpec {
        // CATALOG rows follow the variant order (checked in tests)
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a command is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `rev.cgi?Cmd=nav&action=<id>`
    Nav { action: u8 },
    /// A dedicated settings script such as `ChangeResolution.cgi`
    Script(&'static str),
    /// `Jpeg/CamImg[<id>].jpg`
    Image,
}

/// Accepted values for a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Stored path name: non-empty ASCII alphanumeric
    PathName,
    /// Free text (email addresses, redirect URLs)
    Text,
    /// Integer within an inclusive range
    Integer { min: i64, max: i64 },
    /// Integer from a fixed set
    OneOf(&'static [i64]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Query parameter name on the wire
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    const fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    /// Check one argument against this parameter and render it for the query
    pub fn render(&self, value: &Value) -> Result<String> {
        match (self.kind, value) {
            (ParamKind::PathName, Value::Text(s)) => {
                if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(RovioError::invalid_parameter(
                        self.name,
                        format!("path name '{}' must be non-empty and alphanumeric", s),
                    ));
                }
                Ok(s.clone())
            }
            (ParamKind::Text, Value::Text(s)) => {
                if s.trim().is_empty() {
                    return Err(RovioError::invalid_parameter(self.name, "must not be empty"));
                }
                Ok(s.clone())
            }
            (ParamKind::Integer { min, max }, Value::Integer(n)) => {
                if *n < min || *n > max {
                    return Err(RovioError::invalid_parameter(
                        self.name,
                        format!("{} is outside {}..={}", n, min, max),
                    ));
                }
                Ok(n.to_string())
            }
            (ParamKind::OneOf(allowed), Value::Integer(n)) => {
                if !allowed.contains(n) {
                    return Err(RovioError::invalid_parameter(
                        self.name,
                        format!("{} is not one of {:?}", n, allowed),
                    ));
                }
                Ok(n.to_string())
            }
            (ParamKind::PathName | ParamKind::Text, Value::Integer(n)) => {
                self.render(&Value::Text(n.to_string()))
            }
            (kind, value) => Err(RovioError::invalid_parameter(
                self.name,
                format!("{:?} does not accept '{}'", kind, value),
            )),
        }
    }
}

/// Static description of one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: Command,
    /// Catalog name, e.g. `PlayPathForward`
    pub name: &'static str,
    pub endpoint: Endpoint,
    /// ManualDrive drive id
    pub drive: Option<u8>,
    pub speed: bool,
    /// Extra parameters, in query order
    pub params: &'static [ParamSpec],
}

impl CommandSpec {
    /// Numeric nav action, if this is a `rev.cgi` command
    pub fn action_id(&self) -> Option<u8> {
        match self.endpoint {
            Endpoint::Nav { action } => Some(action),
            _ => None,
        }
    }

    pub fn requires_drive_param(&self) -> bool {
        self.drive.is_some()
    }

    pub fn requires_speed_param(&self) -> bool {
        self.speed
    }

    /// Whether the device answers with a key=value body
    pub fn returns_key_values(&self) -> bool {
        !matches!(self.endpoint, Endpoint::Image)
            && !matches!(self.command, Command::GetPathList | Command::GetMcuReport)
    }

    /// Validate positional arguments, returning `(name, rendered value)` pairs
    pub fn render_params(&self, args: &[Value]) -> Result<Vec<(&'static str, String)>> {
        if args.len() > self.params.len() {
            return Err(RovioError::invalid_parameter(
                self.name,
                format!("expected at most {} arguments, got {}", self.params.len(), args.len()),
            ));
        }

        let mut rendered = Vec::with_capacity(self.params.len());
        for (index, param) in self.params.iter().enumerate() {
            match args.get(index) {
                Some(value) => rendered.push((param.name, param.render(value)?)),
                None if param.required => {
                    return Err(RovioError::invalid_parameter(
                        param.name,
                        "missing required argument",
                    ));
                }
                None => {}
            }
        }
        Ok(rendered)
    }
}

/// Find a command by its catalog name
pub fn lookup(name: &str) -> Result<&'static CommandSpec> {
    CATALOG
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| RovioError::UnknownCommand(name.to_string()))
}

/// Every catalog entry
pub fn catalog() -> &'static [CommandSpec] {
    &CATALOG
}

const PATH_NAME: ParamSpec = ParamSpec::required("name", ParamKind::PathName);
const REDIRECT: ParamSpec = ParamSpec::optional("RedirectURL", ParamKind::Text);
const PARAM_INDEX: ParamSpec = ParamSpec::required("index", ParamKind::Integer { min: 0, max: 19 });

const NO_PARAMS: &[ParamSpec] = &[];
const PATH_PARAMS: &[ParamSpec] = &[PATH_NAME];
const RENAME_PARAMS: &[ParamSpec] = &[
    PATH_NAME,
    ParamSpec::required("newname", ParamKind::PathName),
];
const SAVE_PARAMS: &[ParamSpec] = &[
    PARAM_INDEX,
    ParamSpec::required(
        "value",
        ParamKind::Integer {
            min: i32::MIN as i64,
            max: i32::MAX as i64,
        },
    ),
];
const READ_PARAMS: &[ParamSpec] = &[PARAM_INDEX];
const EMAIL_PARAMS: &[ParamSpec] = &[ParamSpec::required("email", ParamKind::Text)];
const IMAGE_PARAMS: &[ParamSpec] = &[ParamSpec::optional(
    "id",
    ParamKind::Integer {
        min: 0,
        max: u32::MAX as i64,
    },
)];
const RESOLUTION_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("ResType", ParamKind::Integer { min: 0, max: 3 }),
    REDIRECT,
];
const COMPRESS_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("Ratio", ParamKind::Integer { min: 0, max: 2 }),
    REDIRECT,
];
const FRAMERATE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("Framerate", ParamKind::Integer { min: 2, max: 32 }),
    REDIRECT,
];
const BRIGHTNESS_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("Brightness", ParamKind::Integer { min: 0, max: 6 }),
    REDIRECT,
];
const SPEAKER_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("SpeakerVolume", ParamKind::Integer { min: 0, max: 31 }),
    REDIRECT,
];
const MIC_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("MicVolume", ParamKind::Integer { min: 0, max: 31 }),
    REDIRECT,
];
const CAMERA_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("Frequency", ParamKind::OneOf(&[0, 50, 60])),
    REDIRECT,
];

const fn drive(command: Command, name: &'static str, drive: u8) -> CommandSpec {
    CommandSpec {
        command,
        name,
        endpoint: Endpoint::Nav {
            action: MANUAL_DRIVE_ACTION,
        },
        drive: Some(drive),
        speed: true,
        params: NO_PARAMS,
    }
}

const fn nav(
    command: Command,
    name: &'static str,
    action: u8,
    params: &'static [ParamSpec],
) -> CommandSpec {
    CommandSpec {
        command,
        name,
        endpoint: Endpoint::Nav { action },
        drive: None,
        speed: false,
        params,
    }
}

const fn script(
    command: Command,
    name: &'static str,
    script: &'static str,
    params: &'static [ParamSpec],
) -> CommandSpec {
    CommandSpec {
        command,
        name,
        endpoint: Endpoint::Script(script),
        drive: None,
        speed: false,
        params,
    }
}

static CATALOG: [CommandSpec; 49] = [
    drive(Command::Stop, "Stop", 0),
    drive(Command::Forward, "Forward", 1),
    drive(Command::Backward, "Backward", 2),
    drive(Command::Left, "Left", 3),
    drive(Command::Right, "Right", 4),
    drive(Command::RotateLeft, "RotateLeft", 5),
    drive(Command::RotateRight, "RotateRight", 6),
    drive(Command::DiagForwardLeft, "DiagForwardLeft", 7),
    drive(Command::DiagForwardRight, "DiagForwardRight", 8),
    drive(Command::DiagBackLeft, "DiagBackLeft", 9),
    drive(Command::DiagBackRight, "DiagBackRight", 10),
    drive(Command::HeadUp, "HeadUp", 11),
    drive(Command::HeadDown, "HeadDown", 12),
    drive(Command::HeadMiddle, "HeadMiddle", 13),
    drive(Command::RotateLeft20, "RotateLeft20", 17),
    drive(Command::RotateRight20, "RotateRight20", 18),
    nav(Command::GetReport, "GetReport", 1, NO_PARAMS),
    nav(Command::StartRecording, "StartRecording", 2, NO_PARAMS),
    nav(Command::AbortRecording, "AbortRecording", 3, NO_PARAMS),
    nav(Command::StopRecording, "StopRecording", 4, PATH_PARAMS),
    nav(Command::DeletePath, "DeletePath", 5, PATH_PARAMS),
    nav(Command::GetPathList, "GetPathList", 6, NO_PARAMS),
    nav(Command::PlayPathForward, "PlayPathForward", 7, PATH_PARAMS),
    nav(Command::PlayPathBackward, "PlayPathBackward", 8, PATH_PARAMS),
    nav(Command::StopPlaying, "StopPlaying", 9, NO_PARAMS),
    nav(Command::PausePlaying, "PausePlaying", 10, NO_PARAMS),
    nav(Command::RenamePath, "RenamePath", 11, RENAME_PARAMS),
    nav(Command::GoHome, "GoHome", 12, NO_PARAMS),
    nav(Command::GoHomeAndDock, "GoHomeAndDock", 13, NO_PARAMS),
    nav(Command::UpdateHomePosition, "UpdateHomePosition", 14, NO_PARAMS),
    nav(Command::SetTuningParameters, "SetTuningParameters", 15, NO_PARAMS),
    nav(Command::GetTuningParameters, "GetTuningParameters", 16, NO_PARAMS),
    nav(Command::ResetNavStateMachine, "ResetNavStateMachine", 17, NO_PARAMS),
    nav(Command::GetMcuReport, "GetMCUReport", 20, NO_PARAMS),
    nav(Command::ClearAllPaths, "ClearAllPaths", 21, NO_PARAMS),
    nav(Command::GetStatus, "GetStatus", 22, NO_PARAMS),
    nav(Command::SaveParameter, "SaveParameter", 23, SAVE_PARAMS),
    nav(Command::ReadParameter, "ReadParameter", 24, READ_PARAMS),
    nav(Command::GetLibNsVersion, "GetLibNSVersion", 25, NO_PARAMS),
    nav(Command::EmailImage, "EmailImage", 26, EMAIL_PARAMS),
    nav(Command::ResetHomeLocation, "ResetHomeLocation", 27, NO_PARAMS),
    CommandSpec {
        command: Command::GetImage,
        name: "GetImage",
        endpoint: Endpoint::Image,
        drive: None,
        speed: false,
        params: IMAGE_PARAMS,
    },
    script(
        Command::ChangeResolution,
        "ChangeResolution",
        "ChangeResolution.cgi",
        RESOLUTION_PARAMS,
    ),
    script(
        Command::ChangeCompressRatio,
        "ChangeCompressRatio",
        "ChangeCompressRatio.cgi",
        COMPRESS_PARAMS,
    ),
    script(Command::ChangeFramerate, "ChangeFramerate", "ChangeFramerate.cgi", FRAMERATE_PARAMS),
    script(
        Command::ChangeBrightness,
        "ChangeBrightness",
        "ChangeBrightness.cgi",
        BRIGHTNESS_PARAMS,
    ),
    script(
        Command::ChangeSpeakerVolume,
        "ChangeSpeakerVolume",
        "ChangeSpeakerVolume.cgi",
        SPEAKER_PARAMS,
    ),
    script(Command::ChangeMicVolume, "ChangeMicVolume", "ChangeMicVolume.cgi", MIC_PARAMS),
    script(Command::SetCamera, "SetCamera", "SetCamera.cgi", CAMERA_PARAMS),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_follows_variant_order() {
        assert_eq!(Command::ALL.len(), CATALOG.len());
        for (index, command) in Command::ALL.iter().enumerate() {
            assert_eq!(*command as usize, index);
            assert_eq!(CATALOG[index].command, *command);
        }
    }

    #[test]
    fn test_lookup() {
        let spec = lookup("PlayPathForward").unwrap();
        assert_eq!(spec.action_id(), Some(7));
        assert_eq!(spec.params.len(), 1);

        let spec = lookup("RotateRight20").unwrap();
        assert_eq!(spec.action_id(), Some(MANUAL_DRIVE_ACTION));
        assert_eq!(spec.drive, Some(18));
        assert!(spec.requires_drive_param());
        assert!(spec.requires_speed_param());

        assert_eq!(lookup("GetMCUReport").unwrap().action_id(), Some(20));
        assert_eq!(lookup("SetCamera").unwrap().endpoint, Endpoint::Script("SetCamera.cgi"));
    }

    #[test]
    fn test_lookup_unknown() {
        let err = lookup("Jump").unwrap_err();
        assert_eq!(err, RovioError::UnknownCommand("Jump".to_string()));
    }

    #[test]
    fn test_names_are_unique() {
        for spec in CATALOG.iter() {
            assert_eq!(lookup(spec.name).unwrap().command, spec.command);
        }
    }

    #[test]
    fn test_render_params() {
        let spec = Command::RenamePath.spec();
        let rendered = spec
            .render_params(&[Value::from("old1"), Value::from("new2")])
            .unwrap();
        assert_eq!(rendered, vec![("name", "old1".to_string()), ("newname", "new2".to_string())]);

        let err = spec.render_params(&[Value::from("old1")]).unwrap_err();
        assert!(matches!(err, RovioError::InvalidParameter { ref name, .. } if name == "newname"));
    }

    #[test]
    fn test_optional_params_may_be_omitted() {
        let spec = Command::ChangeFramerate.spec();
        let rendered = spec.render_params(&[Value::from(30)]).unwrap();
        assert_eq!(rendered, vec![("Framerate", "30".to_string())]);

        assert!(Command::GetImage.spec().render_params(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parameter_bounds() {
        let read = Command::ReadParameter.spec();
        assert!(read.render_params(&[Value::from(19)]).is_ok());
        assert!(read.render_params(&[Value::from(20)]).is_err());
        assert!(read.render_params(&[Value::from(-1)]).is_err());

        let framerate = Command::ChangeFramerate.spec();
        assert!(framerate.render_params(&[Value::from(1)]).is_err());
        assert!(framerate.render_params(&[Value::from(33)]).is_err());

        let camera = Command::SetCamera.spec();
        assert!(camera.render_params(&[Value::from(50)]).is_ok());
        assert!(camera.render_params(&[Value::from(55)]).is_err());
    }

    #[test]
    fn test_path_name_validation() {
        let spec = Command::DeletePath.spec();
        assert!(spec.render_params(&[Value::from("kitchen2")]).is_ok());
        assert!(spec.render_params(&[Value::from("")]).is_err());
        assert!(spec.render_params(&[Value::from("two words")]).is_err());
        assert!(spec.render_params(&[Value::from(-5)]).is_err());
    }

    #[test]
    fn test_numeric_path_name() {
        let spec = Command::DeletePath.spec();
        let rendered = spec.render_params(&[Value::parse("2024")]).unwrap();
        assert_eq!(rendered, vec![("name", "2024".to_string())]);

        let spec = Command::EmailImage.spec();
        assert!(spec.render_params(&[Value::from(42)]).is_ok());
    }

    #[test]
    fn test_too_many_arguments() {
        let spec = Command::GoHome.spec();
        assert!(spec.render_params(&[Value::from(1)]).is_err());
    }
}
