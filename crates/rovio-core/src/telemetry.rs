//! Telemetry decoding for navigation status reports
//!
//! Turns the raw integers of a GetReport/GetStatus response into semantic
//! values. Raw codes that fall outside their documented range are kept and
//! reported as invalid instead of being mapped to a default.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RovioError};
use crate::response::{ResponseMap, Value};

/// Camera resolution reported by `resolution`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    R176x144,
    R320x240,
    R352x240,
    R640x480,
    /// Raw code with no known mapping
    Invalid(i64),
}

impl Resolution {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => Self::R176x144,
            1 => Self::R320x240,
            2 => Self::R352x240,
            3 => Self::R640x480,
            other => Self::Invalid(other),
        }
    }

    /// (width, height) in pixels
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Self::R176x144 => Some((176, 144)),
            Self::R320x240 => Some((320, 240)),
            Self::R352x240 => Some((352, 240)),
            Self::R640x480 => Some((640, 480)),
            Self::Invalid(_) => None,
        }
    }

    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

/// Camera head position band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadPosition {
    High,
    Mid,
    Low,
}

impl HeadPosition {
    /// Below 135 is high, above 140 is low, 135..=140 is mid
    pub fn from_raw(raw: i64) -> Self {
        if raw < 135 {
            Self::High
        } else if raw > 140 {
            Self::Low
        } else {
            Self::Mid
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }
}

/// Navigation projector mains frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcFrequency {
    NotDetected,
    Hz50,
    Hz60,
}

impl AcFrequency {
    /// 1 is 50 Hz, 2 is 60 Hz, anything else counts as not detected
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Self::Hz50,
            2 => Self::Hz60,
            _ => Self::NotDetected,
        }
    }

    pub fn hz(self) -> u32 {
        match self {
            Self::NotDetected => 0,
            Self::Hz50 => 50,
            Self::Hz60 => 60,
        }
    }
}

/// Battery band over the 0..=127 raw scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryLevel {
    /// Below 100: the MCU is about to cut power
    Critical,
    /// 100..=105: the robot should head home to charge
    SeekingCharge,
    /// 106..=127
    Normal,
    OutOfRange(i64),
}

impl BatteryLevel {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0..=99 => Self::Critical,
            100..=105 => Self::SeekingCharge,
            106..=127 => Self::Normal,
            other => Self::OutOfRange(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargingState {
    /// 0..=79
    NotCharging,
    /// 80
    Charging,
    OutOfRange(i64),
}

impl ChargingState {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0..=79 => Self::NotCharging,
            80 => Self::Charging,
            other => Self::OutOfRange(other),
        }
    }
}

/// Navigation state machine state (`state` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavState {
    Idle,
    DrivingHome,
    Docking,
    ExecutingPath,
    RecordingPath,
    Unknown(i64),
}

impl NavState {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::DrivingHome,
            2 => Self::Docking,
            3 => Self::ExecutingPath,
            4 => Self::RecordingPath,
            other => Self::Unknown(other),
        }
    }
}

bitflags! {
    /// Status flags of a navigation report
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ReportFlags: u8 {
        const HOME_POSITION = 0x01;
        const OBSTACLE_DETECTED = 0x02;
        const IR_DETECTOR_ACTIVE = 0x04;
    }
}

/// Decoded navigation status report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryReport {
    /// Position relative to the strongest room beacon
    pub x: Option<i64>,
    pub y: Option<i64>,
    /// Heading as sent by the device
    pub theta: Option<Value>,
    /// 0 is the home base, 1..=9 are room projectors
    pub room: Option<i64>,
    pub signal_strength: Option<i64>,
    pub beacon: Option<i64>,
    pub beacon_x: Option<i64>,
    /// -1 when no other room is visible
    pub next_room: Option<i64>,
    pub next_room_signal_strength: Option<i64>,
    pub state: Option<NavState>,
    pub resistance: Option<i64>,
    pub state_machine: Option<i64>,
    pub waypoint: Option<i64>,
    pub flags: Option<ReportFlags>,
    pub brightness: Option<i64>,
    pub raw_resolution: Option<i64>,
    pub resolution: Option<Resolution>,
    pub video_compression: Option<i64>,
    pub frame_rate: Option<i64>,
    pub privilege: Option<i64>,
    pub user_check: Option<i64>,
    pub speaker_volume: Option<i64>,
    pub mic_volume: Option<i64>,
    pub wifi_signal_strength: Option<i64>,
    pub show_time: Option<i64>,
    pub ddns_state: Option<i64>,
    pub email_state: Option<i64>,
    pub raw_battery: Option<i64>,
    pub battery: Option<BatteryLevel>,
    pub raw_charging: Option<i64>,
    pub charging: Option<ChargingState>,
    pub raw_head_position: Option<i64>,
    pub head_position: Option<HeadPosition>,
    pub raw_ac_freq: Option<i64>,
    pub ac_freq: Option<AcFrequency>,
}

impl TelemetryReport {
    /// Project a parsed report onto named fields
    ///
    /// Absent fields stay `None`; a numeric field sent as text is malformed.
    pub fn decode(map: &ResponseMap) -> Result<Self> {
        let raw_resolution = map.integer("resolution")?;
        let raw_battery = map.integer("battery")?;
        let raw_charging = map.integer("charging")?;
        let raw_head_position = map.integer("head_position")?;
        let raw_ac_freq = map.integer("ac_freq")?;

        Ok(Self {
            x: map.integer("x")?,
            y: map.integer("y")?,
            theta: map.get("theta").cloned(),
            room: map.integer("room")?,
            signal_strength: map.integer("ss")?,
            beacon: map.integer("beacon")?,
            beacon_x: map.integer("beacon_x")?,
            next_room: map.integer("next_room")?,
            next_room_signal_strength: map.integer("next_room_ss")?,
            state: map.integer("state")?.map(NavState::from_raw),
            resistance: map.integer("resistance")?,
            state_machine: map.integer("sm")?,
            waypoint: map.integer("pp")?,
            flags: map.integer("flags")?.map(decode_flags).transpose()?,
            brightness: map.integer("brightness")?,
            raw_resolution,
            resolution: raw_resolution.map(Resolution::from_raw),
            video_compression: map.integer("video_compression")?,
            frame_rate: map.integer("frame_rate")?,
            privilege: map.integer("privilege")?,
            user_check: map.integer("user_check")?,
            speaker_volume: map.integer("speaker_volume")?,
            mic_volume: map.integer("mic_volume")?,
            wifi_signal_strength: map.integer("wifi_ss")?,
            show_time: map.integer("show_time")?,
            ddns_state: map.integer("ddns_state")?,
            email_state: map.integer("email_state")?,
            raw_battery,
            battery: raw_battery.map(BatteryLevel::from_raw),
            raw_charging,
            charging: raw_charging.map(ChargingState::from_raw),
            raw_head_position,
            head_position: raw_head_position.map(HeadPosition::from_raw),
            raw_ac_freq,
            ac_freq: raw_ac_freq.map(AcFrequency::from_raw),
        })
    }

    /// Obstacle bit of the report flags
    pub fn obstacle_detected(&self) -> bool {
        self.flags
            .map(|f| f.contains(ReportFlags::OBSTACLE_DETECTED))
            .unwrap_or(false)
    }
}

/// Report flags are a single byte; anything wider is malformed
fn decode_flags(raw: i64) -> Result<ReportFlags> {
    let byte = u8::try_from(raw).map_err(|_| {
        RovioError::MalformedResponse(format!("report flags {} do not fit in a byte", raw))
    })?;
    Ok(ReportFlags::from_bits_truncate(byte))
}
