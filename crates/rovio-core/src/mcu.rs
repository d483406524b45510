//! MCU (motor controller) report decoding
//!
//! GetMCUReport answers with the usual `Cmd = nav` header followed by a
//! `responses = <hex>` line, where the hex string is the raw packet from the
//! motor controller:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0      | 1    | packet length |
//! | 2      | 1    | left wheel direction (bit 2) |
//! | 3      | 2    | left wheel encoder ticks |
//! | 5      | 1    | right wheel direction (bit 2) |
//! | 6      | 2    | right wheel encoder ticks |
//! | 8      | 1    | rear wheel direction (bit 2) |
//! | 9      | 2    | rear wheel encoder ticks |
//! | 12     | 1    | head position |
//! | 13     | 1    | battery level |
//! | 14     | 1    | status bitfield |

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::{Result, RovioError};
use crate::response::RESPONSES_KEY;
use crate::telemetry::{BatteryLevel, HeadPosition};

/// Minimum packet size that covers every decoded field
pub const MCU_PACKET_LEN: usize = 15;

/// Obstacle bit in the status byte (and in the report's final nibble)
const OBSTACLE_MASK: u8 = 0x04;
const DIRECTION_MASK: u8 = 0x04;

bitflags! {
    /// Single-bit fields of the status byte (offset 14)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct McuStatus: u8 {
        const LIGHT_ON = 0x01;
        const IR_POWER_ON = 0x02;
        const IR_OBSTACLE = 0x04;
    }
}

/// Charger sub-field, bits 3..=5 of the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargerStatus {
    Idle,
    Completed,
    Charging,
    Error,
    Unknown(u8),
}

impl ChargerStatus {
    pub fn from_status_byte(status: u8) -> Self {
        match (status >> 3) & 0x07 {
            0x00 => Self::Idle,
            0x01 => Self::Completed,
            0x02 => Self::Charging,
            0x04 => Self::Error,
            other => Self::Unknown(other),
        }
    }
}

/// Rotation since the previous read for one wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelReading {
    /// Bit 2 of the direction byte
    pub reverse: bool,
    /// Encoder ticks since the previous read
    pub ticks: u16,
}

/// Field-by-field view of an MCU packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McuTelemetry {
    pub length: u8,
    pub left: WheelReading,
    pub right: WheelReading,
    pub rear: WheelReading,
    pub raw_head_position: u8,
    pub head_position: HeadPosition,
    pub raw_battery: u8,
    pub battery: BatteryLevel,
    pub status: McuStatus,
    pub charger: ChargerStatus,
}

impl McuTelemetry {
    pub fn obstacle(&self) -> bool {
        self.status.contains(McuStatus::IR_OBSTACLE)
    }
}

/// Raw MCU report as returned by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McuReport {
    hex: String,
}

impl McuReport {
    /// Extract the hex payload from a full GetMCUReport response body
    pub fn from_response_text(text: &str) -> Result<Self> {
        let payload = text
            .lines()
            .filter_map(|line| line.split_once('='))
            .find(|(key, _)| key.trim() == RESPONSES_KEY)
            .and_then(|(_, value)| value.split_whitespace().last())
            .ok_or_else(|| {
                RovioError::MalformedResponse("MCU report has no responses payload".to_string())
            })?;

        // A failed request carries a plain response code instead of a packet
        if payload.len() < MCU_PACKET_LEN * 2 {
            if let Ok(code) = payload.parse::<i64>() {
                if code == 0 {
                    return Err(RovioError::MalformedResponse(
                        "MCU report has SUCCESS but no packet".to_string(),
                    ));
                }
                return Err(RovioError::response(Command::GetMcuReport.name(), code));
            }
        }

        Self::from_hex(payload)
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RovioError::MalformedResponse(format!(
                "MCU report is not a hex string: '{}'",
                hex
            )));
        }
        Ok(Self {
            hex: hex.to_string(),
        })
    }

    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    /// Obstacle flag: bit 2 of the low nibble of the final byte
    pub fn obstacle(&self) -> bool {
        self.hex
            .chars()
            .last()
            .and_then(|c| c.to_digit(16))
            .map(|nibble| nibble as u8 & OBSTACLE_MASK != 0)
            .unwrap_or(false)
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.hex)
            .map_err(|e| RovioError::MalformedResponse(format!("MCU report hex: {}", e)))
    }

    /// Decode every documented field of the packet
    pub fn decode(&self) -> Result<McuTelemetry> {
        let data = self.bytes()?;
        if data.len() < MCU_PACKET_LEN {
            return Err(RovioError::MalformedResponse(format!(
                "MCU report too short: {} bytes, need {}",
                data.len(),
                MCU_PACKET_LEN
            )));
        }

        let wheel = |offset: usize| WheelReading {
            reverse: data[offset] & DIRECTION_MASK != 0,
            ticks: u16::from_be_bytes([data[offset + 1], data[offset + 2]]),
        };

        Ok(McuTelemetry {
            length: data[0],
            left: wheel(2),
            right: wheel(5),
            rear: wheel(8),
            raw_head_position: data[12],
            head_position: HeadPosition::from_raw(i64::from(data[12])),
            raw_battery: data[13],
            battery: BatteryLevel::from_raw(i64::from(data[13])),
            status: McuStatus::from_bits_truncate(data[14]),
            charger: ChargerStatus::from_status_byte(data[14]),
        })
    }
}
