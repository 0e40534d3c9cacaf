use chrono::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::parser::parse_packet;

/// Start token of every packet: destination address `0xFF` and packet type `0x47`
pub const START_TOKEN: [u8; 2] = [0xFF, 0x47];

/// Timestamp ticks per second
pub const TICKS_PER_SECOND: u32 = 64;

/// Identifies the payload carried by a packet
///
/// | Code   | Payload                 |
/// |--------|-------------------------|
/// | 0x0001 | Hedgehog [`Position`]   |
/// | 0x0002 | Frozen [`BeaconStatus`] |
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataCode {
    Position,
    Beacons,
    Unknown(u16),
}

impl From<u16> for DataCode {
    fn from(value: u16) -> Self {
        match value {
            0x0001 => Self::Position,
            0x0002 => Self::Beacons,
            other => Self::Unknown(other),
        }
    }
}

impl From<DataCode> for u16 {
    fn from(value: DataCode) -> Self {
        match value {
            DataCode::Position => 0x0001,
            DataCode::Beacons => 0x0002,
            DataCode::Unknown(other) => other,
        }
    }
}

/// Fixed part of every packet
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Header {
    pub address: u8,
    pub packet_type: u8,
    pub code: DataCode,
    /// Payload length in bytes
    pub data_size: u8,
}

/// Decoded beacon packet
///
/// Based on the Marvelmind beacon interface documentation
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Packet {
    /// The system is running and the hedgehog was located
    Position(Position),
    /// The map is frozen, status of every stationary beacon
    Beacons(Vec<BeaconStatus>),
}

impl Packet {
    pub fn code(&self) -> DataCode {
        match self {
            Self::Position(_) => DataCode::Position,
            Self::Beacons(_) => DataCode::Beacons,
        }
    }
}

impl<'a> TryFrom<&'a [u8]> for Packet {
    type Error = crate::Error;

    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        parse_packet(value)
    }
}

/// Hedgehog location at a certain point in time
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Beacon clock, 1/64 s per tick
    pub timestamp: u32,
    /// Meters
    pub x: f64,
    /// Meters
    pub y: f64,
    /// Meters
    pub z: f64,
    pub flags: u8,
}

impl Position {
    /// Timestamp in seconds
    pub fn seconds(&self) -> f64 {
        self.timestamp as f64 / TICKS_PER_SECOND as f64
    }

    /// Timestamp as a duration since the beacon clock origin
    pub fn elapsed(&self) -> Duration {
        // one tick is exactly 15625 us
        Duration::microseconds(self.timestamp as i64 * 1_000_000 / TICKS_PER_SECOND as i64)
    }
}

/// Stationary beacon location
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BeaconStatus {
    pub address: u8,
    /// Meters
    pub x: f64,
    /// Meters
    pub y: f64,
    /// Meters
    pub z: f64,
    pub reserved: u8,
}
