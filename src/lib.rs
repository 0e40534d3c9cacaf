#![doc = include_str!("../README.md")]
mod error;
mod framer;
mod protocol;
mod stream;
pub mod parser;

pub use error::*;
pub use framer::*;
pub use protocol::*;
pub use stream::*;

/// IBM CRC16 Algorithm, Modbus flavour
///
/// Uses 0xA001 polynomial (reflected 0x8005) starting from 0xFFFF, no final XOR
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        // only touches the low byte
        crc ^= byte as u16;
        for _bit in 0..8 {
            let carry = crc & 1;
            crc >>= 1;
            if carry != 0 {
                crc ^= 0xA001;
            }
        }
    }
    crc
}

/// Appends the [`crc16`] of `data` to it, low byte first
///
/// The checksum only covers the original bytes.
pub fn append_crc16(data: impl Into<Vec<u8>>) -> Vec<u8> {
    let mut data = data.into();
    let crc = crc16(&data);
    data.reserve(2);
    data.extend(crc.to_le_bytes());
    data
}

/// Checks that `data` ends with its own little-endian [`crc16`]
///
/// A buffer built by [`append_crc16`] always checksums to zero.
pub fn valid_crc16(data: &[u8]) -> bool {
    data.len() >= 2 && crc16(data) == 0
}

/// Human readable hex dump, e.g. `FF 47 01 00`
pub fn hexify(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
