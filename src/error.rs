use crate::hexify;

/// Errors raised while reading or decoding beacon packets
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The packet does not end with its own CRC16
    ///
    /// `crc` is the checksum computed over the packet without its trailer
    #[error("invalid CRC16 {crc:04X} for packet {}", hexify(packet))]
    InvalidCrc { packet: Vec<u8>, crc: u16 },

    /// The packet checksum is fine but its data code is not supported
    #[error("unexpected data code {code:#06X} for packet {}", hexify(packet))]
    UnknownDataCode { packet: Vec<u8>, code: u16 },

    /// The packet is shorter than its header or payload claims
    #[error("malformed packet {}: {kind:?}", hexify(packet))]
    Malformed {
        packet: Vec<u8>,
        kind: nom::error::ErrorKind,
    },

    /// No data arrived before the read timeout
    #[error("data unavailable")]
    Unavailable,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Raw packet the error refers to, if any
    pub fn packet(&self) -> Option<&[u8]> {
        match self {
            Self::InvalidCrc { packet, .. }
            | Self::UnknownDataCode { packet, .. }
            | Self::Malformed { packet, .. } => Some(packet),
            Self::Unavailable | Self::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
