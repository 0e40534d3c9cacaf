use nom::{
    bytes::complete::{tag, take},
    combinator::{all_consuming, map},
    multi::length_count,
    number::complete::{le_i16, le_u16, le_u32, le_u8},
    sequence::tuple,
    Finish, IResult,
};

use crate::{crc16, protocol::*, valid_crc16, Error};

/// Centimeters as sent by the beacon into meters
fn meters(input: &[u8]) -> IResult<&[u8], f64> {
    map(le_i16, |cm| cm as f64 / 100.0)(input)
}

fn coordinates(input: &[u8]) -> IResult<&[u8], (f64, f64, f64)> {
    tuple((meters, meters, meters))(input)
}

fn data_code(input: &[u8]) -> IResult<&[u8], DataCode> {
    let (input, code) = le_u16(input)?;
    Ok((input, code.into()))
}

/// Parse the 5 bytes preceding the payload
///
/// Fails unless the packet starts with [`START_TOKEN`]
pub fn header(input: &[u8]) -> IResult<&[u8], Header> {
    let (input, token) = tag(&START_TOKEN[..])(input)?;
    let (input, code) = data_code(input)?;
    let (input, data_size) = le_u8(input)?;

    Ok((
        input,
        Header {
            address: token[0],
            packet_type: token[1],
            code,
            data_size,
        },
    ))
}

/// Parse a hedgehog position payload
///
/// Bytes after the flags are reserved and left unconsumed
pub fn position(input: &[u8]) -> IResult<&[u8], Position> {
    let (input, timestamp) = le_u32(input)?;
    let (input, (x, y, z)) = coordinates(input)?;
    let (input, flags) = le_u8(input)?;

    Ok((
        input,
        Position {
            timestamp,
            x,
            y,
            z,
            flags,
        },
    ))
}

/// Parse a single 8 bytes beacon record
pub fn beacon_status(input: &[u8]) -> IResult<&[u8], BeaconStatus> {
    let (input, address) = le_u8(input)?;
    let (input, (x, y, z)) = coordinates(input)?;
    let (input, reserved) = le_u8(input)?;

    Ok((
        input,
        BeaconStatus {
            address,
            x,
            y,
            z,
            reserved,
        },
    ))
}

/// Parse a frozen map payload: a beacon count followed by the beacons
pub fn beacons(input: &[u8]) -> IResult<&[u8], Vec<BeaconStatus>> {
    length_count(le_u8, beacon_status)(input)
}

/// Split a packet into header, payload and trailing CRC
///
/// The CRC is not verified here, see [`parse_packet`]
pub fn frame(input: &[u8]) -> IResult<&[u8], (Header, &[u8], u16)> {
    let (input, header) = header(input)?;
    let (input, payload) = take(header.data_size)(input)?;
    let (input, crc16) = le_u16(input)?;
    Ok((input, (header, payload, crc16)))
}

/// Parse one raw packet as produced by the [`Framer`][crate::Framer]
///
/// It does 3 main checks:
/// - The packet ends with a valid CRC16
/// - The data code is one of [`DataCode::Position`] or [`DataCode::Beacons`]
/// - The header and payload are complete
pub fn parse_packet(raw: &[u8]) -> Result<Packet, Error> {
    if !valid_crc16(raw) {
        let body = &raw[..raw.len().saturating_sub(2)];
        return Err(Error::InvalidCrc {
            packet: raw.to_vec(),
            crc: crc16(body),
        });
    }

    let malformed = |e: nom::error::Error<&[u8]>| Error::Malformed {
        packet: raw.to_vec(),
        kind: e.code,
    };

    let (_, (header, payload, _crc16)) = all_consuming(frame)(raw).finish().map_err(malformed)?;
    let packet = match header.code {
        DataCode::Position => Packet::Position(position(payload).finish().map_err(malformed)?.1),
        DataCode::Beacons => Packet::Beacons(beacons(payload).finish().map_err(malformed)?.1),
        DataCode::Unknown(code) => {
            return Err(Error::UnknownDataCode {
                packet: raw.to_vec(),
                code,
            })
        }
    };

    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITION: &str = "FF47010010001900007B0038FE4E00000000000000BA39";
    const BEACONS: &str = "FF4702001102026400C800000000036AFF00001900001A10";

    #[test]
    fn parse_header() {
        let input = hex::decode("FF47010010").unwrap();
        let (input, header) = header(&input).unwrap();
        assert_eq!(input, &[]);
        assert_eq!(
            header,
            Header {
                address: 0xFF,
                packet_type: 0x47,
                code: DataCode::Position,
                data_size: 16,
            }
        );
    }

    #[test]
    fn parse_header_wrong_token() {
        let input = hex::decode("FF48010010").unwrap();
        assert!(header(&input).is_err());
    }

    #[test]
    fn parse_position() {
        let input = hex::decode("001900007B0038FE4E0000").unwrap();
        let (input, position) = position(&input).unwrap();
        assert_eq!(input, &[]);
        assert_eq!(
            position,
            Position {
                timestamp: 6400,
                x: 1.23,
                y: -4.56,
                z: 0.78,
                flags: 0,
            }
        );
        assert_eq!(position.seconds(), 100.0);
        assert_eq!(position.elapsed(), chrono::Duration::seconds(100));
    }

    #[test]
    fn parse_beacon_status() {
        let input = hex::decode("036AFF0000190000").unwrap();
        let (input, beacon) = beacon_status(&input).unwrap();
        assert_eq!(input, &[]);
        assert_eq!(
            beacon,
            BeaconStatus {
                address: 3,
                x: -1.5,
                y: 0.0,
                z: 0.25,
                reserved: 0,
            }
        );
    }

    #[test]
    fn parse_frame() {
        let input = hex::decode(POSITION).unwrap();
        let (input, (header, payload, crc16)) = frame(&input).unwrap();
        assert_eq!(input, &[]);
        assert_eq!(header.code, DataCode::Position);
        assert_eq!(payload.len(), 16);
        assert_eq!(crc16, 0x39BA);
    }

    #[test]
    fn parse_position_packet() {
        let input = hex::decode(POSITION).unwrap();
        let packet = parse_packet(&input).unwrap();
        assert_eq!(
            packet,
            Packet::Position(Position {
                timestamp: 6400,
                x: 1.23,
                y: -4.56,
                z: 0.78,
                flags: 0,
            })
        );
        assert_eq!(packet.code(), DataCode::Position);
    }

    #[test]
    fn parse_beacons_packet() {
        let input = hex::decode(BEACONS).unwrap();
        let packet = Packet::try_from(&input[..]).unwrap();
        assert_eq!(
            packet,
            Packet::Beacons(vec![
                BeaconStatus {
                    address: 2,
                    x: 1.0,
                    y: 2.0,
                    z: 0.0,
                    reserved: 0,
                },
                BeaconStatus {
                    address: 3,
                    x: -1.5,
                    y: 0.0,
                    z: 0.25,
                    reserved: 0,
                },
            ])
        );
    }

    #[test]
    fn parse_packet_bad_crc() {
        let mut input = hex::decode(POSITION).unwrap();
        input[6] = 0x1A;
        match parse_packet(&input) {
            Err(Error::InvalidCrc { packet, crc }) => {
                assert_eq!(packet, input);
                assert_eq!(crc, crc16(&input[..input.len() - 2]));
                assert_ne!(crc, 0x39BA);
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn parse_packet_too_short_for_crc() {
        assert!(matches!(
            parse_packet(&[0xFF]),
            Err(Error::InvalidCrc { crc: 0xFFFF, .. })
        ));
    }

    #[test]
    fn parse_packet_unknown_code() {
        let input = hex::decode("FF4703000200013F78").unwrap();
        match parse_packet(&input) {
            Err(Error::UnknownDataCode { packet, code }) => {
                assert_eq!(packet, input);
                assert_eq!(code, 3);
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn parse_packet_truncated_payload() {
        // claims 16 bytes of payload but carries only 2
        let input = crate::append_crc16(hex::decode("FF470100100019").unwrap());
        assert!(matches!(
            parse_packet(&input),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn parse_packet_short_beacon_list() {
        // announces 2 beacons, carries 1
        let input = crate::append_crc16(hex::decode("FF4702000902026400C800000000").unwrap());
        assert!(matches!(
            parse_packet(&input),
            Err(Error::Malformed { .. })
        ));
    }
}
