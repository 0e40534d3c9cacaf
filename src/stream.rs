use std::io::{self, Read};

use log::warn;
#[cfg(feature = "tokio")]
use tokio::io::AsyncReadExt;

use crate::{hexify, parser::parse_packet, Error, Framer, Packet, Result};

const DEFAULT_READ_BUF_CAPACITY: usize = 256;
const DEFAULT_MAX_PACKET_LEN: usize = 2048;

/// Default baudrate of the beacon USB serial interface
pub const DEFAULT_BAUD: u32 = 115_200;

/// A wrapper around a byte source for reading Marvelmind beacon data.
///
/// Usually a serial port connected to a beacon or hedgehog, anything
/// implementing [`Read`] works as well (a capture file, a [`std::io::Cursor`]).
pub struct BeaconStream<S> {
    inner: S,
    framer: Framer,
    read_buf_capacity: usize,
    last_packet: Vec<u8>,
}

impl<S> BeaconStream<S> {
    /// Creates a new [`BeaconStream`] from an existing byte source.
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_READ_BUF_CAPACITY, DEFAULT_MAX_PACKET_LEN)
    }

    /// Creates a new [`BeaconStream`] with custom buffer capacities.
    ///
    /// `read_buf_capacity` bytes are requested per read, packets growing past
    /// `max_packet_len` are discarded.
    pub fn with_capacity(inner: S, read_buf_capacity: usize, max_packet_len: usize) -> Self {
        Self {
            inner,
            framer: Framer::new().max_len(max_packet_len),
            read_buf_capacity: read_buf_capacity.max(1),
            last_packet: Vec::new(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Last raw packet handed out, empty before the first one
    pub fn last_packet(&self) -> &[u8] {
        &self.last_packet
    }

    /// Forgets partially received data, e.g. after reconnecting
    pub fn reset(&mut self) {
        self.framer.clear();
        self.last_packet.clear();
    }

    fn release(&mut self, packet: Vec<u8>) -> Vec<u8> {
        self.last_packet.clone_from(&packet);
        packet
    }

    /// Handles the outcome of a read, `Ok(None)` means more data is needed
    fn on_read(&mut self, recv_buf: &[u8], result: io::Result<usize>) -> Result<Option<Vec<u8>>> {
        match result {
            Ok(0) => match self.framer.finish() {
                Some(packet) => Ok(Some(self.release(packet))),
                None => Err(io::Error::new(io::ErrorKind::ConnectionReset, "Connection closed").into()),
            },
            Ok(bytes_read) => {
                self.framer.extend(&recv_buf[..bytes_read]);
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Err(Error::Unavailable)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: Read> BeaconStream<S> {
    /// Reads the next raw packet, start token and CRC included.
    ///
    /// # Errors
    ///
    /// If the read times out, [`Error::Unavailable`] is returned; reading can be retried.
    ///
    /// If the source is exhausted and no packet is pending, an [`Error::Io`] of kind
    /// [`std::io::ErrorKind::ConnectionReset`] is returned.
    pub fn read_raw_packet(&mut self) -> Result<Vec<u8>> {
        let mut recv_buf = vec![0u8; self.read_buf_capacity];

        // Read bytes until a packet is complete
        loop {
            if let Some(packet) = self.framer.next_packet() {
                return Ok(self.release(packet));
            }

            let result = self.inner.read(&mut recv_buf);
            if let Some(packet) = self.on_read(&recv_buf, result)? {
                return Ok(packet);
            }
        }
    }

    /// Reads a raw packet, checks its CRC and decodes it.
    ///
    /// # Errors
    ///
    /// Same as [`BeaconStream::read_raw_packet`], plus the decoding errors of
    /// [`parse_packet`]. A packet error does not affect the following reads.
    pub fn read_packet(&mut self) -> Result<Packet> {
        let raw = self.read_raw_packet()?;
        parse_packet(&raw)
    }

    /// Iterates over the decoded packets.
    ///
    /// Bad packets and read timeouts are logged and skipped, the iteration
    /// ends on the first I/O error, which includes the end of the input.
    pub fn packets(&mut self) -> Packets<'_, S> {
        Packets { stream: self }
    }
}

#[cfg(feature = "serial")]
impl BeaconStream<Box<dyn serialport::SerialPort>> {
    /// Opens a serial port connected to a beacon, with a 1 s read timeout.
    pub fn open(port: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(port, baud)
            .timeout(std::time::Duration::from_secs(1))
            .open()
            .map_err(io::Error::from)?;
        Ok(Self::new(port))
    }
}

#[cfg(feature = "tokio")]
impl<S: AsyncReadExt + Unpin> BeaconStream<S> {
    /// Reads the next raw packet, start token and CRC included.
    ///
    /// # Errors
    ///
    /// See [`BeaconStream::read_raw_packet`].
    pub async fn read_raw_packet_async(&mut self) -> Result<Vec<u8>> {
        let mut recv_buf = vec![0u8; self.read_buf_capacity];

        // Read bytes until a packet is complete
        loop {
            if let Some(packet) = self.framer.next_packet() {
                return Ok(self.release(packet));
            }

            let result = self.inner.read(&mut recv_buf).await;
            if let Some(packet) = self.on_read(&recv_buf, result)? {
                return Ok(packet);
            }
        }
    }

    /// Reads a raw packet, checks its CRC and decodes it.
    ///
    /// # Errors
    ///
    /// See [`BeaconStream::read_packet`].
    pub async fn read_packet_async(&mut self) -> Result<Packet> {
        let raw = self.read_raw_packet_async().await?;
        parse_packet(&raw)
    }
}

/// Iterator returned by [`BeaconStream::packets`]
pub struct Packets<'a, S> {
    stream: &'a mut BeaconStream<S>,
}

impl<S: Read> Iterator for Packets<'_, S> {
    type Item = Packet;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stream.read_packet() {
                Ok(packet) => return Some(packet),
                Err(Error::Io(e)) => {
                    warn!("Port closed: {e}");
                    return None;
                }
                Err(e) => {
                    warn!("Packet error: {e}");
                    if let Some(packet) = e.packet() {
                        warn!("Packet: {}", hexify(packet));
                    }
                    if let Error::InvalidCrc { crc, .. } = e {
                        warn!("CRC16: {crc:04X}");
                    }
                }
            }
        }
    }
}
