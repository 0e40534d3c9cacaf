use std::collections::VecDeque;

use log::{debug, trace, warn};

use crate::{hexify, START_TOKEN};

const DEFAULT_MAX_PACKET_LEN: usize = 2048;

/// Splits a byte stream into raw packets on a start token
///
/// A packet runs from a start token up to, but excluding, the next one. So a
/// packet is only released once the following packet begins, or when
/// [`Framer::finish`] is called at the end of the input. Bytes received before
/// the first start token are discarded.
#[derive(Debug, Clone)]
pub struct Framer {
    separator: Vec<u8>,
    buffer: Vec<u8>,
    max_len: usize,
    ready: VecDeque<Vec<u8>>,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    /// Creates a new [`Framer`] splitting on [`START_TOKEN`]
    pub fn new() -> Self {
        Self::with_separator(START_TOKEN)
    }

    /// Creates a new [`Framer`] splitting on a custom token
    pub fn with_separator(separator: impl Into<Vec<u8>>) -> Self {
        Self {
            separator: separator.into(),
            buffer: Vec::new(),
            max_len: DEFAULT_MAX_PACKET_LEN,
            ready: VecDeque::new(),
        }
    }

    /// Sets the size above which a pending packet is dropped
    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn separator(&self) -> &[u8] {
        &self.separator
    }

    /// Bytes received since the last start token
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Queues one byte, returns a packet if that byte completed one
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        self.buffer.push(byte);

        if !self.buffer.ends_with(&self.separator) {
            if self.buffer.len() > self.max_len {
                warn!(
                    "Dropping {} bytes without a start token in sight",
                    self.buffer.len()
                );
                self.buffer.clear();
            }
            return None;
        }

        let body_len = self.buffer.len() - self.separator.len();
        if body_len == 0 {
            return None;
        }

        if self.buffer.starts_with(&self.separator) {
            let packet: Vec<u8> = self.buffer.drain(..body_len).collect();
            if packet.len() == self.separator.len() {
                // two tokens in a row, nothing in between
                return None;
            }
            trace!("Framed packet: {}", hexify(&packet));
            Some(packet)
        } else {
            // no start token ahead of this one, an incomplete packet
            let dropped: Vec<u8> = self.buffer.drain(..body_len).collect();
            debug!("Discarding incomplete packet: {}", hexify(&dropped));
            None
        }
    }

    /// Queues a chunk of bytes, completed packets are kept for [`Framer::next_packet`]
    pub fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if let Some(packet) = self.push(byte) {
                self.ready.push_back(packet);
            }
        }
    }

    /// Takes the oldest packet completed by [`Framer::extend`]
    pub fn next_packet(&mut self) -> Option<Vec<u8>> {
        self.ready.pop_front()
    }

    /// Flushes the pending bytes at the end of the input
    ///
    /// They are returned only if they start with the token and hold more than it.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let pending = std::mem::take(&mut self.buffer);
        if pending.starts_with(&self.separator) && pending.len() > self.separator.len() {
            Some(pending)
        } else {
            if !pending.is_empty() {
                debug!("Discarding trailing bytes: {}", hexify(&pending));
            }
            None
        }
    }

    /// Drops the pending bytes and any packet not yet taken
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.ready.clear();
    }
}
