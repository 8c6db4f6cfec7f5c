//! Byte framing for the robot link
//!
//! ```text
//! START  0xAA
//! LENGTH payload length (0-64)
//! KIND   message kind
//! PAYLOAD
//! CHECKSUM XOR of LENGTH, KIND and every payload byte
//! ```
//!
//! The parser is fed one byte at a time and resynchronizes on the next
//! START byte after any error.

use heapless::Vec;

/// Synchronization byte that opens every frame
pub const FRAME_START: u8 = 0xAA;

/// Largest payload a frame may carry
pub const MAX_PAYLOAD_SIZE: usize = 64;

/// START + LENGTH + KIND + payload + CHECKSUM
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD_SIZE + 4;

/// Framing and message errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload longer than [`MAX_PAYLOAD_SIZE`]
    PayloadTooLarge,
    /// Trailing checksum does not match
    InvalidChecksum,
    /// LENGTH byte out of range
    InvalidLength,
    /// Output buffer cannot hold the encoded frame
    BufferTooSmall,
    /// KIND byte names no known message
    UnknownKind(u8),
    /// Payload does not decode as the message its kind announces
    InvalidPayload,
}

/// One frame on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: u8,
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

fn checksum(length: u8, kind: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(length ^ kind, |acc, b| acc ^ b)
}

impl Frame {
    pub fn new(kind: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { kind, payload })
    }

    /// Write the frame into `buffer`, returning the byte count
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let len = self.payload.len();
        let total = len + 4;
        if buffer.len() < total {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = FRAME_START;
        buffer[1] = len as u8;
        buffer[2] = self.kind;
        buffer[3..3 + len].copy_from_slice(&self.payload);
        buffer[3 + len] = checksum(len as u8, self.kind, &self.payload);
        Ok(total)
    }

    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    Length,
    Kind,
    Payload,
    Checksum,
}

/// Incremental frame decoder
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    length: u8,
    kind: u8,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            state: ParseState::Start,
            length: 0,
            kind: 0,
            payload: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.state = ParseState::Start;
        self.length = 0;
        self.kind = 0;
        self.payload.clear();
    }

    /// Feed one byte
    ///
    /// `Ok(Some(frame))` once a frame is complete, `Ok(None)` while more
    /// bytes are needed. On error the parser is already reset.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::Start => {
                if byte == FRAME_START {
                    self.state = ParseState::Length;
                }
            }
            ParseState::Length => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidLength);
                }
                self.length = byte;
                self.state = ParseState::Kind;
            }
            ParseState::Kind => {
                self.kind = byte;
                self.payload.clear();
                self.state = if self.length == 0 {
                    ParseState::Checksum
                } else {
                    ParseState::Payload
                };
            }
            ParseState::Payload => {
                // Length was bounded when it was read
                let _ = self.payload.push(byte);
                if self.payload.len() == self.length as usize {
                    self.state = ParseState::Checksum;
                }
            }
            ParseState::Checksum => {
                let expected = checksum(self.length, self.kind, &self.payload);
                if byte != expected {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }
                let frame = Frame {
                    kind: self.kind,
                    payload: core::mem::take(&mut self.payload),
                };
                self.reset();
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
