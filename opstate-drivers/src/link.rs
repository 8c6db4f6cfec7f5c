//! Robot link over a byte stream
//!
//! [`LinkDevice`] is the host end: it implements [`Device`] by keeping the
//! newest status report received and framing commands back. [`RobotLink`] is
//! the robot end, used by adapters that bridge a robot onto the link.
//!
//! Both work over any `embedded-io` stream. Reads only happen when the
//! stream reports data ready, so polling never blocks.

use embedded_io::{Error as _, ErrorKind, Read, ReadReady, Write};

use opstate_core::state::{Command, DeviceSnapshot};
use opstate_core::traits::Device;
use opstate_protocol::{FrameError, FrameParser, LinkMessage, StatusReport};

/// Bytes pulled from the stream per read call
const READ_CHUNK: usize = 32;

/// Link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Underlying stream failed
    Io(ErrorKind),
    /// Bytes did not form a valid message
    Frame(FrameError),
    /// Valid message, wrong direction
    UnexpectedMessage,
}

impl From<FrameError> for LinkError {
    fn from(e: FrameError) -> Self {
        LinkError::Frame(e)
    }
}

fn io_error<E: embedded_io::Error>(e: E) -> LinkError {
    LinkError::Io(e.kind())
}

fn send_message<T: Write>(io: &mut T, message: LinkMessage) -> Result<(), LinkError> {
    let bytes = message.to_frame()?.encode_to_vec()?;
    let mut rest = bytes.as_slice();
    while !rest.is_empty() {
        let written = io.write(rest).map_err(io_error)?;
        if written == 0 {
            return Err(LinkError::Io(ErrorKind::Other));
        }
        rest = &rest[written..];
    }
    io.flush().map_err(io_error)
}

/// Host end of the link
#[derive(Debug)]
pub struct LinkDevice<T> {
    io: T,
    parser: FrameParser,
    latest: Option<StatusReport>,
    /// Frames dropped for bad framing or direction
    rejected: u32,
    /// First write failure since the last `take_error`
    error: Option<LinkError>,
}

impl<T: Read + Write + ReadReady> LinkDevice<T> {
    pub fn new(io: T) -> Self {
        Self {
            io,
            parser: FrameParser::new(),
            latest: None,
            rejected: 0,
            error: None,
        }
    }

    /// Read everything the stream has buffered
    ///
    /// Returns the number of status reports received. Malformed frames are
    /// counted and skipped; only stream failures are errors.
    pub fn poll(&mut self) -> Result<usize, LinkError> {
        let mut reports = 0;
        let mut buf = [0u8; READ_CHUNK];

        while self.io.read_ready().map_err(io_error)? {
            let n = self.io.read(&mut buf).map_err(io_error)?;
            if n == 0 {
                break;
            }
            for &byte in &buf[..n] {
                match self.parser.feed(byte) {
                    Ok(Some(frame)) => match LinkMessage::from_frame(&frame) {
                        Ok(LinkMessage::Status(report)) => {
                            self.latest = Some(report);
                            reports += 1;
                        }
                        Ok(LinkMessage::Command(_)) | Err(_) => self.rejected += 1,
                    },
                    Ok(None) => {}
                    Err(_) => self.rejected += 1,
                }
            }
        }

        Ok(reports)
    }

    /// The underlying stream
    pub fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Take the first command write failure, if any
    pub fn take_error(&mut self) -> Option<LinkError> {
        self.error.take()
    }
}

impl<T: Read + Write + ReadReady> Device for LinkDevice<T> {
    fn snapshot(&self) -> DeviceSnapshot {
        match self.latest {
            Some(report) => report.to_snapshot(),
            None => DeviceSnapshot::default(),
        }
    }

    fn send_command(&mut self, command: Command) {
        if let Err(e) = send_message(&mut self.io, LinkMessage::Command(command)) {
            self.error.get_or_insert(e);
        }
    }
}

/// Robot end of the link
#[derive(Debug)]
pub struct RobotLink<T> {
    io: T,
    parser: FrameParser,
}

impl<T: Read + Write + ReadReady> RobotLink<T> {
    pub fn new(io: T) -> Self {
        Self {
            io,
            parser: FrameParser::new(),
        }
    }

    pub fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    /// Send the robot's current state to the host
    pub fn publish(&mut self, snapshot: &DeviceSnapshot) -> Result<(), LinkError> {
        send_message(&mut self.io, LinkMessage::Status(StatusReport::from(*snapshot)))
    }

    /// Next command from the host, if one has fully arrived
    ///
    /// Reads a byte at a time so bytes after the command stay buffered in
    /// the stream.
    pub fn poll_command(&mut self) -> Result<Option<Command>, LinkError> {
        let mut byte = [0u8; 1];
        while self.io.read_ready().map_err(io_error)? {
            if self.io.read(&mut byte).map_err(io_error)? == 0 {
                break;
            }
            if let Some(frame) = self.parser.feed(byte[0])? {
                return match LinkMessage::from_frame(&frame)? {
                    LinkMessage::Command(command) => Ok(Some(command)),
                    LinkMessage::Status(_) => Err(LinkError::UnexpectedMessage),
                };
            }
        }
        Ok(None)
    }
}
