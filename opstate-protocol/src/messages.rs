//! Link messages
//!
//! The device reports its operating state; the host sends commands. Payloads
//! are postcard-encoded.

use serde::{Deserialize, Serialize};

use opstate_core::state::{Command, DeviceSnapshot, OperatingState};

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

/// Device -> host: operating state report
pub const KIND_STATUS: u8 = 0x01;
/// Host -> device: state transition request
pub const KIND_COMMAND: u8 = 0x20;

/// Operating state as reported over the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub state: OperatingState,
    pub homed: bool,
    pub homing: bool,
    pub busy: bool,
    pub estopped: bool,
}

impl From<DeviceSnapshot> for StatusReport {
    fn from(snapshot: DeviceSnapshot) -> Self {
        Self {
            state: snapshot.state,
            homed: snapshot.homed,
            homing: snapshot.homing,
            busy: snapshot.busy,
            estopped: snapshot.estopped,
        }
    }
}

impl StatusReport {
    /// Snapshot as seen by the host; a received report implies a link
    pub fn to_snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            state: self.state,
            homed: self.homed,
            homing: self.homing,
            busy: self.busy,
            estopped: self.estopped,
            connected: true,
        }
    }
}

/// Any message that travels over the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkMessage {
    Status(StatusReport),
    Command(Command),
}

impl LinkMessage {
    fn kind(&self) -> u8 {
        match self {
            LinkMessage::Status(_) => KIND_STATUS,
            LinkMessage::Command(_) => KIND_COMMAND,
        }
    }

    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        let used = match self {
            LinkMessage::Status(report) => postcard::to_slice(report, &mut buf),
            LinkMessage::Command(command) => postcard::to_slice(command, &mut buf),
        }
        .map_err(|_| FrameError::PayloadTooLarge)?;
        Frame::new(self.kind(), used)
    }

    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.kind {
            KIND_STATUS => postcard::from_bytes(&frame.payload)
                .map(LinkMessage::Status)
                .map_err(|_| FrameError::InvalidPayload),
            KIND_COMMAND => postcard::from_bytes(&frame.payload)
                .map(LinkMessage::Command)
                .map_err(|_| FrameError::InvalidPayload),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameParser;

    #[test]
    fn test_status_carries_modifiers() {
        let report = StatusReport {
            state: OperatingState::Enabled,
            homed: false,
            homing: true,
            busy: false,
            estopped: false,
        };
        let frame = LinkMessage::Status(report).to_frame().unwrap();
        assert_eq!(frame.kind, KIND_STATUS);

        let decoded = LinkMessage::from_frame(&frame).unwrap();
        let LinkMessage::Status(decoded) = decoded else {
            panic!("expected status, got {:?}", decoded);
        };
        let snapshot = decoded.to_snapshot();
        assert!(snapshot.connected);
        assert!(snapshot.homing);
        assert!(snapshot.is_enabled());
    }

    #[test]
    fn test_command_through_parser() {
        let bytes = LinkMessage::Command(Command::Unhome)
            .to_frame()
            .unwrap()
            .encode_to_vec()
            .unwrap();

        let mut parser = FrameParser::new();
        let mut parsed = None;
        for &byte in bytes.iter() {
            if let Some(frame) = parser.feed(byte).unwrap() {
                parsed = Some(frame);
            }
        }
        let frame = parsed.unwrap();
        assert_eq!(frame.kind, KIND_COMMAND);
        assert_eq!(
            LinkMessage::from_frame(&frame),
            Ok(LinkMessage::Command(Command::Unhome))
        );
    }

    #[test]
    fn test_unknown_kind() {
        let frame = Frame::new(0x7F, &[]).unwrap();
        assert_eq!(
            LinkMessage::from_frame(&frame),
            Err(FrameError::UnknownKind(0x7F))
        );
    }

    #[test]
    fn test_truncated_payload() {
        let frame = Frame::new(KIND_STATUS, &[1]).unwrap();
        assert_eq!(
            LinkMessage::from_frame(&frame),
            Err(FrameError::InvalidPayload)
        );
    }
}
