//! Devices the host can drive
//!
//! [`Target`] is either the in-process simulator or a robot reached over
//! TCP through the framed link. [`TcpStream`] adapts a non-blocking std
//! socket to the `embedded-io` traits the link is written against.

use std::io::{self, Read as _, Write as _};
use std::net::{self, SocketAddr, ToSocketAddrs};

use embedded_io::{ErrorType, Read, ReadReady, Write};
use log::info;

use opstate_core::state::{Command, DeviceSnapshot, OperatorAction};
use opstate_core::traits::Device;
use opstate_drivers::{LinkDevice, SimRobot};

use crate::config::HostError;

/// Non-blocking TCP stream
#[derive(Debug)]
pub struct TcpStream {
    inner: net::TcpStream,
}

impl TcpStream {
    pub fn new(inner: net::TcpStream) -> io::Result<Self> {
        inner.set_nonblocking(true)?;
        inner.set_nodelay(true)?;
        Ok(Self { inner })
    }

    pub fn connect(addr: &str) -> Result<Self, HostError> {
        let mut last = None;
        for candidate in addr.to_socket_addrs()? {
            match net::TcpStream::connect(candidate) {
                Ok(stream) => {
                    info!("Connected to robot at {}", candidate);
                    return Ok(Self::new(stream)?);
                }
                Err(e) => last = Some(e),
            }
        }
        Err(last
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address"))
            .into())
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }
}

impl ErrorType for TcpStream {
    type Error = io::Error;
}

impl Read for TcpStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self.inner.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            other => other,
        }
    }
}

impl ReadReady for TcpStream {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        let mut next = [0u8; 1];
        match self.inner.peek(&mut next) {
            // Orderly shutdown from the other end
            Ok(0) => Err(io::ErrorKind::ConnectionAborted.into()),
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Write for TcpStream {
    /// A full send buffer is reported as `WouldBlock` rather than waited out
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}

/// Device under test
#[derive(Debug)]
pub enum Target {
    Sim(SimRobot),
    Link(LinkDevice<TcpStream>),
}

impl Target {
    /// Bring the host's view of the device up to `now_ms`
    ///
    /// Called once per tick, before the engine reads a snapshot.
    pub fn refresh(&mut self, now_ms: u64) -> Result<(), HostError> {
        match self {
            Target::Sim(robot) => robot.advance(now_ms),
            Target::Link(link) => {
                link.poll()?;
                if let Some(e) = link.take_error() {
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Carry out an operator action, if the device is simulated
    ///
    /// Returns false when a person has to do it.
    pub fn perform(&mut self, action: OperatorAction) -> bool {
        match self {
            Target::Sim(robot) => {
                robot.perform(action);
                true
            }
            Target::Link(_) => false,
        }
    }
}

impl Device for Target {
    fn snapshot(&self) -> DeviceSnapshot {
        match self {
            Target::Sim(robot) => robot.snapshot(),
            Target::Link(link) => link.snapshot(),
        }
    }

    fn send_command(&mut self, command: Command) {
        match self {
            Target::Sim(robot) => robot.send_command(command),
            Target::Link(link) => link.send_command(command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opstate_core::config::DeviceFamily;
    use opstate_drivers::{RobotLink, SimTiming};
    use std::net::TcpListener;

    #[test]
    fn test_sim_target_performs_actions() {
        let mut target = Target::Sim(SimRobot::new(SimTiming::default(), DeviceFamily::Raven));
        target.refresh(0).unwrap();
        target.refresh(1_000).unwrap();
        assert!(target.perform(OperatorAction::HomeDevice));
        let snap = target.snapshot();
        assert!(snap.connected);
        assert!(snap.homed);
        assert!(snap.is_enabled());
    }

    #[test]
    fn test_link_target_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let host = TcpStream::connect(&addr).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        let mut robot = RobotLink::new(TcpStream::new(accepted).unwrap());
        let mut target = Target::Link(LinkDevice::new(host));

        assert!(!target.snapshot().connected);
        assert!(!target.perform(OperatorAction::HomeDevice));

        robot.publish(&DeviceSnapshot::powered_up()).unwrap();
        let mut connected = false;
        for _ in 0..100 {
            target.refresh(0).unwrap();
            if target.snapshot().connected {
                connected = true;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(connected);

        target.send_command(Command::Enable);
        let mut received = None;
        for _ in 0..100 {
            if let Some(command) = robot.poll_command().unwrap() {
                received = Some(command);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(received, Some(Command::Enable));
    }

    #[test]
    fn test_write_returns_when_peer_stops_reading() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let mut host = TcpStream::connect(&addr).unwrap();
        let (_idle, _) = listener.accept().unwrap();

        let chunk = [0u8; 64 * 1024];
        let mut last = Ok(0);
        for _ in 0..1024 {
            last = host.write(&chunk);
            if last.is_err() {
                break;
            }
        }
        assert_eq!(last.unwrap_err().kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_link_target_reports_full_send_buffer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let host = TcpStream::connect(&addr).unwrap();
        let (_idle, _) = listener.accept().unwrap();
        let mut target = Target::Link(LinkDevice::new(host));

        // The first failed write is held until the next refresh
        let mut failed = false;
        for _ in 0..400 {
            for _ in 0..10_000 {
                target.send_command(Command::Enable);
            }
            if target.refresh(0).is_err() {
                failed = true;
                break;
            }
        }
        assert!(failed);
    }
}
