//! The byte-stream abstraction both the target and the client sides are
//! reduced to: a serial device, an outbound TCP connection, or a single
//! inbound TCP connection accepted once at startup.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A byte stream that can additionally have its read timeout adjusted.
/// Used only by the startup sync loop (§4.10); every other read on this
/// trait is meant to block indefinitely, which is why `set_timeout(None)`
/// maps to a day-long duration rather than an actual infinite wait --
/// `serialport` has no blocking sentinel of its own.
pub trait Transport: Read + Write + Send {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;
}

const EFFECTIVELY_BLOCKING: Duration = Duration::from_secs(24 * 60 * 60);

impl Transport for TcpStream {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.set_read_timeout(timeout)
    }
}

impl Transport for Box<dyn serialport::SerialPort> {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.as_mut()
            .set_timeout(timeout.unwrap_or(EFFECTIVELY_BLOCKING))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

impl Transport for Box<dyn Transport> {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        (**self).set_timeout(timeout)
    }
}

pub enum TargetSpec {
    Serial(String),
    TcpConnect(String),
    TcpListen(u16),
}

pub fn open_target(spec: &TargetSpec) -> Result<Box<dyn Transport>> {
    match spec {
        TargetSpec::Serial(path) => {
            let port = serialport::new(path.as_str(), 9_600)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .flow_control(serialport::FlowControl::None)
                .timeout(EFFECTIVELY_BLOCKING)
                .open()?;
            // `sync()` narrows this to a short retry timeout and widens it
            // back out once the target responds.
            Ok(Box::new(port))
        }
        TargetSpec::TcpConnect(addr) => {
            let stream = TcpStream::connect(addr)?;
            stream.set_nodelay(true)?;
            Ok(Box::new(stream))
        }
        TargetSpec::TcpListen(port) => {
            let listener = TcpListener::bind(("0.0.0.0", *port))?;
            log::info!("waiting for target to connect on port {}", port);
            let (stream, addr) = listener.accept()?;
            log::info!("target connected from {}", addr);
            stream.set_nodelay(true)?;
            Ok(Box::new(stream))
        }
    }
}

pub fn listen_for_client(port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    Ok(listener)
}

pub fn accept_client(listener: &TcpListener) -> Result<Box<dyn Transport>> {
    let (stream, addr) = listener.accept()?;
    log::info!("client connected from {}", addr);
    stream.set_nodelay(true)?;
    Ok(Box::new(stream))
}
