use std::fmt;

/// An error produced while bridging a client to the target debugger.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

#[derive(Debug)]
pub enum ErrorKind {
    Io(std::io::Error),
    Protocol(&'static str),
}

impl Error {
    pub(crate) fn protocol(msg: &'static str) -> Self {
        Error(Box::new(ErrorKind::Protocol(msg)))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ErrorKind::Io(e) => write!(f, "i/o error: {}", e),
            ErrorKind::Protocol(msg) => write!(f, "protocol violation: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.0 {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error(Box::new(ErrorKind::Io(e)))
    }
}

impl From<serialport::Error> for Error {
    fn from(e: serialport::Error) -> Self {
        Error(Box::new(ErrorKind::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            e,
        ))))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
