use std::fmt;

/// An error produced while reading an ELF object or assembling an X-file.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

#[derive(Debug)]
pub enum ErrorKind {
    InvalidInput(&'static str),
    Unlinkable(&'static str),
    Overflow(&'static str),
    Io(std::io::Error),
}

impl Error {
    pub(crate) fn invalid_input(msg: &'static str) -> Self {
        Error(Box::new(ErrorKind::InvalidInput(msg)))
    }

    pub(crate) fn unlinkable(msg: &'static str) -> Self {
        Error(Box::new(ErrorKind::Unlinkable(msg)))
    }

    pub(crate) fn overflow(msg: &'static str) -> Self {
        Error(Box::new(ErrorKind::Overflow(msg)))
    }

    /// The kind of error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ErrorKind::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            ErrorKind::Unlinkable(msg) => write!(f, "unlinkable input: {}", msg),
            ErrorKind::Overflow(msg) => write!(f, "section placement overflow: {}", msg),
            ErrorKind::Io(e) => write!(f, "i/o error: {}", e),
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

pub(crate) type Result<T> = std::result::Result<T, Error>;
