//! Bridges a GDB remote-serial-protocol client to a HudsonBug (DB.X)
//! target debugger running on Human68k / m68k hardware or an emulator.

pub mod bridge;
pub mod dialect;
pub mod error;
pub mod framing;
pub mod session;
pub mod transport;
pub mod translator;

pub use error::Error;
