//! The top-level accept loop: syncs with the target once at startup, then
//! serially serves one client session at a time for the lifetime of the
//! process.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::dialect::Target;
use crate::error::Result;
use crate::framing::{ClientEvent, ClientLink};
use crate::session::Session;
use crate::transport::{self, TargetSpec, Transport};
use crate::translator::{self, Outcome};

pub struct BridgeConfig {
    pub target: TargetSpec,
    pub client_port: u16,
    pub prompt: char,
    pub verbose: bool,
}

/// Runs the bridge until `running` is cleared (by a SIGINT handler) or a
/// setup-level error occurs. Per-client protocol errors end that session
/// without stopping the process.
pub fn run(config: BridgeConfig, running: Arc<AtomicBool>) -> Result<()> {
    let target_io = transport::open_target(&config.target)?;
    let mut target = Target::new(target_io, config.prompt as u8);

    log::info!("syncing with target...");
    target.sync(Duration::from_secs(3))?;
    log::info!("target synced");

    let listener = transport::listen_for_client(config.client_port)?;
    log::info!("listening for clients on port {}", config.client_port);

    while running.load(Ordering::Relaxed) {
        let client_io = match transport::accept_client(&listener) {
            Ok(io) => io,
            Err(e) => {
                log::warn!("failed to accept client: {}", e);
                continue;
            }
        };
        serve_client(&mut target, client_io, &config);
    }
    Ok(())
}

fn serve_client<T: Read + Write>(
    target: &mut Target<T>,
    client_io: Box<dyn Transport>,
    config: &BridgeConfig,
) {
    let mut link = ClientLink::new(client_io);
    let mut session = Session::new(config.prompt as u8, config.verbose);

    loop {
        let event = match link.recv() {
            Ok(event) => event,
            Err(e) => {
                log::info!("client disconnected: {}", e);
                break;
            }
        };

        let packet = match event {
            ClientEvent::Break => vec![0x03],
            ClientEvent::Packet(p) => p,
        };

        if config.verbose {
            log::trace!("<- {}", escape(&packet));
        }

        match translator::handle_packet(target, &mut session, &packet) {
            Ok(Outcome::Reply(reply)) => {
                if config.verbose {
                    log::trace!("-> {}", escape(&reply));
                }
                if let Err(e) = link.send(&reply) {
                    log::info!("client write failed: {}", e);
                    break;
                }
            }
            Ok(Outcome::ReplyAndClose(reply)) => {
                let _ = link.send(&reply);
                break;
            }
            Ok(Outcome::Close) => break,
            Err(e) => {
                log::warn!("target interaction failed: {}", e);
                break;
            }
        }
    }

    session.slots.clear_all();
}

/// Escapes bytes `< 0x20` (other than `\n`) as `\xHH`, for the `-v` traffic dump.
fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b == b'\n' || (0x20..0x7f).contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{:02x}", b));
        }
    }
    out
}
