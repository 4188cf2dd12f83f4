//! Translates one client packet into a sequence of HudsonBug target
//! commands and produces the reply packet.

use std::io::{Read, Write};

use crate::dialect::Target;
use crate::error::Result;
use crate::session::Session;

/// `None` means the session should end after this reply is sent (or, for
/// `k`, without a reply at all).
pub enum Outcome {
    Reply(Vec<u8>),
    ReplyAndClose(Vec<u8>),
    Close,
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

fn parse_u32_hex(s: &str) -> Option<u32> {
    u32::from_str_radix(s, 16).ok()
}

pub fn handle_packet<T: Read + Write>(
    target: &mut Target<T>,
    session: &mut Session,
    packet: &[u8],
) -> Result<Outcome> {
    let text = String::from_utf8_lossy(packet);

    if packet.is_empty() {
        return Ok(Outcome::Reply(Vec::new()));
    }

    match packet[0] {
        b'?' => Ok(Outcome::Reply(b"S05".to_vec())),
        0x03 => Ok(Outcome::Reply(b"S05".to_vec())),

        b'g' => {
            ensure_registers(target, session)?;
            let hex: String = session.registers.get().iter().map(|r| format!("{:08x}", r)).collect();
            Ok(Outcome::Reply(hex.into_bytes()))
        }

        b'G' => {
            ensure_registers(target, session)?;
            let data = &text[1..];
            let old = *session.registers.get();
            for (index, old_value) in old.iter().enumerate() {
                let chunk = &data.get(index * 8..index * 8 + 8);
                if let Some(chunk) = chunk {
                    if let Some(new_value) = parse_u32_hex(chunk) {
                        if new_value != *old_value {
                            target.set_register(index, new_value)?;
                            session.registers.set_one(index, new_value);
                        }
                    }
                }
            }
            Ok(Outcome::Reply(b"OK".to_vec()))
        }

        b'p' => {
            let index = parse_u32_hex(&text[1..]).unwrap_or(u32::MAX) as usize;
            if index >= crate::dialect::REGISTER_COUNT {
                return Ok(Outcome::Reply(b"00000000".to_vec()));
            }
            ensure_registers(target, session)?;
            Ok(Outcome::Reply(
                format!("{:08x}", session.registers.get()[index]).into_bytes(),
            ))
        }

        b'P' => {
            let body = &text[1..];
            let Some((idx_str, val_str)) = body.split_once('=') else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            let index = parse_u32_hex(idx_str).unwrap_or(u32::MAX) as usize;
            let Some(value) = parse_u32_hex(val_str) else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            if index >= crate::dialect::REGISTER_COUNT {
                return Ok(Outcome::Reply(b"E01".to_vec()));
            }
            ensure_registers(target, session)?;
            target.set_register(index, value)?;
            session.registers.set_one(index, value);
            Ok(Outcome::Reply(b"OK".to_vec()))
        }

        b'm' => {
            let body = &text[1..];
            let Some((addr_str, len_str)) = body.split_once(',') else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            let (Some(addr), Some(len)) = (parse_u32_hex(addr_str), parse_u32_hex(len_str)) else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            if len == 0 {
                return Ok(Outcome::Reply(Vec::new()));
            }
            let bytes = target.dump_memory(addr, addr + len - 1)?;
            Ok(Outcome::Reply(hex_encode(&bytes).into_bytes()))
        }

        b'M' => {
            let body = &text[1..];
            let Some((head, data_hex)) = body.split_once(':') else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            let Some((addr_str, _len_str)) = head.split_once(',') else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            let (Some(addr), Some(data)) = (parse_u32_hex(addr_str), hex_decode(data_hex)) else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            target.write_memory(addr, &data)?;
            Ok(Outcome::Reply(b"OK".to_vec()))
        }

        b'c' => {
            let addr = match parse_u32_hex(&text[1..]) {
                Some(addr) => addr,
                None => {
                    ensure_registers(target, session)?;
                    pc_of(session)
                }
            };
            target.go(addr)?;
            session.registers.invalidate();
            Ok(Outcome::Reply(b"S05".to_vec()))
        }

        b's' => {
            let addr = match parse_u32_hex(&text[1..]) {
                Some(addr) => addr,
                None => {
                    ensure_registers(target, session)?;
                    pc_of(session)
                }
            };
            target.step(addr)?;
            session.registers.invalidate();
            Ok(Outcome::Reply(b"S05".to_vec()))
        }

        b'Z' => {
            if !packet.starts_with(b"Z0,") {
                return Ok(Outcome::Reply(Vec::new()));
            }
            let rest = &text[3..];
            let addr_str = rest.split(',').next().unwrap_or("");
            let Some(addr) = parse_u32_hex(addr_str) else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            match session.slots.alloc(addr) {
                Some(slot) => {
                    target.set_breakpoint(slot, addr)?;
                    Ok(Outcome::Reply(b"OK".to_vec()))
                }
                None => {
                    log::warn!("no free breakpoint slot for 0x{:08x}", addr);
                    Ok(Outcome::Reply(b"OK".to_vec()))
                }
            }
        }

        b'z' => {
            if !packet.starts_with(b"z0,") {
                return Ok(Outcome::Reply(Vec::new()));
            }
            let rest = &text[3..];
            let addr_str = rest.split(',').next().unwrap_or("");
            let Some(addr) = parse_u32_hex(addr_str) else {
                return Ok(Outcome::Reply(Vec::new()));
            };
            if let Some(slot) = session.slots.find(addr) {
                target.clear_breakpoint(slot)?;
                session.slots.free(slot);
            }
            Ok(Outcome::Reply(b"OK".to_vec()))
        }

        b'q' => Ok(Outcome::Reply(handle_query(&text))),

        b'H' => Ok(Outcome::Reply(b"OK".to_vec())),

        b'k' => {
            session.slots.clear_all();
            Ok(Outcome::Close)
        }

        b'D' => {
            session.slots.clear_all();
            Ok(Outcome::ReplyAndClose(b"OK".to_vec()))
        }

        _ => Ok(Outcome::Reply(Vec::new())),
    }
}

fn pc_of(session: &Session) -> u32 {
    session.registers.get()[17]
}

fn ensure_registers<T: Read + Write>(target: &mut Target<T>, session: &mut Session) -> Result<()> {
    if !session.registers.is_valid() {
        let regs = target.fetch_registers()?;
        session.registers.set(regs);
    }
    Ok(())
}

fn handle_query(text: &str) -> Vec<u8> {
    if text.starts_with("qSupported") {
        format!("PacketSize={:x}", crate::framing::MAX_PACKET_SIZE).into_bytes()
    } else if text == "qAttached" {
        b"1".to_vec()
    } else if text == "qfThreadInfo" {
        b"m1".to_vec()
    } else if text == "qsThreadInfo" {
        b"l".to_vec()
    } else if text == "qC" {
        b"QC1".to_vec()
    } else if text == "qOffsets" {
        b"Text=0;Data=0;Bss=0".to_vec()
    } else {
        Vec::new()
    }
}
