//! The HudsonBug (DB.X) line-oriented command dialect: register dump and
//! set, memory dump and write, continue/step, and breakpoint set/clear.

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{Error, Result};

/// Canonical register order: D0-D7, A0-A7, SR, PC.
pub const REGISTER_COUNT: usize = 18;

fn register_name(index: usize) -> Option<&'static str> {
    const NAMES: [&str; REGISTER_COUNT] = [
        "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7", "a0", "a1", "a2", "a3", "a4", "a5", "a6",
        "a7", "sr", "pc",
    ];
    NAMES.get(index).copied()
}

pub struct Target<T> {
    pub(crate) io: T,
    prompt: u8,
}

impl<T: Read + Write> Target<T> {
    pub fn new(io: T, prompt: u8) -> Self {
        Target { io, prompt }
    }

    fn send_cmd(&mut self, cmd: &str) -> Result<()> {
        self.io.write_all(cmd.as_bytes())?;
        self.io.write_all(b"\r")?;
        Ok(())
    }

    fn read_until_prompt(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let mut at_line_start = true;
        loop {
            let mut byte = [0u8; 1];
            self.io.read_exact(&mut byte)?;
            let b = byte[0];
            if at_line_start && b == self.prompt {
                return Ok(String::from_utf8_lossy(&buf).into_owned());
            }
            at_line_start = b == b'\n' || b == b'\r';
            buf.push(b);
        }
    }

    fn read_until_byte(&mut self, terminator: u8) -> Result<String> {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            self.io.read_exact(&mut byte)?;
            if byte[0] == terminator {
                return Ok(String::from_utf8_lossy(&buf).into_owned());
            }
            buf.push(byte[0]);
        }
    }

    /// `x\r` — full register dump, tolerant of `PC:`/`PC=` and `SR:`/`SR=`.
    pub fn fetch_registers(&mut self) -> Result<[u32; REGISTER_COUNT]> {
        self.send_cmd("x")?;
        let text = self.read_until_prompt()?;
        parse_registers(&text)
    }

    /// `x <name>\r` interactive single-register set.
    pub fn set_register(&mut self, index: usize, value: u32) -> Result<()> {
        let name = register_name(index).ok_or_else(|| Error::protocol("register index out of range"))?;
        self.io.write_all(format!("x {}\r", name).as_bytes())?;
        self.read_until_byte(b'=')?;
        self.io.write_all(format!("{:08x}\r", value).as_bytes())?;
        self.read_until_prompt()?;
        Ok(())
    }

    /// `d <start> <end>\r` inclusive memory dump.
    pub fn dump_memory(&mut self, start: u32, end: u32) -> Result<Vec<u8>> {
        self.send_cmd(&format!("d {:x} {:x}", start, end))?;
        let text = self.read_until_prompt()?;
        let mut bytes = parse_dump(&text);
        let want = (end - start + 1) as usize;
        bytes.truncate(want);
        Ok(bytes)
    }

    /// Writes `data` at `addr`, choosing byte/word/long commands per the
    /// alignment strategy: align to 2 with a byte write if needed, align
    /// to 4 with a word write if needed, write as many longwords as fit,
    /// then a trailing word, then a trailing byte.
    pub fn write_memory(&mut self, mut addr: u32, mut data: &[u8]) -> Result<()> {
        if addr % 2 == 1 && !data.is_empty() {
            self.mem_write(addr, "mes", data[0] as u32)?;
            addr += 1;
            data = &data[1..];
        }
        if addr % 4 == 2 && data.len() >= 2 {
            let val = u16::from_be_bytes([data[0], data[1]]) as u32;
            self.mem_write(addr, "mew", val)?;
            addr += 2;
            data = &data[2..];
        }
        while data.len() >= 4 {
            let val = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
            self.mem_write(addr, "mel", val)?;
            addr += 4;
            data = &data[4..];
        }
        if data.len() >= 2 {
            let val = u16::from_be_bytes([data[0], data[1]]) as u32;
            self.mem_write(addr, "mew", val)?;
            addr += 2;
            data = &data[2..];
        }
        if !data.is_empty() {
            self.mem_write(addr, "mes", data[0] as u32)?;
        }
        Ok(())
    }

    fn mem_write(&mut self, addr: u32, op: &str, value: u32) -> Result<()> {
        self.send_cmd(&format!("{} {:x} {:x}", op, addr, value))?;
        self.read_until_prompt()?;
        Ok(())
    }

    /// `g=<addr>\r` — continue. Blocks until the target prompt reappears.
    pub fn go(&mut self, addr: u32) -> Result<()> {
        self.send_cmd(&format!("g={:x}", addr))?;
        self.read_until_prompt()?;
        Ok(())
    }

    /// `t=<addr>\r` — single step.
    pub fn step(&mut self, addr: u32) -> Result<()> {
        self.send_cmd(&format!("t={:x}", addr))?;
        self.read_until_prompt()?;
        Ok(())
    }

    /// `b<slot> <addr>\r` — set a breakpoint in a numbered slot.
    pub fn set_breakpoint(&mut self, slot: u8, addr: u32) -> Result<()> {
        self.send_cmd(&format!("b{} {:x}", slot, addr))?;
        self.read_until_prompt()?;
        Ok(())
    }

    /// `bc <slot>\r` — clear a breakpoint slot.
    pub fn clear_breakpoint(&mut self, slot: u8) -> Result<()> {
        self.send_cmd(&format!("bc {}", slot))?;
        self.read_until_prompt()?;
        Ok(())
    }
}

impl<T: crate::transport::Transport> Target<T> {
    /// Sends a bare carriage return and waits for the first prompt,
    /// retrying every `retry` interval until one arrives. The underlying
    /// transport is put back into blocking mode once sync succeeds, since
    /// every other exchange in the session is meant to block indefinitely.
    pub fn sync(&mut self, retry: Duration) -> Result<()> {
        self.io.set_timeout(Some(retry))?;
        let result = loop {
            if let Err(e) = self.send_cmd("") {
                break Err(e);
            }
            match self.read_until_prompt() {
                Ok(_) => break Ok(()),
                Err(e) => match e.kind() {
                    crate::error::ErrorKind::Io(io_err)
                        if io_err.kind() == std::io::ErrorKind::TimedOut
                            || io_err.kind() == std::io::ErrorKind::WouldBlock =>
                    {
                        log::warn!("target not responding yet, retrying in {:?}", retry);
                        continue;
                    }
                    _ => break Err(e),
                },
            }
        };
        self.io.set_timeout(None)?;
        result
    }
}

fn extract_hex_after(text: &str, needle_colon: &str, needle_eq: &str) -> Option<u32> {
    let pos = text
        .find(needle_colon)
        .map(|p| p + needle_colon.len())
        .or_else(|| text.find(needle_eq).map(|p| p + needle_eq.len()))?;
    let rest = &text[pos..];
    let hex_len = rest.chars().take_while(|c| c.is_ascii_hexdigit()).count();
    u32::from_str_radix(&rest[..hex_len], 16).ok()
}

fn parse_hex_words(s: &str) -> Vec<u32> {
    s.split_whitespace()
        .filter(|t| t.chars().all(|c| c.is_ascii_hexdigit()) && !t.is_empty())
        .filter_map(|t| u32::from_str_radix(t, 16).ok())
        .collect()
}

fn parse_registers(text: &str) -> Result<[u32; REGISTER_COUNT]> {
    let mut regs = [0u32; REGISTER_COUNT];
    regs[17] = extract_hex_after(text, "PC:", "PC=")
        .ok_or_else(|| Error::protocol("register dump missing PC"))?;
    regs[16] = extract_hex_after(text, "SR:", "SR=")
        .ok_or_else(|| Error::protocol("register dump missing SR"))?;

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix('D') {
            for (i, v) in parse_hex_words(rest.trim_start_matches(':')).into_iter().take(8).enumerate() {
                regs[i] = v;
            }
        } else if let Some(rest) = line.strip_prefix('A') {
            for (i, v) in parse_hex_words(rest.trim_start_matches(':')).into_iter().take(8).enumerate() {
                regs[8 + i] = v;
            }
        }
    }
    Ok(regs)
}

/// Parses memory-dump lines: skips the echoed command line, skips a
/// leading >=6 hex digit address token per line, and accepts only
/// 4-hex-digit tokens as data words, stopping at the first token that
/// isn't one (the start of the ASCII side column).
fn parse_dump(text: &str) -> Vec<u8> {
    let mut words = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if i == 0 {
            continue;
        }
        let mut tokens = line.split_whitespace().peekable();
        if let Some(first) = tokens.peek() {
            if first.len() >= 6 && first.chars().all(|c| c.is_ascii_hexdigit()) {
                tokens.next();
            }
        }
        for tok in tokens {
            if tok.len() == 4 && tok.chars().all(|c| c.is_ascii_hexdigit()) {
                words.push(u16::from_str_radix(tok, 16).unwrap());
            } else {
                break;
            }
        }
    }
    let mut bytes = Vec::with_capacity(words.len() * 2);
    for w in words {
        bytes.extend_from_slice(&w.to_be_bytes());
    }
    bytes
}
