//! X-file header and body assembly.

use crate::classify::Layout;
use crate::symtab::XSymbol;

/// Magic bytes `"HU"` that open every Human68k X-file header.
const MAGIC: [u8; 2] = [0x48, 0x55];

pub struct XFile {
    pub entry: u32,
    pub text: Vec<u8>,
    pub data: Vec<u8>,
    pub bss_size: u32,
    pub relocs: Vec<u8>,
    pub symbols: Vec<u8>,
}

/// Encodes one symbol record: `{location, section, value, name}`, where
/// the name field is NUL-padded to the smallest even length strictly
/// greater than the name's own length (so every record ends on a word
/// boundary and always carries at least one NUL).
fn encode_symbol(sym: &XSymbol, out: &mut Vec<u8>) {
    out.push(if sym.external { 0x00 } else { 0x02 });
    out.push(sym.section);
    out.extend_from_slice(&sym.value.to_be_bytes());
    let padded_len = (sym.name.len() + 1 + 1) & !1;
    out.extend_from_slice(&sym.name);
    out.resize(out.len() + (padded_len - sym.name.len()), 0);
}

pub fn encode_symbols(symbols: &[XSymbol]) -> Vec<u8> {
    let mut out = Vec::new();
    for sym in symbols {
        encode_symbol(sym, &mut out);
    }
    out
}

impl XFile {
    pub fn new(entry: u32, image: Vec<u8>, layout: &Layout, relocs: Vec<u8>, symbols: Vec<u8>) -> XFile {
        let text_size = layout.text_size() as usize;
        let (text, data) = image.split_at(text_size);
        XFile {
            entry,
            text: text.to_vec(),
            data: data.to_vec(),
            bss_size: layout.bss_size(),
            relocs,
            symbols,
        }
    }

    /// Serializes the 64-byte header followed by text, data, relocations,
    /// and symbols, in that order.
    pub fn write(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.body_len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&self.entry.to_be_bytes());
        out.extend_from_slice(&(self.text.len() as u32).to_be_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.bss_size.to_be_bytes());
        out.extend_from_slice(&(self.relocs.len() as u32).to_be_bytes());
        out.extend_from_slice(&(self.symbols.len() as u32).to_be_bytes());
        out.resize(64, 0);
        out.extend_from_slice(&self.text);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.relocs);
        out.extend_from_slice(&self.symbols);
        out
    }

    fn body_len(&self) -> usize {
        self.text.len() + self.data.len() + self.relocs.len() + self.symbols.len()
    }
}
