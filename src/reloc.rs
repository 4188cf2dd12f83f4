//! Relocation harvesting and the delta-encoded on-disk stream.

use crate::classify::{classify, Class, Layout};
use crate::elf::{self, SectionHeader};
use crate::image::image_offset;
use crate::error::Result;

/// Harvests every `R_68K_32` relocation in `relocs` that targets a Text or
/// Data section and whose referent symbol is not `SHN_ABS` (a constant),
/// and returns their sorted, deduplicated absolute offsets into the
/// assembled image.
pub fn harvest(
    sections: &[SectionHeader],
    symbols: &[elf::Symbol],
    layout: &Layout,
    relocs: &[(SectionHeader, Vec<elf::Rela>)],
) -> Result<Vec<u32>> {
    let classes: Vec<Class> = sections.iter().map(classify).collect();

    let mut offsets = Vec::new();
    for (rela_section, entries) in relocs {
        let target_idx = rela_section.info as usize;
        let target_class = classes
            .get(target_idx)
            .copied()
            .unwrap_or(Class::None);
        if !matches!(target_class, Class::Text | Class::Data) {
            continue;
        }
        for rela in entries {
            if rela.kind != elf::R_68K_32 {
                continue;
            }
            if let Some(sym) = symbols.get(rela.symbol as usize) {
                if sym.shndx == elf::SHN_ABS {
                    continue;
                }
            }
            if let Some(offset) = image_offset(layout, target_class, rela.offset) {
                offsets.push(offset);
            }
        }
    }

    offsets.sort_unstable();
    let mut deduped = Vec::with_capacity(offsets.len());
    for offset in offsets {
        if deduped.last() == Some(&offset) {
            log::warn!("duplicate relocation offset 0x{:08x}, dropping", offset);
            continue;
        }
        deduped.push(offset);
    }
    Ok(deduped)
}

/// The odd 16-bit sentinel that marks the long (absolute-offset) form.
const LONG_FORM_MARKER: u16 = 0x0001;

/// Encodes sorted, distinct offsets as the delta stream the X-file loader
/// expects: a short form is a 16-bit big-endian delta from the previous
/// offset when that delta fits in 16 bits (it is always even, so its low
/// bit is free to use as the form discriminant); otherwise a long form
/// emits the odd marker `0x0001` followed by the 32-bit absolute offset.
///
/// The long form carries the absolute offset, not the delta -- encoding
/// an out-of-range delta instead would silently truncate whenever its
/// high 16 bits were even.
pub fn encode(offsets: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(offsets.len() * 2);
    let mut prev = 0u32;
    for &offset in offsets {
        let delta = offset - prev;
        if delta <= 0xFFFE {
            out.extend_from_slice(&(delta as u16).to_be_bytes());
        } else {
            out.extend_from_slice(&LONG_FORM_MARKER.to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
        }
        prev = offset;
    }
    out
}

/// Inverse of [`encode`], used by tests to verify the round trip.
pub fn decode(mut stream: &[u8]) -> Vec<u32> {
    let mut out = Vec::new();
    let mut prev = 0u32;
    while stream.len() >= 2 {
        let word = u16::from_be_bytes([stream[0], stream[1]]);
        stream = &stream[2..];
        if word & 1 == 0 {
            prev += word as u32;
        } else {
            let abs = u32::from_be_bytes([stream[0], stream[1], stream[2], stream[3]]);
            stream = &stream[4..];
            prev = abs;
        }
        out.push(prev);
    }
    out
}
