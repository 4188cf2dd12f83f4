//! Optional symbol-table transformation (`-s`).

use crate::classify::Class;
use crate::elf::{self, SectionHeader, Symbol};
use crate::error::Result;
use crate::reader::Reader;

pub struct XSymbol {
    pub external: bool,
    pub section: u8,
    pub value: u32,
    pub name: Vec<u8>,
}

fn section_tag(class: Class) -> Option<u8> {
    match class {
        Class::Text => Some(1),
        Class::Data => Some(2),
        Class::Bss => Some(3),
        Class::None => None,
    }
}

/// Rewrites symbols into X-file form, dropping FILE/SECTION symbols, symbols
/// with no name, and symbols outside Text/Data/Bss. Sorted by (section,
/// value) to match the loader's expectations.
pub fn transform(
    r: Reader,
    symbols: &[Symbol],
    classes: &[Class],
    strtab: &SectionHeader,
) -> Result<Vec<XSymbol>> {
    let mut out = Vec::new();
    for sym in symbols {
        if sym.sym_type == elf::STT_FILE || sym.sym_type == elf::STT_SECTION {
            continue;
        }
        if sym.name == 0 {
            continue;
        }
        let class = classes
            .get(sym.shndx as usize)
            .copied()
            .unwrap_or(Class::None);
        let Some(section) = section_tag(class) else {
            continue;
        };
        let name = r.str_at(strtab.offset as usize + sym.name as usize)?;
        out.push(XSymbol {
            external: sym.bind != elf::STB_LOCAL,
            section,
            value: sym.value,
            name: name.to_vec(),
        });
    }
    out.sort_by_key(|s| (s.section, s.value));
    Ok(out)
}
