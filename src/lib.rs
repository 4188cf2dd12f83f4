//! Converts ELF32 big-endian m68k relocatable objects into Human68k
//! X-file executables.

pub mod classify;
pub mod elf;
pub mod error;
pub mod image;
pub mod reloc;
pub mod symtab;
pub mod xfile;

mod reader;

pub use error::Error;

use classify::{classify, Class};
use error::Result;
use reader::Reader;

/// Converts a whole ELF object (`input`) into X-file bytes.
///
/// `include_symbols` mirrors the `-s` CLI flag: when set, the X-file body
/// carries a trailing symbol table.
pub fn convert(input: &[u8], include_symbols: bool) -> Result<Vec<u8>> {
    let r = Reader::new(input);
    let header = elf::ElfHeader::parse(r)?;
    let sections = elf::read_section_headers(r, &header)?;

    let classes: Vec<Class> = sections.iter().map(classify).collect();
    let layout = classify::layout_of(&sections, &classes)?;

    log::info!(
        "text: 0x{:08x} bytes, data: 0x{:08x} bytes, bss: 0x{:08x} bytes",
        layout.text_size(),
        layout.data_size(),
        layout.bss_size(),
    );

    let assembled = image::assemble(r, &sections, &classes, &layout)?;

    let mut relocs = Vec::new();
    let mut symtab_section = None;
    for section in &sections {
        match section.sh_type {
            elf::SHT_RELA => {
                let entries = elf::read_relas(r, section)?;
                relocs.push((section.clone(), entries));
            }
            elf::SHT_SYMTAB => symtab_section = Some(section.clone()),
            _ => {}
        }
    }

    let symbols = match &symtab_section {
        Some(section) => elf::read_symbols(r, section)?,
        None => Vec::new(),
    };

    let offsets = reloc::harvest(&sections, &symbols, &layout, &relocs)?;
    log::info!("relocations: {}", offsets.len());
    let reloc_bytes = reloc::encode(&offsets);

    let symbol_bytes = if include_symbols {
        match &symtab_section {
            Some(symtab) => {
                let strtab = &sections[symtab.link as usize];
                let xsyms = symtab::transform(r, &symbols, &classes, strtab)?;
                xfile::encode_symbols(&xsyms)
            }
            None => Vec::new(),
        }
    } else {
        Vec::new()
    };

    let xfile = xfile::XFile::new(
        header.entry,
        assembled.bytes,
        &layout,
        reloc_bytes,
        symbol_bytes,
    );
    let bytes = xfile.write();
    log::info!("written x-file: {} bytes", bytes.len());
    Ok(bytes)
}
