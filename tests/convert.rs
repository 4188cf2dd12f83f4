//! End-to-end conversion tests built on hand-assembled ELF32 big-endian
//! m68k objects, covering the scenarios from the relocation/section
//! design notes.

struct ElfBuilder {
    sections: Vec<Section>,
}

struct Section {
    name: String,
    sh_type: u32,
    flags: u32,
    addr: u32,
    content: Option<Vec<u8>>,
    size_if_nobits: u32,
    link: u32,
    info: u32,
    entsize: u32,
}

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;
const SHT_RELA: u32 = 4;
const SHT_NOBITS: u32 = 8;
const SHF_WRITE: u32 = 0x1;
const SHF_ALLOC: u32 = 0x2;
const SHF_EXECINSTR: u32 = 0x4;

impl ElfBuilder {
    fn new() -> Self {
        ElfBuilder {
            sections: vec![Section {
                name: String::new(),
                sh_type: 0,
                flags: 0,
                addr: 0,
                content: None,
                size_if_nobits: 0,
                link: 0,
                info: 0,
                entsize: 0,
            }],
        }
    }

    fn text(mut self, name: &str, addr: u32, content: Vec<u8>) -> Self {
        self.sections.push(Section {
            name: name.to_string(),
            sh_type: SHT_PROGBITS,
            flags: SHF_ALLOC | SHF_EXECINSTR,
            addr,
            content: Some(content),
            size_if_nobits: 0,
            link: 0,
            info: 0,
            entsize: 0,
        });
        self
    }

    fn data(mut self, name: &str, addr: u32, content: Vec<u8>) -> Self {
        self.sections.push(Section {
            name: name.to_string(),
            sh_type: SHT_PROGBITS,
            flags: SHF_ALLOC | SHF_WRITE,
            addr,
            content: Some(content),
            size_if_nobits: 0,
            link: 0,
            info: 0,
            entsize: 0,
        });
        self
    }

    fn bss(mut self, name: &str, addr: u32, size: u32) -> Self {
        self.sections.push(Section {
            name: name.to_string(),
            sh_type: SHT_NOBITS,
            flags: SHF_ALLOC | SHF_WRITE,
            addr,
            content: None,
            size_if_nobits: size,
            link: 0,
            info: 0,
            entsize: 0,
        });
        self
    }

    fn rela(mut self, name: &str, target_section: u32, entries: Vec<(u32, u32, u32, i32)>) -> Self {
        let mut content = Vec::new();
        for (offset, symbol, kind, addend) in entries {
            content.extend_from_slice(&offset.to_be_bytes());
            content.extend_from_slice(&((symbol << 8) | kind).to_be_bytes());
            content.extend_from_slice(&(addend as u32).to_be_bytes());
        }
        self.sections.push(Section {
            name: name.to_string(),
            sh_type: SHT_RELA,
            flags: 0,
            addr: 0,
            content: Some(content),
            size_if_nobits: 0,
            link: 0,
            info: target_section,
            entsize: 12,
        });
        self
    }

    fn symtab(mut self, link: u32, symbols: Vec<(u32, u32, u8, u8, u16)>) -> Self {
        let mut content = Vec::new();
        for (name, value, bind_type, _unused, shndx) in symbols {
            content.extend_from_slice(&name.to_be_bytes());
            content.extend_from_slice(&value.to_be_bytes());
            content.extend_from_slice(&0u32.to_be_bytes()); // st_size
            content.push(bind_type);
            content.push(0); // st_other
            content.extend_from_slice(&shndx.to_be_bytes());
        }
        self.sections.push(Section {
            name: ".symtab".to_string(),
            sh_type: SHT_SYMTAB,
            flags: 0,
            addr: 0,
            content: Some(content),
            size_if_nobits: 0,
            link,
            info: 0,
            entsize: 16,
        });
        self
    }

    fn strtab(mut self, name: &str, names: &[&str]) -> Self {
        let mut content = vec![0u8];
        for n in names {
            content.extend_from_slice(n.as_bytes());
            content.push(0);
        }
        self.sections.push(Section {
            name: name.to_string(),
            sh_type: SHT_STRTAB,
            flags: 0,
            addr: 0,
            content: Some(content),
            size_if_nobits: 0,
            link: 0,
            info: 0,
            entsize: 0,
        });
        self
    }

    fn build(self) -> Vec<u8> {
        let mut shstrtab_content = vec![0u8];
        let mut name_offsets = Vec::new();
        for s in &self.sections {
            name_offsets.push(shstrtab_content.len() as u32);
            shstrtab_content.extend_from_slice(s.name.as_bytes());
            shstrtab_content.push(0);
        }
        let shstrndx = self.sections.len() as u16;

        let mut file = vec![0u8; 52];
        let mut section_records = Vec::new();
        for (i, s) in self.sections.iter().enumerate() {
            let offset = if let Some(content) = &s.content {
                let off = file.len() as u32;
                file.extend_from_slice(content);
                off
            } else {
                0
            };
            let size = s
                .content
                .as_ref()
                .map(|c| c.len() as u32)
                .unwrap_or(s.size_if_nobits);
            section_records.push((name_offsets[i], s, offset, size));
        }

        let shstrtab_off = file.len() as u32;
        file.extend_from_slice(&shstrtab_content);

        let shoff = file.len() as u32;
        for (name_off, s, offset, size) in &section_records {
            file.extend_from_slice(&name_off.to_be_bytes());
            file.extend_from_slice(&s.sh_type.to_be_bytes());
            file.extend_from_slice(&s.flags.to_be_bytes());
            file.extend_from_slice(&s.addr.to_be_bytes());
            file.extend_from_slice(&offset.to_be_bytes());
            file.extend_from_slice(&size.to_be_bytes());
            file.extend_from_slice(&s.link.to_be_bytes());
            file.extend_from_slice(&s.info.to_be_bytes());
            file.extend_from_slice(&4u32.to_be_bytes());
            file.extend_from_slice(&s.entsize.to_be_bytes());
        }
        // +1 for the shstrtab section itself, appended as a real section.
        let shnum = (self.sections.len() + 1) as u16;

        file[16..18].copy_from_slice(&1u16.to_be_bytes()); // e_type = ET_REL
        file[18..20].copy_from_slice(&4u16.to_be_bytes()); // e_machine = EM_68K
        file[20..24].copy_from_slice(&1u32.to_be_bytes());
        file[32..36].copy_from_slice(&shoff.to_be_bytes());
        file[40..42].copy_from_slice(&52u16.to_be_bytes());
        file[46..48].copy_from_slice(&40u16.to_be_bytes());
        file[48..50].copy_from_slice(&shnum.to_be_bytes());
        file[50..52].copy_from_slice(&shstrndx.to_be_bytes());
        file[0] = 0x7f;
        file[1] = b'E';
        file[2] = b'L';
        file[3] = b'F';
        file[4] = 1; // ELFCLASS32
        file[5] = 2; // ELFDATA2MSB

        // append the shstrtab section header last, since shstrndx points past self.sections.
        let mut shstrtab_header = Vec::new();
        shstrtab_header.extend_from_slice(&0u32.to_be_bytes());
        shstrtab_header.extend_from_slice(&SHT_STRTAB.to_be_bytes());
        shstrtab_header.extend_from_slice(&0u32.to_be_bytes());
        shstrtab_header.extend_from_slice(&0u32.to_be_bytes());
        shstrtab_header.extend_from_slice(&shstrtab_off.to_be_bytes());
        shstrtab_header.extend_from_slice(&(shstrtab_content.len() as u32).to_be_bytes());
        shstrtab_header.extend_from_slice(&0u32.to_be_bytes());
        shstrtab_header.extend_from_slice(&0u32.to_be_bytes());
        shstrtab_header.extend_from_slice(&1u32.to_be_bytes());
        shstrtab_header.extend_from_slice(&0u32.to_be_bytes());
        file.extend_from_slice(&shstrtab_header);

        file
    }
}

#[test]
fn scenario_s1_single_reloc() {
    let elf = ElfBuilder::new()
        .text(".text", 0, vec![0u8; 8])
        .rela(".rela.text", 1, vec![(4, 0, 1, 0)])
        .build();

    let xfile = elf2x68k::convert(&elf, false).unwrap();
    assert_eq!(&xfile[0..2], &[0x48, 0x55]);
    assert_eq!(u32::from_be_bytes(xfile[8..12].try_into().unwrap()), 0); // entry
    assert_eq!(u32::from_be_bytes(xfile[12..16].try_into().unwrap()), 8); // text
    assert_eq!(u32::from_be_bytes(xfile[16..20].try_into().unwrap()), 0); // data
    assert_eq!(u32::from_be_bytes(xfile[20..24].try_into().unwrap()), 0); // bss
    assert_eq!(u32::from_be_bytes(xfile[24..28].try_into().unwrap()), 2); // relocs
    assert_eq!(u32::from_be_bytes(xfile[28..32].try_into().unwrap()), 0); // symbols
    let body = &xfile[64..];
    assert_eq!(&body[8..10], &[0x00, 0x04]);
}

#[test]
fn scenario_s3_absolute_symbol_is_skipped() {
    let elf = ElfBuilder::new()
        .text(".text", 0, vec![0u8; 8])
        .rela(".rela.text", 1, vec![(4, 0, 1, 0)])
        .symtab(4, vec![(1, 0, 0, 0, 0xfff1)])
        .strtab(".strtab", &["abs_const"])
        .build();

    let xfile = elf2x68k::convert(&elf, false).unwrap();
    assert_eq!(u32::from_be_bytes(xfile[24..28].try_into().unwrap()), 0);
}

#[test]
fn bss_does_not_occupy_image_bytes_but_is_sized_in_header() {
    let elf = ElfBuilder::new()
        .text(".text", 0, vec![0xffu8; 4])
        .bss(".bss", 0x100, 0x40)
        .build();

    let xfile = elf2x68k::convert(&elf, false).unwrap();
    assert_eq!(u32::from_be_bytes(xfile[12..16].try_into().unwrap()), 4);
    assert_eq!(u32::from_be_bytes(xfile[20..24].try_into().unwrap()), 0x40);
    assert_eq!(xfile.len(), 64 + 4); // bss contributes no body bytes
}

#[test]
fn symbols_are_sorted_by_section_then_value_when_included() {
    let elf = ElfBuilder::new()
        .text(".text", 0, vec![0u8; 0x10])
        .data(".data", 0x10, vec![0u8; 0x10])
        .symtab(
            4,
            vec![
                (1, 0x18, 1 << 4, 0, 2), // global data symbol @ 0x18 (section idx 2 = .data)
                (10, 0x04, 1 << 4, 0, 1), // global text symbol @ 0x04 (section idx 1 = .text)
                (20, 0x00, 0, 0, 1),      // local text symbol @ 0x00
            ],
        )
        .strtab(".strtab", &["data_sym", "text_sym", "local_sym"])
        .build();

    let xfile = elf2x68k::convert(&elf, true).unwrap();
    let sym_len = u32::from_be_bytes(xfile[28..32].try_into().unwrap()) as usize;
    let body_start = 64 + 0x10 + 0x10;
    let symbols = &xfile[body_start..body_start + sym_len];

    // First record should be the local text symbol at value 0 (section=1, value=0).
    assert_eq!(symbols[0], 0x02); // local
    assert_eq!(symbols[1], 1); // text
    assert_eq!(u32::from_be_bytes(symbols[2..6].try_into().unwrap()), 0);
}

#[test]
fn rejects_non_68k_machine() {
    let mut elf = ElfBuilder::new().text(".text", 0, vec![0u8; 4]).build();
    elf[18..20].copy_from_slice(&0u16.to_be_bytes()); // EM_NONE
    let err = elf2x68k::convert(&elf, false).unwrap_err();
    assert!(matches!(err.kind(), elf2x68k::error::ErrorKind::InvalidInput(_)));
}

#[test]
fn empty_text_is_unlinkable() {
    let elf = ElfBuilder::new().data(".data", 0, vec![0u8; 4]).build();
    let err = elf2x68k::convert(&elf, false).unwrap_err();
    assert!(matches!(err.kind(), elf2x68k::error::ErrorKind::Unlinkable(_)));
}
