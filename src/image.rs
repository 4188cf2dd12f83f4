//! Image assembly: copies Text and Data section bytes into one contiguous
//! output buffer at the offsets implied by their linked addresses.

use crate::classify::{Class, Layout};
use crate::elf::SectionHeader;
use crate::error::{Error, Result};
use crate::reader::Reader;

pub struct OutputImage {
    pub bytes: Vec<u8>,
    pub layout: Layout,
}

/// Translate a linked address in `class` into an offset within [`OutputImage::bytes`].
pub fn image_offset(layout: &Layout, class: Class, addr: u32) -> Option<u32> {
    match class {
        Class::Text => {
            let (start, _) = layout.text?;
            Some(addr - start)
        }
        Class::Data => {
            let (start, _) = layout.data?;
            Some(layout.text_size() + (addr - start))
        }
        _ => None,
    }
}

pub fn assemble(
    data: Reader,
    sections: &[SectionHeader],
    classes: &[Class],
    layout: &Layout,
) -> Result<OutputImage> {
    let total = layout.text_size() + layout.data_size();
    let mut bytes = vec![0u8; total as usize];

    for (section, class) in sections.iter().zip(classes) {
        if !matches!(class, Class::Text | Class::Data) {
            continue;
        }
        let offset = image_offset(layout, *class, section.addr)
            .expect("layout was derived from this same section set");
        let end = offset
            .checked_add(section.size)
            .ok_or_else(|| Error::overflow("section size overflows u32"))?;
        if end as usize > bytes.len() {
            return Err(Error::overflow("section placement exceeds assembled image"));
        }
        let src = data.slice_at(section.offset as usize, section.size as usize)?;
        bytes[offset as usize..end as usize].copy_from_slice(src);
    }

    Ok(OutputImage {
        bytes,
        layout: *layout,
    })
}
