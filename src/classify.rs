//! Section classification: every allocated, non-zero-size section is
//! Text, Data, or Bss; everything else is None.

use crate::elf::SectionHeader;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Class {
    None,
    Text,
    Data,
    Bss,
}

pub fn classify(section: &SectionHeader) -> Class {
    if !section.is_alloc() || section.size == 0 {
        return Class::None;
    }
    if !section.has_content() {
        return Class::Bss;
    }
    if section.is_exec() {
        return Class::Text;
    }
    Class::Data
}

/// `[start, end)` address ranges of the Text, Data, and Bss classes,
/// computed as the min/max over every contributing section -- not file order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Layout {
    pub text: Option<(u32, u32)>,
    pub data: Option<(u32, u32)>,
    pub bss: Option<(u32, u32)>,
}

impl Layout {
    pub fn text_size(&self) -> u32 {
        self.text.map_or(0, |(s, e)| e - s)
    }
    pub fn data_size(&self) -> u32 {
        self.data.map_or(0, |(s, e)| e - s)
    }
    pub fn bss_size(&self) -> u32 {
        self.bss.map_or(0, |(s, e)| e - s)
    }
}

fn merge(range: &mut Option<(u32, u32)>, addr: u32, size: u32) {
    let end = addr + size;
    *range = Some(match *range {
        Some((s, e)) => (s.min(addr), e.max(end)),
        None => (addr, end),
    });
}

pub fn layout_of(sections: &[SectionHeader], classes: &[Class]) -> Result<Layout> {
    let mut layout = Layout::default();
    for (section, class) in sections.iter().zip(classes) {
        match class {
            Class::None => {}
            Class::Text => merge(&mut layout.text, section.addr, section.size),
            Class::Data => merge(&mut layout.data, section.addr, section.size),
            Class::Bss => merge(&mut layout.bss, section.addr, section.size),
        }
    }
    if layout.text.is_none() {
        return Err(Error::unlinkable("input has no TEXT section"));
    }
    Ok(layout)
}
