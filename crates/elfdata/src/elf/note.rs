//! ELF notes, the GNU build identifier and `.gnu_debuglink`.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use zerocopy::{BigEndian, ByteOrder, FromBytes, LittleEndian};

use super::ElfFile;
use crate::endian::RunTimeEndian;
use crate::raw::elf::{NoteHeader, SectionType, SegmentType, NOTE_NAME_GNU, NT_GNU_BUILD_ID};
use crate::Error;

/// A single note entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Note<'a> {
    /// The owner name without its NUL terminator.
    pub name: &'a [u8],
    pub kind: u32,
    pub desc: &'a [u8],
}

impl Note<'_> {
    pub fn is_build_id(&self) -> bool {
        self.kind == NT_GNU_BUILD_ID && self.name == NOTE_NAME_GNU
    }
}

/// An iterator over the notes of an ELF file.
///
/// Iteration stops after the first malformed note.
#[derive(Clone, Debug)]
pub struct Notes<'a> {
    endian: RunTimeEndian,
    blocks: Vec<(&'a [u8], usize)>,
    current: &'a [u8],
    align: usize,
    done: bool,
}

impl<'a> Notes<'a> {
    fn new(endian: RunTimeEndian, mut blocks: Vec<(&'a [u8], usize)>) -> Self {
        blocks.reverse();

        Self {
            endian,
            blocks,
            current: &[],
            align: 4,
            done: false,
        }
    }

    fn header(&self) -> Option<(u32, u32, u32)> {
        match self.endian {
            RunTimeEndian::Little => read_header::<LittleEndian>(self.current),
            RunTimeEndian::Big => read_header::<BigEndian>(self.current),
        }
    }

    fn parse_next(&mut self) -> Result<Note<'a>, Error> {
        let (namesz, descsz, kind) = self.header().ok_or(Error::TruncatedInput)?;
        let rest = &self.current[12..];

        let name_len = namesz as usize;
        let name_padded = padded(name_len, self.align).ok_or(Error::TruncatedInput)?;
        let desc_len = descsz as usize;
        let desc_padded = padded(desc_len, self.align).ok_or(Error::TruncatedInput)?;

        let name = rest.get(..name_len).ok_or(Error::TruncatedInput)?;
        let rest = rest.get(name_padded..).ok_or(Error::TruncatedInput)?;
        let desc = rest.get(..desc_len).ok_or(Error::TruncatedInput)?;

        // Padding after the final descriptor may be missing.
        self.current = rest.get(desc_padded..).unwrap_or(&[]);

        let name = match name.split_last() {
            Some((&0, name)) => name,
            _ => name,
        };

        Ok(Note { name, kind, desc })
    }
}

fn read_header<O: ByteOrder>(data: &[u8]) -> Option<(u32, u32, u32)> {
    let header = NoteHeader::<O>::read_from_prefix(data)?;
    Some((header.namesz.get(), header.descsz.get(), header.kind.get()))
}

fn padded(len: usize, align: usize) -> Option<usize> {
    len.checked_add(align - 1).map(|len| len & !(align - 1))
}

impl<'a> Iterator for Notes<'a> {
    type Item = Result<Note<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while self.current.is_empty() {
            let (block, align) = self.blocks.pop()?;
            self.current = block;
            self.align = align;
        }

        let note = self.parse_next();
        if note.is_err() {
            self.done = true;
        }

        Some(note)
    }
}

/// The contents of a `.gnu_debuglink` section.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DebugLink<'a> {
    /// The file name of the separate debug file.
    pub file_name: &'a [u8],
    /// The CRC32 of the separate debug file.
    pub crc: u32,
}

impl DebugLink<'_> {
    pub fn file_name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.file_name)
    }
}

/// Format a build identifier the way debuginfod and `file` print it:
/// lowercase hex, two digits per byte, no separators.
pub fn build_id_hex(id: &[u8]) -> String {
    let mut hex = String::with_capacity(id.len() * 2);
    for byte in id {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

impl<'a> ElfFile<'a> {
    /// Iterate over all notes in the file.
    ///
    /// Notes are read from `SHT_NOTE` sections. Files without section headers
    /// fall back to `PT_NOTE` segments.
    pub fn notes(&self) -> Result<Notes<'a>, Error> {
        let mut blocks = Vec::new();

        if self.sections().is_empty() {
            for segment in self.segments() {
                if segment.kind != SegmentType::NOTE {
                    continue;
                }

                let align = if segment.align == 8 { 8 } else { 4 };
                blocks.push((self.segment_data(segment)?, align));
            }
        } else {
            for section in self.sections_of_type(SectionType::NOTE) {
                let align = if section.align == 8 { 8 } else { 4 };
                blocks.push((self.section_data(section)?, align));
            }
        }

        Ok(Notes::new(self.endian(), blocks))
    }

    /// The GNU build identifier of this file, if it has one.
    pub fn build_id(&self) -> Result<Option<&'a [u8]>, Error> {
        for note in self.notes()? {
            let note = note?;
            if note.is_build_id() {
                return Ok(Some(note.desc));
            }
        }

        Ok(None)
    }

    /// The name and checksum of the separate debug file, read from
    /// `.gnu_debuglink`.
    pub fn debug_link(&self) -> Result<Option<DebugLink<'a>>, Error> {
        let data = match self.section_data_by_name(".gnu_debuglink")? {
            Some(data) => data,
            None => return Ok(None),
        };

        let mut cursor = self.cursor(data);
        let file_name = cursor.read_cstring()?;
        let aligned = padded(cursor.position(), 4).ok_or(Error::TruncatedInput)?;
        cursor.seek(aligned)?;
        let crc = cursor.read_u32()?;

        Ok(Some(DebugLink { file_name, crc }))
    }
}
