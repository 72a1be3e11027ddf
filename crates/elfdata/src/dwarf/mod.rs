//! DWARF debugging information.
//!
//! [`Dwarf`] bundles the debug sections of a file. Units are decoded through
//! [`Dwarf::units`], each one owning its tree of DIEs and, once attached, its
//! line number program.

use core::fmt;

use crate::cursor::Cursor;
use crate::elf::ElfFile;
use crate::endian::RunTimeEndian;
use crate::Error;

pub mod abbrev;
pub mod line;
mod ranges;
pub mod unit;

pub use self::abbrev::{AbbrevCache, AbbrevTable, Abbreviation, AttrSpec};
pub use self::line::{FileEntry, LineProgram, LineProgramHeader, LineRow, LineSequence};
pub use self::unit::{AttrValue, Attribute, Die, Function, Unit, UnitHeader, Variable};

/// Whether a unit or line program uses 32-bit or 64-bit section offsets.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Format {
    Dwarf32,
    Dwarf64,
}

impl Format {
    /// The size of a section offset in bytes.
    pub fn offset_size(self) -> u8 {
        match self {
            Self::Dwarf32 => 4,
            Self::Dwarf64 => 8,
        }
    }

    /// The size of the initial length field that selected this format.
    pub fn initial_length_size(self) -> u64 {
        match self {
            Self::Dwarf32 => 4,
            Self::Dwarf64 => 12,
        }
    }
}

/// Read the initial length field that starts units and line programs.
pub(crate) fn read_initial_length(cursor: &mut Cursor<'_>) -> Result<(u64, Format), Error> {
    match cursor.read_u32()? {
        0xFFFF_FFFF => Ok((cursor.read_u64()?, Format::Dwarf64)),
        // 0xFFFFFFF0 through 0xFFFFFFFE are reserved.
        length if length >= 0xFFFF_FFF0 => Err(Error::TruncatedInput),
        length => Ok((length.into(), Format::Dwarf32)),
    }
}

/// The DWARF sections of an ELF file.
///
/// Sections that are missing from the file are empty.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DwarfSections<'a> {
    pub debug_info: &'a [u8],
    pub debug_abbrev: &'a [u8],
    pub debug_str: &'a [u8],
    pub debug_line_str: &'a [u8],
    pub debug_str_offsets: &'a [u8],
    pub debug_addr: &'a [u8],
    pub debug_ranges: &'a [u8],
    pub debug_rnglists: &'a [u8],
    pub debug_line: &'a [u8],
}

impl<'a> DwarfSections<'a> {
    /// Look up the debug sections of `elf` by name.
    ///
    /// Compressed sections are not supported and are treated as missing.
    pub fn load(elf: &ElfFile<'a>) -> Result<Self, Error> {
        let load = |name: &str| -> Result<&'a [u8], Error> {
            let section = match elf.section_by_name(name) {
                Some(section) => section,
                None => return Ok(&[]),
            };

            if section.is_compressed() {
                log::warn!("skipping compressed debug section {name}");
                return Ok(&[]);
            }

            elf.section_data(section)
        };

        Ok(Self {
            debug_info: load(".debug_info")?,
            debug_abbrev: load(".debug_abbrev")?,
            debug_str: load(".debug_str")?,
            debug_line_str: load(".debug_line_str")?,
            debug_str_offsets: load(".debug_str_offsets")?,
            debug_addr: load(".debug_addr")?,
            debug_ranges: load(".debug_ranges")?,
            debug_rnglists: load(".debug_rnglists")?,
            debug_line: load(".debug_line")?,
        })
    }
}

/// The debug sections of a file along with its byte order.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Dwarf<'a> {
    pub sections: DwarfSections<'a>,
    pub endian: RunTimeEndian,
}

impl<'a> Dwarf<'a> {
    pub fn new(sections: DwarfSections<'a>, endian: RunTimeEndian) -> Self {
        Self { sections, endian }
    }

    pub fn load(elf: &ElfFile<'a>) -> Result<Self, Error> {
        Ok(Self::new(DwarfSections::load(elf)?, elf.endian()))
    }

    /// Whether the file has any debugging information entries.
    pub fn is_empty(&self) -> bool {
        self.sections.debug_info.is_empty()
    }

    /// Iterate over the units in `.debug_info`.
    pub fn units(&self) -> Units<'a> {
        Units {
            dwarf: *self,
            cache: AbbrevCache::new(),
            offset: 0,
            done: false,
        }
    }

    /// Decode the unit whose header starts at `offset`.
    pub fn unit_at(&self, offset: u64) -> Result<Unit<'a>, Error> {
        Unit::parse(self, &mut AbbrevCache::new(), offset)
    }
}

/// A unit that could not be decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitError {
    /// The offset of the unit header within `.debug_info`.
    pub offset: u64,
    pub error: Error,
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit at offset {:#x}: {}", self.offset, self.error)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// An iterator over the units of `.debug_info`.
///
/// A unit whose entries fail to decode is reported as an error and iteration
/// continues with the next unit. A header that cannot be read ends the
/// iteration since the position of the next unit is unknown.
#[derive(Clone, Debug)]
pub struct Units<'a> {
    dwarf: Dwarf<'a>,
    cache: AbbrevCache,
    offset: u64,
    done: bool,
}

impl<'a> Units<'a> {
    /// The abbreviation tables loaded so far.
    pub fn abbrev_cache(&self) -> &AbbrevCache {
        &self.cache
    }
}

impl<'a> Iterator for Units<'a> {
    type Item = Result<Unit<'a>, UnitError>;

    fn next(&mut self) -> Option<Self::Item> {
        let info = self.dwarf.sections.debug_info;
        if self.done || self.offset >= info.len() as u64 {
            return None;
        }

        let offset = self.offset;
        let header = match UnitHeader::parse(info, self.dwarf.endian, offset) {
            Ok(header) => header,
            Err(error) => {
                self.done = true;
                return Some(Err(UnitError { offset, error }));
            }
        };

        self.offset = header.end();

        let unit = Unit::from_header(&self.dwarf, &mut self.cache, header)
            .map_err(|error| UnitError { offset, error });

        Some(unit)
    }
}

impl core::iter::FusedIterator for Units<'_> {}
