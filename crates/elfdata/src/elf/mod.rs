//! The ELF container: file header, section headers and program headers.

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use zerocopy::FromBytes;

use crate::cursor::{string_at, Cursor};
use crate::endian::RunTimeEndian;
use crate::raw::elf::*;
use crate::Error;

mod note;

pub use self::note::{build_id_hex, DebugLink, Note, Notes};

/// Inspect the identification bytes of an ELF file.
///
/// Returns the class and byte order declared by the file. This only looks at
/// the first 16 bytes, so it is cheap enough to use for sniffing.
///
/// # Errors
/// - [`Error::InvalidMagic`] if the magic number or ELF version is wrong.
/// - [`Error::UnsupportedClass`] and [`Error::UnsupportedEncoding`] for
///   unknown class or data encoding bytes.
/// - [`Error::TruncatedInput`] if the input ends within the identification
///   bytes.
pub fn identify(data: &[u8]) -> Result<(Class, RunTimeEndian), Error> {
    if !data.starts_with(&MAGIC) {
        return match MAGIC.starts_with(data) {
            true => Err(Error::TruncatedInput),
            false => Err(Error::InvalidMagic),
        };
    }

    let ident = Ident::ref_from_prefix(data).ok_or(Error::TruncatedInput)?;

    match ident.class {
        Class::ELF32 | Class::ELF64 => (),
        class => return Err(Error::UnsupportedClass(class.0)),
    }

    let endian = match ident.data {
        Data::LSB => RunTimeEndian::Little,
        Data::MSB => RunTimeEndian::Big,
        data => return Err(Error::UnsupportedEncoding(data.0)),
    };

    if ident.version != EV_CURRENT {
        return Err(Error::InvalidMagic);
    }

    Ok((ident.class, endian))
}

/// The decoded ELF file header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileHeader {
    pub class: Class,
    pub endian: RunTimeEndian,
    pub os_abi: OsAbi,
    pub abi_version: u8,
    pub kind: FileType,
    pub machine: Machine,
    pub version: u32,
    pub entry: u64,
    pub phoff: u64,
    pub shoff: u64,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

impl FileHeader {
    pub fn is_64(&self) -> bool {
        self.class == Class::ELF64
    }

    /// The size in bytes of addresses and offsets in this file.
    pub fn word_size(&self) -> u8 {
        match self.is_64() {
            true => 8,
            false => 4,
        }
    }

    fn section_header_size(&self) -> usize {
        match self.is_64() {
            true => SHDR64_SIZE,
            false => SHDR32_SIZE,
        }
    }

    fn program_header_size(&self) -> usize {
        match self.is_64() {
            true => PHDR64_SIZE,
            false => PHDR32_SIZE,
        }
    }
}

/// A coarse classification of what a section holds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SectionKind {
    /// Executable instructions.
    Code,
    /// Initialized data that is loaded at runtime.
    Data,
    /// Zero-initialized data with no file contents.
    UninitializedData,
    StringTable,
    SymbolTable,
    /// DWARF debugging information.
    Debug,
    Note,
    Relocation,
    Dynamic,
    Other,
}

/// A single section header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Section {
    /// The position of this section within the section header table.
    pub index: usize,
    pub name: String,
    /// The offset of the name within the section name string table.
    pub name_offset: u32,
    pub kind: SectionType,
    pub flags: SectionFlags,
    pub address: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub align: u64,
    pub entry_size: u64,
}

impl Section {
    pub fn is_writable(&self) -> bool {
        self.flags.contains(SectionFlags::WRITE)
    }

    pub fn is_executable(&self) -> bool {
        self.flags.contains(SectionFlags::EXECINSTR)
    }

    pub fn is_allocated(&self) -> bool {
        self.flags.contains(SectionFlags::ALLOC)
    }

    pub fn is_compressed(&self) -> bool {
        self.flags.contains(SectionFlags::COMPRESSED)
    }

    /// Whether the section occupies bytes in the file.
    pub fn has_file_data(&self) -> bool {
        self.kind != SectionType::NOBITS && self.kind != SectionType::NULL
    }

    pub fn category(&self) -> SectionKind {
        if self.name.starts_with(".debug_") || self.name.starts_with(".zdebug_") {
            return SectionKind::Debug;
        }

        match self.kind {
            SectionType::SYMTAB | SectionType::DYNSYM => SectionKind::SymbolTable,
            SectionType::STRTAB => SectionKind::StringTable,
            SectionType::NOTE => SectionKind::Note,
            SectionType::REL | SectionType::RELA => SectionKind::Relocation,
            SectionType::DYNAMIC => SectionKind::Dynamic,
            SectionType::NOBITS => SectionKind::UninitializedData,
            SectionType::PROGBITS | SectionType::INIT_ARRAY | SectionType::FINI_ARRAY
                if self.is_executable() =>
            {
                SectionKind::Code
            }
            SectionType::PROGBITS
            | SectionType::INIT_ARRAY
            | SectionType::FINI_ARRAY
            | SectionType::PREINIT_ARRAY
                if self.is_allocated() =>
            {
                SectionKind::Data
            }
            _ => SectionKind::Other,
        }
    }

    /// The virtual address range covered by this section, if it is loaded.
    pub fn address_range(&self) -> Option<Range<u64>> {
        if !self.is_allocated() {
            return None;
        }

        Some(self.address..self.address.saturating_add(self.size))
    }

    pub fn contains_address(&self, address: u64) -> bool {
        self.address_range()
            .map_or(false, |range| range.contains(&address))
    }
}

/// A single program header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Segment {
    pub kind: SegmentType,
    pub flags: SegmentFlags,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub file_size: u64,
    pub mem_size: u64,
    pub align: u64,
}

impl Segment {
    pub fn is_readable(&self) -> bool {
        self.flags.contains(SegmentFlags::R)
    }

    pub fn is_writable(&self) -> bool {
        self.flags.contains(SegmentFlags::W)
    }

    pub fn is_executable(&self) -> bool {
        self.flags.contains(SegmentFlags::X)
    }

    pub fn address_range(&self) -> Range<u64> {
        self.vaddr..self.vaddr.saturating_add(self.mem_size)
    }

    pub fn file_range(&self) -> Range<u64> {
        self.offset..self.offset.saturating_add(self.file_size)
    }
}

/// A parsed ELF file.
///
/// Section and segment data is not copied; accessors return slices of the
/// buffer the file was parsed from.
#[derive(Clone, Debug)]
pub struct ElfFile<'a> {
    data: &'a [u8],
    header: FileHeader,
    sections: Vec<Section>,
    segments: Vec<Segment>,
    names: BTreeMap<String, usize>,
}

impl<'a> ElfFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        let (class, endian) = identify(data)?;
        let ident = Ident::ref_from_prefix(data).ok_or(Error::TruncatedInput)?;

        let word_size = match class {
            Class::ELF64 => 8,
            _ => 4,
        };

        let mut cursor = Cursor::new(data, endian, word_size);
        cursor.seek(16)?;

        let header = FileHeader {
            class,
            endian,
            os_abi: ident.os_abi,
            abi_version: ident.abi_version,
            kind: FileType(cursor.read_u16()?),
            machine: Machine(cursor.read_u16()?),
            version: cursor.read_u32()?,
            entry: cursor.read_word()?,
            phoff: cursor.read_word()?,
            shoff: cursor.read_word()?,
            flags: cursor.read_u32()?,
            ehsize: cursor.read_u16()?,
            phentsize: cursor.read_u16()?,
            phnum: cursor.read_u16()?,
            shentsize: cursor.read_u16()?,
            shnum: cursor.read_u16()?,
            shstrndx: cursor.read_u16()?,
        };

        let mut file = Self {
            data,
            header,
            sections: Vec::new(),
            segments: Vec::new(),
            names: BTreeMap::new(),
        };

        file.sections = file.parse_section_headers()?;
        file.name_sections()?;
        file.segments = file.parse_program_headers()?;

        log::debug!(
            "parsed {:?} {:?} file with {} sections and {} segments",
            file.header.class,
            file.header.endian,
            file.sections.len(),
            file.segments.len()
        );

        Ok(file)
    }

    /// A cursor over `data` configured with this file's byte order and word
    /// size.
    pub fn cursor(&self, data: &'a [u8]) -> Cursor<'a> {
        Cursor::new(data, self.header.endian, self.header.word_size())
    }

    fn table_range(&self, offset: u64, count: usize, entsize: usize) -> Result<Range<usize>, Error> {
        let start = usize::try_from(offset).map_err(|_| Error::TruncatedInput)?;
        let end = count
            .checked_mul(entsize)
            .and_then(|len| start.checked_add(len))
            .ok_or(Error::TruncatedInput)?;

        if end > self.data.len() {
            return Err(Error::TruncatedInput);
        }

        Ok(start..end)
    }

    fn parse_section_headers(&self) -> Result<Vec<Section>, Error> {
        let header = &self.header;
        if header.shoff == 0 {
            return Ok(Vec::new());
        }

        let entsize = usize::from(header.shentsize);
        if entsize < header.section_header_size() {
            if header.shnum == 0 && entsize == 0 {
                return Ok(Vec::new());
            }

            return Err(Error::TruncatedInput);
        }

        let mut count = usize::from(header.shnum);
        if count == 0 {
            // Extended numbering: the real count is stored in section 0.
            let range = self.table_range(header.shoff, 1, entsize)?;
            let first = self.parse_section_header(range.start, 0)?;

            count = usize::try_from(first.size).map_err(|_| Error::TruncatedInput)?;
        }

        let range = self.table_range(header.shoff, count, entsize)?;
        let mut sections = Vec::with_capacity(count);
        for index in 0..count {
            sections.push(self.parse_section_header(range.start + index * entsize, index)?);
        }

        Ok(sections)
    }

    fn parse_section_header(&self, offset: usize, index: usize) -> Result<Section, Error> {
        let mut cursor = self.cursor(self.data);
        cursor.seek(offset)?;

        let name_offset = cursor.read_u32()?;
        let kind = SectionType(cursor.read_u32()?);
        let flags = SectionFlags::from_bits_retain(cursor.read_word()?);
        let address = cursor.read_word()?;
        let offset = cursor.read_word()?;
        let size = cursor.read_word()?;
        let link = cursor.read_u32()?;
        let info = cursor.read_u32()?;
        let align = cursor.read_word()?;
        let entry_size = cursor.read_word()?;

        Ok(Section {
            index,
            name: String::new(),
            name_offset,
            kind,
            flags,
            address,
            offset,
            size,
            link,
            info,
            align,
            entry_size,
        })
    }

    /// The index of the section name string table, if there is one.
    pub fn shstrndx(&self) -> Option<usize> {
        let index = match self.header.shstrndx {
            SHN_UNDEF => return None,
            SHN_XINDEX => self.sections.first()?.link as usize,
            index => usize::from(index),
        };

        Some(index)
    }

    fn name_sections(&mut self) -> Result<(), Error> {
        if self.sections.is_empty() {
            return Ok(());
        }

        let index = match self.shstrndx() {
            Some(index) => index,
            None => return Ok(()),
        };

        let strtab = self
            .sections
            .get(index)
            .ok_or(Error::CorruptStringTable {
                offset: index as u64,
            })?;
        let table = self.section_data(strtab)?;

        let mut names = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let name = match section.name_offset {
                0 => String::new(),
                offset => String::from_utf8_lossy(string_at(table, offset.into())?).into_owned(),
            };
            names.push(name);
        }

        for (section, name) in self.sections.iter_mut().zip(names) {
            section.name = name;
        }

        for section in &self.sections {
            if section.name.is_empty() || self.names.contains_key(&section.name) {
                continue;
            }

            self.names.insert(section.name.to_owned(), section.index);
        }

        Ok(())
    }

    fn parse_program_headers(&self) -> Result<Vec<Segment>, Error> {
        let header = &self.header;
        if header.phoff == 0 || header.phnum == 0 {
            return Ok(Vec::new());
        }

        let entsize = usize::from(header.phentsize);
        if entsize < header.program_header_size() {
            return Err(Error::TruncatedInput);
        }

        let count = match header.phnum {
            PN_XNUM => match self.sections.first() {
                Some(section) => section.info as usize,
                None => usize::from(PN_XNUM),
            },
            count => usize::from(count),
        };

        let range = self.table_range(header.phoff, count, entsize)?;
        let mut segments = Vec::with_capacity(count);
        for index in 0..count {
            let mut cursor = self.cursor(self.data);
            cursor.seek(range.start + index * entsize)?;

            let segment = match header.is_64() {
                true => {
                    let kind = SegmentType(cursor.read_u32()?);
                    let flags = SegmentFlags::from_bits_retain(cursor.read_u32()?);

                    Segment {
                        kind,
                        flags,
                        offset: cursor.read_u64()?,
                        vaddr: cursor.read_u64()?,
                        paddr: cursor.read_u64()?,
                        file_size: cursor.read_u64()?,
                        mem_size: cursor.read_u64()?,
                        align: cursor.read_u64()?,
                    }
                }
                false => {
                    let kind = SegmentType(cursor.read_u32()?);
                    let offset = cursor.read_u32()?.into();
                    let vaddr = cursor.read_u32()?.into();
                    let paddr = cursor.read_u32()?.into();
                    let file_size = cursor.read_u32()?.into();
                    let mem_size = cursor.read_u32()?.into();
                    let flags = SegmentFlags::from_bits_retain(cursor.read_u32()?);
                    let align = cursor.read_u32()?.into();

                    Segment {
                        kind,
                        flags,
                        offset,
                        vaddr,
                        paddr,
                        file_size,
                        mem_size,
                        align,
                    }
                }
            };

            segments.push(segment);
        }

        Ok(segments)
    }

    /// The raw bytes the file was parsed from.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn class(&self) -> Class {
        self.header.class
    }

    pub fn endian(&self) -> RunTimeEndian {
        self.header.endian
    }

    pub fn machine(&self) -> Machine {
        self.header.machine
    }

    pub fn entry(&self) -> u64 {
        self.header.entry
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Find a section by name.
    ///
    /// If several sections share a name the first one in the section header
    /// table is returned.
    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.names.get(name).and_then(|&index| self.sections.get(index))
    }

    /// An iterator over the sections of the given type.
    pub fn sections_of_type(&self, kind: SectionType) -> impl Iterator<Item = &Section> + '_ {
        self.sections.iter().filter(move |section| section.kind == kind)
    }

    /// The first section whose address range contains `address`.
    pub fn section_containing(&self, address: u64) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.contains_address(address))
    }

    /// The contents of a section.
    ///
    /// Sections without file data (`SHT_NOBITS` and the null section) yield an
    /// empty slice.
    pub fn section_data(&self, section: &Section) -> Result<&'a [u8], Error> {
        if !section.has_file_data() {
            return Ok(&[]);
        }

        self.file_bytes(section.offset, section.size)
    }

    /// The contents of a section, looked up by name.
    pub fn section_data_by_name(&self, name: &str) -> Result<Option<&'a [u8]>, Error> {
        match self.section_by_name(name) {
            Some(section) => self.section_data(section).map(Some),
            None => Ok(None),
        }
    }

    /// The bytes of a segment that are backed by the file.
    pub fn segment_data(&self, segment: &Segment) -> Result<&'a [u8], Error> {
        self.file_bytes(segment.offset, segment.file_size)
    }

    fn file_bytes(&self, offset: u64, size: u64) -> Result<&'a [u8], Error> {
        let start = usize::try_from(offset).map_err(|_| Error::TruncatedInput)?;
        let len = usize::try_from(size).map_err(|_| Error::TruncatedInput)?;
        let end = start.checked_add(len).ok_or(Error::TruncatedInput)?;

        self.data.get(start..end).ok_or(Error::TruncatedInput)
    }
}
