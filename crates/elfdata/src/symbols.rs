//! Symbol tables (`.symtab` and `.dynsym`).

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use crate::cursor::string_at;
use crate::elf::{ElfFile, Section};
use crate::raw::elf::*;
use crate::Error;

/// The section a symbol is defined relative to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SymbolSection {
    /// The symbol is referenced here but defined elsewhere.
    Undefined,
    /// The value is an absolute address, unaffected by relocation.
    Absolute,
    /// An unallocated common block.
    Common,
    /// Some other reserved index with a processor or OS specific meaning.
    Reserved(u16),
    /// A regular section header index.
    Index(usize),
}

impl SymbolSection {
    pub fn index(&self) -> Option<usize> {
        match *self {
            Self::Index(index) => Some(index),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Symbol {
    /// The position of this symbol in its symbol table.
    pub index: usize,
    pub name: String,
    pub value: u64,
    pub size: u64,
    pub binding: SymbolBinding,
    pub kind: SymbolType,
    /// The raw `st_other` byte. The low bits hold the visibility.
    pub other: u8,
    pub section: SymbolSection,
}

impl Symbol {
    pub fn is_defined(&self) -> bool {
        self.section != SymbolSection::Undefined
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolType::FUNC | SymbolType::GNU_IFUNC)
    }

    pub fn is_global(&self) -> bool {
        self.binding != SymbolBinding::LOCAL
    }

    /// The addresses covered by this symbol.
    pub fn address_range(&self) -> Range<u64> {
        self.value..self.value.saturating_add(self.size)
    }

    /// Whether `address` falls within this symbol.
    ///
    /// Undefined and zero-sized symbols contain no addresses.
    pub fn contains(&self, address: u64) -> bool {
        self.is_defined() && self.address_range().contains(&address)
    }

    /// The demangled name of this symbol.
    ///
    /// Names that are not Rust mangled names are returned unchanged.
    pub fn demangled(&self) -> String {
        match rustc_demangle::try_demangle(&self.name) {
            Ok(demangled) => format!("{demangled:#}"),
            Err(_) => self.name.clone(),
        }
    }
}

/// A decoded symbol table, sorted by address.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    /// `max_end[i]` is the largest end address among `symbols[..=i]`.
    max_end: Vec<u64>,
}

impl SymbolTable {
    /// Decode the symbol table stored in `section`.
    ///
    /// Names are resolved through the string table named by the section's
    /// `sh_link` field.
    pub fn parse(elf: &ElfFile<'_>, section: &Section) -> Result<Self, Error> {
        let entsize = match elf.header().is_64() {
            true => SYM64_SIZE,
            false => SYM32_SIZE,
        };

        let declared = usize::try_from(section.entry_size).map_err(|_| Error::TruncatedInput)?;
        let stride = match declared {
            0 => entsize,
            declared if declared < entsize => return Err(Error::TruncatedInput),
            declared => declared,
        };

        let data = elf.section_data(section)?;
        if data.len() % stride != 0 {
            return Err(Error::TruncatedInput);
        }

        let strtab = match elf.section(section.link as usize) {
            Some(strtab) if section.link != 0 => elf.section_data(strtab)?,
            _ => &[],
        };

        let shndx = extended_indices(elf, section)?;

        let count = data.len() / stride;
        let mut symbols = Vec::with_capacity(count);
        for index in 0..count {
            let mut cursor = elf.cursor(data);
            cursor.seek(index * stride)?;

            let (name_offset, value, size, info, other, shndx_raw) = match elf.header().is_64() {
                true => {
                    let name = cursor.read_u32()?;
                    let info = cursor.read_u8()?;
                    let other = cursor.read_u8()?;
                    let shndx = cursor.read_u16()?;
                    let value = cursor.read_u64()?;
                    let size = cursor.read_u64()?;

                    (name, value, size, info, other, shndx)
                }
                false => {
                    let name = cursor.read_u32()?;
                    let value = cursor.read_u32()?.into();
                    let size = cursor.read_u32()?.into();
                    let info = cursor.read_u8()?;
                    let other = cursor.read_u8()?;
                    let shndx = cursor.read_u16()?;

                    (name, value, size, info, other, shndx)
                }
            };

            let name = match name_offset {
                0 => String::new(),
                offset => {
                    let name = string_at(strtab, offset.into())?;
                    String::from_utf8_lossy(name).into_owned()
                }
            };

            let section = match shndx_raw {
                SHN_UNDEF => SymbolSection::Undefined,
                SHN_ABS => SymbolSection::Absolute,
                SHN_COMMON => SymbolSection::Common,
                SHN_XINDEX => match shndx.as_deref().and_then(|table| table.get(index)) {
                    Some(&real) => SymbolSection::Index(real as usize),
                    None => SymbolSection::Reserved(SHN_XINDEX),
                },
                index if index >= SHN_LORESERVE => SymbolSection::Reserved(index),
                index => SymbolSection::Index(usize::from(index)),
            };

            symbols.push(Symbol {
                index,
                name,
                value,
                size,
                binding: SymbolBinding(info >> 4),
                kind: SymbolType(info & 0xF),
                other,
                section,
            });
        }

        log::debug!(
            "read {} symbols from section {:?}",
            symbols.len(),
            section.name
        );

        Ok(Self::from_symbols(symbols))
    }

    /// Build a table from already decoded symbols.
    pub fn from_symbols(mut symbols: Vec<Symbol>) -> Self {
        symbols.sort_by_key(|symbol| symbol.value);

        let mut max_end = Vec::with_capacity(symbols.len());
        let mut end = 0;
        for symbol in &symbols {
            if symbol.contains(symbol.value) {
                end = end.max(symbol.address_range().end);
            }
            max_end.push(end);
        }

        Self { symbols, max_end }
    }

    /// All symbols in ascending address order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbol with the largest value that is `<= address`, regardless of
    /// its size.
    pub fn nearest(&self, address: u64) -> Option<&Symbol> {
        let end = self.symbols.partition_point(|symbol| symbol.value <= address);
        let last = self.symbols[..end].last()?;
        let first = self.symbols[..end].partition_point(|symbol| symbol.value < last.value);

        self.symbols.get(first)
    }

    /// Find the symbol whose address range contains `address`.
    ///
    /// When several symbols contain the address the one with the greatest
    /// start address wins, ties going to the earliest entry of the table.
    pub fn symbol_at(&self, address: u64) -> Result<&Symbol, Error> {
        let end = self.symbols.partition_point(|symbol| symbol.value <= address);

        let mut found: Option<usize> = None;
        for index in (0..end).rev() {
            if self.max_end[index] <= address {
                break;
            }

            let symbol = &self.symbols[index];
            match found {
                Some(prev) if self.symbols[prev].value != symbol.value => break,
                _ if symbol.contains(address) => found = Some(index),
                _ => (),
            }
        }

        found.map(|index| &self.symbols[index]).ok_or(Error::NotFound)
    }

    /// Find a symbol by its exact (mangled) name.
    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = &'a Symbol;
    type IntoIter = core::slice::Iter<'a, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read the `SHT_SYMTAB_SHNDX` table associated with `symtab`, if any.
fn extended_indices(elf: &ElfFile<'_>, symtab: &Section) -> Result<Option<Vec<u32>>, Error> {
    let section = elf
        .sections_of_type(SectionType::SYMTAB_SHNDX)
        .find(|section| section.link as usize == symtab.index);

    let section = match section {
        Some(section) => section,
        None => return Ok(None),
    };

    let data = elf.section_data(section)?;
    let mut cursor = elf.cursor(data);
    let mut indices = Vec::with_capacity(data.len() / 4);
    while cursor.remaining() >= 4 {
        indices.push(cursor.read_u32()?);
    }

    Ok(Some(indices))
}

impl<'a> ElfFile<'a> {
    /// The static symbol table (`SHT_SYMTAB`), if present.
    pub fn symbol_table(&self) -> Result<Option<SymbolTable>, Error> {
        self.symbol_table_of_type(SectionType::SYMTAB)
    }

    /// The dynamic symbol table (`SHT_DYNSYM`), if present.
    pub fn dynamic_symbol_table(&self) -> Result<Option<SymbolTable>, Error> {
        self.symbol_table_of_type(SectionType::DYNSYM)
    }

    fn symbol_table_of_type(&self, kind: SectionType) -> Result<Option<SymbolTable>, Error> {
        match self.sections_of_type(kind).next() {
            Some(section) => SymbolTable::parse(self, section).map(Some),
            None => Ok(None),
        }
    }
}
