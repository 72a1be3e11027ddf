//! `elfdata` extracts structured data from ELF binaries: the section and
//! segment layout, symbol tables and [DWARF][0] debugging information.
//!
//! The entry point for most uses is [`ElfData`], which decodes a whole file
//! and answers the common questions about it:
//! - which symbol covers an address ([`ElfData::symbol_at`]),
//! - which source line an address came from ([`ElfData::line_at`]), and,
//! - which debugging entry sits at a `.debug_info` offset
//!   ([`ElfData::resolve_reference`]).
//!
//! Nothing is copied out of the input buffer unless it has to be, so all of
//! the decoded types borrow from it.
//!
//! [0]: https://dwarfstd.org/dwarf5std.html
//!
//! # Modules
//! - [`elf`] - The ELF container: file header, sections, segments and notes.
//! - [`symbols`] - Symbol tables sorted for address lookups.
//! - [`dwarf`] - Abbreviations, debugging information entries and line
//!   number programs.
//! - [`raw`] - Constants as they are defined by the ELF and DWARF standards.
//! - [`write`][mod@write] - Encoders for the decoded structures.
//! - [`disasm`] - The interface to an external disassembler.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod cursor;
pub mod disasm;
pub mod dwarf;
pub mod elf;
pub mod endian;
mod error;
mod options;
mod query;
pub mod raw;
pub mod symbols;
pub mod write;

pub use self::cursor::Cursor;
pub use self::dwarf::{Dwarf, Unit, UnitError};
pub use self::elf::{ElfFile, Section, Segment};
pub use self::endian::{Big, Endian, Little, RunTimeEndian};
pub use self::error::Error;
pub use self::options::{ParseOptions, SymbolSource};
pub use self::query::{ElfData, LineLocation};
pub use self::symbols::{Symbol, SymbolSection, SymbolTable};
