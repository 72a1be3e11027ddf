//! Lookups across the decoded parts of a file.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use crate::disasm::{DisassembleError, Disassembler, Instruction, InstructionSet};
use crate::dwarf::{Die, Dwarf, Function, Unit, UnitError};
use crate::elf::{DebugLink, ElfFile, Section, Segment};
use crate::options::{ParseOptions, SymbolSource};
use crate::raw::elf::{FileType, SectionType};
use crate::symbols::{Symbol, SymbolSection, SymbolTable};
use crate::Error;

/// The source location of an address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineLocation {
    /// The address of the line table row that covers the query.
    pub address: u64,
    /// The full path of the source file.
    pub file: String,
    pub line: u64,
    /// The column within the line, 0 if unknown.
    pub column: u64,
    pub is_stmt: bool,
    pub discriminator: u64,
    /// The offset of the unit the row belongs to.
    pub unit_offset: u64,
}

/// A decoded ELF file with its symbols and debugging information.
///
/// All data borrows from the input buffer. Once built, an `ElfData` is never
/// mutated so it may be shared freely between threads.
#[derive(Clone, Debug)]
pub struct ElfData<'a> {
    elf: ElfFile<'a>,
    options: ParseOptions,
    symbols: SymbolTable,
    dwarf: Dwarf<'a>,
    units: Vec<Unit<'a>>,
    unit_errors: Vec<UnitError>,
    /// Unit address ranges sorted by start address, with the unit index.
    aranges: Vec<(Range<u64>, usize)>,
    /// `aranges_end[i]` is the largest end address among `aranges[..=i]`.
    aranges_end: Vec<u64>,
}

impl<'a> ElfData<'a> {
    /// Decode `data` with the default options.
    pub fn parse(data: &'a [u8]) -> Result<Self, Error> {
        Self::parse_with(data, ParseOptions::default())
    }

    pub fn parse_with(data: &'a [u8], options: ParseOptions) -> Result<Self, Error> {
        let elf = ElfFile::parse(data)?;

        let symbols = match options.symbols {
            SymbolSource::Symtab => elf.symbol_table()?,
            SymbolSource::Dynsym => elf.dynamic_symbol_table()?,
            SymbolSource::Auto => match elf.symbol_table()? {
                Some(table) => Some(table),
                None => elf.dynamic_symbol_table()?,
            },
        };
        let symbols = symbols.unwrap_or_default();
        log::debug!("loaded {} symbols", symbols.len());

        let mut this = Self {
            elf,
            options,
            symbols,
            dwarf: Dwarf::default(),
            units: Vec::new(),
            unit_errors: Vec::new(),
            aranges: Vec::new(),
            aranges_end: Vec::new(),
        };

        if options.dwarf {
            this.dwarf = Dwarf::load(&this.elf)?;
            this.load_units()?;
            this.build_aranges()?;

            if options.eager_references {
                this.check_references()?;
            }
        }

        Ok(this)
    }

    fn load_units(&mut self) -> Result<(), Error> {
        for unit in self.dwarf.units() {
            let mut unit = match unit {
                Ok(unit) => unit,
                Err(error) if self.options.strict => return Err(error.error),
                Err(error) => {
                    log::warn!("skipping {error}");
                    self.unit_errors.push(error);
                    continue;
                }
            };

            if self.options.line_programs {
                match unit.load_line_program() {
                    Ok(Some(program)) => unit.set_line_program(program),
                    Ok(None) => (),
                    Err(error) if self.options.strict => return Err(error),
                    Err(error) => {
                        let error = UnitError {
                            offset: unit.offset(),
                            error,
                        };
                        log::warn!("line program of {error}");
                        self.unit_errors.push(error);
                    }
                }
            }

            self.units.push(unit);
        }

        log::debug!(
            "decoded {} units ({} failed)",
            self.units.len(),
            self.unit_errors.len()
        );

        Ok(())
    }

    fn build_aranges(&mut self) -> Result<(), Error> {
        let mut aranges = Vec::new();

        for (index, unit) in self.units.iter().enumerate() {
            let ranges = match unit.ranges() {
                Ok(ranges) => ranges,
                Err(error) if self.options.strict => return Err(error),
                Err(error) => {
                    log::warn!("unit at offset {:#x} has unreadable ranges: {error}", unit.offset());
                    Vec::new()
                }
            };

            let ranges = match (ranges.is_empty(), unit.line_program()) {
                (true, Some(program)) => program
                    .sequences()
                    .iter()
                    .map(|sequence| sequence.start..sequence.end)
                    .collect(),
                _ => ranges,
            };

            aranges.extend(ranges.into_iter().map(|range| (range, index)));
        }

        aranges.sort_by_key(|(range, index)| (range.start, *index));

        let mut end = 0;
        self.aranges_end = aranges
            .iter()
            .map(|(range, _)| {
                end = end.max(range.end);
                end
            })
            .collect();
        self.aranges = aranges;

        Ok(())
    }

    fn check_references(&self) -> Result<(), Error> {
        for unit in &self.units {
            for die in unit.dies() {
                for offset in die.references() {
                    self.resolve_reference(offset)?;
                }
            }
        }

        Ok(())
    }

    pub fn elf(&self) -> &ElfFile<'a> {
        &self.elf
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn sections(&self) -> &[Section] {
        self.elf.sections()
    }

    pub fn segments(&self) -> &[Segment] {
        self.elf.segments()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn dwarf(&self) -> &Dwarf<'a> {
        &self.dwarf
    }

    /// The units that were decoded successfully, in `.debug_info` order.
    pub fn units(&self) -> &[Unit<'a>] {
        &self.units
    }

    /// Units and line programs that failed to decode.
    ///
    /// Always empty when parsing in strict mode.
    pub fn unit_errors(&self) -> &[UnitError] {
        &self.unit_errors
    }

    /// Find the symbol whose address range contains `address`.
    pub fn symbol_at(&self, address: u64) -> Result<&Symbol, Error> {
        self.symbols.symbol_at(address)
    }

    /// Indices of the units with an address range containing `address`,
    /// lowest range start first.
    fn units_containing(&self, address: u64) -> impl Iterator<Item = usize> + '_ {
        let end = self.aranges.partition_point(|(range, _)| range.start <= address);
        let start = self.aranges_end[..end].partition_point(|&max| max <= address);

        self.aranges[start..end]
            .iter()
            .filter(move |(range, _)| range.contains(&address))
            .map(|&(_, index)| index)
    }

    /// The unit whose address ranges contain `address`.
    pub fn unit_at_address(&self, address: u64) -> Result<&Unit<'a>, Error> {
        self.units_containing(address)
            .next()
            .map(|index| &self.units[index])
            .ok_or(Error::NotFound)
    }

    /// The unit containing the start address of `symbol`.
    pub fn unit_for_symbol(&self, symbol: &Symbol) -> Result<&Unit<'a>, Error> {
        self.unit_at_address(symbol.value)
    }

    /// Find the source location of `address` using the line tables.
    pub fn line_at(&self, address: u64) -> Result<LineLocation, Error> {
        for index in self.units_containing(address) {
            let unit = &self.units[index];
            let program = match unit.line_program() {
                Some(program) => program,
                None => continue,
            };

            let row = match program.find_row(address) {
                Some(row) => row,
                None => continue,
            };

            let comp_dir = unit.comp_dir()?;
            let file = program.file_path(row.file, comp_dir.as_deref())?;

            return Ok(LineLocation {
                address: row.address,
                file,
                line: row.line,
                column: row.column,
                is_stmt: row.is_stmt,
                discriminator: row.discriminator,
                unit_offset: unit.offset(),
            });
        }

        Err(Error::NotFound)
    }

    /// Find the DIE that starts at `offset` within `.debug_info`.
    pub fn resolve_reference(&self, offset: u64) -> Result<(&Unit<'a>, &Die<'a>), Error> {
        let index = self
            .units
            .partition_point(|unit| unit.offset() <= offset)
            .checked_sub(1)
            .ok_or(Error::DanglingReference(offset))?;

        let unit = &self.units[index];
        if !unit.header().contains(offset) {
            return Err(Error::DanglingReference(offset));
        }

        let die = unit
            .die_at_offset(offset)
            .ok_or(Error::DanglingReference(offset))?;

        Ok((unit, die))
    }

    /// Summaries of the subprogram entries of every unit.
    pub fn functions(&self) -> Result<Vec<Function>, Error> {
        let mut functions = Vec::new();
        for unit in &self.units {
            functions.extend(unit.functions()?);
        }

        Ok(functions)
    }

    /// The innermost function whose ranges contain `address`.
    pub fn function_at(&self, address: u64) -> Result<Function, Error> {
        let unit = self.unit_at_address(address)?;

        unit.functions()?
            .into_iter()
            .filter(|function| function.contains(address))
            .min_by_key(|function| {
                function
                    .ranges
                    .iter()
                    .find(|range| range.contains(&address))
                    .map_or(u64::MAX, |range| range.end - range.start)
            })
            .ok_or(Error::NotFound)
    }

    pub fn build_id(&self) -> Result<Option<&'a [u8]>, Error> {
        self.elf.build_id()
    }

    pub fn debug_link(&self) -> Result<Option<DebugLink<'a>>, Error> {
        self.elf.debug_link()
    }

    /// The bytes of the code or data a symbol covers.
    ///
    /// In relocatable files symbol values are offsets within their section,
    /// elsewhere they are virtual addresses.
    pub fn symbol_code(&self, symbol: &Symbol) -> Result<&'a [u8], Error> {
        let section = match symbol.section {
            SymbolSection::Index(index) => self.elf.section(index),
            SymbolSection::Absolute => self.elf.section_containing(symbol.value),
            _ => None,
        };

        let section = match section {
            Some(section) if section.kind != SectionType::NOBITS => section,
            _ => return Err(Error::NotFound),
        };

        let start = match self.elf.header().kind {
            FileType::REL => Some(symbol.value),
            _ => symbol.value.checked_sub(section.address),
        };
        let range = start
            .and_then(|start| Some(start..start.checked_add(symbol.size)?))
            .filter(|range| range.end <= section.size)
            .ok_or(Error::NotFound)?;

        let data = self.elf.section_data(section)?;
        let range = usize::try_from(range.start).map_err(|_| Error::TruncatedInput)?
            ..usize::try_from(range.end).map_err(|_| Error::TruncatedInput)?;

        data.get(range).ok_or(Error::TruncatedInput)
    }

    /// Disassemble the code of `symbol` with an external disassembler.
    pub fn disassemble_symbol<D: Disassembler>(
        &self,
        symbol: &Symbol,
        disassembler: &D,
    ) -> Result<Vec<Instruction>, DisassembleError<D::Error>> {
        let machine = self.elf.machine();
        let isa = InstructionSet::from_machine(machine)
            .ok_or(DisassembleError::UnsupportedMachine(machine))?;
        let code = self.symbol_code(symbol)?;

        disassembler
            .disassemble(code, symbol.value, isa)
            .map_err(DisassembleError::Disassembler)
    }
}
