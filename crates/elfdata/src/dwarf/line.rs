//! Line number programs from `.debug_line`.
//!
//! A line number program is bytecode for a small state machine. Running it
//! produces a table of rows mapping addresses to source positions, split into
//! sequences of contiguous addresses.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use crate::cursor::{string_at, Cursor};
use crate::dwarf::{read_initial_length, DwarfSections, Format};
use crate::endian::RunTimeEndian;
use crate::raw::dwarf::{DwForm, DwLnct, DwLne, DwLns};
use crate::Error;

/// An entry of the file name table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileEntry<'a> {
    pub path: &'a [u8],
    pub directory_index: u64,
    pub timestamp: u64,
    pub size: u64,
    pub md5: Option<[u8; 16]>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineProgramHeader<'a> {
    /// The offset of the program within `.debug_line`.
    pub offset: u64,
    pub format: Format,
    pub unit_length: u64,
    pub version: u16,
    pub address_size: u8,
    pub segment_selector_size: u8,
    pub header_length: u64,
    pub minimum_instruction_length: u8,
    pub maximum_operations_per_instruction: u8,
    pub default_is_stmt: bool,
    pub line_base: i8,
    pub line_range: u8,
    pub opcode_base: u8,
    /// The number of operands of each standard opcode, starting at opcode 1.
    pub standard_opcode_lengths: Vec<u8>,
    pub include_directories: Vec<&'a [u8]>,
    pub file_names: Vec<FileEntry<'a>>,
    /// The offset of the first opcode within `.debug_line`.
    pub program_offset: u64,
}

enum EntryValue<'a> {
    Bytes(&'a [u8]),
    Int(u64),
}

impl<'a> LineProgramHeader<'a> {
    pub fn parse(
        sections: &DwarfSections<'a>,
        endian: RunTimeEndian,
        offset: u64,
        address_size: u8,
    ) -> Result<Self, Error> {
        let data = sections.debug_line;
        let start = usize::try_from(offset).map_err(|_| Error::TruncatedInput)?;

        let mut cursor = Cursor::new(data, endian, address_size);
        cursor.seek(start)?;

        let (unit_length, format) = read_initial_length(&mut cursor)?;
        let end = usize::try_from(unit_length)
            .ok()
            .and_then(|len| cursor.position().checked_add(len))
            .filter(|&end| end <= data.len())
            .ok_or(Error::TruncatedInput)?;

        let position = cursor.position();
        let mut cursor = Cursor::new(&data[..end], endian, address_size);
        cursor.seek(position)?;

        let malformed = Error::MalformedLineProgram { offset };
        let version = cursor.read_u16()?;
        if !(2..=5).contains(&version) {
            return Err(Error::UnsupportedVersion(version.into()));
        }

        let mut address_size = address_size;
        let mut segment_selector_size = 0;
        if version >= 5 {
            address_size = cursor.read_u8()?;
            segment_selector_size = cursor.read_u8()?;

            if !matches!(address_size, 1 | 2 | 4 | 8) {
                return Err(Error::UnsupportedAddressSize(address_size));
            }

            cursor = cursor.with_address_size(address_size);
        }

        let header_length = cursor.read_uint(format.offset_size())?;
        let program_offset = usize::try_from(header_length)
            .ok()
            .and_then(|len| cursor.position().checked_add(len))
            .filter(|&program| program <= end)
            .ok_or_else(|| malformed.clone())?;

        let minimum_instruction_length = cursor.read_u8()?;
        let maximum_operations_per_instruction = match version {
            2 | 3 => 1,
            _ => cursor.read_u8()?,
        };
        let default_is_stmt = cursor.read_u8()? != 0;
        let line_base = cursor.read_i8()?;
        let line_range = cursor.read_u8()?;
        let opcode_base = cursor.read_u8()?;

        if line_range == 0 || maximum_operations_per_instruction == 0 || opcode_base == 0 {
            return Err(malformed);
        }

        let standard_opcode_lengths = cursor.read_bytes(usize::from(opcode_base) - 1)?.to_vec();
        for (index, &len) in standard_opcode_lengths.iter().enumerate() {
            let opcode = DwLns(index as u8 + 1);
            match opcode.operand_count() {
                Some(expected) if expected != len => {
                    log::debug!(
                        "line program at {offset:#x} declares {len} operands for {opcode:?}"
                    );
                    return Err(malformed);
                }
                _ => (),
            }
        }

        let mut header = Self {
            offset,
            format,
            unit_length,
            version,
            address_size,
            segment_selector_size,
            header_length,
            minimum_instruction_length,
            maximum_operations_per_instruction,
            default_is_stmt,
            line_base,
            line_range,
            opcode_base,
            standard_opcode_lengths,
            include_directories: Vec::new(),
            file_names: Vec::new(),
            program_offset: program_offset as u64,
        };

        match version {
            5 => header.parse_v5_tables(sections, &mut cursor)?,
            _ => header.parse_tables(&mut cursor)?,
        }

        if cursor.position() > program_offset {
            return Err(malformed);
        }

        Ok(header)
    }

    fn parse_tables(&mut self, cursor: &mut Cursor<'a>) -> Result<(), Error> {
        loop {
            let directory = cursor.read_cstring()?;
            if directory.is_empty() {
                break;
            }

            self.include_directories.push(directory);
        }

        loop {
            let path = cursor.read_cstring()?;
            if path.is_empty() {
                break;
            }

            self.file_names.push(FileEntry {
                path,
                directory_index: cursor.read_uleb128()?,
                timestamp: cursor.read_uleb128()?,
                size: cursor.read_uleb128()?,
                md5: None,
            });
        }

        Ok(())
    }

    fn parse_v5_tables(
        &mut self,
        sections: &DwarfSections<'a>,
        cursor: &mut Cursor<'a>,
    ) -> Result<(), Error> {
        let formats = Self::read_entry_formats(cursor)?;
        let count = self.read_entry_count(cursor, &formats)?;
        for _ in 0..count {
            let entry = self.read_entry(sections, cursor, &formats)?;
            self.include_directories.push(entry.path);
        }

        let formats = Self::read_entry_formats(cursor)?;
        let count = self.read_entry_count(cursor, &formats)?;
        for _ in 0..count {
            let entry = self.read_entry(sections, cursor, &formats)?;
            self.file_names.push(entry);
        }

        Ok(())
    }

    /// Entries without any fields would let the count run unbounded.
    fn read_entry_count(
        &self,
        cursor: &mut Cursor<'a>,
        formats: &[(DwLnct, DwForm)],
    ) -> Result<u64, Error> {
        let count = cursor.read_uleb128()?;
        if formats.is_empty() && count != 0 {
            return Err(Error::MalformedLineProgram {
                offset: self.offset,
            });
        }

        Ok(count)
    }

    fn read_entry_formats(cursor: &mut Cursor<'a>) -> Result<Vec<(DwLnct, DwForm)>, Error> {
        let count = cursor.read_u8()?;
        let mut formats = Vec::with_capacity(count.into());
        for _ in 0..count {
            let kind = DwLnct(cursor.read_uleb128_u16()?);
            let form = DwForm(cursor.read_uleb128_u16()?);
            formats.push((kind, form));
        }

        Ok(formats)
    }

    fn read_entry(
        &self,
        sections: &DwarfSections<'a>,
        cursor: &mut Cursor<'a>,
        formats: &[(DwLnct, DwForm)],
    ) -> Result<FileEntry<'a>, Error> {
        let mut entry = FileEntry {
            path: &[],
            directory_index: 0,
            timestamp: 0,
            size: 0,
            md5: None,
        };

        for &(kind, form) in formats {
            let value = self.read_entry_value(sections, cursor, form)?;

            match (kind, value) {
                (DwLnct::PATH, EntryValue::Bytes(path)) => entry.path = path,
                (DwLnct::DIRECTORY_INDEX, EntryValue::Int(index)) => entry.directory_index = index,
                (DwLnct::TIMESTAMP, EntryValue::Int(timestamp)) => entry.timestamp = timestamp,
                (DwLnct::SIZE, EntryValue::Int(size)) => entry.size = size,
                (DwLnct::MD5, EntryValue::Bytes(md5)) => {
                    let md5 = <[u8; 16]>::try_from(md5).map_err(|_| Error::UnsupportedForm(form.0))?;
                    entry.md5 = Some(md5);
                }
                (DwLnct::PATH | DwLnct::DIRECTORY_INDEX | DwLnct::TIMESTAMP | DwLnct::SIZE | DwLnct::MD5, _) => {
                    return Err(Error::UnsupportedForm(form.0))
                }
                // Vendor content types are skipped.
                _ => (),
            }
        }

        Ok(entry)
    }

    fn read_entry_value(
        &self,
        sections: &DwarfSections<'a>,
        cursor: &mut Cursor<'a>,
        form: DwForm,
    ) -> Result<EntryValue<'a>, Error> {
        let offset_size = self.format.offset_size();

        let value = match form {
            DwForm::STRING => EntryValue::Bytes(cursor.read_cstring()?),
            DwForm::LINE_STRP => {
                let offset = cursor.read_uint(offset_size)?;
                EntryValue::Bytes(string_at(sections.debug_line_str, offset)?)
            }
            DwForm::STRP => {
                let offset = cursor.read_uint(offset_size)?;
                EntryValue::Bytes(string_at(sections.debug_str, offset)?)
            }
            DwForm::UDATA => EntryValue::Int(cursor.read_uleb128()?),
            DwForm::DATA1 => EntryValue::Int(cursor.read_uint(1)?),
            DwForm::DATA2 => EntryValue::Int(cursor.read_uint(2)?),
            DwForm::DATA4 => EntryValue::Int(cursor.read_uint(4)?),
            DwForm::DATA8 => EntryValue::Int(cursor.read_uint(8)?),
            DwForm::DATA16 => EntryValue::Bytes(cursor.read_bytes(16)?),
            DwForm::BLOCK => {
                let len = cursor.read_uleb128()?;
                let len = usize::try_from(len).map_err(|_| Error::TruncatedInput)?;
                EntryValue::Bytes(cursor.read_bytes(len)?)
            }
            form => return Err(Error::UnsupportedForm(form.0)),
        };

        Ok(value)
    }

    /// The offset just past the end of this program.
    pub fn end(&self) -> u64 {
        self.offset + self.format.initial_length_size() + self.unit_length
    }

    /// Look up a file by the index used in the `file` register.
    ///
    /// File indices are 1-based before DWARF 5 and 0-based since.
    pub fn file(&self, index: u64) -> Option<&FileEntry<'a>> {
        let index = match self.version {
            2..=4 => index.checked_sub(1)?,
            _ => index,
        };

        self.file_names.get(usize::try_from(index).ok()?)
    }

    /// The initial state of the line number registers.
    pub fn initial_row(&self) -> LineRow {
        LineRow {
            address: 0,
            op_index: 0,
            file: 1,
            line: 1,
            column: 0,
            is_stmt: self.default_is_stmt,
            basic_block: false,
            end_sequence: false,
            prologue_end: false,
            epilogue_begin: false,
            isa: 0,
            discriminator: 0,
        }
    }
}

/// A row of the line table, which is also the register set of the line
/// number state machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineRow {
    pub address: u64,
    /// The index of an operation within a VLIW instruction.
    pub op_index: u64,
    pub file: u64,
    pub line: u64,
    pub column: u64,
    pub is_stmt: bool,
    pub basic_block: bool,
    pub end_sequence: bool,
    pub prologue_end: bool,
    pub epilogue_begin: bool,
    pub isa: u64,
    pub discriminator: u64,
}

/// A run of rows with contiguous, ascending addresses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineSequence {
    /// The address of the first row.
    pub start: u64,
    /// The address of the end-of-sequence row, one past the last instruction.
    pub end: u64,
    /// The rows of this sequence within [`LineProgram::rows`], including the
    /// terminating row.
    pub rows: Range<usize>,
}

impl LineSequence {
    pub fn contains(&self, address: u64) -> bool {
        (self.start..self.end).contains(&address)
    }
}

/// A line number program and the rows produced by running it.
#[derive(Clone, Debug)]
pub struct LineProgram<'a> {
    header: LineProgramHeader<'a>,
    rows: Vec<LineRow>,
    sequences: Vec<LineSequence>,
}

impl<'a> LineProgram<'a> {
    /// Parse and run the line number program at `offset` within
    /// `.debug_line`.
    ///
    /// `address_size` is the address size of the citing unit. DWARF 5
    /// programs declare their own.
    pub fn parse(
        sections: &DwarfSections<'a>,
        endian: RunTimeEndian,
        offset: u64,
        address_size: u8,
    ) -> Result<Self, Error> {
        let header = LineProgramHeader::parse(sections, endian, offset, address_size)?;

        log::debug!(
            "line program at {:#x}: version {}, {} directories, {} files",
            offset,
            header.version,
            header.include_directories.len(),
            header.file_names.len()
        );

        let mut program = Self {
            header,
            rows: Vec::new(),
            sequences: Vec::new(),
        };

        program.run(sections.debug_line, endian)?;
        Ok(program)
    }

    fn run(&mut self, data: &'a [u8], endian: RunTimeEndian) -> Result<(), Error> {
        let end = self.header.end() as usize;
        let mut cursor = Cursor::new(&data[..end], endian, self.header.address_size);
        cursor.seek(self.header.program_offset as usize)?;

        let opcode_base = self.header.opcode_base;
        let line_range = self.header.line_range;
        let line_base = i64::from(self.header.line_base);

        let mut row = self.header.initial_row();
        let mut sequence_start = 0;

        while !cursor.is_empty() {
            let offset = cursor.position() as u64;
            let opcode = cursor.read_u8()?;

            if opcode >= opcode_base {
                let adjusted = opcode - opcode_base;
                self.advance(&mut row, u64::from(adjusted / line_range));
                row.line = row
                    .line
                    .wrapping_add_signed(line_base + i64::from(adjusted % line_range));
                self.emit(&mut row);
                continue;
            }

            match DwLns(opcode) {
                DwLns(0) => {
                    let len = cursor.read_uleb128()?;
                    let len = usize::try_from(len)
                        .ok()
                        .filter(|&len| len > 0 && len <= cursor.remaining())
                        .ok_or(Error::MalformedLineProgram { offset })?;

                    let payload = cursor.split(len)?;
                    let finished = self
                        .execute_extended(&mut row, payload)
                        .map_err(|_| Error::MalformedLineProgram { offset })?;

                    if finished {
                        self.sequences.push(LineSequence {
                            start: self.rows[sequence_start].address,
                            end: row.address,
                            rows: sequence_start..self.rows.len(),
                        });

                        sequence_start = self.rows.len();
                        row = self.header.initial_row();
                    }
                }
                DwLns::COPY => self.emit(&mut row),
                DwLns::ADVANCE_PC => {
                    let advance = cursor.read_uleb128()?;
                    self.advance(&mut row, advance);
                }
                DwLns::ADVANCE_LINE => {
                    let delta = cursor.read_sleb128()?;
                    row.line = row.line.wrapping_add_signed(delta);
                }
                DwLns::SET_FILE => row.file = cursor.read_uleb128()?,
                DwLns::SET_COLUMN => row.column = cursor.read_uleb128()?,
                DwLns::NEGATE_STMT => row.is_stmt = !row.is_stmt,
                DwLns::SET_BASIC_BLOCK => row.basic_block = true,
                DwLns::CONST_ADD_PC => {
                    let adjusted = 255 - opcode_base;
                    self.advance(&mut row, u64::from(adjusted / line_range));
                }
                DwLns::FIXED_ADVANCE_PC => {
                    let advance = cursor.read_u16()?;
                    row.address = row.address.wrapping_add(advance.into());
                    row.op_index = 0;
                }
                DwLns::SET_PROLOGUE_END => row.prologue_end = true,
                DwLns::SET_EPILOGUE_BEGIN => row.epilogue_begin = true,
                DwLns::SET_ISA => row.isa = cursor.read_uleb128()?,
                DwLns(opcode) => {
                    let operands = self.header.standard_opcode_lengths[usize::from(opcode) - 1];
                    for _ in 0..operands {
                        cursor.read_uleb128()?;
                    }
                }
            }
        }

        if sequence_start < self.rows.len() {
            log::warn!(
                "line program at {:#x} ends with {} rows outside of a sequence",
                self.header.offset,
                self.rows.len() - sequence_start
            );
        }

        Ok(())
    }

    /// Execute an extended opcode. Returns whether it ended a sequence.
    fn execute_extended(&mut self, row: &mut LineRow, mut payload: Cursor<'a>) -> Result<bool, Error> {
        let len = payload.len();

        match DwLne(payload.read_u8()?) {
            DwLne::END_SEQUENCE if len == 1 => {
                row.end_sequence = true;
                self.emit(row);
                return Ok(true);
            }
            DwLne::SET_ADDRESS if matches!(len - 1, 1 | 2 | 4 | 8) => {
                row.address = payload.read_uint((len - 1) as u8)?;
                row.op_index = 0;
            }
            DwLne::DEFINE_FILE => {
                let path = payload.read_cstring()?;
                let entry = FileEntry {
                    path,
                    directory_index: payload.read_uleb128()?,
                    timestamp: payload.read_uleb128()?,
                    size: payload.read_uleb128()?,
                    md5: None,
                };

                self.header.file_names.push(entry);
            }
            DwLne::SET_DISCRIMINATOR => row.discriminator = payload.read_uleb128()?,
            DwLne::END_SEQUENCE | DwLne::SET_ADDRESS => {
                return Err(Error::MalformedLineProgram {
                    offset: self.header.offset,
                })
            }
            // Unknown extended opcodes are skipped using their length.
            _ => (),
        }

        Ok(false)
    }

    fn advance(&self, row: &mut LineRow, operation_advance: u64) {
        let min_len = u64::from(self.header.minimum_instruction_length);
        let max_ops = u64::from(self.header.maximum_operations_per_instruction);

        if max_ops == 1 {
            row.address = row
                .address
                .wrapping_add(min_len.wrapping_mul(operation_advance));
        } else {
            let ops = row.op_index.wrapping_add(operation_advance);
            row.address = row.address.wrapping_add(min_len.wrapping_mul(ops / max_ops));
            row.op_index = ops % max_ops;
        }
    }

    fn emit(&mut self, row: &mut LineRow) {
        self.rows.push(*row);

        row.basic_block = false;
        row.prologue_end = false;
        row.epilogue_begin = false;
        row.discriminator = 0;
    }

    pub fn header(&self) -> &LineProgramHeader<'a> {
        &self.header
    }

    /// All rows in the order the program emitted them.
    pub fn rows(&self) -> &[LineRow] {
        &self.rows
    }

    /// The terminated sequences of the program, in program order.
    pub fn sequences(&self) -> &[LineSequence] {
        &self.sequences
    }

    /// The rows of a single sequence.
    pub fn sequence_rows(&self, sequence: &LineSequence) -> &[LineRow] {
        &self.rows[sequence.rows.clone()]
    }

    /// Find the row describing the instruction at `address`.
    ///
    /// This is the row with the greatest address `<= address` within the
    /// first sequence that covers `address`.
    pub fn find_row(&self, address: u64) -> Option<&LineRow> {
        for sequence in &self.sequences {
            if !sequence.contains(address) {
                continue;
            }

            let rows = self.sequence_rows(sequence);
            let index = rows.partition_point(|row| row.address <= address);
            match index.checked_sub(1).map(|index| &rows[index]) {
                Some(row) if !row.end_sequence => return Some(row),
                _ => continue,
            }
        }

        None
    }

    /// The full path of a file from the file table, joined with its
    /// directory and `comp_dir` where those are relative.
    pub fn file_path(&self, index: u64, comp_dir: Option<&str>) -> Result<String, Error> {
        let file = self.header.file(index).ok_or(Error::InvalidFileIndex(index))?;
        let name = String::from_utf8_lossy(file.path);
        if name.starts_with('/') {
            return Ok(name.into_owned());
        }

        let directory = match (self.header.version, file.directory_index) {
            (0..=4, 0) => None,
            (0..=4, dir) => Some(self.include_directory(dir - 1, index)?),
            (_, dir) => Some(self.include_directory(dir, index)?),
        };

        let mut path = String::new();
        let directory = directory.map(String::from_utf8_lossy);

        if !directory.as_deref().map_or(false, |dir| dir.starts_with('/')) {
            if let Some(comp_dir) = comp_dir {
                push_component(&mut path, comp_dir);
            }
        }

        if let Some(directory) = &directory {
            push_component(&mut path, directory);
        }

        push_component(&mut path, &name);
        Ok(path)
    }

    fn include_directory(&self, index: u64, file: u64) -> Result<&'a [u8], Error> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.header.include_directories.get(index))
            .copied()
            .ok_or(Error::InvalidFileIndex(file))
    }
}

fn push_component(path: &mut String, component: &str) {
    if component.is_empty() {
        return;
    }

    if !path.is_empty() && !path.ends_with('/') {
        path.push('/');
    }

    path.push_str(component);
}
