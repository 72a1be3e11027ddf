//! Hand-assembled ELF images shared by the integration tests.

#![allow(dead_code)]

use elfdata::write::{encode_sleb128, encode_uleb128};

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOTE: u32 = 7;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_DYNSYM: u32 = 11;
pub const SHT_SYMTAB_SHNDX: u32 = 18;

pub const SHF_WRITE: u64 = 0x1;
pub const SHF_ALLOC: u64 = 0x2;
pub const SHF_EXECINSTR: u64 = 0x4;

pub const PT_LOAD: u32 = 1;
pub const PT_NOTE: u32 = 4;

pub const ET_REL: u16 = 1;
pub const ET_EXEC: u16 = 2;
pub const EM_X86_64: u16 = 62;

pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;

pub const SHN_UNDEF: u16 = 0;
pub const SHN_ABS: u16 = 0xFFF1;
pub const SHN_XINDEX: u16 = 0xFFFF;

/// The class and byte order of an image.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Layout {
    pub is_64: bool,
    pub big_endian: bool,
}

impl Layout {
    pub const LE64: Self = Self::new(true, false);
    pub const BE64: Self = Self::new(true, true);
    pub const LE32: Self = Self::new(false, false);
    pub const BE32: Self = Self::new(false, true);

    pub const ALL: [Self; 4] = [Self::LE64, Self::BE64, Self::LE32, Self::BE32];

    pub const fn new(is_64: bool, big_endian: bool) -> Self {
        Self { is_64, big_endian }
    }

    pub fn address_size(&self) -> u8 {
        if self.is_64 {
            8
        } else {
            4
        }
    }
}

/// A byte buffer written in the order and word size of a [`Layout`].
#[derive(Clone, Debug)]
pub struct Bytes {
    pub data: Vec<u8>,
    layout: Layout,
}

impl Bytes {
    pub fn new(layout: Layout) -> Self {
        Self {
            data: Vec::new(),
            layout,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        match self.layout.big_endian {
            true => self.data.extend_from_slice(&value.to_be_bytes()),
            false => self.data.extend_from_slice(&value.to_le_bytes()),
        }
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        match self.layout.big_endian {
            true => self.data.extend_from_slice(&value.to_be_bytes()),
            false => self.data.extend_from_slice(&value.to_le_bytes()),
        }
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        match self.layout.big_endian {
            true => self.data.extend_from_slice(&value.to_be_bytes()),
            false => self.data.extend_from_slice(&value.to_le_bytes()),
        }
        self
    }

    /// A 4 or 8 byte word, depending on the class.
    pub fn word(&mut self, value: u64) -> &mut Self {
        match self.layout.is_64 {
            true => self.u64(value),
            false => self.u32(value as u32),
        }
    }

    pub fn uleb(&mut self, value: u64) -> &mut Self {
        self.data.extend_from_slice(&encode_uleb128(value));
        self
    }

    pub fn sleb(&mut self, value: i64) -> &mut Self {
        self.data.extend_from_slice(&encode_sleb128(value));
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// A NUL-terminated string.
    pub fn cstr(&mut self, text: &str) -> &mut Self {
        self.data.extend_from_slice(text.as_bytes());
        self.data.push(0);
        self
    }

    pub fn align(&mut self, align: usize) -> &mut Self {
        while self.data.len() % align != 0 {
            self.data.push(0);
        }
        self
    }

    pub fn patch_u32(&mut self, at: usize, value: u32) {
        let bytes = match self.layout.big_endian {
            true => value.to_be_bytes(),
            false => value.to_le_bytes(),
        };
        self.data[at..at + 4].copy_from_slice(&bytes);
    }

    /// A section offset in the 32-bit or 64-bit DWARF format.
    pub fn offset(&mut self, dwarf64: bool, value: u64) -> &mut Self {
        match dwarf64 {
            true => self.u64(value),
            false => self.u32(value as u32),
        }
    }

    /// Start a DWARF initial length field. Returns its position for
    /// [`Bytes::patch_length`].
    pub fn initial_length(&mut self, dwarf64: bool) -> usize {
        if dwarf64 {
            self.u32(0xFFFF_FFFF);
        }

        let at = self.len();
        self.offset(dwarf64, 0);
        at
    }

    /// Fill in the initial length started at `at` to cover everything
    /// written since.
    pub fn patch_length(&mut self, at: usize, dwarf64: bool) {
        let size = if dwarf64 { 8 } else { 4 };
        let length = (self.len() - at - size) as u64;

        let mut encoded = Bytes::new(self.layout);
        encoded.offset(dwarf64, length);
        self.data[at..at + size].copy_from_slice(&encoded.data);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

#[derive(Clone, Debug, Default)]
pub struct SectionSpec {
    pub name: String,
    pub kind: u32,
    pub flags: u64,
    pub address: u64,
    pub data: Vec<u8>,
    /// The size of a `SHT_NOBITS` section. Other sections use `data.len()`.
    pub nobits_size: u64,
    pub link: u32,
    pub info: u32,
    pub align: u64,
    pub entry_size: u64,
}

impl SectionSpec {
    pub fn new(name: &str, kind: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            data,
            align: 1,
            ..Default::default()
        }
    }

    pub fn flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }

    pub fn address(mut self, address: u64) -> Self {
        self.address = address;
        self
    }

    pub fn link(mut self, link: u32) -> Self {
        self.link = link;
        self
    }

    pub fn info(mut self, info: u32) -> Self {
        self.info = info;
        self
    }

    pub fn align(mut self, align: u64) -> Self {
        self.align = align;
        self
    }

    pub fn entry_size(mut self, entry_size: u64) -> Self {
        self.entry_size = entry_size;
        self
    }

    fn size(&self) -> u64 {
        match self.kind {
            SHT_NOBITS => self.nobits_size,
            _ => self.data.len() as u64,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SegmentSpec {
    pub kind: u32,
    pub flags: u32,
    /// The section whose contents make up the segment.
    pub section: u32,
    pub align: u64,
}

/// The positions an image was laid out at.
#[derive(Clone, Debug, Default)]
pub struct Image {
    pub data: Vec<u8>,
    /// File offset of the data of each section, indexed like the section
    /// header table.
    pub section_offsets: Vec<u64>,
    pub shoff: u64,
    pub phoff: u64,
    pub shstrndx: u16,
}

#[derive(Clone, Debug)]
pub struct ElfBuilder {
    pub layout: Layout,
    pub kind: u16,
    pub machine: u16,
    pub entry: u64,
    pub sections: Vec<SectionSpec>,
    pub segments: Vec<SegmentSpec>,
}

impl ElfBuilder {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            kind: ET_EXEC,
            machine: EM_X86_64,
            entry: 0,
            sections: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Add a section, returning its index in the section header table.
    pub fn section(&mut self, spec: SectionSpec) -> u32 {
        self.sections.push(spec);
        self.sections.len() as u32
    }

    pub fn segment(&mut self, kind: u32, flags: u32, section: u32) {
        self.segments.push(SegmentSpec {
            kind,
            flags,
            section,
            align: 4,
        });
    }

    pub fn build(&self) -> Vec<u8> {
        self.image().data
    }

    pub fn image(&self) -> Image {
        let layout = self.layout;
        let (ehsize, phentsize, shentsize) = match layout.is_64 {
            true => (64u16, 56u16, 64u16),
            false => (52, 32, 40),
        };

        let mut shstrtab = Bytes::new(layout);
        shstrtab.u8(0);
        let mut name_offsets = Vec::new();
        for section in &self.sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.cstr(&section.name);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.cstr(".shstrtab");

        let phoff = match self.segments.is_empty() {
            true => 0,
            false => u64::from(ehsize),
        };
        let mut offset = u64::from(ehsize) + self.segments.len() as u64 * u64::from(phentsize);

        let mut body = Vec::new();
        let mut section_offsets = vec![0];
        for section in &self.sections {
            offset = (offset + 7) & !7;
            section_offsets.push(offset);
            if section.kind != SHT_NOBITS {
                body.push((offset, section.data.as_slice()));
                offset += section.data.len() as u64;
            }
        }
        let shstrtab_offset = offset;
        offset += shstrtab.len() as u64;
        let shoff = (offset + 7) & !7;

        let shnum = self.sections.len() as u16 + 2;
        let shstrndx = shnum - 1;

        let mut out = Bytes::new(layout);
        out.bytes(&[0x7F, b'E', b'L', b'F']);
        out.u8(if layout.is_64 { 2 } else { 1 });
        out.u8(if layout.big_endian { 2 } else { 1 });
        out.u8(1);
        out.bytes(&[0; 9]);
        out.u16(self.kind);
        out.u16(self.machine);
        out.u32(1);
        out.word(self.entry);
        out.word(phoff);
        out.word(shoff);
        out.u32(0);
        out.u16(ehsize);
        out.u16(phentsize);
        out.u16(self.segments.len() as u16);
        out.u16(shentsize);
        out.u16(shnum);
        out.u16(shstrndx);

        for segment in &self.segments {
            let section = &self.sections[segment.section as usize - 1];
            let file_offset = section_offsets[segment.section as usize];
            let file_size = match section.kind {
                SHT_NOBITS => 0,
                _ => section.size(),
            };

            out.u32(segment.kind);
            if layout.is_64 {
                out.u32(segment.flags);
            }
            out.word(file_offset);
            out.word(section.address);
            out.word(section.address);
            out.word(file_size);
            out.word(section.size());
            if !layout.is_64 {
                out.u32(segment.flags);
            }
            out.word(segment.align);
        }

        for (offset, data) in body {
            out.data.resize(offset as usize, 0);
            out.bytes(data);
        }
        out.data.resize(shstrtab_offset as usize, 0);
        out.bytes(&shstrtab.data);
        out.data.resize(shoff as usize, 0);

        // The null section header.
        out.bytes(&vec![0; usize::from(shentsize)]);

        for (index, section) in self.sections.iter().enumerate() {
            out.u32(name_offsets[index]);
            out.u32(section.kind);
            out.word(section.flags);
            out.word(section.address);
            out.word(section_offsets[index + 1]);
            out.word(section.size());
            out.u32(section.link);
            out.u32(section.info);
            out.word(section.align);
            out.word(section.entry_size);
        }

        out.u32(shstrtab_name);
        out.u32(SHT_STRTAB);
        out.word(0);
        out.word(0);
        out.word(shstrtab_offset);
        out.word(shstrtab.len() as u64);
        out.u32(0);
        out.u32(0);
        out.word(1);
        out.word(0);

        section_offsets.push(shstrtab_offset);

        Image {
            data: out.into_inner(),
            section_offsets,
            shoff,
            phoff,
            shstrndx,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SymbolSpec {
    pub name: &'static str,
    pub value: u64,
    pub size: u64,
    pub binding: u8,
    pub kind: u8,
    pub shndx: u16,
}

impl SymbolSpec {
    pub fn new(name: &'static str, value: u64, size: u64) -> Self {
        Self {
            name,
            value,
            size,
            binding: STB_GLOBAL,
            kind: STT_FUNC,
            shndx: 1,
        }
    }

    pub fn binding(mut self, binding: u8) -> Self {
        self.binding = binding;
        self
    }

    pub fn kind(mut self, kind: u8) -> Self {
        self.kind = kind;
        self
    }

    pub fn shndx(mut self, shndx: u16) -> Self {
        self.shndx = shndx;
        self
    }
}

/// Encode a symbol table and its string table. The null symbol is added
/// automatically.
pub fn symbol_table(layout: Layout, symbols: &[SymbolSpec]) -> (Vec<u8>, Vec<u8>) {
    let mut strtab = Bytes::new(layout);
    strtab.u8(0);

    let mut table = Bytes::new(layout);
    let entsize = if layout.is_64 { 24 } else { 16 };
    table.bytes(&vec![0; entsize]);

    for symbol in symbols {
        let name = match symbol.name {
            "" => 0,
            name => {
                let offset = strtab.len() as u32;
                strtab.cstr(name);
                offset
            }
        };
        let info = (symbol.binding << 4) | symbol.kind;

        table.u32(name);
        if layout.is_64 {
            table.u8(info).u8(0).u16(symbol.shndx);
            table.u64(symbol.value).u64(symbol.size);
        } else {
            table.u32(symbol.value as u32).u32(symbol.size as u32);
            table.u8(info).u8(0).u16(symbol.shndx);
        }
    }

    (table.into_inner(), strtab.into_inner())
}

/// Add `.symtab` (or `.dynsym`) and its string table to `builder`.
pub fn add_symbols(builder: &mut ElfBuilder, symbols: &[SymbolSpec], dynamic: bool) -> u32 {
    let layout = builder.layout;
    let (table, strings) = symbol_table(layout, symbols);
    let (name, strname, kind) = match dynamic {
        true => (".dynsym", ".dynstr", SHT_DYNSYM),
        false => (".symtab", ".strtab", SHT_SYMTAB),
    };

    let strtab = builder.section(SectionSpec::new(strname, SHT_STRTAB, strings));
    builder.section(
        SectionSpec::new(name, kind, table)
            .link(strtab)
            .info(1)
            .align(u64::from(layout.address_size()))
            .entry_size(if layout.is_64 { 24 } else { 16 }),
    )
}

pub const TEXT_ADDRESS: u64 = 0x1000;
pub const DATA_ADDRESS: u64 = 0x2000;
pub const BSS_ADDRESS: u64 = 0x3000;
pub const BUILD_ID: [u8; 8] = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11, 0x22, 0x33];
pub const RUST_SYMBOL: &str = "_ZN4core3fmt5write17h0123456789abcdefE";

/// The debug sections of the sample program.
#[derive(Clone, Debug, Default)]
pub struct DwarfFixture {
    pub abbrev: Vec<u8>,
    pub info: Vec<u8>,
    pub line: Vec<u8>,
    pub str: Vec<u8>,
    /// Offsets of interesting entries within `.debug_info`.
    pub main_die: u64,
    pub helper_die: u64,
    pub int_die: u64,
    pub counter_die: u64,
    pub vendor_die: u64,
    pub second_unit: u64,
    pub write_die: u64,
}

/// Debug info for a program with two units.
///
/// The first unit is a DWARF 4 C unit covering `0x1000..0x1038` with a line
/// program. It holds `main` (`0x1000..0x1020`), `helper`
/// (`0x1020..0x1038`), a base type `int`, a variable `counter` and one
/// entry with a vendor specific tag.
///
/// The second unit is a DWARF 5 unit with its own abbreviation table
/// covering `0x1038..0x1040` with a single function `write`, without a line
/// program.
pub fn sample_dwarf(layout: Layout) -> DwarfFixture {
    let mut fixture = DwarfFixture::default();

    let mut strings = Bytes::new(layout);
    strings.cstr("clang 17").cstr("main.c").cstr("/src");

    let mut abbrev = Bytes::new(layout);
    // 1: compile_unit, children
    abbrev.uleb(1).uleb(0x11).u8(1);
    abbrev.uleb(0x25).uleb(0x0E); // producer, strp
    abbrev.uleb(0x13).uleb(0x0B); // language, data1
    abbrev.uleb(0x03).uleb(0x0E); // name, strp
    abbrev.uleb(0x1B).uleb(0x0E); // comp_dir, strp
    abbrev.uleb(0x11).uleb(0x01); // low_pc, addr
    abbrev.uleb(0x12).uleb(0x06); // high_pc, data4
    abbrev.uleb(0x10).uleb(0x17); // stmt_list, sec_offset
    abbrev.u8(0).u8(0);
    // 2: subprogram, external
    abbrev.uleb(2).uleb(0x2E).u8(0);
    abbrev.uleb(0x3F).uleb(0x19); // external, flag_present
    abbrev.uleb(0x03).uleb(0x08); // name, string
    abbrev.uleb(0x3A).uleb(0x0B); // decl_file, data1
    abbrev.uleb(0x3B).uleb(0x0B); // decl_line, data1
    abbrev.uleb(0x11).uleb(0x01);
    abbrev.uleb(0x12).uleb(0x06);
    abbrev.uleb(0x49).uleb(0x13); // type, ref4
    abbrev.u8(0).u8(0);
    // 3: subprogram, static
    abbrev.uleb(3).uleb(0x2E).u8(0);
    abbrev.uleb(0x03).uleb(0x08);
    abbrev.uleb(0x3A).uleb(0x0B);
    abbrev.uleb(0x3B).uleb(0x0B);
    abbrev.uleb(0x11).uleb(0x01);
    abbrev.uleb(0x12).uleb(0x06);
    abbrev.u8(0).u8(0);
    // 4: base_type
    abbrev.uleb(4).uleb(0x24).u8(0);
    abbrev.uleb(0x03).uleb(0x08);
    abbrev.uleb(0x3E).uleb(0x0B); // encoding, data1
    abbrev.uleb(0x0B).uleb(0x0B); // byte_size, data1
    abbrev.u8(0).u8(0);
    // 5: variable
    abbrev.uleb(5).uleb(0x34).u8(0);
    abbrev.uleb(0x03).uleb(0x08);
    abbrev.uleb(0x49).uleb(0x13);
    abbrev.uleb(0x3F).uleb(0x19);
    abbrev.uleb(0x3A).uleb(0x0B);
    abbrev.uleb(0x3B).uleb(0x0B);
    abbrev.u8(0).u8(0);
    // 6: a vendor tag without attributes
    abbrev.uleb(6).uleb(0x8123).u8(0);
    abbrev.u8(0).u8(0);
    abbrev.u8(0);

    let second_abbrev = abbrev.len() as u32;
    // 1: compile_unit, children
    abbrev.uleb(1).uleb(0x11).u8(1);
    abbrev.uleb(0x03).uleb(0x08);
    abbrev.uleb(0x11).uleb(0x01);
    abbrev.uleb(0x12).uleb(0x06);
    abbrev.u8(0).u8(0);
    // 2: subprogram with a udata high_pc
    abbrev.uleb(2).uleb(0x2E).u8(0);
    abbrev.uleb(0x03).uleb(0x08);
    abbrev.uleb(0x11).uleb(0x01);
    abbrev.uleb(0x12).uleb(0x0F);
    abbrev.u8(0).u8(0);
    abbrev.u8(0);

    let mut info = Bytes::new(layout);
    info.u32(0); // unit length, patched below
    info.u16(4);
    info.u32(0);
    info.u8(layout.address_size());

    info.uleb(1);
    info.u32(0).u8(0x0C).u32(9).u32(16);
    info.word(TEXT_ADDRESS).u32(0x38).u32(0);

    fixture.main_die = info.len() as u64;
    info.uleb(2).cstr("main").u8(1).u8(3);
    info.word(TEXT_ADDRESS).u32(0x20);
    let main_type = info.len();
    info.u32(0);

    fixture.helper_die = info.len() as u64;
    info.uleb(3).cstr("helper").u8(2).u8(10);
    info.word(TEXT_ADDRESS + 0x20).u32(0x18);

    fixture.int_die = info.len() as u64;
    info.uleb(4).cstr("int").u8(5).u8(4);

    fixture.counter_die = info.len() as u64;
    info.uleb(5).cstr("counter").u32(fixture.int_die as u32).u8(1).u8(1);

    fixture.vendor_die = info.len() as u64;
    info.uleb(6);
    info.u8(0);

    info.patch_u32(main_type, fixture.int_die as u32);
    let length = info.len() as u32 - 4;
    info.patch_u32(0, length);

    fixture.second_unit = info.len() as u64;
    let start = info.len();
    info.u32(0);
    info.u16(5);
    info.u8(0x01); // DW_UT_compile
    info.u8(layout.address_size());
    info.u32(second_abbrev);
    info.uleb(1).cstr("write.c").word(TEXT_ADDRESS + 0x38).u32(8);
    fixture.write_die = info.len() as u64;
    info.uleb(2).cstr("write").word(TEXT_ADDRESS + 0x38).uleb(8);
    info.u8(0);
    let length = (info.len() - start) as u32 - 4;
    info.patch_u32(start, length);

    fixture.abbrev = abbrev.into_inner();
    fixture.info = info.into_inner();
    fixture.line = sample_line_program(layout);
    fixture.str = strings.into_inner();
    fixture
}

/// A DWARF 4 line program for the first unit of [`sample_dwarf`].
///
/// Rows:
/// - `0x1000` main.c:3
/// - `0x1004` main.c:4
/// - `0x1010` main.c:6
/// - `0x1020` include/util.h:10:5
/// - `0x1028` include/util.h:11:5
/// - `0x1038` end of sequence
pub fn sample_line_program(layout: Layout) -> Vec<u8> {
    let mut line = Bytes::new(layout);
    line.u32(0);
    line.u16(4);
    let header_length = line.len();
    line.u32(0);
    line.u8(1); // minimum_instruction_length
    line.u8(1); // maximum_operations_per_instruction
    line.u8(1); // default_is_stmt
    line.u8(-5i8 as u8); // line_base
    line.u8(14); // line_range
    line.u8(13); // opcode_base
    line.bytes(&[0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1]);
    line.cstr("include").u8(0);
    line.cstr("main.c").uleb(0).uleb(0).uleb(0);
    line.cstr("util.h").uleb(1).uleb(0).uleb(0);
    line.u8(0);
    let program = line.len();

    // DW_LNE_set_address
    line.u8(0).uleb(1 + u64::from(layout.address_size())).u8(2);
    line.word(TEXT_ADDRESS);
    line.u8(3).sleb(2); // advance_line to 3
    line.u8(1); // copy
    line.u8(75); // address += 4, line += 1
    line.u8(188); // address += 12, line += 2
    line.u8(2).uleb(0x10); // advance_pc
    line.u8(4).uleb(2); // set_file
    line.u8(3).sleb(4); // advance_line to 10
    line.u8(5).uleb(5); // set_column
    line.u8(1);
    line.u8(131); // address += 8, line += 1
    line.u8(2).uleb(0x10);
    line.u8(0).uleb(1).u8(1); // end_sequence

    line.patch_u32(header_length, (program - header_length - 4) as u32);
    let length = line.len() as u32 - 4;
    line.patch_u32(0, length);
    line.into_inner()
}

/// The symbols of the sample program, with `.text` as section 1 and
/// `.data` as section 2.
pub fn sample_symbols() -> Vec<SymbolSpec> {
    vec![
        SymbolSpec::new("", TEXT_ADDRESS, 0)
            .binding(STB_LOCAL)
            .kind(STT_SECTION),
        SymbolSpec::new("helper", TEXT_ADDRESS + 0x20, 0x18).binding(STB_LOCAL),
        SymbolSpec::new("main", TEXT_ADDRESS, 0x20),
        SymbolSpec::new(RUST_SYMBOL, TEXT_ADDRESS + 0x38, 8),
        SymbolSpec::new("counter", DATA_ADDRESS, 4)
            .kind(STT_OBJECT)
            .shndx(2),
        SymbolSpec::new("puts", 0, 0).shndx(SHN_UNDEF),
        SymbolSpec::new("ABSOLUTE", 0x42, 0)
            .kind(STT_NOTYPE)
            .shndx(SHN_ABS),
    ]
}

pub fn build_id_note(layout: Layout) -> Vec<u8> {
    let mut note = Bytes::new(layout);
    note.u32(4).u32(BUILD_ID.len() as u32).u32(3);
    note.cstr("GNU");
    note.bytes(&BUILD_ID);
    note.into_inner()
}

pub fn debug_link(layout: Layout) -> Vec<u8> {
    let mut link = Bytes::new(layout);
    link.cstr("prog.debug").align(4).u32(0x1234_5678);
    link.into_inner()
}

/// A builder for the sample program with everything but the debug info.
pub fn sample_builder(layout: Layout) -> ElfBuilder {
    let mut builder = ElfBuilder::new(layout);
    builder.entry = TEXT_ADDRESS;

    let mut text = vec![0x90; 0x40];
    text[0x1F] = 0xC3;
    let text = builder.section(
        SectionSpec::new(".text", SHT_PROGBITS, text)
            .flags(SHF_ALLOC | SHF_EXECINSTR)
            .address(TEXT_ADDRESS)
            .align(16),
    );
    builder.section(
        SectionSpec::new(".data", SHT_PROGBITS, vec![1, 2, 3, 4, 5, 6, 7, 8])
            .flags(SHF_ALLOC | SHF_WRITE)
            .address(DATA_ADDRESS)
            .align(8),
    );
    builder.section(SectionSpec {
        nobits_size: 0x100,
        ..SectionSpec::new(".bss", SHT_NOBITS, Vec::new())
            .flags(SHF_ALLOC | SHF_WRITE)
            .address(BSS_ADDRESS)
            .align(8)
    });
    let note = builder.section(
        SectionSpec::new(".note.gnu.build-id", SHT_NOTE, build_id_note(layout))
            .flags(SHF_ALLOC)
            .address(0x400)
            .align(4),
    );
    builder.section(SectionSpec::new(
        ".gnu_debuglink",
        SHT_PROGBITS,
        debug_link(layout),
    ));

    builder.segment(PT_LOAD, 0x5, text);
    builder.segment(PT_NOTE, 0x4, note);
    builder
}

/// Add the debug sections of `fixture` to `builder`.
pub fn add_dwarf(builder: &mut ElfBuilder, fixture: &DwarfFixture) {
    builder.section(SectionSpec::new(".debug_abbrev", SHT_PROGBITS, fixture.abbrev.clone()));
    builder.section(SectionSpec::new(".debug_info", SHT_PROGBITS, fixture.info.clone()));
    builder.section(SectionSpec::new(".debug_line", SHT_PROGBITS, fixture.line.clone()));
    builder.section(SectionSpec::new(".debug_str", SHT_PROGBITS, fixture.str.clone()));
}

/// The debug sections of [`sample_dwarf5`].
#[derive(Clone, Debug, Default)]
pub struct Dwarf5Fixture {
    pub abbrev: Vec<u8>,
    pub info: Vec<u8>,
    pub line: Vec<u8>,
    pub str: Vec<u8>,
    pub line_str: Vec<u8>,
    pub str_offsets: Vec<u8>,
    pub addr: Vec<u8>,
    pub rnglists: Vec<u8>,
    pub main_die: u64,
    pub helper_die: u64,
}

pub const UNIT_MD5: [u8; 16] = [0x11; 16];
pub const HEADER_MD5: [u8; 16] = [0x22; 16];

/// A DWARF 5 unit that reaches its strings, addresses and ranges through
/// the `.debug_str_offsets`, `.debug_addr` and `.debug_rnglists` tables.
///
/// The unit "unit.c" built by "clang 18" in "/work" covers `0x1000..0x1020`
/// and `0x1020..0x1038`. It holds `main` (`0x1000..0x1020`, line 3 of
/// file 0) and `helper` (`0x1020..0x1038`, line 300 of file 1). The name of
/// `main` uses `DW_FORM_indirect` and both functions take `decl_file` from
/// `DW_FORM_implicit_const`.
///
/// Line rows:
/// - `0x1000` /work/unit.c:3
/// - `0x1004` /work/unit.c:4
/// - `0x1020` /work/src/util.h:10:5
/// - `0x1038` end of sequence
pub fn sample_dwarf5(layout: Layout, dwarf64: bool) -> Dwarf5Fixture {
    let mut fixture = Dwarf5Fixture::default();
    let address_size = layout.address_size();
    let offset_size: u64 = if dwarf64 { 8 } else { 4 };

    let mut strings = Bytes::new(layout);
    strings.cstr("clang 18").cstr("unit.c").cstr("main").cstr("helper");

    let mut line_strings = Bytes::new(layout);
    line_strings.cstr("/work").cstr("src").cstr("unit.c").cstr("util.h");

    let mut str_offsets = Bytes::new(layout);
    let length = str_offsets.initial_length(dwarf64);
    str_offsets.u16(5).u16(0);
    let str_offsets_base = str_offsets.len() as u64;
    for offset in [0, 9, 16, 21] {
        str_offsets.offset(dwarf64, offset);
    }
    str_offsets.patch_length(length, dwarf64);

    let mut addr = Bytes::new(layout);
    let length = addr.initial_length(dwarf64);
    addr.u16(5).u8(address_size).u8(0);
    let addr_base = addr.len() as u64;
    addr.word(TEXT_ADDRESS).word(TEXT_ADDRESS + 0x20);
    addr.patch_length(length, dwarf64);

    let mut rnglists = Bytes::new(layout);
    let length = rnglists.initial_length(dwarf64);
    rnglists.u16(5).u8(address_size).u8(0).u32(1);
    let rnglists_base = rnglists.len() as u64;
    rnglists.offset(dwarf64, offset_size);
    rnglists.u8(0x04).uleb(0).uleb(0x20); // offset_pair
    rnglists.u8(0x03).uleb(1).uleb(0x18); // startx_length
    rnglists.u8(0x00);
    rnglists.patch_length(length, dwarf64);

    let mut abbrev = Bytes::new(layout);
    // 1: compile_unit, children
    abbrev.uleb(1).uleb(0x11).u8(1);
    abbrev.uleb(0x25).uleb(0x25); // producer, strx1
    abbrev.uleb(0x13).uleb(0x21).sleb(0x1D); // language, implicit_const C11
    abbrev.uleb(0x03).uleb(0x25); // name, strx1
    abbrev.uleb(0x1B).uleb(0x1F); // comp_dir, line_strp
    abbrev.uleb(0x72).uleb(0x17); // str_offsets_base
    abbrev.uleb(0x73).uleb(0x17); // addr_base
    abbrev.uleb(0x74).uleb(0x17); // rnglists_base
    abbrev.uleb(0x11).uleb(0x29); // low_pc, addrx1
    abbrev.uleb(0x55).uleb(0x23); // ranges, rnglistx
    abbrev.uleb(0x10).uleb(0x17); // stmt_list
    abbrev.u8(0).u8(0);
    // 2: subprogram
    abbrev.uleb(2).uleb(0x2E).u8(0);
    abbrev.uleb(0x3F).uleb(0x19); // external, flag_present
    abbrev.uleb(0x03).uleb(0x16); // name, indirect
    abbrev.uleb(0x3A).uleb(0x21).sleb(0); // decl_file, implicit_const
    abbrev.uleb(0x3B).uleb(0x0B); // decl_line, data1
    abbrev.uleb(0x11).uleb(0x1B); // low_pc, addrx
    abbrev.uleb(0x12).uleb(0x06); // high_pc, data4
    abbrev.u8(0).u8(0);
    // 3: subprogram
    abbrev.uleb(3).uleb(0x2E).u8(0);
    abbrev.uleb(0x03).uleb(0x26); // name, strx2
    abbrev.uleb(0x3A).uleb(0x21).sleb(1); // decl_file, implicit_const
    abbrev.uleb(0x3B).uleb(0x05); // decl_line, data2
    abbrev.uleb(0x11).uleb(0x2A); // low_pc, addrx2
    abbrev.uleb(0x12).uleb(0x0F); // high_pc, udata
    abbrev.u8(0).u8(0);
    abbrev.u8(0);

    let mut info = Bytes::new(layout);
    let length = info.initial_length(dwarf64);
    info.u16(5);
    info.u8(0x01); // DW_UT_compile
    info.u8(address_size);
    info.offset(dwarf64, 0);

    info.uleb(1);
    info.u8(0).u8(1).offset(dwarf64, 0);
    info.offset(dwarf64, str_offsets_base);
    info.offset(dwarf64, addr_base);
    info.offset(dwarf64, rnglists_base);
    info.u8(0).uleb(0);
    info.offset(dwarf64, 0);

    fixture.main_die = info.len() as u64;
    info.uleb(2);
    info.uleb(0x25).u8(2); // strx1 through indirect
    info.u8(3).uleb(0).u32(0x20);

    fixture.helper_die = info.len() as u64;
    info.uleb(3).u16(3).u16(300).u16(1).uleb(0x18);
    info.u8(0);
    info.patch_length(length, dwarf64);

    fixture.abbrev = abbrev.into_inner();
    fixture.info = info.into_inner();
    fixture.line = sample_line_program5(layout, dwarf64);
    fixture.str = strings.into_inner();
    fixture.line_str = line_strings.into_inner();
    fixture.str_offsets = str_offsets.into_inner();
    fixture.addr = addr.into_inner();
    fixture.rnglists = rnglists.into_inner();
    fixture
}

/// The DWARF 5 line program of [`sample_dwarf5`], with its directory and
/// file names in `.debug_line_str`.
pub fn sample_line_program5(layout: Layout, dwarf64: bool) -> Vec<u8> {
    let mut line = Bytes::new(layout);
    let length = line.initial_length(dwarf64);
    line.u16(5);
    line.u8(layout.address_size()).u8(0);
    let header_length = line.len();
    line.offset(dwarf64, 0);
    let header_start = line.len();
    line.u8(1); // minimum_instruction_length
    line.u8(1); // maximum_operations_per_instruction
    line.u8(1); // default_is_stmt
    line.u8(-5i8 as u8); // line_base
    line.u8(14); // line_range
    line.u8(13); // opcode_base
    line.bytes(&[0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1]);

    // Directories: path/line_strp.
    line.u8(1).uleb(1).uleb(0x1F);
    line.uleb(2).offset(dwarf64, 0).offset(dwarf64, 6);

    // Files: path/line_strp, directory_index/udata, MD5/data16.
    line.u8(3);
    line.uleb(1).uleb(0x1F);
    line.uleb(2).uleb(0x0F);
    line.uleb(5).uleb(0x1E);
    line.uleb(2);
    line.offset(dwarf64, 10).uleb(0).bytes(&UNIT_MD5);
    line.offset(dwarf64, 17).uleb(1).bytes(&HEADER_MD5);

    let program = line.len();
    let mut header = Bytes::new(layout);
    header.offset(dwarf64, (program - header_start) as u64);
    line.data[header_length..header_start].copy_from_slice(&header.data);

    // DW_LNE_set_address
    line.u8(0).uleb(1 + u64::from(layout.address_size())).u8(2);
    line.word(TEXT_ADDRESS);
    line.u8(4).uleb(0); // set_file
    line.u8(3).sleb(2); // advance_line to 3
    line.u8(1); // copy
    line.u8(75); // address += 4, line += 1
    line.u8(2).uleb(0x1C); // advance_pc
    line.u8(4).uleb(1);
    line.u8(3).sleb(6); // advance_line to 10
    line.u8(5).uleb(5); // set_column
    line.u8(1);
    line.u8(2).uleb(0x18);
    line.u8(0).uleb(1).u8(1); // end_sequence

    line.patch_length(length, dwarf64);
    line.into_inner()
}

/// Add the debug sections of `fixture` to `builder`.
pub fn add_dwarf5(builder: &mut ElfBuilder, fixture: &Dwarf5Fixture) {
    let sections = [
        (".debug_abbrev", &fixture.abbrev),
        (".debug_info", &fixture.info),
        (".debug_line", &fixture.line),
        (".debug_str", &fixture.str),
        (".debug_line_str", &fixture.line_str),
        (".debug_str_offsets", &fixture.str_offsets),
        (".debug_addr", &fixture.addr),
        (".debug_rnglists", &fixture.rnglists),
    ];

    for (name, data) in sections {
        builder.section(SectionSpec::new(name, SHT_PROGBITS, data.clone()));
    }
}

/// The sample program with the debug info of [`sample_dwarf5`].
pub fn sample_program5(layout: Layout, dwarf64: bool) -> Vec<u8> {
    let mut builder = sample_builder(layout);
    add_dwarf5(&mut builder, &sample_dwarf5(layout, dwarf64));
    add_symbols(&mut builder, &sample_symbols(), false);
    builder.build()
}

/// The complete sample program.
pub fn sample_program(layout: Layout) -> Vec<u8> {
    let mut builder = sample_builder(layout);
    add_dwarf(&mut builder, &sample_dwarf(layout));
    add_symbols(&mut builder, &sample_symbols(), false);
    builder.build()
}
