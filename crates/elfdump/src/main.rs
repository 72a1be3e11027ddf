use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use elfdata::dwarf::{AttrValue, Attribute, Unit};
use elfdata::elf::build_id_hex;
use elfdata::{ElfData, ParseOptions};

const HELP: &str = "\
Dump the layout, symbols and debug info of an ELF object.

USAGE
    elfdump [OPTIONS] <object file>

DESCRIPTION
    elfdump prints the contents of an ELF object in a human readable format.
    Without any flags only the file header is printed.

FLAGS
    -h
    --help
        Print this help message and then exit.

    -s
    --sections
        Print the section headers.

    -l
    --segments
        Print the program headers.

    -y
    --symbols
        Print the symbol table.

    -u
    --units
        Print the DWARF units and their entry trees.

    -L
    --lines
        Print the decoded line tables.

    -n
    --notes
        Print the build id and debug link.

    -a ADDR
    --addr ADDR
        Print the symbol and source line of a hexadecimal address. May be
        given more than once.

ENVIRONMENT
    RUST_LOG
        Controls the verbosity of diagnostic messages.
";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut opts = getopts::Options::new();
    opts.optflag("h", "help", "show this help text");
    opts.optflag("s", "sections", "print section headers");
    opts.optflag("l", "segments", "print program headers");
    opts.optflag("y", "symbols", "print the symbol table");
    opts.optflag("u", "units", "print DWARF units");
    opts.optflag("L", "lines", "print line tables");
    opts.optflag("n", "notes", "print the build id and debug link");
    opts.optmulti("a", "addr", "look up an address", "ADDR");

    let matches = opts.parse(std::env::args().skip(1))?;

    if matches.opt_present("help") {
        eprintln!("{HELP}");
        return Ok(());
    }

    if matches.free.is_empty() {
        anyhow::bail!("no object file input provided");
    }

    if matches.free.len() != 1 {
        anyhow::bail!("at most one object file can be provided as an input")
    }

    let addresses = matches
        .opt_strs("addr")
        .iter()
        .map(|addr| parse_address(addr))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let path = Path::new(&matches.free[0]);
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let data = unsafe { memmap2::Mmap::map(&file) }
        .with_context(|| format!("failed to mmap `{}`", path.display()))?;

    let options = ParseOptions::new()
        .line_programs(matches.opt_present("lines") || !addresses.is_empty());
    let elf = ElfData::parse_with(&data, options)
        .with_context(|| format!("failed to parse `{}`", path.display()))?;

    for error in elf.unit_errors() {
        log::warn!("{error}");
    }

    let stdout = std::io::stdout();
    let mut w = BufWriter::new(stdout.lock());

    dump_header(&mut w, &elf)?;
    if matches.opt_present("sections") {
        dump_sections(&mut w, &elf)?;
    }
    if matches.opt_present("segments") {
        dump_segments(&mut w, &elf)?;
    }
    if matches.opt_present("notes") {
        dump_notes(&mut w, &elf)?;
    }
    if matches.opt_present("symbols") {
        dump_symbols(&mut w, &elf)?;
    }
    if matches.opt_present("units") {
        dump_units(&mut w, &elf)?;
    }
    if matches.opt_present("lines") {
        dump_lines(&mut w, &elf)?;
    }
    for address in addresses {
        dump_address(&mut w, &elf, address)?;
    }

    w.flush()?;
    Ok(())
}

fn parse_address(text: &str) -> anyhow::Result<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    u64::from_str_radix(digits, 16).with_context(|| format!("invalid address `{text}`"))
}

fn dump_header<W: Write>(w: &mut W, elf: &ElfData) -> anyhow::Result<()> {
    let header = elf.elf().header();

    writeln!(w, "Header:")?;
    writeln!(w, "  Class:   {:?}", header.class)?;
    writeln!(w, "  Data:    {:?}", header.endian)?;
    writeln!(w, "  OS/ABI:  {:?}", header.os_abi)?;
    writeln!(w, "  Type:    {:?}", header.kind)?;
    writeln!(w, "  Machine: {:?}", header.machine)?;
    writeln!(w, "  Entry:   {:#x}", header.entry)?;
    writeln!(w, "  Flags:   {:#x}", header.flags)?;
    writeln!(w)?;

    Ok(())
}

fn dump_sections<W: Write>(w: &mut W, elf: &ElfData) -> anyhow::Result<()> {
    writeln!(w, "Sections:")?;
    writeln!(
        w,
        "  [Nr] {:<20} {:<14} {:<16} {:<8} {:<8} Flags",
        "Name", "Type", "Address", "Offset", "Size"
    )?;

    for section in elf.sections() {
        let mut flags = String::new();
        if section.is_writable() {
            flags.push('W');
        }
        if section.is_allocated() {
            flags.push('A');
        }
        if section.is_executable() {
            flags.push('X');
        }
        if section.is_compressed() {
            flags.push('C');
        }

        writeln!(
            w,
            "  [{:>2}] {:<20} {:<14} {:016x} {:08x} {:08x} {flags}",
            section.index,
            section.name,
            format!("{:?}", section.kind),
            section.address,
            section.offset,
            section.size,
        )?;
    }

    writeln!(w)?;
    Ok(())
}

fn dump_segments<W: Write>(w: &mut W, elf: &ElfData) -> anyhow::Result<()> {
    writeln!(w, "Segments:")?;
    writeln!(
        w,
        "  {:<14} {:<8} {:<16} {:<8} {:<8} Flags",
        "Type", "Offset", "VirtAddr", "FileSiz", "MemSiz"
    )?;

    for segment in elf.segments() {
        let flags = format!(
            "{}{}{}",
            if segment.is_readable() { 'R' } else { ' ' },
            if segment.is_writable() { 'W' } else { ' ' },
            if segment.is_executable() { 'E' } else { ' ' },
        );

        writeln!(
            w,
            "  {:<14} {:08x} {:016x} {:08x} {:08x} {flags}",
            format!("{:?}", segment.kind),
            segment.offset,
            segment.vaddr,
            segment.file_size,
            segment.mem_size,
        )?;
    }

    writeln!(w)?;
    Ok(())
}

fn dump_notes<W: Write>(w: &mut W, elf: &ElfData) -> anyhow::Result<()> {
    let build_id = elf.build_id().context("failed to read notes")?;
    let link = elf.debug_link().context("failed to read .gnu_debuglink")?;

    writeln!(w, "Notes:")?;
    match build_id {
        Some(id) => writeln!(w, "  Build ID:   {}", build_id_hex(id))?,
        None => writeln!(w, "  Build ID:   none")?,
    }
    match link {
        Some(link) => writeln!(
            w,
            "  Debug link: {} (crc {:#010x})",
            link.file_name_lossy(),
            link.crc
        )?,
        None => writeln!(w, "  Debug link: none")?,
    }

    writeln!(w)?;
    Ok(())
}

fn dump_symbols<W: Write>(w: &mut W, elf: &ElfData) -> anyhow::Result<()> {
    writeln!(w, "Symbols ({}):", elf.symbols().len())?;
    writeln!(
        w,
        "  {:<16} {:>6} {:<8} {:<8} {:<10} Name",
        "Value", "Size", "Type", "Bind", "Section"
    )?;

    for symbol in elf.symbols() {
        let section = match symbol.section.index() {
            Some(index) => index.to_string(),
            None => format!("{:?}", symbol.section),
        };

        writeln!(
            w,
            "  {:016x} {:>6} {:<8} {:<8} {:<10} {}",
            symbol.value,
            symbol.size,
            format!("{:?}", symbol.kind),
            format!("{:?}", symbol.binding),
            section,
            symbol.demangled(),
        )?;
    }

    writeln!(w)?;
    Ok(())
}

fn format_value(unit: &Unit, attr: &Attribute) -> String {
    match attr.value {
        AttrValue::String(_)
        | AttrValue::StrOffset(_)
        | AttrValue::LineStrOffset(_)
        | AttrValue::StrIndex(_) => match unit.attr_string(attr) {
            Ok(string) => format!("\"{}\"", String::from_utf8_lossy(string)),
            Err(e) => format!("<{e}>"),
        },
        AttrValue::Addr(_) | AttrValue::AddrIndex(_) => match unit.attr_address(attr) {
            Ok(address) => format!("{address:#x}"),
            Err(e) => format!("<{e}>"),
        },
        AttrValue::Ref(offset) => format!("<{offset:#x}>"),
        AttrValue::Flag(flag) => flag.to_string(),
        AttrValue::Sdata(value) => value.to_string(),
        AttrValue::Data(value) | AttrValue::Udata(value) => value.to_string(),
        AttrValue::SecOffset(offset) => format!("{offset:#x}"),
        AttrValue::Block(bytes) | AttrValue::Exprloc(bytes) | AttrValue::Data16(bytes) => {
            format!("{} byte block", bytes.len())
        }
        value => format!("{value:?}"),
    }
}

fn dump_units<W: Write>(w: &mut W, elf: &ElfData) -> anyhow::Result<()> {
    for unit in elf.units() {
        let header = unit.header();
        writeln!(
            w,
            "Unit at {:#x}: version {}, {:?}, address size {}, abbrevs at {:#x}",
            header.offset, header.version, header.unit_type, header.address_size, header.abbrev_offset
        )?;

        for die in unit.dies() {
            let indent = die.depth * 2 + 2;
            writeln!(w, "{:indent$}<{:#x}> {:?}", "", die.offset, die.tag)?;

            for attr in &die.attrs {
                writeln!(
                    w,
                    "{:indent$}  {:?}: {}",
                    "",
                    attr.name,
                    format_value(unit, attr)
                )?;
            }
        }

        writeln!(w)?;
    }

    Ok(())
}

fn dump_lines<W: Write>(w: &mut W, elf: &ElfData) -> anyhow::Result<()> {
    for unit in elf.units() {
        let program = match unit.line_program() {
            Some(program) => program,
            None => continue,
        };

        let comp_dir = match unit.comp_dir() {
            Ok(comp_dir) => comp_dir,
            Err(e) => {
                log::warn!("unit at {:#x}: unreadable DW_AT_comp_dir: {e}", unit.offset());
                None
            }
        };
        writeln!(w, "Line table of unit at {:#x}:", unit.offset())?;

        for sequence in program.sequences() {
            writeln!(w, "  Sequence {:#x}..{:#x}", sequence.start, sequence.end)?;

            for row in program.sequence_rows(sequence) {
                if row.end_sequence {
                    writeln!(w, "    {:016x} end", row.address)?;
                    continue;
                }

                let file = program
                    .file_path(row.file, comp_dir.as_deref())
                    .unwrap_or_else(|e| format!("<{e}>"));
                writeln!(
                    w,
                    "    {:016x} {file}:{}:{}{}",
                    row.address,
                    row.line,
                    row.column,
                    if row.is_stmt { "" } else { " (not stmt)" }
                )?;
            }
        }

        writeln!(w)?;
    }

    Ok(())
}

fn dump_address<W: Write>(w: &mut W, elf: &ElfData, address: u64) -> anyhow::Result<()> {
    let symbol = match elf.symbol_at(address) {
        Ok(symbol) => format!("{}+{:#x}", symbol.demangled(), address - symbol.value),
        Err(e) if e.is_not_found() => "??".to_string(),
        Err(e) => return Err(e.into()),
    };

    let line = match elf.line_at(address) {
        Ok(location) => format!("{}:{}", location.file, location.line),
        Err(e) if e.is_not_found() => "??:0".to_string(),
        Err(e) => return Err(e).context(format!("failed to look up {address:#x}")),
    };

    writeln!(w, "{address:#x}: {symbol} at {line}")?;
    Ok(())
}
