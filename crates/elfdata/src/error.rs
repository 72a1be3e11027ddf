use core::fmt;

/// Errors produced while decoding an ELF file or querying the decoded data.
///
/// Every variant except [`Error::NotFound`] means that the input does not
/// satisfy the invariants of its format. `NotFound` is the ordinary answer
/// to a lookup that has no result.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Hit the end of input before it was expected.
    TruncatedInput,

    /// The file does not start with `\x7fELF` or declares an unknown ELF
    /// version.
    InvalidMagic,

    /// The ELF class byte was neither 32-bit nor 64-bit.
    UnsupportedClass(u8),

    /// The ELF data encoding byte was neither little nor big endian.
    UnsupportedEncoding(u8),

    /// A DWARF unit or line program uses a version this crate cannot decode.
    UnsupportedVersion(u32),

    /// A DWARF unit declares an address size other than 1, 2, 4 or 8 bytes.
    UnsupportedAddressSize(u8),

    /// A string table lookup went past the end of the table, or the string
    /// at that offset was not NUL-terminated.
    CorruptStringTable { offset: u64 },

    /// A LEB128 value used more bytes than its target width allows.
    OverlongEncoding,

    /// An abbreviation table is malformed, or a DIE cites an abbreviation
    /// code that the table does not define.
    MalformedAbbrevTable { offset: u64 },

    /// An attribute uses a form that cannot be decoded in its context.
    UnsupportedForm(u16),

    /// A reference points outside of `.debug_info`, or no DIE starts at the
    /// referenced offset.
    DanglingReference(u64),

    /// A line number program contains an invalid header field or opcode
    /// length.
    MalformedLineProgram { offset: u64 },

    /// A line table row cites a file that is not in the program's file
    /// table.
    InvalidFileIndex(u64),

    /// The queried address or offset is not covered by any entity.
    NotFound,
}

impl Error {
    /// Whether this is the ordinary "no result" outcome of a query rather
    /// than a decode failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedInput => f.write_str("unexpected end of input"),
            Self::InvalidMagic => f.write_str("input is not an ELF file"),
            Self::UnsupportedClass(class) => write!(f, "unsupported ELF class {class}"),
            Self::UnsupportedEncoding(data) => write!(f, "unsupported ELF data encoding {data}"),
            Self::UnsupportedVersion(version) => write!(f, "unsupported format version {version}"),
            Self::UnsupportedAddressSize(size) => write!(f, "unsupported address size {size}"),
            Self::CorruptStringTable { offset } => {
                write!(f, "string table lookup at offset {offset:#x} is out of bounds")
            }
            Self::OverlongEncoding => f.write_str("LEB128 value is too long for its target width"),
            Self::MalformedAbbrevTable { offset } => {
                write!(f, "malformed abbreviation table at offset {offset:#x}")
            }
            Self::UnsupportedForm(form) => write!(f, "unsupported attribute form {form:#x}"),
            Self::DanglingReference(offset) => {
                write!(f, "reference to offset {offset:#x} does not resolve to a DIE")
            }
            Self::MalformedLineProgram { offset } => {
                write!(f, "malformed line number program at offset {offset:#x}")
            }
            Self::InvalidFileIndex(index) => {
                write!(f, "line table row cites unknown file index {index}")
            }
            Self::NotFound => f.write_str("no entry covers the requested location"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
