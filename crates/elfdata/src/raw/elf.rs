//! Definitions from the System V ABI (gABI) for ELF files.
//!
//! The generic ABI is available at
//! <https://refspecs.linuxfoundation.org/elf/gabi4+/contents.html>.

use bitflags::bitflags;
use c_enum::c_enum;
use zerocopy::{ByteOrder, FromBytes, FromZeroes, Unaligned, U32};

/// The four bytes every ELF file starts with.
pub const MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// The only defined ELF version.
pub const EV_CURRENT: u8 = 1;

/// The identification bytes at the very start of an ELF file.
///
/// This is the only part of the file header whose layout does not depend on
/// the class and byte order of the file.
#[repr(C)]
#[derive(Copy, Clone, Debug, FromBytes, FromZeroes, Unaligned)]
pub struct Ident {
    /// Must be [`MAGIC`].
    pub magic: [u8; 4],

    /// Whether the file uses 32-bit or 64-bit structures.
    pub class: Class,

    /// The byte order of all multi-byte fields in the file.
    pub data: Data,

    /// The ELF header version. Must be [`EV_CURRENT`].
    pub version: u8,

    /// The OS or ABI specific extensions used by the file.
    pub os_abi: OsAbi,

    /// The version of the ABI named by `os_abi`.
    pub abi_version: u8,

    #[doc(hidden)]
    pub _padding: [u8; 7],
}

c_enum! {
    /// The file class, which selects between 32-bit and 64-bit structures.
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash, FromBytes, FromZeroes, Unaligned)]
    pub enum Class: u8 {
        NONE = 0,
        ELF32 = 1,
        ELF64 = 2,
    }
}

c_enum! {
    /// The data encoding of the file.
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash, FromBytes, FromZeroes, Unaligned)]
    pub enum Data: u8 {
        NONE = 0,
        /// Two's complement, little endian.
        LSB = 1,
        /// Two's complement, big endian.
        MSB = 2,
    }
}

c_enum! {
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash, FromBytes, FromZeroes, Unaligned)]
    pub enum OsAbi: u8 {
        SYSV = 0,
        HPUX = 1,
        NETBSD = 2,
        GNU = 3,
        SOLARIS = 6,
        AIX = 7,
        IRIX = 8,
        FREEBSD = 9,
        OPENBSD = 12,
        ARM = 97,
        STANDALONE = 255,
    }
}

c_enum! {
    /// The object file type (`e_type`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum FileType: u16 {
        NONE = 0,
        /// A relocatable object.
        REL = 1,
        /// A position-dependent executable.
        EXEC = 2,
        /// A shared object or position-independent executable.
        DYN = 3,
        CORE = 4,
    }
}

c_enum! {
    /// The target architecture (`e_machine`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum Machine: u16 {
        NONE = 0,
        SPARC = 2,
        X86 = 3,
        M68K = 4,
        MIPS = 8,
        PPC = 20,
        PPC64 = 21,
        S390 = 22,
        ARM = 40,
        SPARCV9 = 43,
        IA_64 = 50,
        X86_64 = 62,
        AARCH64 = 183,
        RISCV = 243,
        BPF = 247,
        LOONGARCH = 258,
    }
}

c_enum! {
    /// The section type (`sh_type`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum SectionType: u32 {
        NULL = 0,
        PROGBITS = 1,
        SYMTAB = 2,
        STRTAB = 3,
        RELA = 4,
        HASH = 5,
        DYNAMIC = 6,
        NOTE = 7,
        /// Occupies memory at runtime but no space in the file.
        NOBITS = 8,
        REL = 9,
        SHLIB = 10,
        DYNSYM = 11,
        INIT_ARRAY = 14,
        FINI_ARRAY = 15,
        PREINIT_ARRAY = 16,
        GROUP = 17,
        SYMTAB_SHNDX = 18,
        GNU_HASH = 0x6FFF_FFF6,
        GNU_VERDEF = 0x6FFF_FFFD,
        GNU_VERNEED = 0x6FFF_FFFE,
        GNU_VERSYM = 0x6FFF_FFFF,
    }
}

/// Section attribute flags (`sh_flags`).
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SectionFlags(u64);

bitflags! {
    impl SectionFlags: u64 {
        const WRITE = 0x1;
        const ALLOC = 0x2;
        const EXECINSTR = 0x4;
        const MERGE = 0x10;
        const STRINGS = 0x20;
        const INFO_LINK = 0x40;
        const LINK_ORDER = 0x80;
        const OS_NONCONFORMING = 0x100;
        const GROUP = 0x200;
        const TLS = 0x400;

        /// The section data is compressed and starts with a compression
        /// header.
        const COMPRESSED = 0x800;

        // Processor and OS specific bits are kept as-is.
        const _ = !0;
    }
}

c_enum! {
    /// The segment type (`p_type`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum SegmentType: u32 {
        NULL = 0,
        LOAD = 1,
        DYNAMIC = 2,
        INTERP = 3,
        NOTE = 4,
        SHLIB = 5,
        PHDR = 6,
        TLS = 7,
        GNU_EH_FRAME = 0x6474_E550,
        GNU_STACK = 0x6474_E551,
        GNU_RELRO = 0x6474_E552,
        GNU_PROPERTY = 0x6474_E553,
    }
}

/// Segment permission flags (`p_flags`).
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SegmentFlags(u32);

bitflags! {
    impl SegmentFlags: u32 {
        const X = 0x1;
        const W = 0x2;
        const R = 0x4;

        const _ = !0;
    }
}

c_enum! {
    /// Symbol binding, the high nibble of `st_info`.
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum SymbolBinding: u8 {
        LOCAL = 0,
        GLOBAL = 1,
        WEAK = 2,
        GNU_UNIQUE = 10,
    }
}

c_enum! {
    /// Symbol type, the low nibble of `st_info`.
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum SymbolType: u8 {
        NOTYPE = 0,
        OBJECT = 1,
        FUNC = 2,
        SECTION = 3,
        FILE = 4,
        COMMON = 5,
        TLS = 6,
        GNU_IFUNC = 10,
    }
}

/// An undefined, missing or irrelevant section reference.
pub const SHN_UNDEF: u16 = 0;
/// The start of the reserved section index range.
pub const SHN_LORESERVE: u16 = 0xFF00;
/// Symbols defined relative to this index are absolute.
pub const SHN_ABS: u16 = 0xFFF1;
/// Common symbols that have not been allocated yet.
pub const SHN_COMMON: u16 = 0xFFF2;
/// The real index lives somewhere else.
pub const SHN_XINDEX: u16 = 0xFFFF;

/// `e_phnum` value signalling that the real count is in section 0.
pub const PN_XNUM: u16 = 0xFFFF;

/// The note type of a GNU build identifier.
pub const NT_GNU_BUILD_ID: u32 = 3;

/// The owner name of GNU notes.
pub const NOTE_NAME_GNU: &[u8] = b"GNU";

pub const EHDR32_SIZE: usize = 52;
pub const EHDR64_SIZE: usize = 64;
pub const SHDR32_SIZE: usize = 40;
pub const SHDR64_SIZE: usize = 64;
pub const PHDR32_SIZE: usize = 32;
pub const PHDR64_SIZE: usize = 56;
pub const SYM32_SIZE: usize = 16;
pub const SYM64_SIZE: usize = 24;

/// The fixed header of an ELF note.
///
/// The layout is the same for both classes. The name and descriptor that
/// follow are each padded to a 4-byte boundary.
#[repr(C)]
#[derive(Copy, Clone, Debug, FromBytes, FromZeroes, Unaligned)]
pub struct NoteHeader<O: ByteOrder> {
    /// The length of the owner name, including its NUL terminator.
    pub namesz: U32<O>,

    /// The length of the descriptor.
    pub descsz: U32<O>,

    /// The note type, interpreted relative to the owner name.
    pub kind: U32<O>,
}
