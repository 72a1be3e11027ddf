//! Encodings from the DWARF debugging format, versions 2 through 5.
//!
//! The DWARF 5 standard is available at <https://dwarfstd.org/dwarf5std.html>.

use c_enum::c_enum;

c_enum! {
    /// The kind of program construct a DIE describes (`DW_TAG_*`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
    pub enum DwTag: u16 {
        NULL = 0x00,
        ARRAY_TYPE = 0x01,
        CLASS_TYPE = 0x02,
        ENTRY_POINT = 0x03,
        ENUMERATION_TYPE = 0x04,
        FORMAL_PARAMETER = 0x05,
        IMPORTED_DECLARATION = 0x08,
        LABEL = 0x0A,
        LEXICAL_BLOCK = 0x0B,
        MEMBER = 0x0D,
        POINTER_TYPE = 0x0F,
        REFERENCE_TYPE = 0x10,
        COMPILE_UNIT = 0x11,
        STRING_TYPE = 0x12,
        STRUCTURE_TYPE = 0x13,
        SUBROUTINE_TYPE = 0x15,
        TYPEDEF = 0x16,
        UNION_TYPE = 0x17,
        UNSPECIFIED_PARAMETERS = 0x18,
        VARIANT = 0x19,
        COMMON_BLOCK = 0x1A,
        COMMON_INCLUSION = 0x1B,
        INHERITANCE = 0x1C,
        INLINED_SUBROUTINE = 0x1D,
        MODULE = 0x1E,
        PTR_TO_MEMBER_TYPE = 0x1F,
        SET_TYPE = 0x20,
        SUBRANGE_TYPE = 0x21,
        WITH_STMT = 0x22,
        ACCESS_DECLARATION = 0x23,
        BASE_TYPE = 0x24,
        CATCH_BLOCK = 0x25,
        CONST_TYPE = 0x26,
        CONSTANT = 0x27,
        ENUMERATOR = 0x28,
        FILE_TYPE = 0x29,
        FRIEND = 0x2A,
        NAMELIST = 0x2B,
        NAMELIST_ITEM = 0x2C,
        PACKED_TYPE = 0x2D,
        SUBPROGRAM = 0x2E,
        TEMPLATE_TYPE_PARAMETER = 0x2F,
        TEMPLATE_VALUE_PARAMETER = 0x30,
        THROWN_TYPE = 0x31,
        TRY_BLOCK = 0x32,
        VARIANT_PART = 0x33,
        VARIABLE = 0x34,
        VOLATILE_TYPE = 0x35,
        DWARF_PROCEDURE = 0x36,
        RESTRICT_TYPE = 0x37,
        INTERFACE_TYPE = 0x38,
        NAMESPACE = 0x39,
        IMPORTED_MODULE = 0x3A,
        UNSPECIFIED_TYPE = 0x3B,
        PARTIAL_UNIT = 0x3C,
        IMPORTED_UNIT = 0x3D,
        CONDITION = 0x3F,
        SHARED_TYPE = 0x40,
        TYPE_UNIT = 0x41,
        RVALUE_REFERENCE_TYPE = 0x42,
        TEMPLATE_ALIAS = 0x43,
        COARRAY_TYPE = 0x44,
        GENERIC_SUBRANGE = 0x45,
        DYNAMIC_TYPE = 0x46,
        ATOMIC_TYPE = 0x47,
        CALL_SITE = 0x48,
        CALL_SITE_PARAMETER = 0x49,
        SKELETON_UNIT = 0x4A,
        IMMUTABLE_TYPE = 0x4B,
        GNU_TEMPLATE_PARAMETER_PACK = 0x4107,
        GNU_FORMAL_PARAMETER_PACK = 0x4108,
        GNU_CALL_SITE = 0x4109,
        GNU_CALL_SITE_PARAMETER = 0x410A,
    }
}

c_enum! {
    /// Attribute names (`DW_AT_*`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
    pub enum DwAt: u16 {
        SIBLING = 0x01,
        LOCATION = 0x02,
        NAME = 0x03,
        ORDERING = 0x09,
        BYTE_SIZE = 0x0B,
        BIT_OFFSET = 0x0C,
        BIT_SIZE = 0x0D,
        STMT_LIST = 0x10,
        LOW_PC = 0x11,
        HIGH_PC = 0x12,
        LANGUAGE = 0x13,
        DISCR = 0x15,
        DISCR_VALUE = 0x16,
        VISIBILITY = 0x17,
        IMPORT = 0x18,
        STRING_LENGTH = 0x19,
        COMMON_REFERENCE = 0x1A,
        COMP_DIR = 0x1B,
        CONST_VALUE = 0x1C,
        CONTAINING_TYPE = 0x1D,
        DEFAULT_VALUE = 0x1E,
        INLINE = 0x20,
        IS_OPTIONAL = 0x21,
        LOWER_BOUND = 0x22,
        PRODUCER = 0x25,
        PROTOTYPED = 0x27,
        RETURN_ADDR = 0x2A,
        START_SCOPE = 0x2C,
        BIT_STRIDE = 0x2E,
        UPPER_BOUND = 0x2F,
        ABSTRACT_ORIGIN = 0x31,
        ACCESSIBILITY = 0x32,
        ADDRESS_CLASS = 0x33,
        ARTIFICIAL = 0x34,
        BASE_TYPES = 0x35,
        CALLING_CONVENTION = 0x36,
        COUNT = 0x37,
        DATA_MEMBER_LOCATION = 0x38,
        DECL_COLUMN = 0x39,
        DECL_FILE = 0x3A,
        DECL_LINE = 0x3B,
        DECLARATION = 0x3C,
        DISCR_LIST = 0x3D,
        ENCODING = 0x3E,
        EXTERNAL = 0x3F,
        FRAME_BASE = 0x40,
        FRIEND = 0x41,
        IDENTIFIER_CASE = 0x42,
        MACRO_INFO = 0x43,
        NAMELIST_ITEM = 0x44,
        PRIORITY = 0x45,
        SEGMENT = 0x46,
        SPECIFICATION = 0x47,
        STATIC_LINK = 0x48,
        TYPE = 0x49,
        USE_LOCATION = 0x4A,
        VARIABLE_PARAMETER = 0x4B,
        VIRTUALITY = 0x4C,
        VTABLE_ELEM_LOCATION = 0x4D,
        ALLOCATED = 0x4E,
        ASSOCIATED = 0x4F,
        DATA_LOCATION = 0x50,
        BYTE_STRIDE = 0x51,
        ENTRY_PC = 0x52,
        USE_UTF8 = 0x53,
        EXTENSION = 0x54,
        RANGES = 0x55,
        TRAMPOLINE = 0x56,
        CALL_COLUMN = 0x57,
        CALL_FILE = 0x58,
        CALL_LINE = 0x59,
        DESCRIPTION = 0x5A,
        BINARY_SCALE = 0x5B,
        DECIMAL_SCALE = 0x5C,
        SMALL = 0x5D,
        DECIMAL_SIGN = 0x5E,
        DIGIT_COUNT = 0x5F,
        PICTURE_STRING = 0x60,
        MUTABLE = 0x61,
        THREADS_SCALED = 0x62,
        EXPLICIT = 0x63,
        OBJECT_POINTER = 0x64,
        ENDIANITY = 0x65,
        ELEMENTAL = 0x66,
        PURE = 0x67,
        RECURSIVE = 0x68,
        SIGNATURE = 0x69,
        MAIN_SUBPROGRAM = 0x6A,
        DATA_BIT_OFFSET = 0x6B,
        CONST_EXPR = 0x6C,
        ENUM_CLASS = 0x6D,
        LINKAGE_NAME = 0x6E,
        STRING_LENGTH_BIT_SIZE = 0x6F,
        STRING_LENGTH_BYTE_SIZE = 0x70,
        RANK = 0x71,
        STR_OFFSETS_BASE = 0x72,
        ADDR_BASE = 0x73,
        RNGLISTS_BASE = 0x74,
        DWO_NAME = 0x76,
        REFERENCE = 0x77,
        RVALUE_REFERENCE = 0x78,
        MACROS = 0x79,
        CALL_ALL_CALLS = 0x7A,
        CALL_ALL_SOURCE_CALLS = 0x7B,
        CALL_ALL_TAIL_CALLS = 0x7C,
        CALL_RETURN_PC = 0x7D,
        CALL_VALUE = 0x7E,
        CALL_ORIGIN = 0x7F,
        CALL_PARAMETER = 0x80,
        CALL_PC = 0x81,
        CALL_TAIL_CALL = 0x82,
        CALL_TARGET = 0x83,
        CALL_TARGET_CLOBBERED = 0x84,
        CALL_DATA_LOCATION = 0x85,
        CALL_DATA_VALUE = 0x86,
        NORETURN = 0x87,
        ALIGNMENT = 0x88,
        EXPORT_SYMBOLS = 0x89,
        DELETED = 0x8A,
        DEFAULTED = 0x8B,
        LOCLISTS_BASE = 0x8C,
        MIPS_LINKAGE_NAME = 0x2007,
        GNU_DWO_NAME = 0x2130,
        GNU_DWO_ID = 0x2131,
        GNU_RANGES_BASE = 0x2132,
        GNU_ADDR_BASE = 0x2133,
        GNU_PUBNAMES = 0x2134,
    }
}

c_enum! {
    /// Attribute value encodings (`DW_FORM_*`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
    pub enum DwForm: u16 {
        ADDR = 0x01,
        BLOCK2 = 0x03,
        BLOCK4 = 0x04,
        DATA2 = 0x05,
        DATA4 = 0x06,
        DATA8 = 0x07,
        STRING = 0x08,
        BLOCK = 0x09,
        BLOCK1 = 0x0A,
        DATA1 = 0x0B,
        FLAG = 0x0C,
        SDATA = 0x0D,
        STRP = 0x0E,
        UDATA = 0x0F,
        REF_ADDR = 0x10,
        REF1 = 0x11,
        REF2 = 0x12,
        REF4 = 0x13,
        REF8 = 0x14,
        REF_UDATA = 0x15,
        INDIRECT = 0x16,
        SEC_OFFSET = 0x17,
        EXPRLOC = 0x18,
        FLAG_PRESENT = 0x19,
        STRX = 0x1A,
        ADDRX = 0x1B,
        REF_SUP4 = 0x1C,
        STRP_SUP = 0x1D,
        DATA16 = 0x1E,
        LINE_STRP = 0x1F,
        REF_SIG8 = 0x20,
        IMPLICIT_CONST = 0x21,
        LOCLISTX = 0x22,
        RNGLISTX = 0x23,
        REF_SUP8 = 0x24,
        STRX1 = 0x25,
        STRX2 = 0x26,
        STRX3 = 0x27,
        STRX4 = 0x28,
        ADDRX1 = 0x29,
        ADDRX2 = 0x2A,
        ADDRX3 = 0x2B,
        ADDRX4 = 0x2C,
        GNU_ADDR_INDEX = 0x1F01,
        GNU_STR_INDEX = 0x1F02,
        GNU_REF_ALT = 0x1F20,
        GNU_STRP_ALT = 0x1F21,
    }
}

impl DwForm {
    /// Whether this crate knows how to decode values of this form.
    pub fn is_known(self) -> bool {
        matches!(self.0, 0x01 | 0x03..=0x2C | 0x1F01 | 0x1F02 | 0x1F20 | 0x1F21)
    }
}

c_enum! {
    /// The kind of a unit in `.debug_info` (`DW_UT_*`, DWARF 5 only).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum DwUt: u8 {
        COMPILE = 0x01,
        TYPE = 0x02,
        PARTIAL = 0x03,
        SKELETON = 0x04,
        SPLIT_COMPILE = 0x05,
        SPLIT_TYPE = 0x06,
    }
}

c_enum! {
    /// Standard line number program opcodes (`DW_LNS_*`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum DwLns: u8 {
        COPY = 0x01,
        ADVANCE_PC = 0x02,
        ADVANCE_LINE = 0x03,
        SET_FILE = 0x04,
        SET_COLUMN = 0x05,
        NEGATE_STMT = 0x06,
        SET_BASIC_BLOCK = 0x07,
        CONST_ADD_PC = 0x08,
        FIXED_ADVANCE_PC = 0x09,
        SET_PROLOGUE_END = 0x0A,
        SET_EPILOGUE_BEGIN = 0x0B,
        SET_ISA = 0x0C,
    }
}

impl DwLns {
    /// The number of operands the standard defines for this opcode, or `None`
    /// if the opcode is not a standard one.
    pub fn operand_count(self) -> Option<u8> {
        match self {
            Self::COPY => Some(0),
            Self::ADVANCE_PC => Some(1),
            Self::ADVANCE_LINE => Some(1),
            Self::SET_FILE => Some(1),
            Self::SET_COLUMN => Some(1),
            Self::NEGATE_STMT => Some(0),
            Self::SET_BASIC_BLOCK => Some(0),
            Self::CONST_ADD_PC => Some(0),
            Self::FIXED_ADVANCE_PC => Some(1),
            Self::SET_PROLOGUE_END => Some(0),
            Self::SET_EPILOGUE_BEGIN => Some(0),
            Self::SET_ISA => Some(1),
            _ => None,
        }
    }
}

c_enum! {
    /// Extended line number program opcodes (`DW_LNE_*`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum DwLne: u8 {
        END_SEQUENCE = 0x01,
        SET_ADDRESS = 0x02,
        DEFINE_FILE = 0x03,
        SET_DISCRIMINATOR = 0x04,
    }
}

c_enum! {
    /// Content types of DWARF 5 directory and file name entries
    /// (`DW_LNCT_*`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum DwLnct: u16 {
        PATH = 0x1,
        DIRECTORY_INDEX = 0x2,
        TIMESTAMP = 0x3,
        SIZE = 0x4,
        MD5 = 0x5,
    }
}

c_enum! {
    /// Range list entry kinds in `.debug_rnglists` (`DW_RLE_*`).
    #[repr(transparent)]
    #[derive(Copy, Clone, Eq, PartialEq, Hash)]
    pub enum DwRle: u8 {
        END_OF_LIST = 0x00,
        BASE_ADDRESSX = 0x01,
        STARTX_ENDX = 0x02,
        STARTX_LENGTH = 0x03,
        OFFSET_PAIR = 0x04,
        BASE_ADDRESS = 0x05,
        START_END = 0x06,
        START_LENGTH = 0x07,
    }
}
