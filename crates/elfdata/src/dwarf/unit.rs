//! Units and their debugging information entries.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Range;

use crate::cursor::{string_at, Cursor};
use crate::dwarf::abbrev::{AbbrevCache, AbbrevTable, AttrSpec};
use crate::dwarf::line::LineProgram;
use crate::dwarf::{ranges, read_initial_length, Dwarf, DwarfSections, Format};
use crate::endian::RunTimeEndian;
use crate::raw::dwarf::{DwAt, DwForm, DwTag, DwUt};
use crate::Error;

/// The header of a unit in `.debug_info`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitHeader {
    /// The offset of the header within `.debug_info`.
    pub offset: u64,
    pub format: Format,
    /// The length of the unit, not counting the initial length field.
    pub length: u64,
    pub version: u16,
    pub unit_type: DwUt,
    pub address_size: u8,
    pub abbrev_offset: u64,
    /// The split DWARF id of skeleton and split compile units.
    pub dwo_id: Option<u64>,
    /// The signature of type units.
    pub type_signature: Option<u64>,
    /// The unit-relative offset of the type a type unit describes.
    pub type_offset: Option<u64>,
    /// The offset of the first DIE within `.debug_info`.
    pub entries_offset: u64,
}

impl UnitHeader {
    pub fn parse(section: &[u8], endian: RunTimeEndian, offset: u64) -> Result<Self, Error> {
        let mut cursor = Cursor::new(section, endian, 8);
        cursor.seek(usize::try_from(offset).map_err(|_| Error::TruncatedInput)?)?;

        let (length, format) = read_initial_length(&mut cursor)?;
        let end = (cursor.position() as u64)
            .checked_add(length)
            .filter(|&end| end <= section.len() as u64)
            .ok_or(Error::TruncatedInput)?;

        let offset_size = format.offset_size();
        let version = cursor.read_u16()?;

        let mut header = Self {
            offset,
            format,
            length,
            version,
            unit_type: DwUt::COMPILE,
            address_size: 0,
            abbrev_offset: 0,
            dwo_id: None,
            type_signature: None,
            type_offset: None,
            entries_offset: 0,
        };

        match version {
            2..=4 => {
                header.abbrev_offset = cursor.read_uint(offset_size)?;
                header.address_size = cursor.read_u8()?;
            }
            5 => {
                header.unit_type = DwUt(cursor.read_u8()?);
                header.address_size = cursor.read_u8()?;
                header.abbrev_offset = cursor.read_uint(offset_size)?;

                match header.unit_type {
                    DwUt::SKELETON | DwUt::SPLIT_COMPILE => {
                        header.dwo_id = Some(cursor.read_u64()?);
                    }
                    DwUt::TYPE | DwUt::SPLIT_TYPE => {
                        header.type_signature = Some(cursor.read_u64()?);
                        header.type_offset = Some(cursor.read_uint(offset_size)?);
                    }
                    _ => (),
                }
            }
            version => return Err(Error::UnsupportedVersion(version.into())),
        }

        if !matches!(header.address_size, 1 | 2 | 4 | 8) {
            return Err(Error::UnsupportedAddressSize(header.address_size));
        }

        header.entries_offset = cursor.position() as u64;
        if header.entries_offset > end {
            return Err(Error::TruncatedInput);
        }

        Ok(header)
    }

    /// The offset just past the end of this unit.
    pub fn end(&self) -> u64 {
        self.offset + self.format.initial_length_size() + self.length
    }

    pub fn offset_size(&self) -> u8 {
        self.format.offset_size()
    }

    /// Whether `offset` lies within this unit.
    pub fn contains(&self, offset: u64) -> bool {
        (self.offset..self.end()).contains(&offset)
    }
}

/// A decoded attribute value.
///
/// Values that refer into other sections are kept as offsets or indices and
/// resolved on demand through the owning [`Unit`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AttrValue<'a> {
    Addr(u64),
    /// An index into `.debug_addr`.
    AddrIndex(u64),
    /// A constant of unknown signedness (`DW_FORM_data1` through `data8`).
    Data(u64),
    Udata(u64),
    Sdata(i64),
    Data16(&'a [u8]),
    Flag(bool),
    /// A string stored inline in the DIE.
    String(&'a [u8]),
    /// An offset into `.debug_str`.
    StrOffset(u64),
    /// An offset into `.debug_line_str`.
    LineStrOffset(u64),
    /// An index into `.debug_str_offsets`.
    StrIndex(u64),
    /// An offset into the string section of a supplementary file.
    SupStrOffset(u64),
    /// An absolute offset of a DIE within `.debug_info`.
    Ref(u64),
    /// The signature of a type unit.
    RefSig8(u64),
    /// An offset into the `.debug_info` of a supplementary file.
    RefSup(u64),
    SecOffset(u64),
    Block(&'a [u8]),
    Exprloc(&'a [u8]),
    LocListIndex(u64),
    RangeListIndex(u64),
}

impl<'a> AttrValue<'a> {
    /// The value as an unsigned constant.
    pub fn udata(&self) -> Option<u64> {
        match *self {
            Self::Data(value) | Self::Udata(value) => Some(value),
            Self::Sdata(value) => u64::try_from(value).ok(),
            _ => None,
        }
    }

    /// The value as a signed constant.
    pub fn sdata(&self) -> Option<i64> {
        match *self {
            Self::Sdata(value) => Some(value),
            Self::Data(value) | Self::Udata(value) => i64::try_from(value).ok(),
            _ => None,
        }
    }

    pub fn flag(&self) -> Option<bool> {
        match *self {
            Self::Flag(flag) => Some(flag),
            _ => None,
        }
    }

    /// The target of a reference to a DIE in this file.
    pub fn reference(&self) -> Option<u64> {
        match *self {
            Self::Ref(offset) => Some(offset),
            _ => None,
        }
    }

    /// The value as an offset into another section.
    ///
    /// DWARF 2 and 3 encode section offsets with the plain data forms.
    pub fn section_offset(&self) -> Option<u64> {
        match *self {
            Self::SecOffset(offset) | Self::Data(offset) => Some(offset),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Attribute<'a> {
    pub name: DwAt,
    pub form: DwForm,
    pub value: AttrValue<'a>,
}

/// A debugging information entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Die<'a> {
    /// The offset of this entry within `.debug_info`.
    pub offset: u64,
    pub code: u64,
    pub tag: DwTag,
    /// The nesting depth of this entry. The root has depth 0.
    pub depth: usize,
    /// The index of the parent entry within the unit.
    pub parent: Option<usize>,
    /// The indices of the child entries within the unit, in sibling order.
    pub children: Vec<usize>,
    pub attrs: Vec<Attribute<'a>>,
}

impl<'a> Die<'a> {
    pub fn attr(&self, name: DwAt) -> Option<&Attribute<'a>> {
        self.attrs.iter().find(|attr| attr.name == name)
    }

    pub fn value(&self, name: DwAt) -> Option<AttrValue<'a>> {
        self.attr(name).map(|attr| attr.value)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// All references from this entry to other DIEs in the file.
    pub fn references(&self) -> impl Iterator<Item = u64> + '_ {
        self.attrs.iter().filter_map(|attr| attr.value.reference())
    }
}

/// A summary of a `DW_TAG_subprogram` entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Function {
    /// The offset of the entry within `.debug_info`.
    pub offset: u64,
    pub name: Option<String>,
    pub linkage_name: Option<String>,
    pub low_pc: Option<u64>,
    pub high_pc: Option<u64>,
    pub ranges: Vec<Range<u64>>,
    pub decl_file: Option<u64>,
    pub decl_line: Option<u64>,
}

impl Function {
    pub fn contains(&self, address: u64) -> bool {
        self.ranges.iter().any(|range| range.contains(&address))
    }
}

/// A summary of a `DW_TAG_variable` entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
    pub offset: u64,
    pub name: Option<String>,
    pub linkage_name: Option<String>,
    pub external: bool,
    /// Whether the variable is declared at unit scope rather than inside a
    /// function.
    pub global: bool,
    pub decl_file: Option<u64>,
    pub decl_line: Option<u64>,
}

/// A decoded unit along with its entries.
#[derive(Clone, Debug)]
pub struct Unit<'a> {
    header: UnitHeader,
    sections: DwarfSections<'a>,
    endian: RunTimeEndian,
    abbrevs: Option<Arc<AbbrevTable>>,
    dies: Vec<Die<'a>>,
    line_program: Option<LineProgram<'a>>,
}

/// Nested `DW_FORM_indirect` deeper than this is rejected.
const MAX_INDIRECTION: usize = 4;

/// How many `DW_AT_specification`/`DW_AT_abstract_origin` links are followed
/// when looking up a name.
const MAX_ORIGIN_DEPTH: usize = 8;

impl<'a> Unit<'a> {
    /// Decode the unit whose header starts at `offset` in `.debug_info`.
    pub fn parse(dwarf: &Dwarf<'a>, cache: &mut AbbrevCache, offset: u64) -> Result<Self, Error> {
        let header = UnitHeader::parse(dwarf.sections.debug_info, dwarf.endian, offset)?;
        Self::from_header(dwarf, cache, header)
    }

    pub(crate) fn from_header(
        dwarf: &Dwarf<'a>,
        cache: &mut AbbrevCache,
        header: UnitHeader,
    ) -> Result<Self, Error> {
        log::debug!(
            "unit at {:#x}: version {}, {:?}, address size {}, abbrevs at {:#x}",
            header.offset,
            header.version,
            header.unit_type,
            header.address_size,
            header.abbrev_offset
        );

        let mut unit = Self {
            header,
            sections: dwarf.sections,
            endian: dwarf.endian,
            abbrevs: None,
            dies: Vec::new(),
            line_program: None,
        };

        unit.decode_entries(cache)?;
        Ok(unit)
    }

    fn decode_entries(&mut self, cache: &mut AbbrevCache) -> Result<(), Error> {
        let info = self.sections.debug_info;
        let end = usize::try_from(self.header.end()).map_err(|_| Error::TruncatedInput)?;
        let data = info.get(..end).ok_or(Error::TruncatedInput)?;

        let mut cursor = Cursor::new(data, self.endian, self.header.address_size);
        cursor.seek(self.header.entries_offset as usize)?;

        // A unit without entries never needs its abbreviation table.
        if cursor.is_empty() || cursor.clone().read_uleb128()? == 0 {
            return Ok(());
        }

        let table = cache.get(self.sections.debug_abbrev, self.header.abbrev_offset)?;
        let mut stack: Vec<usize> = Vec::new();

        loop {
            let offset = cursor.position() as u64;
            let code = cursor.read_uleb128()?;

            if code == 0 {
                stack.pop();
                if stack.is_empty() {
                    break;
                }
                continue;
            }

            let abbrev = table.get(code).ok_or(Error::MalformedAbbrevTable {
                offset: self.header.abbrev_offset,
            })?;

            let mut attrs = Vec::with_capacity(abbrev.attrs.len());
            for spec in &abbrev.attrs {
                attrs.push(self.read_attribute(&mut cursor, spec)?);
            }

            let index = self.dies.len();
            let parent = stack.last().copied();
            self.dies.push(Die {
                offset,
                code,
                tag: abbrev.tag,
                depth: stack.len(),
                parent,
                children: Vec::new(),
                attrs,
            });

            if let Some(parent) = parent {
                self.dies[parent].children.push(index);
            }

            if abbrev.has_children {
                stack.push(index);
            } else if stack.is_empty() {
                break;
            }
        }

        self.abbrevs = Some(table);
        Ok(())
    }

    fn read_attribute(&self, cursor: &mut Cursor<'a>, spec: &AttrSpec) -> Result<Attribute<'a>, Error> {
        let mut form = spec.form;
        for _ in 0..MAX_INDIRECTION {
            if form != DwForm::INDIRECT {
                break;
            }

            form = DwForm(cursor.read_uleb128_u16()?);
        }

        let value = self.read_value(cursor, form, spec)?;

        Ok(Attribute {
            name: spec.name,
            form,
            value,
        })
    }

    fn read_value(
        &self,
        cursor: &mut Cursor<'a>,
        form: DwForm,
        spec: &AttrSpec,
    ) -> Result<AttrValue<'a>, Error> {
        let offset_size = self.header.offset_size();

        let value = match form {
            DwForm::ADDR => AttrValue::Addr(cursor.read_address()?),
            DwForm::BLOCK1 => {
                let len = cursor.read_u8()?;
                AttrValue::Block(cursor.read_bytes(len.into())?)
            }
            DwForm::BLOCK2 => {
                let len = cursor.read_u16()?;
                AttrValue::Block(cursor.read_bytes(len.into())?)
            }
            DwForm::BLOCK4 => {
                let len = cursor.read_u32()?;
                AttrValue::Block(cursor.read_bytes(len as usize)?)
            }
            DwForm::BLOCK => {
                let len = cursor.read_uleb128()?;
                let len = usize::try_from(len).map_err(|_| Error::TruncatedInput)?;
                AttrValue::Block(cursor.read_bytes(len)?)
            }
            DwForm::EXPRLOC => {
                let len = cursor.read_uleb128()?;
                let len = usize::try_from(len).map_err(|_| Error::TruncatedInput)?;
                AttrValue::Exprloc(cursor.read_bytes(len)?)
            }
            DwForm::DATA1 => AttrValue::Data(cursor.read_uint(1)?),
            DwForm::DATA2 => AttrValue::Data(cursor.read_uint(2)?),
            DwForm::DATA4 => AttrValue::Data(cursor.read_uint(4)?),
            DwForm::DATA8 => AttrValue::Data(cursor.read_uint(8)?),
            DwForm::DATA16 => AttrValue::Data16(cursor.read_bytes(16)?),
            DwForm::SDATA => AttrValue::Sdata(cursor.read_sleb128()?),
            DwForm::UDATA => AttrValue::Udata(cursor.read_uleb128()?),
            DwForm::IMPLICIT_CONST => match spec.implicit_const {
                Some(value) => AttrValue::Sdata(value),
                // Only the abbreviation can carry the constant.
                None => return Err(Error::UnsupportedForm(form.0)),
            },
            DwForm::FLAG => AttrValue::Flag(cursor.read_u8()? != 0),
            DwForm::FLAG_PRESENT => AttrValue::Flag(true),
            DwForm::STRING => AttrValue::String(cursor.read_cstring()?),
            DwForm::STRP => AttrValue::StrOffset(cursor.read_uint(offset_size)?),
            DwForm::LINE_STRP => AttrValue::LineStrOffset(cursor.read_uint(offset_size)?),
            DwForm::STRP_SUP | DwForm::GNU_STRP_ALT => {
                AttrValue::SupStrOffset(cursor.read_uint(offset_size)?)
            }
            DwForm::STRX | DwForm::GNU_STR_INDEX => AttrValue::StrIndex(cursor.read_uleb128()?),
            DwForm::STRX1 => AttrValue::StrIndex(cursor.read_uint(1)?),
            DwForm::STRX2 => AttrValue::StrIndex(cursor.read_uint(2)?),
            DwForm::STRX3 => AttrValue::StrIndex(cursor.read_uint(3)?),
            DwForm::STRX4 => AttrValue::StrIndex(cursor.read_uint(4)?),
            DwForm::ADDRX | DwForm::GNU_ADDR_INDEX => {
                AttrValue::AddrIndex(cursor.read_uleb128()?)
            }
            DwForm::ADDRX1 => AttrValue::AddrIndex(cursor.read_uint(1)?),
            DwForm::ADDRX2 => AttrValue::AddrIndex(cursor.read_uint(2)?),
            DwForm::ADDRX3 => AttrValue::AddrIndex(cursor.read_uint(3)?),
            DwForm::ADDRX4 => AttrValue::AddrIndex(cursor.read_uint(4)?),
            DwForm::REF1 => self.unit_ref(cursor.read_uint(1)?)?,
            DwForm::REF2 => self.unit_ref(cursor.read_uint(2)?)?,
            DwForm::REF4 => self.unit_ref(cursor.read_uint(4)?)?,
            DwForm::REF8 => self.unit_ref(cursor.read_uint(8)?)?,
            DwForm::REF_UDATA => self.unit_ref(cursor.read_uleb128()?)?,
            DwForm::REF_ADDR => {
                // DWARF 2 sized these like addresses.
                let size = match self.header.version {
                    2 => self.header.address_size,
                    _ => offset_size,
                };

                self.info_ref(cursor.read_uint(size)?)?
            }
            DwForm::REF_SIG8 => AttrValue::RefSig8(cursor.read_u64()?),
            DwForm::REF_SUP4 => AttrValue::RefSup(cursor.read_uint(4)?),
            DwForm::REF_SUP8 => AttrValue::RefSup(cursor.read_uint(8)?),
            DwForm::GNU_REF_ALT => AttrValue::RefSup(cursor.read_uint(offset_size)?),
            DwForm::SEC_OFFSET => AttrValue::SecOffset(cursor.read_uint(offset_size)?),
            DwForm::LOCLISTX => AttrValue::LocListIndex(cursor.read_uleb128()?),
            DwForm::RNGLISTX => AttrValue::RangeListIndex(cursor.read_uleb128()?),
            form => return Err(Error::UnsupportedForm(form.0)),
        };

        Ok(value)
    }

    fn unit_ref(&self, offset: u64) -> Result<AttrValue<'a>, Error> {
        let target = self.header.offset.checked_add(offset).ok_or(Error::DanglingReference(offset))?;
        self.info_ref(target)
    }

    fn info_ref(&self, target: u64) -> Result<AttrValue<'a>, Error> {
        if target >= self.sections.debug_info.len() as u64 {
            return Err(Error::DanglingReference(target));
        }

        Ok(AttrValue::Ref(target))
    }

    pub fn header(&self) -> &UnitHeader {
        &self.header
    }

    /// The offset of the unit header within `.debug_info`.
    pub fn offset(&self) -> u64 {
        self.header.offset
    }

    pub fn version(&self) -> u16 {
        self.header.version
    }

    pub fn address_size(&self) -> u8 {
        self.header.address_size
    }

    pub fn endian(&self) -> RunTimeEndian {
        self.endian
    }

    pub fn sections(&self) -> &DwarfSections<'a> {
        &self.sections
    }

    /// The abbreviation table of this unit. `None` if the unit has no entries.
    pub fn abbrevs(&self) -> Option<&AbbrevTable> {
        self.abbrevs.as_deref()
    }

    /// All entries of this unit in depth-first order.
    pub fn dies(&self) -> &[Die<'a>] {
        &self.dies
    }

    pub fn die(&self, index: usize) -> Option<&Die<'a>> {
        self.dies.get(index)
    }

    /// The top-level entry of the unit, if it has any entries at all.
    pub fn root(&self) -> Option<&Die<'a>> {
        self.dies.first()
    }

    /// The index of the entry starting at `offset` within `.debug_info`.
    pub fn die_index(&self, offset: u64) -> Option<usize> {
        self.dies.binary_search_by_key(&offset, |die| die.offset).ok()
    }

    pub fn die_at_offset(&self, offset: u64) -> Option<&Die<'a>> {
        self.die_index(offset).map(|index| &self.dies[index])
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = &Die<'a>> + '_ {
        self.dies
            .get(index)
            .map(|die| die.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&child| &self.dies[child])
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.dies.get(index)?.parent
    }

    /// The index of the entry following `index` among its siblings.
    pub fn next_sibling(&self, index: usize) -> Option<usize> {
        let parent = self.parent(index)?;
        let siblings = &self.dies[parent].children;
        let position = siblings.iter().position(|&child| child == index)?;

        siblings.get(position + 1).copied()
    }

    pub fn line_program(&self) -> Option<&LineProgram<'a>> {
        self.line_program.as_ref()
    }

    pub(crate) fn set_line_program(&mut self, program: LineProgram<'a>) {
        self.line_program = Some(program);
    }

    fn root_value(&self, name: DwAt) -> Option<AttrValue<'a>> {
        self.root()?.value(name)
    }

    /// The default start of the `.debug_str_offsets`, `.debug_addr` and
    /// `.debug_rnglists` tables when the unit does not name one.
    ///
    /// `v5_header` is the size of the table header in the 32-bit format. The
    /// 64-bit format only grows the initial length field.
    fn default_base(&self, v5_header: u64) -> u64 {
        match (self.header.version, self.header.format) {
            (5, Format::Dwarf32) => v5_header,
            (5, Format::Dwarf64) => v5_header + 8,
            _ => 0,
        }
    }

    fn base(&self, name: DwAt, v5_header: u64) -> u64 {
        self.root_value(name)
            .and_then(|value| value.section_offset())
            .unwrap_or_else(|| self.default_base(v5_header))
    }

    /// Resolve an index into `.debug_addr`.
    pub fn address_index(&self, index: u64) -> Result<u64, Error> {
        let base = match self.root_value(DwAt::ADDR_BASE) {
            Some(value) => value.section_offset().unwrap_or(0),
            None => match self.root_value(DwAt::GNU_ADDR_BASE) {
                Some(value) => value.section_offset().unwrap_or(0),
                None => self.default_base(8),
            },
        };

        let size = u64::from(self.header.address_size);
        let offset = index
            .checked_mul(size)
            .and_then(|offset| offset.checked_add(base))
            .and_then(|offset| usize::try_from(offset).ok())
            .ok_or(Error::TruncatedInput)?;

        let mut cursor = Cursor::new(self.sections.debug_addr, self.endian, self.header.address_size);
        cursor.seek(offset)?;
        cursor.read_address()
    }

    /// Resolve an index into `.debug_str_offsets` to a `.debug_str` offset.
    fn string_offset(&self, index: u64) -> Result<u64, Error> {
        let base = self.base(DwAt::STR_OFFSETS_BASE, 8);
        let size = self.header.offset_size();
        let offset = index
            .checked_mul(u64::from(size))
            .and_then(|offset| offset.checked_add(base))
            .and_then(|offset| usize::try_from(offset).ok())
            .ok_or(Error::TruncatedInput)?;

        let mut cursor = Cursor::new(self.sections.debug_str_offsets, self.endian, 8);
        cursor.seek(offset)?;
        cursor.read_uint(size)
    }

    /// Resolve a string attribute to its bytes.
    pub fn attr_string(&self, attr: &Attribute<'a>) -> Result<&'a [u8], Error> {
        match attr.value {
            AttrValue::String(string) => Ok(string),
            AttrValue::StrOffset(offset) => string_at(self.sections.debug_str, offset),
            AttrValue::LineStrOffset(offset) => string_at(self.sections.debug_line_str, offset),
            AttrValue::StrIndex(index) => {
                let offset = self.string_offset(index)?;
                string_at(self.sections.debug_str, offset)
            }
            _ => Err(Error::UnsupportedForm(attr.form.0)),
        }
    }

    /// Resolve an address attribute.
    pub fn attr_address(&self, attr: &Attribute<'a>) -> Result<u64, Error> {
        match attr.value {
            AttrValue::Addr(address) => Ok(address),
            AttrValue::AddrIndex(index) => self.address_index(index),
            _ => Err(Error::UnsupportedForm(attr.form.0)),
        }
    }

    fn string_value(&self, die: &Die<'a>, name: DwAt) -> Result<Option<String>, Error> {
        match die.attr(name) {
            Some(attr) => {
                let bytes = self.attr_string(attr)?;
                Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
            }
            None => Ok(None),
        }
    }

    /// The name of the unit, usually the path of the primary source file.
    pub fn name(&self) -> Result<Option<String>, Error> {
        match self.root() {
            Some(root) => self.string_value(root, DwAt::NAME),
            None => Ok(None),
        }
    }

    /// The compilation directory of the unit.
    pub fn comp_dir(&self) -> Result<Option<String>, Error> {
        match self.root() {
            Some(root) => self.string_value(root, DwAt::COMP_DIR),
            None => Ok(None),
        }
    }

    pub fn producer(&self) -> Result<Option<String>, Error> {
        match self.root() {
            Some(root) => self.string_value(root, DwAt::PRODUCER),
            None => Ok(None),
        }
    }

    /// The `DW_LANG_*` code of the unit.
    pub fn language(&self) -> Option<u64> {
        self.root_value(DwAt::LANGUAGE)?.udata()
    }

    /// The offset of the unit's line number program within `.debug_line`.
    pub fn stmt_list(&self) -> Option<u64> {
        self.root_value(DwAt::STMT_LIST)?.section_offset()
    }

    /// The base address used by range lists and location lists.
    pub fn base_address(&self) -> u64 {
        let root = match self.root() {
            Some(root) => root,
            None => return 0,
        };

        root.attr(DwAt::LOW_PC)
            .and_then(|attr| self.attr_address(attr).ok())
            .unwrap_or(0)
    }

    /// The address ranges covered by the entry at `index`.
    ///
    /// `DW_AT_ranges` takes precedence over `DW_AT_low_pc`/`DW_AT_high_pc`.
    /// Entries with neither yield no ranges.
    pub fn die_ranges(&self, index: usize) -> Result<Vec<Range<u64>>, Error> {
        let die = match self.dies.get(index) {
            Some(die) => die,
            None => return Err(Error::NotFound),
        };

        if let Some(attr) = die.attr(DwAt::RANGES) {
            return self.range_list(attr);
        }

        let low = match die.attr(DwAt::LOW_PC) {
            Some(attr) => self.attr_address(attr)?,
            None => return Ok(Vec::new()),
        };

        let high = match die.attr(DwAt::HIGH_PC) {
            Some(attr) => match attr.value {
                AttrValue::Addr(_) | AttrValue::AddrIndex(_) => self.attr_address(attr)?,
                value => {
                    let len = value.udata().ok_or(Error::UnsupportedForm(attr.form.0))?;
                    low.wrapping_add(len)
                }
            },
            None => return Ok(Vec::new()),
        };

        match low < high {
            true => Ok(alloc::vec![low..high]),
            false => Ok(Vec::new()),
        }
    }

    fn range_list(&self, attr: &Attribute<'a>) -> Result<Vec<Range<u64>>, Error> {
        let base = self.base_address();

        if self.header.version < 5 {
            let offset = attr
                .value
                .section_offset()
                .ok_or(Error::UnsupportedForm(attr.form.0))?;

            return ranges::read_ranges(self, offset, base);
        }

        let offset = match attr.value {
            AttrValue::SecOffset(offset) => offset,
            AttrValue::RangeListIndex(index) => {
                let table = self.base(DwAt::RNGLISTS_BASE, 12);
                let size = self.header.offset_size();
                let entry = index
                    .checked_mul(u64::from(size))
                    .and_then(|offset| offset.checked_add(table))
                    .and_then(|offset| usize::try_from(offset).ok())
                    .ok_or(Error::TruncatedInput)?;

                let mut cursor = Cursor::new(self.sections.debug_rnglists, self.endian, 8);
                cursor.seek(entry)?;
                table.wrapping_add(cursor.read_uint(size)?)
            }
            _ => return Err(Error::UnsupportedForm(attr.form.0)),
        };

        ranges::read_rnglist(self, offset, base)
    }

    /// The address ranges covered by the unit itself.
    pub fn ranges(&self) -> Result<Vec<Range<u64>>, Error> {
        match self.root() {
            Some(_) => self.die_ranges(0),
            None => Ok(Vec::new()),
        }
    }

    /// Follow `DW_AT_specification` and `DW_AT_abstract_origin` links within
    /// this unit until an entry with the attribute `name` is found.
    fn inherited_attr(&self, index: usize, name: DwAt) -> Option<&Attribute<'a>> {
        let mut die = self.dies.get(index)?;

        for _ in 0..MAX_ORIGIN_DEPTH {
            if let Some(attr) = die.attr(name) {
                return Some(attr);
            }

            let origin = die
                .value(DwAt::SPECIFICATION)
                .or_else(|| die.value(DwAt::ABSTRACT_ORIGIN))
                .and_then(|value| value.reference())?;

            die = self.die_at_offset(origin)?;
        }

        None
    }

    fn inherited_string(&self, index: usize, name: DwAt) -> Result<Option<String>, Error> {
        match self.inherited_attr(index, name) {
            Some(attr) => {
                let bytes = self.attr_string(attr)?;
                Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
            }
            None => Ok(None),
        }
    }

    fn linkage_name(&self, index: usize) -> Result<Option<String>, Error> {
        match self.inherited_string(index, DwAt::LINKAGE_NAME)? {
            Some(name) => Ok(Some(name)),
            None => self.inherited_string(index, DwAt::MIPS_LINKAGE_NAME),
        }
    }

    fn inherited_udata(&self, index: usize, name: DwAt) -> Option<u64> {
        self.inherited_attr(index, name)?.value.udata()
    }

    /// Summaries of all subprogram entries in this unit.
    pub fn functions(&self) -> Result<Vec<Function>, Error> {
        let mut functions = Vec::new();

        for (index, die) in self.dies.iter().enumerate() {
            if die.tag != DwTag::SUBPROGRAM {
                continue;
            }

            let ranges = self.die_ranges(index)?;

            functions.push(Function {
                offset: die.offset,
                name: self.inherited_string(index, DwAt::NAME)?,
                linkage_name: self.linkage_name(index)?,
                low_pc: ranges.iter().map(|range| range.start).min(),
                high_pc: ranges.iter().map(|range| range.end).max(),
                ranges,
                decl_file: self.inherited_udata(index, DwAt::DECL_FILE),
                decl_line: self.inherited_udata(index, DwAt::DECL_LINE),
            });
        }

        Ok(functions)
    }

    /// Summaries of all variable entries in this unit.
    pub fn variables(&self) -> Result<Vec<Variable>, Error> {
        let mut variables = Vec::new();

        for (index, die) in self.dies.iter().enumerate() {
            if die.tag != DwTag::VARIABLE {
                continue;
            }

            let external = self
                .inherited_attr(index, DwAt::EXTERNAL)
                .and_then(|attr| attr.value.flag())
                .unwrap_or(false);

            let global = match die.parent {
                Some(parent) => self.dies[parent].parent.is_none(),
                None => true,
            };

            variables.push(Variable {
                offset: die.offset,
                name: self.inherited_string(index, DwAt::NAME)?,
                linkage_name: self.linkage_name(index)?,
                external,
                global,
                decl_file: self.inherited_udata(index, DwAt::DECL_FILE),
                decl_line: self.inherited_udata(index, DwAt::DECL_LINE),
            });
        }

        Ok(variables)
    }

    /// Decode the line number program cited by `DW_AT_stmt_list`, if any.
    pub fn load_line_program(&self) -> Result<Option<LineProgram<'a>>, Error> {
        let offset = match self.stmt_list() {
            Some(offset) => offset,
            None => return Ok(None),
        };

        LineProgram::parse(&self.sections, self.endian, offset, self.header.address_size).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    const ABBREV: &[u8] = &[
        // 1: compile_unit, children, name/string, low_pc/addr, high_pc/data4
        0x01, 0x11, 0x01, 0x03, 0x08, 0x11, 0x01, 0x12, 0x06, 0x00, 0x00,
        // 2: subprogram, no children, name/string, type/ref4
        0x02, 0x2E, 0x00, 0x03, 0x08, 0x49, 0x13, 0x00, 0x00,
        // 3: base_type, no children, name/string
        0x03, 0x24, 0x00, 0x03, 0x08, 0x00, 0x00, //
        0x00,
    ];

    /// A DWARF 4 unit with a compile unit, a subprogram and a base type.
    fn info() -> Vec<u8> {
        let mut body = vec![
            0x04, 0x00, // version
            0x00, 0x00, 0x00, 0x00, // abbrev offset
            0x08, // address size
        ];

        // offset 11: compile unit
        body.extend_from_slice(&[0x01, b'a', b'.', b'c', 0x00]);
        body.extend_from_slice(&0x1000u64.to_le_bytes());
        body.extend_from_slice(&0x40u32.to_le_bytes());
        // offset 28: subprogram, type refers to offset 35
        body.extend_from_slice(&[0x02, b'f', 0x00, 35, 0x00, 0x00, 0x00]);
        // offset 35: base type
        body.extend_from_slice(&[0x03, b'i', 0x00]);
        // offset 38: another base type
        body.extend_from_slice(&[0x03, b'x', 0x00]);
        body.push(0x00);

        let mut info = (body.len() as u32).to_le_bytes().to_vec();
        info.extend(body);
        info
    }

    fn dwarf<'a>(info: &'a [u8], abbrev: &'a [u8]) -> Dwarf<'a> {
        let sections = DwarfSections {
            debug_info: info,
            debug_abbrev: abbrev,
            ..Default::default()
        };

        Dwarf::new(sections, RunTimeEndian::Little)
    }

    #[test]
    fn decode_tree() {
        let info = info();
        let dwarf = dwarf(&info, ABBREV);
        let unit = dwarf.unit_at(0).unwrap();

        assert_eq!(unit.version(), 4);
        assert_eq!(unit.dies().len(), 4);

        let root = unit.root().unwrap();
        assert_eq!(root.tag, DwTag::COMPILE_UNIT);
        assert_eq!(root.offset, 11);
        assert_eq!(root.children, vec![1, 2, 3]);
        assert_eq!(unit.name().unwrap().as_deref(), Some("a.c"));
        assert_eq!(unit.ranges().unwrap(), vec![0x1000..0x1040]);

        let sub = unit.die(1).unwrap();
        assert_eq!(sub.tag, DwTag::SUBPROGRAM);
        assert_eq!(sub.depth, 1);
        assert_eq!(sub.parent, Some(0));
        assert_eq!(sub.value(DwAt::TYPE), Some(AttrValue::Ref(35)));
        assert_eq!(unit.die_at_offset(35).unwrap().tag, DwTag::BASE_TYPE);
        assert_eq!(unit.next_sibling(1), Some(2));
        assert_eq!(unit.next_sibling(3), None);

        let functions = unit.functions().unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name.as_deref(), Some("f"));
        assert!(functions[0].ranges.is_empty());
    }

    #[test]
    fn reference_outside_info() {
        let mut info = info();
        // Point the subprogram's type at offset 0x1000.
        info[31..35].copy_from_slice(&0x1000u32.to_le_bytes());

        let dwarf = dwarf(&info, ABBREV);
        assert_eq!(
            dwarf.unit_at(0).unwrap_err(),
            Error::DanglingReference(0x1000)
        );
    }

    #[test]
    fn empty_unit_skips_abbrevs() {
        let info = [0x08, 0x00, 0x00, 0x00, 0x04, 0x00, 0x40, 0x00, 0x00, 0x00, 0x08, 0x00];
        let dwarf = dwarf(&info, &[]);

        let unit = dwarf.unit_at(0).unwrap();
        assert!(unit.root().is_none());
        assert!(unit.abbrevs().is_none());
    }

    #[test]
    fn unknown_abbrev_code() {
        let mut info = info();
        info[28] = 0x09;

        let dwarf = dwarf(&info, ABBREV);
        assert_eq!(
            dwarf.unit_at(0).unwrap_err(),
            Error::MalformedAbbrevTable { offset: 0 }
        );
    }

    #[test]
    fn unsupported_version() {
        let info = [0x07, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08];
        assert_eq!(
            UnitHeader::parse(&info, RunTimeEndian::Little, 0),
            Err(Error::UnsupportedVersion(6))
        );
    }

    #[test]
    fn dwarf5_header() {
        let info = [
            0x0C, 0x00, 0x00, 0x00, // length
            0x05, 0x00, // version
            0x01, // DW_UT_compile
            0x04, // address size
            0x00, 0x00, 0x00, 0x00, // abbrev offset
            0x00, 0x00, 0x00, 0x00,
        ];

        let header = UnitHeader::parse(&info, RunTimeEndian::Little, 0).unwrap();
        assert_eq!(header.unit_type, DwUt::COMPILE);
        assert_eq!(header.address_size, 4);
        assert_eq!(header.entries_offset, 12);
        assert_eq!(header.end(), 16);
    }

    /// A 64-bit DWARF 5 unit that leaves `.debug_addr` and
    /// `.debug_rnglists` at their default bases.
    #[test]
    fn dwarf64_default_bases() {
        // 1: compile_unit, no children, low_pc/addrx, ranges/rnglistx
        let abbrev = [0x01, 0x11, 0x00, 0x11, 0x1B, 0x55, 0x23, 0x00, 0x00, 0x00];

        let mut info = vec![0xFF; 4];
        info.extend_from_slice(&15u64.to_le_bytes());
        info.extend_from_slice(&[0x05, 0x00, 0x01, 0x08]);
        info.extend_from_slice(&0u64.to_le_bytes());
        info.extend_from_slice(&[0x01, 0x00, 0x00]);

        let mut addr = vec![0xFF; 4];
        addr.extend_from_slice(&12u64.to_le_bytes());
        addr.extend_from_slice(&[0x05, 0x00, 0x08, 0x00]);
        addr.extend_from_slice(&0x1000u64.to_le_bytes());

        let mut rnglists = vec![0xFF; 4];
        rnglists.extend_from_slice(&20u64.to_le_bytes());
        rnglists.extend_from_slice(&[0x05, 0x00, 0x08, 0x00]);
        rnglists.extend_from_slice(&1u32.to_le_bytes());
        rnglists.extend_from_slice(&8u64.to_le_bytes());
        rnglists.extend_from_slice(&[0x04, 0x00, 0x10, 0x00]);

        let sections = DwarfSections {
            debug_info: &info,
            debug_abbrev: &abbrev,
            debug_addr: &addr,
            debug_rnglists: &rnglists,
            ..Default::default()
        };
        let dwarf = Dwarf::new(sections, RunTimeEndian::Little);
        let unit = dwarf.unit_at(0).unwrap();

        assert_eq!(unit.header().format, Format::Dwarf64);
        assert_eq!(unit.header().entries_offset, 24);
        assert_eq!(unit.header().end(), info.len() as u64);
        assert_eq!(unit.base_address(), 0x1000);
        assert_eq!(unit.ranges().unwrap(), vec![0x1000..0x1010]);
    }

    #[test]
    fn attribute_values() {
        assert_eq!(AttrValue::Data(5).sdata(), Some(5));
        assert_eq!(AttrValue::Sdata(-1).udata(), None);
        assert_eq!(AttrValue::SecOffset(9).section_offset(), Some(9));
        assert_eq!(AttrValue::Flag(true).flag(), Some(true));
        assert_eq!(AttrValue::Udata(3).reference(), None);
    }
}
