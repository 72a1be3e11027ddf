//! Abbreviation tables from `.debug_abbrev`.

use alloc::collections::btree_map::{self, BTreeMap};
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::endian::RunTimeEndian;
use crate::raw::dwarf::{DwAt, DwForm, DwTag};
use crate::Error;

/// How a single attribute of a DIE is encoded.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AttrSpec {
    pub name: DwAt,
    pub form: DwForm,
    /// The value of a `DW_FORM_implicit_const` attribute, which is stored in
    /// the abbreviation rather than in the DIE.
    pub implicit_const: Option<i64>,
}

/// A template describing the layout of a DIE.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Abbreviation {
    pub code: u64,
    pub tag: DwTag,
    pub has_children: bool,
    pub attrs: Vec<AttrSpec>,
}

/// All abbreviations of a single table, indexed by code.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AbbrevTable {
    offset: u64,
    abbrevs: BTreeMap<u64, Abbreviation>,
}

impl AbbrevTable {
    /// Parse the table starting at `offset` within `.debug_abbrev`.
    ///
    /// Any problem with the table, including running off the end of the
    /// section, is reported as [`Error::MalformedAbbrevTable`].
    pub fn parse(section: &[u8], offset: u64) -> Result<Self, Error> {
        Self::parse_inner(section, offset).map_err(|e| {
            log::debug!("abbreviation table at {offset:#x}: {e}");
            Error::MalformedAbbrevTable { offset }
        })
    }

    fn parse_inner(section: &[u8], offset: u64) -> Result<Self, Error> {
        let start = usize::try_from(offset).map_err(|_| Error::TruncatedInput)?;
        let mut cursor = Cursor::new(section, RunTimeEndian::default(), 8);
        cursor.seek(start)?;

        let mut abbrevs = BTreeMap::new();
        loop {
            let code = cursor.read_uleb128()?;
            if code == 0 {
                break;
            }

            let tag = DwTag(cursor.read_uleb128_u16()?);
            if tag == DwTag::NULL {
                return Err(Error::MalformedAbbrevTable { offset });
            }

            let has_children = match cursor.read_u8()? {
                0 => false,
                1 => true,
                _ => return Err(Error::MalformedAbbrevTable { offset }),
            };

            let mut attrs = Vec::new();
            loop {
                let name = cursor.read_uleb128_u16()?;
                let form = cursor.read_uleb128_u16()?;

                match (name, form) {
                    (0, 0) => break,
                    (0, _) | (_, 0) => return Err(Error::MalformedAbbrevTable { offset }),
                    _ => (),
                }

                let form = DwForm(form);
                if !form.is_known() {
                    return Err(Error::UnsupportedForm(form.0));
                }

                let implicit_const = match form {
                    DwForm::IMPLICIT_CONST => Some(cursor.read_sleb128()?),
                    _ => None,
                };

                attrs.push(AttrSpec {
                    name: DwAt(name),
                    form,
                    implicit_const,
                });
            }

            let abbrev = Abbreviation {
                code,
                tag,
                has_children,
                attrs,
            };

            match abbrevs.entry(code) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(abbrev);
                }
                btree_map::Entry::Occupied(_) => {
                    return Err(Error::MalformedAbbrevTable { offset })
                }
            }
        }

        Ok(Self { offset, abbrevs })
    }

    /// The offset of this table within `.debug_abbrev`.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn get(&self, code: u64) -> Option<&Abbreviation> {
        self.abbrevs.get(&code)
    }

    pub fn len(&self) -> usize {
        self.abbrevs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abbrevs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Abbreviation> + '_ {
        self.abbrevs.values()
    }
}

/// Abbreviation tables shared between units, keyed by their offset.
///
/// Failures are cached as well so that every unit citing a broken table
/// reports the same error.
#[derive(Clone, Debug, Default)]
pub struct AbbrevCache {
    tables: BTreeMap<u64, Result<Arc<AbbrevTable>, Error>>,
}

impl AbbrevCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, section: &[u8], offset: u64) -> Result<Arc<AbbrevTable>, Error> {
        self.tables
            .entry(offset)
            .or_insert_with(|| AbbrevTable::parse(section, offset).map(Arc::new))
            .clone()
    }

    /// The number of distinct table offsets that have been requested.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
