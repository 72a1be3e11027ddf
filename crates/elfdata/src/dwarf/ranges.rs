//! Address range lists from `.debug_ranges` and `.debug_rnglists`.

use alloc::vec::Vec;
use core::ops::Range;

use crate::cursor::Cursor;
use crate::dwarf::Unit;
use crate::raw::dwarf::DwRle;
use crate::Error;

fn push_range(ranges: &mut Vec<Range<u64>>, start: u64, end: u64) {
    if start < end {
        ranges.push(start..end);
    }
}

/// Read a DWARF 2-4 range list starting at `offset` within `.debug_ranges`.
pub(crate) fn read_ranges(unit: &Unit<'_>, offset: u64, base: u64) -> Result<Vec<Range<u64>>, Error> {
    let data = unit.sections().debug_ranges;
    let address_size = unit.address_size();
    let max_address = match address_size {
        8 => u64::MAX,
        size => (1u64 << (u32::from(size) * 8)) - 1,
    };

    let mut cursor = Cursor::new(data, unit.endian(), address_size);
    cursor.seek(usize::try_from(offset).map_err(|_| Error::TruncatedInput)?)?;

    let mut base = base;
    let mut ranges = Vec::new();
    loop {
        let start = cursor.read_address()?;
        let end = cursor.read_address()?;

        match (start, end) {
            (0, 0) => break,
            (start, end) if start == max_address => base = end,
            (start, end) => push_range(
                &mut ranges,
                base.wrapping_add(start),
                base.wrapping_add(end),
            ),
        }
    }

    Ok(ranges)
}

/// Read a DWARF 5 range list starting at `offset` within `.debug_rnglists`.
pub(crate) fn read_rnglist(unit: &Unit<'_>, offset: u64, base: u64) -> Result<Vec<Range<u64>>, Error> {
    let data = unit.sections().debug_rnglists;

    let mut cursor = Cursor::new(data, unit.endian(), unit.address_size());
    cursor.seek(usize::try_from(offset).map_err(|_| Error::TruncatedInput)?)?;

    let mut base = base;
    let mut ranges = Vec::new();
    loop {
        match DwRle(cursor.read_u8()?) {
            DwRle::END_OF_LIST => break,
            DwRle::BASE_ADDRESSX => base = unit.address_index(cursor.read_uleb128()?)?,
            DwRle::STARTX_ENDX => {
                let start = unit.address_index(cursor.read_uleb128()?)?;
                let end = unit.address_index(cursor.read_uleb128()?)?;
                push_range(&mut ranges, start, end);
            }
            DwRle::STARTX_LENGTH => {
                let start = unit.address_index(cursor.read_uleb128()?)?;
                let len = cursor.read_uleb128()?;
                push_range(&mut ranges, start, start.wrapping_add(len));
            }
            DwRle::OFFSET_PAIR => {
                let start = cursor.read_uleb128()?;
                let end = cursor.read_uleb128()?;
                push_range(&mut ranges, base.wrapping_add(start), base.wrapping_add(end));
            }
            DwRle::BASE_ADDRESS => base = cursor.read_address()?,
            DwRle::START_END => {
                let start = cursor.read_address()?;
                let end = cursor.read_address()?;
                push_range(&mut ranges, start, end);
            }
            DwRle::START_LENGTH => {
                let start = cursor.read_address()?;
                let len = cursor.read_uleb128()?;
                push_range(&mut ranges, start, start.wrapping_add(len));
            }
            kind => return Err(Error::UnsupportedForm(kind.0.into())),
        }
    }

    Ok(ranges)
}
