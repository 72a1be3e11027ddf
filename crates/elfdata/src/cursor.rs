//! A bounds-checked reader over a byte slice.

use crate::endian::{Endian, RunTimeEndian};
use crate::Error;

/// The maximum number of bytes a LEB128 value may occupy when decoded into a
/// 64-bit integer.
pub const MAX_LEB128_LEN: usize = 10;

/// A forward-moving reader over a flat binary buffer.
///
/// The byte order and the size of a target address are fixed when the cursor
/// is created. Every read advances the position and fails with
/// [`Error::TruncatedInput`] if the buffer does not hold enough bytes, in
/// which case the position is left unchanged.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    endian: RunTimeEndian,
    address_size: u8,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8], endian: RunTimeEndian, address_size: u8) -> Self {
        Self {
            data,
            pos: 0,
            endian,
            address_size,
        }
    }

    /// A copy of this cursor at the same position which reads addresses of a
    /// different width.
    pub fn with_address_size(&self, address_size: u8) -> Self {
        Self {
            address_size,
            ..self.clone()
        }
    }

    pub fn endian(&self) -> RunTimeEndian {
        self.endian
    }

    pub fn address_size(&self) -> u8 {
        self.address_size
    }

    /// The full buffer this cursor reads from.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move to an absolute offset within the buffer.
    ///
    /// Seeking to exactly the end of the buffer is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<(), Error> {
        if offset > self.data.len() {
            return Err(Error::TruncatedInput);
        }

        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.read_bytes(len).map(|_| ())
    }

    /// Split off a cursor over the next `len` bytes and advance past them.
    ///
    /// The new cursor starts at position zero and shares this cursor's
    /// configuration.
    pub fn split(&mut self, len: usize) -> Result<Cursor<'a>, Error> {
        let data = self.read_bytes(len)?;

        Ok(Self {
            data,
            pos: 0,
            endian: self.endian,
            address_size: self.address_size,
        })
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(len).ok_or(Error::TruncatedInput)?;
        let bytes = self.data.get(self.pos..end).ok_or(Error::TruncatedInput)?;

        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let bytes = self.read_bytes(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        self.read_u8().map(|byte| byte as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let bytes = self.read_array()?;
        Ok(self.endian.u16_from_bytes(bytes))
    }

    /// Read a 3-byte unsigned integer, as used by the `strx3` and `addrx3`
    /// forms.
    pub fn read_u24(&mut self) -> Result<u32, Error> {
        let [a, b, c] = self.read_array::<3>()?;
        let bytes = match self.endian {
            RunTimeEndian::Little => [a, b, c, 0],
            RunTimeEndian::Big => [0, a, b, c],
        };

        Ok(self.endian.u32_from_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let bytes = self.read_array()?;
        Ok(self.endian.u32_from_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        let bytes = self.read_array()?;
        Ok(self.endian.u64_from_bytes(bytes))
    }

    /// Read an unsigned integer that is `size` bytes wide.
    ///
    /// Sizes other than 1, 2, 3, 4 and 8 are rejected with
    /// [`Error::TruncatedInput`] since no encoding uses them.
    pub fn read_uint(&mut self, size: u8) -> Result<u64, Error> {
        match size {
            1 => self.read_u8().map(u64::from),
            2 => self.read_u16().map(u64::from),
            3 => self.read_u24().map(u64::from),
            4 => self.read_u32().map(u64::from),
            8 => self.read_u64(),
            _ => Err(Error::TruncatedInput),
        }
    }

    /// Read a target address using the configured address size.
    pub fn read_address(&mut self) -> Result<u64, Error> {
        self.read_uint(self.address_size)
    }

    /// Read an ELF "word-sized" field: 4 bytes for 32-bit files and 8 bytes
    /// for 64-bit files.
    pub fn read_word(&mut self) -> Result<u64, Error> {
        match self.address_size {
            8 => self.read_u64(),
            _ => self.read_u32().map(u64::from),
        }
    }

    pub fn read_uleb128(&mut self) -> Result<u64, Error> {
        let mut result = 0u64;
        let mut shift = 0;
        let start = self.pos;

        for index in 0..MAX_LEB128_LEN {
            let byte = match self.read_u8() {
                Ok(byte) => byte,
                Err(e) => {
                    self.pos = start;
                    return Err(e);
                }
            };

            let payload = u64::from(byte & 0x7F);
            if index == MAX_LEB128_LEN - 1 && payload > 1 {
                self.pos = start;
                return Err(Error::OverlongEncoding);
            }

            result |= payload << shift;
            shift += 7;

            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }

        self.pos = start;
        Err(Error::OverlongEncoding)
    }

    pub fn read_sleb128(&mut self) -> Result<i64, Error> {
        let mut result = 0i64;
        let mut shift = 0;
        let start = self.pos;

        for index in 0..MAX_LEB128_LEN {
            let byte = match self.read_u8() {
                Ok(byte) => byte,
                Err(e) => {
                    self.pos = start;
                    return Err(e);
                }
            };

            // The final byte only contributes the sign bit.
            if index == MAX_LEB128_LEN - 1 && byte != 0x00 && byte != 0x7F {
                self.pos = start;
                return Err(Error::OverlongEncoding);
            }

            result |= i64::from(byte & 0x7F) << shift;
            shift += 7;

            if byte & 0x80 == 0 {
                if shift < 64 && byte & 0x40 != 0 {
                    result |= !0 << shift;
                }

                return Ok(result);
            }
        }

        self.pos = start;
        Err(Error::OverlongEncoding)
    }

    /// Read a ULEB128 value that must fit into a `u16`.
    pub fn read_uleb128_u16(&mut self) -> Result<u16, Error> {
        let start = self.pos;
        let value = self.read_uleb128()?;

        u16::try_from(value).map_err(|_| {
            self.pos = start;
            Error::OverlongEncoding
        })
    }

    /// Read a NUL-terminated string, returning the bytes before the NUL.
    pub fn read_cstring(&mut self) -> Result<&'a [u8], Error> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&byte| byte == 0)
            .ok_or(Error::TruncatedInput)?;

        self.pos += len + 1;
        Ok(&rest[..len])
    }
}

/// Read the NUL-terminated string at `offset` within a string table.
pub(crate) fn string_at(table: &[u8], offset: u64) -> Result<&[u8], Error> {
    let rest = usize::try_from(offset)
        .ok()
        .and_then(|offset| table.get(offset..))
        .ok_or(Error::CorruptStringTable { offset })?;

    let len = rest
        .iter()
        .position(|&byte| byte == 0)
        .ok_or(Error::CorruptStringTable { offset })?;

    Ok(&rest[..len])
}
