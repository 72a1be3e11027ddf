//! Encoders for the structures this crate decodes.
//!
//! These produce the exact on-disk bytes for a decoded value, which makes
//! them useful for building test inputs and for checking that decoding
//! loses no information.

use alloc::vec::Vec;

use tinyvec::ArrayVec;

use crate::elf::{Section, Segment};
use crate::endian::{Endian, RunTimeEndian};
use crate::raw::elf::Class;

/// Room for the longest LEB128 encoding of a 64-bit value.
pub type Leb128 = ArrayVec<[u8; 10]>;

pub fn encode_uleb128(mut value: u64) -> Leb128 {
    let mut bytes = Leb128::new();

    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;

        if value == 0 {
            bytes.push(byte);
            return bytes;
        }

        bytes.push(byte | 0x80);
    }
}

pub fn encode_sleb128(mut value: i64) -> Leb128 {
    let mut bytes = Leb128::new();

    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;

        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            bytes.push(byte);
            return bytes;
        }

        bytes.push(byte | 0x80);
    }
}

/// Accumulates fields in a fixed byte order and word size.
struct HeaderWriter {
    bytes: Vec<u8>,
    endian: RunTimeEndian,
    is_64: bool,
}

impl HeaderWriter {
    fn new(class: Class, endian: RunTimeEndian, capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            endian,
            is_64: class == Class::ELF64,
        }
    }

    fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&self.endian.u32_to_bytes(value));
    }

    /// A field that is 4 bytes wide in ELF32 and 8 bytes wide in ELF64.
    ///
    /// Values that do not fit a 32-bit word are truncated.
    fn word(&mut self, value: u64) {
        match self.is_64 {
            true => self.bytes.extend_from_slice(&self.endian.u64_to_bytes(value)),
            false => self.u32(value as u32),
        }
    }
}

/// Encode a section header table entry.
pub fn encode_section_header(section: &Section, class: Class, endian: RunTimeEndian) -> Vec<u8> {
    let mut w = HeaderWriter::new(class, endian, 64);

    w.u32(section.name_offset);
    w.u32(section.kind.0);
    w.word(section.flags.bits());
    w.word(section.address);
    w.word(section.offset);
    w.word(section.size);
    w.u32(section.link);
    w.u32(section.info);
    w.word(section.align);
    w.word(section.entry_size);

    w.bytes
}

/// Encode a program header table entry.
pub fn encode_program_header(segment: &Segment, class: Class, endian: RunTimeEndian) -> Vec<u8> {
    let mut w = HeaderWriter::new(class, endian, 56);

    w.u32(segment.kind.0);
    if w.is_64 {
        w.u32(segment.flags.bits());
    }
    w.word(segment.offset);
    w.word(segment.vaddr);
    w.word(segment.paddr);
    w.word(segment.file_size);
    w.word(segment.mem_size);
    if !w.is_64 {
        w.u32(segment.flags.bits());
    }
    w.word(segment.align);

    w.bytes
}
