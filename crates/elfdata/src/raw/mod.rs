//! Raw types and constants as they are laid out on disk.
//!
//! - [`elf`] - the ELF identification bytes, header field values and flag
//!   sets from the System V ABI.
//! - [`dwarf`] - tag, attribute, form and line number program encodings from
//!   the DWARF 2 through 5 standards.
//!
//! The enumerations here are open: any value that fits the underlying integer
//! can be represented, so values added by newer producers survive decoding.

pub mod dwarf;
pub mod elf;
