//! Byte order handling.
//!
//! ELF files declare their byte order in the identification bytes, so most of
//! the crate works with [`RunTimeEndian`]. The zero-sized [`Little`] and
//! [`Big`] types are available for code that knows the order statically.

use self::private::Sealed;

mod private {
    pub trait Sealed {}
}

pub trait Endian: Sealed + Copy {
    fn is_big_endian(&self) -> bool;

    fn u16_from_bytes(&self, bytes: [u8; 2]) -> u16;
    fn u32_from_bytes(&self, bytes: [u8; 4]) -> u32;
    fn u64_from_bytes(&self, bytes: [u8; 8]) -> u64;

    fn i16_from_bytes(&self, bytes: [u8; 2]) -> i16 {
        self.u16_from_bytes(bytes) as _
    }
    fn i32_from_bytes(&self, bytes: [u8; 4]) -> i32 {
        self.u32_from_bytes(bytes) as _
    }
    fn i64_from_bytes(&self, bytes: [u8; 8]) -> i64 {
        self.u64_from_bytes(bytes) as _
    }

    fn u16_to_bytes(&self, value: u16) -> [u8; 2];
    fn u32_to_bytes(&self, value: u32) -> [u8; 4];
    fn u64_to_bytes(&self, value: u64) -> [u8; 8];

    fn i16_to_bytes(&self, value: i16) -> [u8; 2] {
        self.u16_to_bytes(value as _)
    }
    fn i32_to_bytes(&self, value: i32) -> [u8; 4] {
        self.u32_to_bytes(value as _)
    }
    fn i64_to_bytes(&self, value: i64) -> [u8; 8] {
        self.u64_to_bytes(value as _)
    }
}

macro_rules! endian_impl {
    ($type:ty, $big:expr => $from:ident $to:ident) => {
        impl Endian for $type {
            fn is_big_endian(&self) -> bool {
                $big
            }

            fn u16_from_bytes(&self, bytes: [u8; 2]) -> u16 {
                u16::$from(bytes)
            }
            fn u32_from_bytes(&self, bytes: [u8; 4]) -> u32 {
                u32::$from(bytes)
            }
            fn u64_from_bytes(&self, bytes: [u8; 8]) -> u64 {
                u64::$from(bytes)
            }

            fn u16_to_bytes(&self, value: u16) -> [u8; 2] {
                value.$to()
            }
            fn u32_to_bytes(&self, value: u32) -> [u8; 4] {
                value.$to()
            }
            fn u64_to_bytes(&self, value: u64) -> [u8; 8] {
                value.$to()
            }
        }

        impl Sealed for $type {}
    };
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Little;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Big;

endian_impl!(Little, false => from_le_bytes to_le_bytes);
endian_impl!(Big, true => from_be_bytes to_be_bytes);

/// A byte order that is only known once the input has been inspected.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum RunTimeEndian {
    #[default]
    Little,
    Big,
}

macro_rules! dispatch {
    ($self:ident.$method:ident($arg:expr)) => {
        match $self {
            RunTimeEndian::Little => Little.$method($arg),
            RunTimeEndian::Big => Big.$method($arg),
        }
    };
}

impl Endian for RunTimeEndian {
    fn is_big_endian(&self) -> bool {
        matches!(self, Self::Big)
    }

    fn u16_from_bytes(&self, bytes: [u8; 2]) -> u16 {
        dispatch!(self.u16_from_bytes(bytes))
    }
    fn u32_from_bytes(&self, bytes: [u8; 4]) -> u32 {
        dispatch!(self.u32_from_bytes(bytes))
    }
    fn u64_from_bytes(&self, bytes: [u8; 8]) -> u64 {
        dispatch!(self.u64_from_bytes(bytes))
    }

    fn u16_to_bytes(&self, value: u16) -> [u8; 2] {
        dispatch!(self.u16_to_bytes(value))
    }
    fn u32_to_bytes(&self, value: u32) -> [u8; 4] {
        dispatch!(self.u32_to_bytes(value))
    }
    fn u64_to_bytes(&self, value: u64) -> [u8; 8] {
        dispatch!(self.u64_to_bytes(value))
    }
}

impl Sealed for RunTimeEndian {}

impl From<Little> for RunTimeEndian {
    fn from(_: Little) -> Self {
        Self::Little
    }
}

impl From<Big> for RunTimeEndian {
    fn from(_: Big) -> Self {
        Self::Big
    }
}
