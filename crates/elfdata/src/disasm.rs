//! The interface to an external disassembler.
//!
//! This crate does not decode machine instructions itself. Callers plug in
//! an implementation of [`Disassembler`] (for example one backed by
//! capstone) and [`ElfData::disassemble_symbol`] feeds it the code bytes of
//! a symbol.
//!
//! [`ElfData::disassemble_symbol`]: crate::ElfData::disassemble_symbol

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::raw::elf::Machine;
use crate::Error;

/// The instruction set to decode code bytes as.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum InstructionSet {
    X86,
    X86_64,
    Arm,
    AArch64,
    RiscV,
    PowerPc,
    PowerPc64,
    Mips,
    S390x,
    Sparc,
    LoongArch,
    Bpf,
}

impl InstructionSet {
    /// Map an ELF machine identifier to an instruction set.
    pub fn from_machine(machine: Machine) -> Option<Self> {
        let isa = match machine {
            Machine::X86 => Self::X86,
            Machine::X86_64 => Self::X86_64,
            Machine::ARM => Self::Arm,
            Machine::AARCH64 => Self::AArch64,
            Machine::RISCV => Self::RiscV,
            Machine::PPC => Self::PowerPc,
            Machine::PPC64 => Self::PowerPc64,
            Machine::MIPS => Self::Mips,
            Machine::S390 => Self::S390x,
            Machine::SPARC | Machine::SPARCV9 => Self::Sparc,
            Machine::LOONGARCH => Self::LoongArch,
            Machine::BPF => Self::Bpf,
            _ => return None,
        };

        Some(isa)
    }
}

/// A single decoded instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    /// The offset of the instruction from the start of the code bytes.
    pub offset: u64,
    pub len: usize,
    pub mnemonic: String,
}

pub trait Disassembler {
    type Error;

    /// Decode `code`, which is loaded at `address`, as a sequence of
    /// instructions.
    fn disassemble(
        &self,
        code: &[u8],
        address: u64,
        isa: InstructionSet,
    ) -> Result<Vec<Instruction>, Self::Error>;
}

/// Errors from [`ElfData::disassemble_symbol`].
///
/// [`ElfData::disassemble_symbol`]: crate::ElfData::disassemble_symbol
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DisassembleError<E> {
    /// The code bytes of the symbol could not be located.
    Elf(Error),
    /// The file targets a machine with no known instruction set.
    UnsupportedMachine(Machine),
    Disassembler(E),
}

impl<E> From<Error> for DisassembleError<E> {
    fn from(error: Error) -> Self {
        Self::Elf(error)
    }
}

impl<E: fmt::Display> fmt::Display for DisassembleError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elf(e) => e.fmt(f),
            Self::UnsupportedMachine(machine) => {
                write!(f, "no instruction set is known for machine {:?}", machine)
            }
            Self::Disassembler(e) => write!(f, "disassembler failed: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for DisassembleError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Elf(e) => Some(e),
            Self::UnsupportedMachine(_) => None,
            Self::Disassembler(e) => Some(e),
        }
    }
}
