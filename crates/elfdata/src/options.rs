/// Which symbol table answers address lookups.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SymbolSource {
    /// The static symbol table, `.symtab`.
    Symtab,
    /// The dynamic symbol table, `.dynsym`.
    Dynsym,
    /// `.symtab` if the file has one, `.dynsym` otherwise.
    #[default]
    Auto,
}

/// Options controlling how much of a file [`ElfData`] decodes and how it
/// reacts to malformed debugging information.
///
/// [`ElfData`]: crate::ElfData
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParseOptions {
    pub(crate) dwarf: bool,
    pub(crate) line_programs: bool,
    pub(crate) symbols: SymbolSource,
    pub(crate) eager_references: bool,
    pub(crate) strict: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self {
            dwarf: true,
            line_programs: true,
            symbols: SymbolSource::Auto,
            eager_references: false,
            strict: false,
        }
    }

    /// Decode DWARF debugging information.
    ///
    /// Defaults to true.
    pub fn dwarf(mut self, dwarf: bool) -> Self {
        self.dwarf = dwarf;
        self
    }

    /// Run the line number program of each unit.
    ///
    /// Has no effect if DWARF decoding is disabled. Defaults to true.
    pub fn line_programs(mut self, line_programs: bool) -> Self {
        self.line_programs = line_programs;
        self
    }

    /// Select the symbol table used for address lookups.
    ///
    /// Defaults to [`SymbolSource::Auto`].
    pub fn symbols(mut self, source: SymbolSource) -> Self {
        self.symbols = source;
        self
    }

    /// Resolve every reference between DIEs while parsing.
    ///
    /// If set, the first reference that does not land on a DIE fails the
    /// parse with [`Error::DanglingReference`]. Otherwise references are only
    /// resolved when asked for through [`ElfData::resolve_reference`].
    ///
    /// Defaults to false.
    ///
    /// [`Error::DanglingReference`]: crate::Error::DanglingReference
    /// [`ElfData::resolve_reference`]: crate::ElfData::resolve_reference
    pub fn eager_references(mut self, eager: bool) -> Self {
        self.eager_references = eager;
        self
    }

    /// Fail the whole parse if any unit or line program fails to decode.
    ///
    /// If not set, such failures are recorded and the remaining units stay
    /// available. Defaults to false.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}
