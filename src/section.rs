/// How the byte size of a section is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// A size fixed by configuration.
    Fixed(u64),
    /// Sized by its contents; the caller measures them before planning.
    GrowToFit(u64),
    /// Space held back with no contents, such as a stack. Conventionally placed last.
    Reserved(u64),
}

impl SizeMode {
    pub fn bytes(&self) -> u64 {
        match self {
            SizeMode::Fixed(n) => *n,
            SizeMode::GrowToFit(n) => *n,
            SizeMode::Reserved(n) => *n,
        }
    }
}

/// Symbols to publish at the boundaries of a placed section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportBoundaries {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// One logical section to place, in caller order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    pub name: String,
    pub alignment: u64,
    pub region: String,
    pub size: SizeMode,
    pub export: ExportBoundaries,
}

impl SectionSpec {
    pub fn new(name: impl Into<String>, region: impl Into<String>, size: SizeMode) -> Self {
        SectionSpec {
            name: name.into(),
            alignment: 1,
            region: region.into(),
            size,
            export: ExportBoundaries::default(),
        }
    }

    pub fn fixed(name: impl Into<String>, region: impl Into<String>, bytes: u64) -> Self {
        Self::new(name, region, SizeMode::Fixed(bytes))
    }

    pub fn grow_to_fit(
        name: impl Into<String>,
        region: impl Into<String>,
        content_size: u64,
    ) -> Self {
        Self::new(name, region, SizeMode::GrowToFit(content_size))
    }

    pub fn reserved(name: impl Into<String>, region: impl Into<String>, bytes: u64) -> Self {
        Self::new(name, region, SizeMode::Reserved(bytes))
    }

    pub fn with_alignment(mut self, alignment: u64) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn export_start(mut self, symbol: impl Into<String>) -> Self {
        self.export.start = Some(symbol.into());
        self
    }

    pub fn export_end(mut self, symbol: impl Into<String>) -> Self {
        self.export.end = Some(symbol.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.size.bytes()
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self.size, SizeMode::Reserved(_))
    }
}
