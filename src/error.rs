use thiserror::Error;

use crate::Address;

/// Why a region definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionDefect {
    #[error("length is zero")]
    ZeroLength,
    #[error("origin + length exceeds the {0}-bit address space")]
    ExceedsAddressWidth(u32),
    #[error("overlaps region `{0}`")]
    Overlaps(String),
}

/// Every way a placement run can fail.
///
/// All variants are terminal: the same inputs always reproduce the same error, and no partial
/// layout is handed out alongside one. Messages carry the region and section names plus the
/// computed and available addresses so the configuration can be fixed by hand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("region `{0}` is defined more than once")]
    DuplicateRegion(String),

    #[error("invalid region `{region}`: {reason}")]
    InvalidRegion { region: String, reason: RegionDefect },

    #[error(
        "unknown region `{region}`{}",
        .section.as_deref().map(|s| format!(" targeted by section `{s}`")).unwrap_or_default()
    )]
    UnknownRegion {
        region: String,
        section: Option<String>,
    },

    #[error("section `{section}` has alignment {alignment}, which is not a power of two")]
    InvalidAlignment { section: String, alignment: u64 },

    #[error("section `{0}` is declared more than once")]
    DuplicateSection(String),

    #[error(
        "section `{section}` overflows region `{region}`: needs up to {needed:#010x}, region ends at {available}"
    )]
    RegionOverflow {
        region: String,
        section: String,
        needed: u128,
        available: Address,
    },

    #[error("layout is inconsistent: {detail}")]
    LayoutInconsistent { detail: String },

    #[error("symbol `{symbol}` is exported by both `{first}` and `{second}`")]
    DuplicateSymbol {
        symbol: String,
        first: String,
        second: String,
    },

    #[error("entry section `{section}`: {detail}")]
    EntryPlacementError { section: String, detail: String },
}
