//! GNU ld fragment describing a finished layout.
//!
//! The fragment carries a `MEMORY` block for the regions and one `PROVIDE` per exported
//! symbol, so a downstream link step can `INCLUDE` it and startup code can refer to
//! boundaries such as the top of the stack.

use std::fmt;

use crate::placement::ValidatedLayout;
use crate::{RegionTable, SymbolTable};

pub struct LinkerScript<'a> {
    layout: &'a ValidatedLayout,
    regions: &'a RegionTable,
    symbols: &'a SymbolTable,
}

impl<'a> LinkerScript<'a> {
    pub fn new(
        layout: &'a ValidatedLayout,
        regions: &'a RegionTable,
        symbols: &'a SymbolTable,
    ) -> Self {
        LinkerScript {
            layout,
            regions,
            symbols,
        }
    }
}

impl fmt::Display for LinkerScript<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MEMORY\n{{")?;
        for region in self.regions.iter() {
            writeln!(
                f,
                "  {} ({}) : ORIGIN = {}, LENGTH = 0x{:08x}",
                region.name(),
                region.permissions(),
                region.origin(),
                region.length()
            )?;
        }
        writeln!(f, "}}")?;

        if !self.layout.sections().is_empty() {
            writeln!(f)?;
        }
        for section in self.layout.sections() {
            writeln!(
                f,
                "/* .{} > {} : {}..{} */",
                section.name(),
                section.region(),
                section.start(),
                section.end()
            )?;
        }

        if !self.symbols.is_empty() {
            writeln!(f)?;
        }
        for (name, address) in self.symbols.iter() {
            writeln!(f, "PROVIDE({} = {});", name, address)?;
        }
        Ok(())
    }
}

pub fn render(layout: &ValidatedLayout, regions: &RegionTable, symbols: &SymbolTable) -> String {
    LinkerScript::new(layout, regions, symbols).to_string()
}
