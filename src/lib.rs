pub mod address;
pub mod definition;
pub mod error;
pub mod placement;
pub mod region;
pub mod script;
pub mod section;
pub mod serializable;
pub mod symbols;

pub use address::Address;
pub use definition::{ConfigError, LayoutDefinition, RawDefinition};
pub use error::{PlacementError, RegionDefect};
pub use placement::{
    plan, validate, Layout, LayoutPlanner, PlacedSection, RegionUsage, ValidatedLayout,
};
pub use region::{Permissions, Region, RegionTable};
pub use section::{ExportBoundaries, SectionSpec, SizeMode};
pub use serializable::{AddressWidth, Serializable, SerializationError};
pub use symbols::{export, Symbol, SymbolTable};

/// A layout that made it through every stage, with its exported symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutput {
    pub layout: ValidatedLayout,
    pub symbols: SymbolTable,
}

impl LinkOutput {
    pub fn linker_script(&self, regions: &RegionTable) -> String {
        script::render(&self.layout, regions, &self.symbols)
    }
}

/// Runs plan, validate and export over one definition.
///
/// The first failure ends the run and nothing else is returned. The definition is only
/// borrowed; the output owns all of its data.
pub fn link(definition: &LayoutDefinition) -> Result<LinkOutput, PlacementError> {
    let entry = definition.entry.as_deref();

    log::debug!(
        "planning {} sections over {} regions",
        definition.sections.len(),
        definition.regions.len()
    );
    let layout = plan(&definition.regions, &definition.sections, entry)?;

    log::debug!("validating layout");
    let layout = validate(layout, &definition.regions, entry)?;
    for usage in layout.usage(&definition.regions) {
        log::info!("{}", usage);
    }

    log::debug!("exporting symbols");
    let symbols = export(&layout)?;

    Ok(LinkOutput { layout, symbols })
}
