use serde::Deserialize;
use thiserror::Error;

use crate::error::PlacementError;
use crate::section::{ExportBoundaries, SectionSpec, SizeMode};
use crate::{AddressWidth, Permissions, RegionTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse layout definition: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid permissions `{0}`, expected a combination of r, w and x")]
    InvalidPermissions(String),
    #[error("unsupported address width {0}, expected 32 or 64")]
    InvalidAddressWidth(u8),
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

#[derive(Debug, Deserialize)]
pub struct RawRegion {
    pub name: String,
    pub origin: u64,
    pub length: u64,
    #[serde(default = "default_permissions")]
    pub permissions: String,
}

fn default_permissions() -> String {
    "rwx".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum RawSize {
    #[serde(rename = "fixed")]
    Fixed { bytes: u64 },
    #[serde(rename = "grow_to_fit")]
    GrowToFit { content_size: u64 },
    #[serde(rename = "reserved")]
    Reserved { bytes: u64 },
}

#[derive(Debug, Default, Deserialize)]
pub struct RawExport {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawSection {
    pub name: String,
    pub region: String,
    #[serde(default = "default_alignment")]
    pub align: u64,
    pub size: RawSize,
    #[serde(default)]
    pub export: RawExport,
}

fn default_alignment() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RawDefinition {
    #[serde(default = "default_address_width")]
    pub address_width: u8,
    pub entry: Option<String>,
    pub regions: Vec<RawRegion>,
    #[serde(default)]
    pub sections: Vec<RawSection>,
}

fn default_address_width() -> u8 {
    32
}

impl RawDefinition {
    pub fn from_yaml(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }
}

impl From<RawSize> for SizeMode {
    fn from(raw: RawSize) -> Self {
        match raw {
            RawSize::Fixed { bytes } => SizeMode::Fixed(bytes),
            RawSize::GrowToFit { content_size } => SizeMode::GrowToFit(content_size),
            RawSize::Reserved { bytes } => SizeMode::Reserved(bytes),
        }
    }
}

impl From<RawSection> for SectionSpec {
    fn from(raw: RawSection) -> Self {
        SectionSpec {
            name: raw.name,
            alignment: raw.align,
            region: raw.region,
            size: raw.size.into(),
            export: ExportBoundaries {
                start: raw.export.start,
                end: raw.export.end,
            },
        }
    }
}

/// Everything one planning run needs: the regions, the sections in placement order and the
/// optional entry (vector table) section.
#[derive(Debug, Clone, Default)]
pub struct LayoutDefinition {
    pub regions: RegionTable,
    pub sections: Vec<SectionSpec>,
    pub entry: Option<String>,
}

impl LayoutDefinition {
    pub fn new(regions: RegionTable, sections: Vec<SectionSpec>) -> Self {
        LayoutDefinition {
            regions,
            sections,
            entry: None,
        }
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn from_yaml(s: &str) -> Result<Self, ConfigError> {
        LayoutDefinition::try_from(RawDefinition::from_yaml(s)?)
    }
}

impl TryFrom<RawDefinition> for LayoutDefinition {
    type Error = ConfigError;

    fn try_from(raw: RawDefinition) -> Result<Self, Self::Error> {
        let width = AddressWidth::try_from(raw.address_width)
            .map_err(|_| ConfigError::InvalidAddressWidth(raw.address_width))?;

        let mut regions = RegionTable::new(width);
        for region in raw.regions {
            let permissions = Permissions::try_from(region.permissions.as_str())
                .map_err(ConfigError::InvalidPermissions)?;
            regions.define(region.name, region.origin, region.length, permissions)?;
        }

        Ok(LayoutDefinition {
            regions,
            sections: raw.sections.into_iter().map(SectionSpec::from).collect(),
            entry: raw.entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegionDefect;
    use crate::Address;

    const MINIMAL: &str = r#"
entry: vectors
regions:
  - { name: ROM, origin: 0x0, length: 0x8000, permissions: rx }
  - { name: RAM, origin: 0x20000000, length: 0x2000 }
sections:
  - { name: vectors, region: ROM, align: 128, size: { type: fixed, bytes: 0xc0 } }
  - { name: text, region: ROM, size: { type: grow_to_fit, content_size: 1000 } }
  - name: stack
    region: RAM
    align: 8
    size: { type: reserved, bytes: 1024 }
    export: { end: __stack_top }
"#;

    #[test]
    fn parses_regions_and_sections() {
        let definition = LayoutDefinition::from_yaml(MINIMAL).unwrap();
        assert_eq!(definition.entry.as_deref(), Some("vectors"));
        assert_eq!(definition.regions.width(), AddressWidth::Bits32);

        let rom = definition.regions.lookup("ROM").unwrap();
        assert_eq!(rom.permissions(), Permissions::RX);
        let ram = definition.regions.lookup("RAM").unwrap();
        assert_eq!(ram.origin(), Address(0x2000_0000));
        assert_eq!(ram.permissions(), Permissions::RWX);

        assert_eq!(definition.sections.len(), 3);
        assert_eq!(definition.sections[0].alignment, 128);
        assert_eq!(definition.sections[1].alignment, 1);
        assert_eq!(definition.sections[1].size, SizeMode::GrowToFit(1000));
        assert_eq!(definition.sections[2].size, SizeMode::Reserved(1024));
        assert_eq!(
            definition.sections[2].export.end.as_deref(),
            Some("__stack_top")
        );
    }

    #[test]
    fn region_errors_surface_as_placement_errors() {
        let yaml = r#"
regions:
  - { name: RAM, origin: 0x20000000, length: 0 }
"#;
        assert!(matches!(
            LayoutDefinition::from_yaml(yaml),
            Err(ConfigError::Placement(PlacementError::InvalidRegion {
                reason: RegionDefect::ZeroLength,
                ..
            }))
        ));
    }

    #[test]
    fn rejects_bad_permissions_and_width() {
        let yaml = r#"
regions:
  - { name: RAM, origin: 0x20000000, length: 16, permissions: rwz }
"#;
        assert!(matches!(
            LayoutDefinition::from_yaml(yaml),
            Err(ConfigError::InvalidPermissions(p)) if p == "rwz"
        ));

        let yaml = r#"
address_width: 16
regions: []
"#;
        assert!(matches!(
            LayoutDefinition::from_yaml(yaml),
            Err(ConfigError::InvalidAddressWidth(16))
        ));
    }

    #[test]
    fn rejects_unknown_size_type() {
        let yaml = r#"
regions: []
sections:
  - { name: text, region: ROM, size: { type: elastic, bytes: 4 } }
"#;
        assert!(matches!(
            LayoutDefinition::from_yaml(yaml),
            Err(ConfigError::Parse(_))
        ));
    }
}
