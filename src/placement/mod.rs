use std::collections::HashSet;
use std::fmt;

use crate::error::PlacementError;
use crate::section::{ExportBoundaries, SectionSpec};
use crate::{Address, RegionTable};

pub mod validate;

pub use validate::{validate, ValidatedLayout};

/// A section with its final address range. Holds copies of everything it needs from the
/// input definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedSection {
    pub(crate) name: String,
    pub(crate) region: String,
    pub(crate) start: Address,
    pub(crate) end: Address, // exclusive
    pub(crate) alignment: u64,
    pub(crate) export: ExportBoundaries,
}

impl PlacedSection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn end(&self) -> Address {
        self.end
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    pub fn export(&self) -> &ExportBoundaries {
        &self.export
    }

    pub fn size(&self) -> u64 {
        self.end.checked_sub(self.start).unwrap_or(0)
    }
}

/// The result of a planning pass: every section's range, in caller order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    sections: Vec<PlacedSection>,
}

impl Layout {
    pub(crate) fn new(sections: Vec<PlacedSection>) -> Self {
        Layout { sections }
    }

    pub fn sections(&self) -> &[PlacedSection] {
        &self.sections
    }

    pub fn get(&self, name: &str) -> Option<&PlacedSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Sections placed in `region`, in placement order.
    pub fn in_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a PlacedSection> {
        self.sections.iter().filter(move |s| s.region == region)
    }

    /// How much of each region is taken, from its origin up to the end of its last section.
    ///
    /// Sections lying outside the table's region of the same name are not counted.
    pub fn usage(&self, regions: &RegionTable) -> Vec<RegionUsage> {
        regions
            .iter()
            .map(|region| {
                let used = self
                    .in_region(region.name())
                    .filter(|s| region.contains(s.start, s.end))
                    .last()
                    .and_then(|last| last.end.checked_sub(region.origin()))
                    .unwrap_or(0);
                RegionUsage {
                    region: region.name().to_string(),
                    used,
                    length: region.length(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionUsage {
    pub region: String,
    pub used: u64,
    pub length: u64,
}

impl RegionUsage {
    pub fn percent(&self) -> f64 {
        self.used as f64 * 100.0 / self.length as f64
    }
}

impl fmt::Display for RegionUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} bytes used ({:.1}%)",
            self.region,
            self.used,
            self.length,
            self.percent()
        )
    }
}

/// Places sections into regions with one running cursor per region.
///
/// Regions never interact, so each region is planned on its own: the cursor starts at the
/// region origin, is rounded up to each section's alignment, and advances past the section.
/// Sections are taken strictly in the order the caller listed them.
pub struct LayoutPlanner<'a> {
    regions: &'a RegionTable,
    sections: &'a [SectionSpec],
    entry: Option<&'a str>,
}

impl<'a> LayoutPlanner<'a> {
    pub fn new(regions: &'a RegionTable, sections: &'a [SectionSpec]) -> Self {
        LayoutPlanner {
            regions,
            sections,
            entry: None,
        }
    }

    /// Names the section that must sit at the very start of its region (the vector table).
    pub fn with_entry(mut self, entry: Option<&'a str>) -> Self {
        self.entry = entry;
        self
    }

    pub fn plan(&self) -> Result<Layout, PlacementError> {
        self.check()?;

        let mut slots: Vec<Option<PlacedSection>> = vec![None; self.sections.len()];
        for region in self.regions.iter() {
            let mut cursor = region.origin();
            let limit = region.end();
            for (index, spec) in self.sections.iter().enumerate() {
                if spec.region != region.name() {
                    continue;
                }
                let start = cursor.align_up(spec.alignment);
                let end = start.and_then(|start| start.checked_add(spec.size()));
                let (start, end) = match (start, end) {
                    (Some(start), Some(end)) if end <= limit => (start, end),
                    _ => {
                        return Err(PlacementError::RegionOverflow {
                            region: region.name().to_string(),
                            section: spec.name.clone(),
                            needed: wide_end(cursor, spec.alignment, spec.size()),
                            available: limit,
                        })
                    }
                };
                log::debug!(
                    "placed {} in {} at {}..{} ({} bytes)",
                    spec.name,
                    region.name(),
                    start,
                    end,
                    spec.size()
                );
                slots[index] = Some(PlacedSection {
                    name: spec.name.clone(),
                    region: spec.region.clone(),
                    start,
                    end,
                    alignment: spec.alignment,
                    export: spec.export.clone(),
                });
                cursor = end;
            }
        }

        Ok(Layout::new(slots.into_iter().flatten().collect()))
    }

    /// Rejects bad input before anything is placed, in caller order.
    fn check(&self) -> Result<(), PlacementError> {
        let mut names = HashSet::new();
        for spec in self.sections {
            if !names.insert(spec.name.as_str()) {
                return Err(PlacementError::DuplicateSection(spec.name.clone()));
            }
            if self.regions.lookup(&spec.region).is_err() {
                return Err(PlacementError::UnknownRegion {
                    region: spec.region.clone(),
                    section: Some(spec.name.clone()),
                });
            }
            if !spec.alignment.is_power_of_two() {
                return Err(PlacementError::InvalidAlignment {
                    section: spec.name.clone(),
                    alignment: spec.alignment,
                });
            }
        }

        if let Some(entry) = self.entry {
            if !names.contains(entry) {
                return Err(PlacementError::EntryPlacementError {
                    section: entry.to_string(),
                    detail: "no such section".to_string(),
                });
            }
        }

        for (index, spec) in self.sections.iter().enumerate() {
            let followed = self.sections[index + 1..]
                .iter()
                .any(|later| later.region == spec.region);
            if spec.is_reserved() && followed {
                log::warn!(
                    "reserved section {} is not the last section in {}",
                    spec.name,
                    spec.region
                );
            }
        }
        Ok(())
    }
}

/// End address a section would need, computed without the 64-bit limit for error reports.
fn wide_end(cursor: Address, alignment: u64, size: u64) -> u128 {
    let mask = u128::from(alignment) - 1;
    ((u128::from(cursor.0) + mask) & !mask) + u128::from(size)
}

pub fn plan(
    regions: &RegionTable,
    sections: &[SectionSpec],
    entry: Option<&str>,
) -> Result<Layout, PlacementError> {
    LayoutPlanner::new(regions, sections).with_entry(entry).plan()
}
