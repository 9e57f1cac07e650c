//! Independent re-check of a finished [`Layout`].
//!
//! None of these checks should ever fire for a layout produced by the planner. They look at
//! the result only, never at how it was computed, so a planner bug cannot hide itself.

use std::ops::Deref;

use crate::error::PlacementError;
use crate::placement::{Layout, PlacedSection};
use crate::RegionTable;

/// A [`Layout`] that passed every check in [`validate`]. Only validated layouts can be
/// exported or rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLayout(Layout);

impl ValidatedLayout {
    pub fn into_inner(self) -> Layout {
        self.0
    }
}

impl Deref for ValidatedLayout {
    type Target = Layout;

    fn deref(&self) -> &Layout {
        &self.0
    }
}

pub fn validate(
    layout: Layout,
    regions: &RegionTable,
    entry: Option<&str>,
) -> Result<ValidatedLayout, PlacementError> {
    check_ordering(&layout, regions)?;
    check_containment(&layout, regions)?;
    check_alignment(&layout)?;
    if let Some(entry) = entry {
        check_entry(&layout, regions, entry)?;
    }
    Ok(ValidatedLayout(layout))
}

fn inconsistent(detail: String) -> PlacementError {
    PlacementError::LayoutInconsistent { detail }
}

fn check_ordering(layout: &Layout, regions: &RegionTable) -> Result<(), PlacementError> {
    for region in regions.iter() {
        let mut previous: Option<&PlacedSection> = None;
        for section in layout.in_region(region.name()) {
            if let Some(previous) = previous {
                if section.start < previous.end {
                    return Err(inconsistent(format!(
                        "`{}` at {} overlaps `{}` ending at {} in region `{}`",
                        section.name,
                        section.start,
                        previous.name,
                        previous.end,
                        region.name()
                    )));
                }
            }
            previous = Some(section);
        }
    }
    Ok(())
}

fn check_containment(layout: &Layout, regions: &RegionTable) -> Result<(), PlacementError> {
    for section in layout.sections() {
        let region = regions.lookup(&section.region).map_err(|_| {
            inconsistent(format!(
                "`{}` is placed in undefined region `{}`",
                section.name, section.region
            ))
        })?;
        if !region.contains(section.start, section.end) {
            return Err(inconsistent(format!(
                "`{}` at {}..{} is outside region `{}` ({}..{})",
                section.name,
                section.start,
                section.end,
                region.name(),
                region.origin(),
                region.end()
            )));
        }
    }
    Ok(())
}

fn check_alignment(layout: &Layout) -> Result<(), PlacementError> {
    match layout
        .sections()
        .iter()
        .find(|s| !s.start.is_aligned(s.alignment))
    {
        Some(section) => Err(inconsistent(format!(
            "`{}` starts at {}, which is not {}-byte aligned",
            section.name, section.start, section.alignment
        ))),
        None => Ok(()),
    }
}

fn check_entry(layout: &Layout, regions: &RegionTable, entry: &str) -> Result<(), PlacementError> {
    let fail = |detail: String| PlacementError::EntryPlacementError {
        section: entry.to_string(),
        detail,
    };

    let section = layout
        .get(entry)
        .ok_or_else(|| fail("not present in the layout".to_string()))?;
    let region = regions
        .lookup(&section.region)
        .map_err(|_| fail(format!("placed in undefined region `{}`", section.region)))?;

    if let Some(first) = layout.in_region(&section.region).next() {
        if first.name != section.name {
            return Err(fail(format!(
                "`{}` is placed before it in region `{}`",
                first.name, section.region
            )));
        }
    }
    if section.start != region.origin() {
        return Err(fail(format!(
            "starts at {}, not at the origin {} of region `{}`",
            section.start,
            region.origin(),
            region.name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::ExportBoundaries;
    use crate::{Address, Permissions};

    fn regions() -> RegionTable {
        let mut table = RegionTable::default();
        table
            .define("FLASH", 0x0800_0000, 0x1000, Permissions::RX)
            .unwrap();
        table
    }

    fn placed(name: &str, start: u64, end: u64, alignment: u64) -> PlacedSection {
        PlacedSection {
            name: name.to_string(),
            region: "FLASH".to_string(),
            start: Address(start),
            end: Address(end),
            alignment,
            export: ExportBoundaries::default(),
        }
    }

    #[test]
    fn accepts_a_consistent_layout() {
        let layout = Layout::new(vec![
            placed("isr_vector", 0x0800_0000, 0x0800_0100, 4),
            placed("text", 0x0800_0100, 0x0800_0200, 4),
        ]);
        assert!(validate(layout, &regions(), Some("isr_vector")).is_ok());
    }

    #[test]
    fn catches_overlap() {
        let layout = Layout::new(vec![
            placed("a", 0x0800_0000, 0x0800_0100, 4),
            placed("b", 0x0800_00fc, 0x0800_0200, 4),
        ]);
        assert!(matches!(
            validate(layout, &regions(), None),
            Err(PlacementError::LayoutInconsistent { .. })
        ));
    }

    #[test]
    fn catches_escape_from_region() {
        let layout = Layout::new(vec![placed("a", 0x0800_0f00, 0x0800_1001, 1)]);
        assert!(matches!(
            validate(layout, &regions(), None),
            Err(PlacementError::LayoutInconsistent { .. })
        ));

        let layout = Layout::new(vec![placed("a", 0x07ff_ff00, 0x0800_0100, 1)]);
        assert!(matches!(
            validate(layout, &regions(), None),
            Err(PlacementError::LayoutInconsistent { .. })
        ));
    }

    #[test]
    fn catches_misalignment() {
        let layout = Layout::new(vec![placed("a", 0x0800_0002, 0x0800_0010, 4)]);
        let err = validate(layout, &regions(), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "layout is inconsistent: `a` starts at 0x08000002, which is not 4-byte aligned"
        );
    }

    #[test]
    fn entry_must_come_first_at_the_origin() {
        let layout = Layout::new(vec![
            placed("text", 0x0800_0000, 0x0800_0100, 4),
            placed("isr_vector", 0x0800_0100, 0x0800_0200, 4),
        ]);
        assert!(matches!(
            validate(layout, &regions(), Some("isr_vector")),
            Err(PlacementError::EntryPlacementError { .. })
        ));

        let layout = Layout::new(vec![placed("isr_vector", 0x0800_0100, 0x0800_0200, 4)]);
        assert!(matches!(
            validate(layout, &regions(), Some("isr_vector")),
            Err(PlacementError::EntryPlacementError { .. })
        ));
    }
}
