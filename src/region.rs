use std::fmt;

use crate::error::{PlacementError, RegionDefect};
use crate::{Address, AddressWidth};

/// Access rights of a memory region, spelled `rwx` the way linker scripts do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Permissions {
    pub const RX: Permissions = Permissions {
        read: true,
        write: false,
        execute: true,
    };
    pub const RW: Permissions = Permissions {
        read: true,
        write: true,
        execute: false,
    };
    pub const RWX: Permissions = Permissions {
        read: true,
        write: true,
        execute: true,
    };
}

impl TryFrom<&str> for Permissions {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut permissions = Permissions::default();
        for c in s.chars() {
            let flag = match c.to_ascii_lowercase() {
                'r' => &mut permissions.read,
                'w' => &mut permissions.write,
                'x' => &mut permissions.execute,
                _ => return Err(s.to_string()),
            };
            if *flag {
                return Err(s.to_string());
            }
            *flag = true;
        }
        Ok(permissions)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            f.write_str("r")?;
        }
        if self.write {
            f.write_str("w")?;
        }
        if self.execute {
            f.write_str("x")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    name: String,
    origin: Address,
    length: u64,
    permissions: Permissions,
}

impl Region {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Address {
        self.origin
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    /// Exclusive upper bound. Never wraps, `define` rejects regions for which it would.
    pub fn end(&self) -> Address {
        Address(self.origin.0 + self.length)
    }

    pub fn contains(&self, start: Address, end: Address) -> bool {
        self.origin <= start && start <= end && end <= self.end()
    }

    fn overlaps(&self, other: &Region) -> bool {
        self.origin < other.end() && other.origin < self.end()
    }
}

/// The named physical memory regions of a target, in definition order.
///
/// Regions are checked once as they are defined; the table is read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    width: AddressWidth,
    regions: Vec<Region>,
}

impl RegionTable {
    pub fn new(width: AddressWidth) -> Self {
        RegionTable {
            width,
            regions: Vec::new(),
        }
    }

    pub fn width(&self) -> AddressWidth {
        self.width
    }

    pub fn define(
        &mut self,
        name: impl Into<String>,
        origin: u64,
        length: u64,
        permissions: Permissions,
    ) -> Result<(), PlacementError> {
        let name = name.into();
        let origin = Address(origin);
        if self.regions.iter().any(|r| r.name == name) {
            return Err(PlacementError::DuplicateRegion(name));
        }
        if length == 0 {
            return Err(PlacementError::InvalidRegion {
                region: name,
                reason: RegionDefect::ZeroLength,
            });
        }
        match origin.checked_add(length) {
            Some(end) if u128::from(end.0) <= self.width.limit() => {}
            _ => {
                return Err(PlacementError::InvalidRegion {
                    region: name,
                    reason: RegionDefect::ExceedsAddressWidth(self.width as u32),
                })
            }
        }

        let region = Region {
            name,
            origin,
            length,
            permissions,
        };
        if let Some(other) = self.regions.iter().find(|r| r.overlaps(&region)) {
            return Err(PlacementError::InvalidRegion {
                region: region.name,
                reason: RegionDefect::Overlaps(other.name.clone()),
            });
        }

        log::debug!(
            "defined region {} ({}) at {}..{}",
            region.name,
            region.permissions,
            region.origin,
            region.end()
        );
        self.regions.push(region);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&Region, PlacementError> {
        self.regions
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| PlacementError::UnknownRegion {
                region: name.to_string(),
                section: None,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
