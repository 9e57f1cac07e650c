use std::collections::HashMap;

use crate::error::PlacementError;
use crate::placement::ValidatedLayout;
use crate::{Address, Serializable, SerializationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: Address,
}

/// Boundary symbols in export order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: Vec<(String, Address)>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            entries: Vec::new(),
        }
    }

    pub fn add_symbol(&mut self, name: String, address: Address) {
        self.entries.push((name, address));
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.entries
            .iter()
            .map(|(name, address)| Symbol {
                name: name.clone(),
                address: *address,
            })
            .collect()
    }

    pub fn find_symbol(&self, name: &str) -> Option<Address> {
        self.entries
            .iter()
            .find(|(symbol_name, _)| symbol_name == name)
            .map(|(_, address)| *address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.entries
            .iter()
            .map(|(name, address)| (name.as_str(), *address))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Projects the requested boundary symbols out of a validated layout.
///
/// Sections are visited in layout order, start symbol before end symbol.
pub fn export(layout: &ValidatedLayout) -> Result<SymbolTable, PlacementError> {
    let mut table = SymbolTable::new();
    let mut owners: HashMap<&str, &str> = HashMap::new();

    for section in layout.sections() {
        let boundaries = [
            (&section.export().start, section.start()),
            (&section.export().end, section.end()),
        ];
        for (symbol, address) in boundaries {
            let Some(symbol) = symbol else {
                continue;
            };
            if let Some(first) = owners.insert(symbol.as_str(), section.name()) {
                return Err(PlacementError::DuplicateSymbol {
                    symbol: symbol.clone(),
                    first: first.to_string(),
                    second: section.name().to_string(),
                });
            }
            log::debug!("exported {} = {}", symbol, address);
            table.add_symbol(symbol.clone(), address);
        }
    }
    Ok(table)
}

// Layout: u64 entry count, u64 name table size, then per entry a u64 address and u32 name
// offset, then the NUL-terminated names. All little endian.
impl Serializable for SymbolTable {
    fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let mut name_data = Vec::new();

        for (name, address) in &self.entries {
            data.extend(address.0.to_le_bytes());
            data.extend((name_data.len() as u32).to_le_bytes());
            name_data.extend(name.as_bytes());
            name_data.push(0);
        }

        let mut out = Vec::with_capacity(16 + data.len() + name_data.len());
        out.extend((self.entries.len() as u64).to_le_bytes());
        out.extend((name_data.len() as u64).to_le_bytes());
        out.extend(data);
        out.extend(name_data);
        out
    }

    fn deserialize(data: &[u8]) -> Result<(usize, Self), SerializationError> {
        let symbol_count = read_u64(data, 0)? as usize;
        let name_table_size = read_u64(data, 8)? as usize;
        let entries_start = 16;
        let name_table_start = symbol_count
            .checked_mul(12)
            .and_then(|n| n.checked_add(entries_start))
            .ok_or(SerializationError::InvalidData)?;
        let required_size = name_table_start
            .checked_add(name_table_size)
            .ok_or(SerializationError::InvalidData)?;
        if data.len() < required_size {
            return Err(SerializationError::DataTooShort);
        }
        let names = &data[name_table_start..required_size];

        let mut entries = Vec::with_capacity(symbol_count);
        for index in 0..symbol_count {
            let offset = entries_start + index * 12;
            let address = read_u64(data, offset)?;
            let name_offset = read_u32(data, offset + 8)? as usize;

            let name = names
                .get(name_offset..)
                .and_then(|rest| {
                    rest.iter()
                        .position(|&b| b == 0)
                        .map(|len| &rest[..len])
                })
                .ok_or(SerializationError::InvalidData)?;
            let name =
                String::from_utf8(name.to_vec()).map_err(|_| SerializationError::InvalidData)?;
            entries.push((name, Address(address)));
        }

        Ok((required_size, SymbolTable { entries }))
    }
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64, SerializationError> {
    data.get(offset..offset + 8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(SerializationError::DataTooShort)
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, SerializationError> {
    data.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(SerializationError::DataTooShort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{plan, validate};
    use crate::{Permissions, RegionTable, SectionSpec};

    fn validated(sections: &[SectionSpec]) -> ValidatedLayout {
        let mut regions = RegionTable::default();
        regions
            .define("RAM", 0x2000_0000, 0x1000, Permissions::RW)
            .unwrap();
        let layout = plan(&regions, sections, None).unwrap();
        validate(layout, &regions, None).unwrap()
    }

    #[test]
    fn exports_start_and_end_in_layout_order() {
        let layout = validated(&[
            SectionSpec::fixed("data", "RAM", 0x10)
                .export_start("_sdata")
                .export_end("_edata"),
            SectionSpec::reserved("stack", "RAM", 0x100)
                .with_alignment(8)
                .export_end("_estack"),
        ]);
        let symbols = export(&layout).unwrap();
        let names: Vec<_> = symbols.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["_sdata", "_edata", "_estack"]);
        assert_eq!(symbols.find_symbol("_edata"), Some(Address(0x2000_0010)));
        assert_eq!(symbols.find_symbol("_estack"), Some(Address(0x2000_0110)));
    }

    #[test]
    fn rejects_duplicate_symbols() {
        let layout = validated(&[
            SectionSpec::fixed("data", "RAM", 0x10).export_end("_end"),
            SectionSpec::fixed("bss", "RAM", 0x10).export_end("_end"),
        ]);
        assert_eq!(
            export(&layout),
            Err(PlacementError::DuplicateSymbol {
                symbol: "_end".into(),
                first: "data".into(),
                second: "bss".into(),
            })
        );
    }

    #[test]
    fn start_and_end_of_one_section_may_not_share_a_name() {
        let layout = validated(&[SectionSpec::fixed("data", "RAM", 0)
            .export_start("_data")
            .export_end("_data")]);
        assert!(matches!(
            export(&layout),
            Err(PlacementError::DuplicateSymbol { .. })
        ));
    }

    #[test]
    fn serialized_table_reads_back() {
        let mut table = SymbolTable::new();
        table.add_symbol("_estack".to_string(), Address(0x2000_1600));
        table.add_symbol("_sidata".to_string(), Address(0x0800_1100));
        let bytes = table.serialize();
        assert_eq!(SymbolTable::deserialize(&bytes), Ok((bytes.len(), table)));
    }

    #[test]
    fn truncated_table_is_rejected() {
        let mut table = SymbolTable::new();
        table.add_symbol("_estack".to_string(), Address(0x2000_1600));
        let bytes = table.serialize();
        assert_eq!(
            SymbolTable::deserialize(&bytes[..bytes.len() - 1]),
            Err(SerializationError::DataTooShort)
        );
        assert_eq!(
            SymbolTable::deserialize(&bytes[..4]),
            Err(SerializationError::DataTooShort)
        );
    }
}
