#[derive(Debug, PartialEq, Eq)]
pub enum SerializationError {
    InvalidAddressWidth(u8),
    InvalidData,
    DataTooShort,
}

pub trait Serializable: Sized {
    fn serialize(&self) -> Vec<u8>;
    fn deserialize(data: &[u8]) -> Result<(usize, Self), SerializationError>;
}

/// Width of the target address bus. Every region must end at or below `2^bits`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum AddressWidth {
    #[default]
    Bits32 = 32,
    Bits64 = 64,
}

impl AddressWidth {
    /// Exclusive upper bound of the address space.
    pub fn limit(self) -> u128 {
        1u128 << (self as u32)
    }
}

impl TryFrom<u8> for AddressWidth {
    type Error = SerializationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            32 => Ok(AddressWidth::Bits32),
            64 => Ok(AddressWidth::Bits64),
            v => Err(SerializationError::InvalidAddressWidth(v)),
        }
    }
}
