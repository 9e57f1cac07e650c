use std::fmt;

/// A byte address in the target's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub u64);

impl Address {
    pub fn checked_add(self, rhs: u64) -> Option<Address> {
        self.0.checked_add(rhs).map(Address)
    }

    /// Rounds up to the next multiple of `alignment`, which must be a power of two.
    /// Returns `None` if the rounded address does not fit in 64 bits.
    pub fn align_up(self, alignment: u64) -> Option<Address> {
        debug_assert!(alignment.is_power_of_two());
        let mask = alignment - 1;
        self.0.checked_add(mask).map(|a| Address(a & !mask))
    }

    pub fn is_aligned(self, alignment: u64) -> bool {
        alignment != 0 && self.0 % alignment == 0
    }

    /// Distance from `rhs` up to `self`, or `None` if `rhs` lies above.
    pub fn checked_sub(self, rhs: Address) -> Option<u64> {
        self.0.checked_sub(rhs.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
