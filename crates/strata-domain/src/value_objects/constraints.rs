//! Resolution constraint bitmask

use bitflags::bitflags;

bitflags! {
    /// Flags altering where a dependency is looked up and how a miss is handled
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Constraints: u8 {
        /// Never ascend to the parent
        const SELF = 1;
        /// Start the lookup at the parent, ignoring the current node
        const SKIP_SELF = 1 << 1;
        /// Substitute an absent result instead of failing
        const OPTIONAL = 1 << 2;
        /// Resolve the multi-group instead of a single record
        const MANY = 1 << 3;
    }
}

impl Constraints {
    /// `SELF` and `SKIP_SELF` together can never be satisfied
    pub fn is_contradictory(self) -> bool {
        self.contains(Self::SELF | Self::SKIP_SELF)
    }

    /// Whether the lookup may ascend past the target node
    pub fn allows_recursion(self) -> bool {
        !self.contains(Self::SELF)
    }
}
