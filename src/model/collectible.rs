//! Decoding of the provider's collectible state bitmask

/// Named bits of a collectible state, in bit order
pub const COLLECTIBLE_FLAGS: [(&str, u32); 7] = [
    ("notAcquired", 1),
    ("obscured", 2),
    ("invisible", 4),
    ("cannotAffordMaterialRequirements", 8),
    ("inventorySpaceUnavailable", 16),
    ("uniquenessViolation", 32),
    ("purchaseDisabled", 64),
];

/// A collectible state bitmask decoded into named flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectibleState {
    pub none: bool,
    pub not_acquired: bool,
    pub obscured: bool,
    pub invisible: bool,
    pub cannot_afford_material_requirements: bool,
    pub inventory_space_unavailable: bool,
    pub uniqueness_violation: bool,
    pub purchase_disabled: bool,
}

impl CollectibleState {
    /// Decodes a raw state value. Bits above 64 are ignored.
    pub fn decode(state: u32) -> Self {
        let has = |bit: u32| state & bit != 0;
        Self {
            none: state == 0,
            not_acquired: has(1),
            obscured: has(2),
            invisible: has(4),
            cannot_afford_material_requirements: has(8),
            inventory_space_unavailable: has(16),
            uniqueness_violation: has(32),
            purchase_disabled: has(64),
        }
    }

    /// An account owns the collectible unless `notAcquired` is set
    pub fn is_possessed(&self) -> bool {
        !self.not_acquired
    }

    /// Names of the flags set in `state`, in bit order
    pub fn flag_names(state: u32) -> Vec<&'static str> {
        COLLECTIBLE_FLAGS
            .iter()
            .filter(|(_, bit)| state & bit != 0)
            .map(|(name, _)| *name)
            .collect()
    }
}
