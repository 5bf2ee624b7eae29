use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of an image inside the backend's texture-set cache.
///
/// Slot value `0` inside a material descriptor means "no image bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a registered material.
///
/// `MaterialId::NONE` (zero) is the lookup-failure sentinel; real ids are
/// allocated from the attachment counter and start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    pub const NONE: Self = Self(0);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame-local index into the frame's state table.
///
/// Ids are only meaningful within the frame that produced them.
/// `StateId::NONE` (the maximum value) marks "no dynamic state".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub u32);

impl StateId {
    pub const NONE: Self = Self(u32::MAX);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

static NEXT_SCOPE_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a state scope, used to tag its stack entries.
///
/// Stack entries carry this id instead of a reference back into the scene
/// tree, so closing a scope out of order can find its own entry without
/// touching other components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeOwnerId(u64);

impl ScopeOwnerId {
    /// Entries pushed without an owning scope (pass-level overrides).
    pub const ORPHAN: Self = Self(0);

    pub fn next() -> Self {
        Self(NEXT_SCOPE_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ScopeOwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
