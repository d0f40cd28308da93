//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Derived lifecycle state of a promotional offer.
///
/// Never stored: always recomputed from the offer's active flag and date
/// window against the instant of interest. The active flag is checked
/// before any date, so an inactive offer classifies as `Inactive` even
/// while its window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Active flag set and the instant is inside the inclusive date window.
    Active,
    /// Active flag set but the window has not opened yet.
    Scheduled,
    /// Active flag set but the window has already closed.
    Expired,
    /// Active flag unset; dates are not consulted.
    Inactive,
}

impl OfferStatus {
    /// True only for [`OfferStatus::Active`], the single state in which the
    /// offer price applies.
    #[must_use]
    pub const fn is_current(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Expired => write!(f, "expired"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}
