use crate::key::LinkKey;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored go link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The "foo" part of `http://go/foo`, as entered by its owner.
    pub short: String,
    /// The target URL or template pattern. Stored verbatim.
    pub long: String,
    /// When the link was first saved.
    pub created: Timestamp,
    /// When the link was last saved.
    pub last_edit: Timestamp,
    /// `user@domain` of the owner; may be empty.
    pub owner: String,
}

impl Link {
    /// Returns the canonical key this link is stored under.
    pub fn key(&self) -> LinkKey {
        LinkKey::from_short(&self.short)
    }
}

/// Click counts keyed by link.
///
/// When written, each value is the number of clicks since the previous
/// flush and keys may be short names in any display form. When read, keys
/// are canonical and values are all-time totals.
pub type ClickStats = HashMap<String, i64>;
