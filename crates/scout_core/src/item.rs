use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed leading segment of every well-formed item id.
pub const ID_PREFIX: &str = "1000";
/// Width of the numeric segment that follows the prefix.
pub const NUMERIC_WIDTH: usize = 5;

/// Catalog item identifier as reported by the extract endpoint,
/// e.g. `10006456200280` (prefix `1000`, segment `64562`, suffix `00280`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric segment of a well-formed id, `None` otherwise.
    pub fn numeric(&self) -> Option<u32> {
        extract_numeric(&self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Extract the 5-digit segment from `1000XXXXX...`.
pub fn extract_numeric(id: &str) -> Option<u32> {
    let rest = id.strip_prefix(ID_PREFIX)?;
    let segment = rest.get(..NUMERIC_WIDTH)?;
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Build the id for `numeric` using `template`'s prefix and suffix.
/// Returns `None` when the template itself is not well-formed.
pub fn with_numeric(template: &str, numeric: u32) -> Option<ItemId> {
    extract_numeric(template)?;
    let suffix = &template[ID_PREFIX.len() + NUMERIC_WIDTH..];
    Some(ItemId(format!(
        "{ID_PREFIX}{numeric:0width$}{suffix}",
        width = NUMERIC_WIDTH
    )))
}

/// Status code of one component slot within an item.
///
/// The site reports small integer codes; the names describe how the codes
/// behave on the storefront, not an official vocabulary. Unknown codes are
/// kept verbatim so stored ledgers survive a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ComponentState {
    Pending,
    Taken,
    Closed,
    Held,
    Featured,
    Rare,
    Unknown(i64),
}

/// Visual grouping used when presenting component states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateBucket {
    Muted,
    Dark,
    Accent,
    Highlight,
    Bright,
    Fallback,
}

impl ComponentState {
    pub fn code(self) -> i64 {
        match self {
            ComponentState::Pending => 0,
            ComponentState::Taken => 1,
            ComponentState::Closed => 2,
            ComponentState::Held => 3,
            ComponentState::Featured => 4,
            ComponentState::Rare => 5,
            ComponentState::Unknown(code) => code,
        }
    }

    pub fn bucket(self) -> StateBucket {
        match self {
            ComponentState::Pending | ComponentState::Closed => StateBucket::Muted,
            ComponentState::Taken => StateBucket::Dark,
            ComponentState::Held => StateBucket::Accent,
            ComponentState::Featured => StateBucket::Highlight,
            ComponentState::Rare => StateBucket::Bright,
            ComponentState::Unknown(_) => StateBucket::Fallback,
        }
    }
}

impl From<i64> for ComponentState {
    fn from(code: i64) -> Self {
        match code {
            0 => ComponentState::Pending,
            1 => ComponentState::Taken,
            2 => ComponentState::Closed,
            3 => ComponentState::Held,
            4 => ComponentState::Featured,
            5 => ComponentState::Rare,
            other => ComponentState::Unknown(other),
        }
    }
}

impl From<ComponentState> for i64 {
    fn from(state: ComponentState) -> Self {
        state.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_segment_after_prefix() {
        assert_eq!(extract_numeric("10008782500350"), Some(87825));
        assert_eq!(extract_numeric("10006456200280"), Some(64562));
        assert_eq!(extract_numeric("100000042"), Some(42));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(extract_numeric("20006456200280"), None);
        assert_eq!(extract_numeric("1000645"), None);
        assert_eq!(extract_numeric("10006a56200280"), None);
        assert_eq!(extract_numeric(""), None);
    }

    #[test]
    fn with_numeric_pads_and_keeps_suffix() {
        let id = with_numeric("10006456200280", 42).unwrap();
        assert_eq!(id.as_str(), "10000004200280");
        assert_eq!(id.numeric(), Some(42));
        assert!(with_numeric("bogus", 1).is_none());
    }

    #[test]
    fn unknown_codes_fall_back() {
        assert_eq!(ComponentState::from(9), ComponentState::Unknown(9));
        assert_eq!(ComponentState::from(9).bucket(), StateBucket::Fallback);
        assert_eq!(ComponentState::from(2).bucket(), StateBucket::Muted);
        assert_eq!(ComponentState::from(4).code(), 4);
    }
}
