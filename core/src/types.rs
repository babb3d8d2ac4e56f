//! Shared primitive types used across the reporting engine.

/// Primary key of any record row (FIR, accused, bail).
pub type RecordId = i64;

/// Default coalesced label for a missing or blank dimension value.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Separator used only when a composite key is rendered for display.
/// Grouping never compares rendered keys.
pub const KEY_DISPLAY_SEPARATOR: &str = " / ";

/// Returns the trimmed value, or None when the field is absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
