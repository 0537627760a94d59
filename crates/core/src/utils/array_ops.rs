//! Set-like mutations over id arrays stored on documents.
//!
//! Document arrays (participants, saved quests, ...) behave as sets: union
//! never duplicates and removal of a non-member is a no-op. Both return
//! whether the array actually changed so callers can pair them with
//! counter updates without double counting on retry.

/// Appends `value` unless already present. Returns true if appended.
pub fn array_union(values: &mut Vec<String>, value: &str) -> bool {
    if values.iter().any(|v| v == value) {
        return false;
    }
    values.push(value.to_string());
    true
}

/// Removes every occurrence of `value`. Returns true if anything was removed.
pub fn array_remove(values: &mut Vec<String>, value: &str) -> bool {
    let before = values.len();
    values.retain(|v| v != value);
    values.len() != before
}
