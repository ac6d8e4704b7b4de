//! Composite identifier helpers

/// Separator between the parts of a composite identifier
pub const SEPARATOR: &str = ",";

/// Join identifier parts with [`SEPARATOR`]
pub fn join_id(parts: &[&str]) -> String {
    parts.join(SEPARATOR)
}

/// Split a composite identifier into exactly `N` non-empty parts
///
/// Returns `None` when the part count differs or any part is empty.
pub fn split_id<const N: usize>(id: &str) -> Option<[&str; N]> {
    let parts: Vec<&str> = id.split(SEPARATOR).collect();
    if parts.len() != N || parts.iter().any(|part| part.is_empty()) {
        return None;
    }
    parts.try_into().ok()
}
