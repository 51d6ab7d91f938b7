//! Reference data (district / area lists)

use serde::{Deserialize, Serialize};

/// One id/name entry of a reference list.
///
/// Fetched once per flow, read-only; used to populate selection fields and
/// to resolve ids to display names for card rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: i64,
    pub name: String,
}

/// Resolve an id against a reference list.
pub fn resolve_name(list: &[ReferenceItem], id: Option<i64>) -> Option<&str> {
    let id = id?;
    list.iter().find(|it| it.id == id).map(|it| it.name.as_str())
}
