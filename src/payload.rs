use serde::Serialize;

/// A structured record stored at each leaf entry. Identifiers are assumed
/// unique across the tree; duplicate ids are not detected (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub id: u64,
    pub name: String,
}

impl Payload {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
