use serde::{Deserialize, Serialize};

use pharmacie_core::{CategoryCode, DomainError, DomainResult, Entity};

/// Medication category (e.g. "Antalgiques").
///
/// Identity is the code: two `Category` values with the same code compare
/// equal and hash the same even if their labels differ, so the type can key a
/// map when medications are grouped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    code: CategoryCode,
    label: String,
}

impl Category {
    pub fn new(code: CategoryCode, label: impl Into<String>) -> DomainResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(DomainError::validation("category label cannot be empty"));
        }
        Ok(Self { code, label })
    }

    pub fn code(&self) -> CategoryCode {
        self.code
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Entity for Category {
    type Id = CategoryCode;

    fn id(&self) -> Self::Id {
        self.code
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Category {}

impl core::hash::Hash for Category {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}
