use std::collections::{HashMap, HashSet};

use pharmacie_catalog::{Category, Medication};
use pharmacie_core::{CategoryCode, MedicationRef};

/// Candidates of one category, in query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: Category,
    pub medications: Vec<Medication>,
}

/// Medications due for reorder, grouped by category code.
///
/// Groups keep the order in which their category first appeared; medications
/// keep query order within a group. A reference seen twice is kept once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderCandidates {
    groups: Vec<CategoryGroup>,
    index: HashMap<CategoryCode, usize>,
    references: Vec<MedicationRef>,
    seen: HashSet<MedicationRef>,
}

impl ReorderCandidates {
    pub fn from_medications(medications: impl IntoIterator<Item = Medication>) -> Self {
        let mut candidates = Self::default();
        for medication in medications {
            candidates.push(medication);
        }
        candidates
    }

    fn push(&mut self, medication: Medication) {
        if !self.seen.insert(medication.reference()) {
            return;
        }
        self.references.push(medication.reference());

        let code = medication.category().code();
        match self.index.get(&code) {
            Some(&i) => self.groups[i].medications.push(medication),
            None => {
                self.index.insert(code, self.groups.len());
                self.groups.push(CategoryGroup {
                    category: medication.category().clone(),
                    medications: vec![medication],
                });
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Number of medications (not groups).
    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    pub fn get(&self, code: CategoryCode) -> Option<&[Medication]> {
        self.index
            .get(&code)
            .map(|&i| self.groups[i].medications.as_slice())
    }

    /// Distinct medication references, first-seen order.
    pub fn references(&self) -> &[MedicationRef] {
        &self.references
    }
}
