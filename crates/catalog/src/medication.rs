use serde::{Deserialize, Serialize};

use pharmacie_core::{DomainError, DomainResult, Entity, MedicationRef};

use crate::category::Category;

/// Input for building a [`Medication`].
///
/// Stores fill this from their rows; tests fill it by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedication {
    pub reference: MedicationRef,
    pub name: String,
    pub category: Category,
    pub units_in_stock: u32,
    pub reorder_level: u32,
    #[serde(default)]
    pub unavailable: bool,
}

/// Catalog entry: a medication with its stock position.
///
/// A medication always belongs to exactly one category; the category is
/// carried inline so grouping does not need a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    reference: MedicationRef,
    name: String,
    category: Category,
    units_in_stock: u32,
    reorder_level: u32,
    unavailable: bool,
}

impl Medication {
    pub fn new(input: NewMedication) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("medication name cannot be empty"));
        }
        Ok(Self {
            reference: input.reference,
            name: input.name,
            category: input.category,
            units_in_stock: input.units_in_stock,
            reorder_level: input.reorder_level,
            unavailable: input.unavailable,
        })
    }

    pub fn reference(&self) -> MedicationRef {
        self.reference
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn units_in_stock(&self) -> u32 {
        self.units_in_stock
    }

    pub fn reorder_level(&self) -> u32 {
        self.reorder_level
    }

    /// Reorder rule: stock at or below the threshold, and still sold.
    ///
    /// The comparison is inclusive; a stock equal to the threshold must be
    /// reordered.
    pub fn needs_reorder(&self) -> bool {
        !self.unavailable && self.units_in_stock <= self.reorder_level
    }

    /// Record a new stock count (deliveries, inventory counts).
    pub fn set_units_in_stock(&mut self, units: u32) {
        self.units_in_stock = units;
    }

    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }
}

impl Entity for Medication {
    type Id = MedicationRef;

    fn id(&self) -> Self::Id {
        self.reference
    }
}
