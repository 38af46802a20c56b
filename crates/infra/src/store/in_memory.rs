use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use pharmacie_catalog::{Category, Medication};
use pharmacie_core::{CategoryCode, MedicationRef, SupplierId};
use pharmacie_reorder::{CatalogStore, StoreError, SupplierDirectory};
use pharmacie_suppliers::Supplier;

#[derive(Debug, Default)]
struct Inner {
    categories: BTreeMap<CategoryCode, Category>,
    medications: BTreeMap<MedicationRef, Medication>,
    suppliers: BTreeMap<SupplierId, Supplier>,
}

/// In-memory catalog + supplier directory for tests/dev.
///
/// Records are returned in identifier order, which is what the Postgres store
/// does with its `ORDER BY` clauses.
#[derive(Debug, Default)]
pub struct InMemoryPharmacyStore {
    inner: RwLock<Inner>,
}

impl InMemoryPharmacyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    pub fn upsert_category(&self, category: Category) -> Result<(), StoreError> {
        self.write()?.categories.insert(category.code(), category);
        Ok(())
    }

    /// Insert or replace a medication. Its category is registered too.
    pub fn upsert_medication(&self, medication: Medication) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let category = medication.category().clone();
        inner.categories.entry(category.code()).or_insert(category);
        inner.medications.insert(medication.reference(), medication);
        Ok(())
    }

    /// Insert or replace a supplier. Its categories are registered too.
    pub fn upsert_supplier(&self, supplier: Supplier) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        for category in supplier.categories() {
            inner
                .categories
                .entry(category.code())
                .or_insert_with(|| category.clone());
        }
        inner.suppliers.insert(supplier.id_typed(), supplier);
        Ok(())
    }

    /// Record a new stock count for a medication.
    pub fn set_units_in_stock(
        &self,
        reference: MedicationRef,
        units: u32,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let medication = inner
            .medications
            .get_mut(&reference)
            .ok_or_else(|| StoreError::NotFound(format!("medication {reference}")))?;
        medication.set_units_in_stock(units);
        Ok(())
    }

    pub fn medication(&self, reference: MedicationRef) -> Result<Option<Medication>, StoreError> {
        Ok(self.read()?.medications.get(&reference).cloned())
    }

    pub fn list_suppliers(&self) -> Result<Vec<Supplier>, StoreError> {
        Ok(self.read()?.suppliers.values().cloned().collect())
    }
}

impl CatalogStore for InMemoryPharmacyStore {
    fn find_reorder_candidates(&self) -> Result<Vec<Medication>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .medications
            .values()
            .filter(|m| m.needs_reorder())
            .cloned()
            .collect())
    }
}

impl SupplierDirectory for InMemoryPharmacyStore {
    fn find_suppliers_for_medications(
        &self,
        references: &[MedicationRef],
    ) -> Result<Vec<Supplier>, StoreError> {
        let inner = self.read()?;
        let codes: HashSet<CategoryCode> = references
            .iter()
            .filter_map(|r| inner.medications.get(r))
            .map(|m| m.category().code())
            .collect();

        Ok(inner
            .suppliers
            .values()
            .filter(|s| s.categories().iter().any(|c| codes.contains(&c.code())))
            .cloned()
            .collect())
    }

    fn suppliers_per_category(&self) -> Result<Vec<(Category, usize)>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .categories
            .values()
            .map(|c| {
                let n = inner
                    .suppliers
                    .values()
                    .filter(|s| s.supplies(c.code()))
                    .count();
                (c.clone(), n)
            })
            .collect())
    }
}
