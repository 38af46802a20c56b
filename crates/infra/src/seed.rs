//! Demo catalog for the in-memory dev setup.
//!
//! Two categories, each served by at least two suppliers. Stock sits above
//! every reorder level, so a quote request on a fresh seed reports nothing to
//! reorder until a stock count is lowered.

use thiserror::Error;

use pharmacie_catalog::{Category, Medication, NewMedication};
use pharmacie_core::{CategoryCode, DomainError, MedicationRef, SupplierId};
use pharmacie_reorder::StoreError;
use pharmacie_suppliers::Supplier;

use crate::store::InMemoryPharmacyStore;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// (reference, name, category code, units in stock, reorder level)
const MEDICATIONS: &[(i32, &str, i32, u32, u32)] = &[
    (93, "Paracétamol 500mg", 98, 100, 10),
    (94, "Ibuprofène 400mg", 98, 80, 15),
    (95, "Aspirine 500mg", 98, 60, 10),
    (96, "Amoxicilline 1g", 99, 40, 10),
    (97, "Azithromycine 250mg", 99, 30, 5),
];

/// (id, name, email, category codes)
const SUPPLIERS: &[(i32, &str, &str, &[i32])] = &[
    (1, "PharmaDistrib", "commandes@pharmadistrib.example.com", &[98, 99]),
    (2, "MediFrance", "devis@medifrance.example.com", &[98]),
    (3, "SantéPlus", "achats@santeplus.example.com", &[98]),
    (4, "BioMedic", "contact@biomedic.example.com", &[99]),
];

fn categories() -> Result<Vec<Category>, DomainError> {
    Ok(vec![
        Category::new(CategoryCode::new(98), "Antalgiques")?,
        Category::new(CategoryCode::new(99), "Antibiotiques")?,
    ])
}

pub fn seed_demo_data(store: &InMemoryPharmacyStore) -> Result<(), SeedError> {
    let categories = categories()?;
    let find = |code: i32| {
        categories
            .iter()
            .find(|c| c.code().get() == code)
            .cloned()
            .ok_or_else(|| DomainError::invariant(format!("unknown category {code}")))
    };

    for category in &categories {
        store.upsert_category(category.clone())?;
    }

    for &(reference, name, code, stock, level) in MEDICATIONS {
        store.upsert_medication(Medication::new(NewMedication {
            reference: MedicationRef::new(reference),
            name: name.to_string(),
            category: find(code)?,
            units_in_stock: stock,
            reorder_level: level,
            unavailable: false,
        })?)?;
    }

    for &(id, name, email, codes) in SUPPLIERS {
        let supplied = codes.iter().map(|c| find(*c)).collect::<Result<Vec<_>, _>>()?;
        store.upsert_supplier(Supplier::new(SupplierId::new(id), name, email, supplied)?)?;
    }

    Ok(())
}
