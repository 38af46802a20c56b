//! Test doubles for the workflow ports.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use pharmacie_catalog::{Category, Medication, NewMedication};
use pharmacie_core::{CategoryCode, MedicationRef, SupplierId};
use pharmacie_suppliers::Supplier;

use crate::ports::{CatalogStore, Notifier, NotifyError, StoreError, SupplierDirectory};

pub fn category(code: i32, label: &str) -> Category {
    Category::new(CategoryCode::new(code), label).unwrap()
}

pub fn medication(
    reference: i32,
    name: &str,
    category: &Category,
    stock: u32,
    level: u32,
) -> Medication {
    Medication::new(NewMedication {
        reference: MedicationRef::new(reference),
        name: name.to_string(),
        category: category.clone(),
        units_in_stock: stock,
        reorder_level: level,
        unavailable: false,
    })
    .unwrap()
}

pub fn supplier(id: i32, name: &str, email: &str, categories: &[&Category]) -> Supplier {
    Supplier::new(
        SupplierId::new(id),
        name,
        email,
        categories.iter().map(|c| (*c).clone()).collect(),
    )
    .unwrap()
}

/// Catalog + directory over plain vectors, with the same query semantics as
/// the real stores.
#[derive(Debug, Default)]
pub struct FakeStore {
    pub medications: Vec<Medication>,
    pub categories: Vec<Category>,
    pub suppliers: Vec<Supplier>,
    pub fail_catalog: bool,
    pub fail_directory: bool,
    /// Return every matching supplier once per matching medication.
    pub duplicate_suppliers: bool,
    pub directory_calls: AtomicUsize,
}

impl CatalogStore for FakeStore {
    fn find_reorder_candidates(&self) -> Result<Vec<Medication>, StoreError> {
        if self.fail_catalog {
            return Err(StoreError::Unavailable("catalog down".into()));
        }
        Ok(self
            .medications
            .iter()
            .filter(|m| m.needs_reorder())
            .cloned()
            .collect())
    }
}

impl SupplierDirectory for FakeStore {
    fn find_suppliers_for_medications(
        &self,
        references: &[MedicationRef],
    ) -> Result<Vec<Supplier>, StoreError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_directory {
            return Err(StoreError::Query("directory down".into()));
        }

        let codes = self
            .medications
            .iter()
            .filter(|m| references.contains(&m.reference()))
            .map(|m| m.category().code())
            .collect::<Vec<_>>();

        let mut out = Vec::new();
        for s in &self.suppliers {
            let hits = codes.iter().filter(|c| s.supplies(**c)).count();
            let copies = if self.duplicate_suppliers { hits } else { hits.min(1) };
            for _ in 0..copies {
                out.push(s.clone());
            }
        }
        Ok(out)
    }

    fn suppliers_per_category(&self) -> Result<Vec<(Category, usize)>, StoreError> {
        if self.fail_directory {
            return Err(StoreError::Query("directory down".into()));
        }
        Ok(self
            .categories
            .iter()
            .map(|c| {
                let n = self.suppliers.iter().filter(|s| s.supplies(c.code())).count();
                (c.clone(), n)
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records every attempt; fails for addresses in `failing`.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub failing: HashSet<String>,
    pub sent: Mutex<Vec<SentMail>>,
    pub attempts: AtomicUsize,
}

impl RecordingNotifier {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            failing: addresses.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(to) {
            return Err(NotifyError::Transport(format!("connection refused for {to}")));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
