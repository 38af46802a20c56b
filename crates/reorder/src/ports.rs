//! Boundaries the workflow depends on.
//!
//! All three are synchronous: an invocation runs to completion on the calling
//! thread. Adapters over async clients block on their own runtime handle.

use std::sync::Arc;

use thiserror::Error;

use pharmacie_catalog::{Category, Medication};
use pharmacie_core::MedicationRef;
use pharmacie_suppliers::Supplier;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached (pool closed, no runtime, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    /// A record addressed by key does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A row could not be mapped back to a valid domain record.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The message never reached the provider (network, TLS, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider answered but refused the message.
    #[error("rejected by provider (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Catalog read side: medications due for reorder.
pub trait CatalogStore: Send + Sync {
    /// Medications with `unavailable = false AND units_in_stock <= reorder_level`,
    /// each carrying its category.
    fn find_reorder_candidates(&self) -> Result<Vec<Medication>, StoreError>;
}

/// Supplier read side.
pub trait SupplierDirectory: Send + Sync {
    /// Every supplier associated with at least one category that contains one of
    /// `references`, with its categories populated. No supplier appears twice.
    fn find_suppliers_for_medications(
        &self,
        references: &[MedicationRef],
    ) -> Result<Vec<Supplier>, StoreError>;

    /// Number of suppliers per category, including categories with none.
    fn suppliers_per_category(&self) -> Result<Vec<(Category, usize)>, StoreError>;
}

/// Outbound plain-text message capability.
pub trait Notifier: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn find_reorder_candidates(&self) -> Result<Vec<Medication>, StoreError> {
        (**self).find_reorder_candidates()
    }
}

impl<S> SupplierDirectory for Arc<S>
where
    S: SupplierDirectory + ?Sized,
{
    fn find_suppliers_for_medications(
        &self,
        references: &[MedicationRef],
    ) -> Result<Vec<Supplier>, StoreError> {
        (**self).find_suppliers_for_medications(references)
    }

    fn suppliers_per_category(&self) -> Result<Vec<(Category, usize)>, StoreError> {
        (**self).suppliers_per_category()
    }
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).send(to, subject, body)
    }
}
