//! `pharmacie-reorder`
//!
//! **Responsibility:** the reprovisioning workflow.
//!
//! Select the medications at or below their reorder level, find the suppliers
//! covering their categories, and send each supplier one consolidated quote
//! request. Storage and mail transport stay behind the traits in [`ports`];
//! this crate performs no IO of its own.

pub mod candidates;
pub mod message;
pub mod outcome;
pub mod ports;
pub mod redundancy;
pub mod service;

#[cfg(test)]
mod testing;

pub use candidates::{CategoryGroup, ReorderCandidates};
pub use message::{DEFAULT_SIGNATURE, QUOTE_SUBJECT, QuoteRequest};
pub use outcome::QuoteOutcome;
pub use ports::{CatalogStore, Notifier, NotifyError, StoreError, SupplierDirectory};
pub use redundancy::{DEFAULT_MIN_SUPPLIERS, RedundancyGap, check_supplier_redundancy};
pub use service::{FailurePolicy, QuoteRequestService, ReorderError};
