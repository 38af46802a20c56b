//! Catalog domain module (medications and their categories).
//!
//! This crate contains the catalog records and the reorder rule, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod category;
pub mod medication;

pub use category::Category;
pub use medication::{Medication, NewMedication};
