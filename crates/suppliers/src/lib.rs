//! Suppliers domain module.
//!
//! A supplier is a wholesaler the pharmacy can ask for quotes. Each supplier
//! covers a set of medication categories; the many-to-many association is
//! carried on the supplier side.

pub mod supplier;

pub use supplier::{MAX_FIELD_LEN, Supplier};
