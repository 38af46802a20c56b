//! Catalog and supplier storage adapters.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryPharmacyStore;
pub use postgres::PostgresPharmacyStore;
