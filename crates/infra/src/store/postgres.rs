//! Postgres-backed catalog + supplier directory.
//!
//! The reorder ports are synchronous, sqlx is async. Each port method blocks on
//! the current tokio runtime handle, so callers must be on a thread where
//! blocking is allowed (e.g. inside `tokio::task::spawn_blocking`).
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | PoolClosed, PoolTimedOut, Io | `Unavailable` |
//! | Database, other | `Query` |
//! | row decoding / domain validation | `Corrupt` |

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use pharmacie_catalog::{Category, Medication, NewMedication};
use pharmacie_core::{CategoryCode, MedicationRef, SupplierId};
use pharmacie_reorder::{CatalogStore, StoreError, SupplierDirectory};
use pharmacie_suppliers::Supplier;

const SCHEMA: &str = include_str!("../../migrations/0001_pharmacie.sql");

/// Postgres-backed store implementing both read ports.
#[derive(Debug, Clone)]
pub struct PostgresPharmacyStore {
    pool: Arc<PgPool>,
}

impl PostgresPharmacyStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the tables exist.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn load_reorder_candidates(&self) -> Result<Vec<Medication>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.reference,
                m.nom,
                m.unites_en_stock,
                m.niveau_de_reappro,
                m.indisponible,
                c.code,
                c.libelle
            FROM medicament m
            JOIN categorie c ON c.code = m.categorie_code
            WHERE NOT m.indisponible
              AND m.unites_en_stock <= m.niveau_de_reappro
            ORDER BY m.reference ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_reorder_candidates", e))?;

        rows.iter().map(medication_from_row).collect()
    }

    /// One row per (supplier, category) pair, folded into suppliers.
    #[instrument(skip(self, references), fields(references = references.len()), err)]
    pub async fn load_suppliers_for_medications(
        &self,
        references: &[MedicationRef],
    ) -> Result<Vec<Supplier>, StoreError> {
        if references.is_empty() {
            return Ok(vec![]);
        }
        let refs: Vec<i32> = references.iter().map(|r| r.get()).collect();

        let rows = sqlx::query(
            r#"
            SELECT
                f.id,
                f.nom,
                f.adresse_electronique,
                c.code,
                c.libelle
            FROM fournisseur f
            JOIN fournisseur_categorie fc ON fc.fournisseur_id = f.id
            JOIN categorie c ON c.code = fc.categorie_code
            WHERE f.id IN (
                SELECT fc2.fournisseur_id
                FROM fournisseur_categorie fc2
                JOIN medicament m ON m.categorie_code = fc2.categorie_code
                WHERE m.reference = ANY($1)
            )
            ORDER BY f.id ASC, c.code ASC
            "#,
        )
        .bind(&refs)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_suppliers_for_medications", e))?;

        fold_supplier_rows(&rows)
    }

    #[instrument(skip(self), err)]
    pub async fn load_suppliers_per_category(&self) -> Result<Vec<(Category, usize)>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.code, c.libelle, COUNT(fc.fournisseur_id) AS suppliers
            FROM categorie c
            LEFT JOIN fournisseur_categorie fc ON fc.categorie_code = c.code
            GROUP BY c.code, c.libelle
            ORDER BY c.code ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("suppliers_per_category", e))?;

        rows.iter()
            .map(|row| {
                let category = category_from_row(row)?;
                let count: i64 = get(row, "suppliers")?;
                let count = usize::try_from(count)
                    .map_err(|_| StoreError::Corrupt(format!("negative count {count}")))?;
                Ok((category, count))
            })
            .collect()
    }
}

fn runtime() -> Result<tokio::runtime::Handle, StoreError> {
    tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Unavailable(
            "PostgresPharmacyStore requires a tokio runtime; call it from spawn_blocking"
                .to_string(),
        )
    })
}

impl CatalogStore for PostgresPharmacyStore {
    fn find_reorder_candidates(&self) -> Result<Vec<Medication>, StoreError> {
        runtime()?.block_on(self.load_reorder_candidates())
    }
}

impl SupplierDirectory for PostgresPharmacyStore {
    fn find_suppliers_for_medications(
        &self,
        references: &[MedicationRef],
    ) -> Result<Vec<Supplier>, StoreError> {
        runtime()?.block_on(self.load_suppliers_for_medications(references))
    }

    fn suppliers_per_category(&self) -> Result<Vec<(Category, usize)>, StoreError> {
        runtime()?.block_on(self.load_suppliers_per_category())
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Corrupt(format!("column {column}: {e}")))
}

fn non_negative(value: i32, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    let code: i32 = get(row, "code")?;
    let label: String = get(row, "libelle")?;
    Category::new(CategoryCode::new(code), label)
        .map_err(|e| StoreError::Corrupt(format!("categorie {code}: {e}")))
}

fn medication_from_row(row: &PgRow) -> Result<Medication, StoreError> {
    let reference: i32 = get(row, "reference")?;
    Medication::new(NewMedication {
        reference: MedicationRef::new(reference),
        name: get(row, "nom")?,
        category: category_from_row(row)?,
        units_in_stock: non_negative(get(row, "unites_en_stock")?, "unites_en_stock")?,
        reorder_level: non_negative(get(row, "niveau_de_reappro")?, "niveau_de_reappro")?,
        unavailable: get(row, "indisponible")?,
    })
    .map_err(|e| StoreError::Corrupt(format!("medicament {reference}: {e}")))
}

/// Rows arrive ordered by supplier id, so consecutive rows share a supplier.
fn fold_supplier_rows(rows: &[PgRow]) -> Result<Vec<Supplier>, StoreError> {
    let mut suppliers: Vec<Supplier> = Vec::new();
    for row in rows {
        let id = SupplierId::new(get(row, "id")?);
        let category = category_from_row(row)?;

        match suppliers.last_mut() {
            Some(last) if last.id_typed() == id => last.add_category(category),
            _ => {
                let name: String = get(row, "nom")?;
                let email: String = get(row, "adresse_electronique")?;
                let supplier = Supplier::new(id, name, email, vec![category])
                    .map_err(|e| StoreError::Corrupt(format!("fournisseur {id}: {e}")))?;
                suppliers.push(supplier);
            }
        }
    }
    Ok(suppliers)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Database(db_err) => {
            StoreError::Query(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(format!("decode error in {operation}: {err}"))
        }
        _ => StoreError::Query(format!("sqlx error in {operation}: {err}")),
    }
}
