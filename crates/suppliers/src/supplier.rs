use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use pharmacie_catalog::Category;
use pharmacie_core::{CategoryCode, DomainError, DomainResult, Entity, SupplierId};

/// Column width of the name and email fields.
pub const MAX_FIELD_LEN: usize = 255;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$")
        .expect("email pattern is valid")
});

/// Supplier record with the categories it can fulfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    id: SupplierId,
    name: String,
    email: String,
    categories: Vec<Category>,
}

impl Supplier {
    /// Build a supplier, validating name and email.
    ///
    /// Duplicate categories (same code) are collapsed, keeping the first one.
    pub fn new(
        id: SupplierId,
        name: impl Into<String>,
        email: impl Into<String>,
        categories: Vec<Category>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let email = email.into();

        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("supplier name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_FIELD_LEN {
            return Err(DomainError::validation(format!(
                "supplier name cannot exceed {MAX_FIELD_LEN} characters"
            )));
        }
        validate_email(&email)?;

        let mut supplier = Self {
            id,
            name: trimmed.to_string(),
            email,
            categories: Vec::with_capacity(categories.len()),
        };
        for category in categories {
            supplier.add_category(category);
        }
        Ok(supplier)
    }

    pub fn id_typed(&self) -> SupplierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Categories this supplier can fulfill, in association order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn supplies(&self, code: CategoryCode) -> bool {
        self.categories.iter().any(|c| c.code() == code)
    }

    /// Associate a category; no-op if already present.
    pub fn add_category(&mut self, category: Category) {
        if !self.supplies(category.code()) {
            self.categories.push(category);
        }
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

fn validate_email(email: &str) -> DomainResult<()> {
    if email.chars().count() > MAX_FIELD_LEN {
        return Err(DomainError::validation(format!(
            "supplier email cannot exceed {MAX_FIELD_LEN} characters"
        )));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(DomainError::validation(format!(
            "invalid supplier email: {email:?}"
        )));
    }
    Ok(())
}
