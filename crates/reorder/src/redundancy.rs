//! Supplier redundancy audit.
//!
//! Every category is expected to have at least two suppliers so a quote
//! request never depends on a single wholesaler. Nothing enforces it; this
//! reports the categories that fall short.

use pharmacie_catalog::Category;

pub const DEFAULT_MIN_SUPPLIERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedundancyGap {
    pub category: Category,
    pub supplier_count: usize,
}

/// Categories with fewer than `min_suppliers` suppliers, ordered by code.
pub fn check_supplier_redundancy(
    counts: impl IntoIterator<Item = (Category, usize)>,
    min_suppliers: usize,
) -> Vec<RedundancyGap> {
    let mut gaps = counts
        .into_iter()
        .filter(|(_, n)| *n < min_suppliers)
        .map(|(category, supplier_count)| RedundancyGap {
            category,
            supplier_count,
        })
        .collect::<Vec<_>>();
    gaps.sort_by_key(|g| g.category.code());
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::category;

    #[test]
    fn reports_categories_below_minimum() {
        let counts = vec![
            (category(99, "Antibiotiques"), 2),
            (category(98, "Antalgiques"), 3),
            (category(100, "Vitamines"), 1),
            (category(97, "Homéopathie"), 0),
        ];

        let gaps = check_supplier_redundancy(counts, DEFAULT_MIN_SUPPLIERS);

        let found = gaps
            .iter()
            .map(|g| (g.category.code().get(), g.supplier_count))
            .collect::<Vec<_>>();
        assert_eq!(found, vec![(97, 0), (100, 1)]);
    }

    #[test]
    fn zero_minimum_reports_nothing() {
        let counts = vec![(category(1, "Antalgiques"), 0)];
        assert!(check_supplier_redundancy(counts, 0).is_empty());
    }
}
