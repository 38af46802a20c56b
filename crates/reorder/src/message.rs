//! Quote-request email composition.

use std::fmt::Write as _;

use pharmacie_suppliers::Supplier;

use crate::candidates::ReorderCandidates;

pub const QUOTE_SUBJECT: &str = "Demande de devis de réapprovisionnement";

pub const DEFAULT_SIGNATURE: &str = "La Pharmacie";

/// A composed message, ready for the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub to: String,
    pub subject: &'static str,
    pub body: String,
    /// Medications listed in `body`.
    pub medication_count: usize,
}

impl QuoteRequest {
    /// Compose the request for one supplier.
    ///
    /// Walks the supplier's own categories, so the body only lists categories
    /// it can fulfill; categories without candidates get no section. Returns
    /// `None` when no section would be written.
    pub fn compose(
        supplier: &Supplier,
        candidates: &ReorderCandidates,
        signature: &str,
    ) -> Option<Self> {
        let mut sections = String::new();
        let mut medication_count = 0;

        for category in supplier.categories() {
            let Some(medications) = candidates.get(category.code()) else {
                continue;
            };
            if medications.is_empty() {
                continue;
            }

            let _ = writeln!(sections, "=== Catégorie : {} ===", category.label());
            for m in medications {
                let _ = writeln!(
                    sections,
                    "  - {} (stock actuel: {}, seuil: {})",
                    m.name(),
                    m.units_in_stock(),
                    m.reorder_level()
                );
            }
            sections.push('\n');
            medication_count += medications.len();
        }

        if medication_count == 0 {
            return None;
        }

        let mut body = String::with_capacity(sections.len() + 256);
        let _ = write!(body, "Bonjour {},\n\n", supplier.name());
        body.push_str("Nous vous contactons pour vous demander un devis de réapprovisionnement ");
        body.push_str("pour les médicaments suivants :\n\n");
        body.push_str(&sections);
        body.push_str("Merci de nous transmettre votre devis dans les meilleurs délais.\n\n");
        body.push_str("Cordialement,\n");
        body.push_str(signature);

        Some(Self {
            to: supplier.email().to_string(),
            subject: QUOTE_SUBJECT,
            body,
            medication_count,
        })
    }
}
