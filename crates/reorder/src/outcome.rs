use core::fmt;

/// One line of the quote-request report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteOutcome {
    /// Nothing at or below its reorder level.
    NoCandidates,
    /// Candidates exist but no supplier covers their categories.
    NoSuppliers,
    Sent { supplier: String, email: String },
    /// Only produced under [`crate::FailurePolicy::IsolatePerSupplier`].
    Failed {
        supplier: String,
        email: String,
        reason: String,
    },
}

impl QuoteOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, QuoteOutcome::Failed { .. })
    }
}

impl fmt::Display for QuoteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteOutcome::NoCandidates => f.write_str("Aucun médicament à réapprovisionner"),
            QuoteOutcome::NoSuppliers => f.write_str(
                "Aucun fournisseur trouvé pour les médicaments à réapprovisionner",
            ),
            QuoteOutcome::Sent { supplier, email } => {
                write!(f, "Mail envoyé à {supplier} ({email})")
            }
            QuoteOutcome::Failed {
                supplier,
                email,
                reason,
            } => write!(f, "Échec de l'envoi à {supplier} ({email}) : {reason}"),
        }
    }
}
