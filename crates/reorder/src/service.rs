//! Quote-request workflow.

use std::collections::HashSet;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use pharmacie_core::{DomainError, Entity, RunId};

use crate::candidates::ReorderCandidates;
use crate::message::{DEFAULT_SIGNATURE, QuoteRequest};
use crate::outcome::QuoteOutcome;
use crate::ports::{CatalogStore, Notifier, NotifyError, StoreError, SupplierDirectory};
use crate::redundancy::{RedundancyGap, check_supplier_redundancy};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReorderError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("failed to notify {supplier} ({email}): {source}")]
    Notification {
        supplier: String,
        email: String,
        #[source]
        source: NotifyError,
    },
}

/// What to do when the notifier fails for one supplier.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and fail the whole invocation.
    AbortOnFirstFailure,
    /// Record the failure as a report line and move on to the next supplier.
    #[default]
    IsolatePerSupplier,
}

impl FromStr for FailurePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::AbortOnFirstFailure),
            "isolate" => Ok(FailurePolicy::IsolatePerSupplier),
            other => Err(DomainError::validation(format!(
                "failure policy must be one of: abort, isolate (got {other:?})"
            ))),
        }
    }
}

/// Reprovisioning workflow over a catalog, a supplier directory and a notifier.
///
/// Holds no state between invocations. Re-running with unchanged stock selects
/// the same candidates and sends the same emails again.
#[derive(Debug)]
pub struct QuoteRequestService<C, S, N> {
    catalog: C,
    suppliers: S,
    notifier: N,
    policy: FailurePolicy,
    signature: String,
}

impl<C, S, N> QuoteRequestService<C, S, N>
where
    C: CatalogStore,
    S: SupplierDirectory,
    N: Notifier,
{
    pub fn new(catalog: C, suppliers: S, notifier: N) -> Self {
        Self {
            catalog,
            suppliers,
            notifier,
            policy: FailurePolicy::default(),
            signature: DEFAULT_SIGNATURE.to_string(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Closing line of every email.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Medications due for reorder, grouped by category.
    ///
    /// Re-applies the reorder rule on top of the store's filter, so a lax store
    /// can never widen the candidate set.
    pub fn reorder_candidates(&self) -> Result<ReorderCandidates, ReorderError> {
        let fetched = self.catalog.find_reorder_candidates()?;
        let total = fetched.len();
        let candidates =
            ReorderCandidates::from_medications(fetched.into_iter().filter(|m| m.needs_reorder()));
        if candidates.len() < total {
            debug!(
                discarded = total - candidates.len(),
                "discarded rows outside the reorder rule"
            );
        }
        Ok(candidates)
    }

    /// Ask every qualifying supplier for a quote.
    ///
    /// Each supplier is contacted at most once. Store failures always abort;
    /// notifier failures follow the configured [`FailurePolicy`].
    #[instrument(skip(self), fields(run_id = %RunId::new(), policy = ?self.policy))]
    pub fn request_quotes(&self) -> Result<Vec<QuoteOutcome>, ReorderError> {
        let candidates = self.reorder_candidates()?;
        if candidates.is_empty() {
            info!("no medication needs reordering");
            return Ok(vec![QuoteOutcome::NoCandidates]);
        }
        info!(
            medications = candidates.len(),
            categories = candidates.groups().len(),
            "medications need reordering"
        );

        let suppliers = self
            .suppliers
            .find_suppliers_for_medications(candidates.references())?;
        if suppliers.is_empty() {
            warn!("no supplier found for medications needing reorder");
            return Ok(vec![QuoteOutcome::NoSuppliers]);
        }

        let mut contacted = HashSet::with_capacity(suppliers.len());
        let mut outcomes = Vec::with_capacity(suppliers.len());

        for supplier in &suppliers {
            if !contacted.insert(supplier.id()) {
                debug!(supplier = supplier.name(), "supplier returned twice; skipping");
                continue;
            }

            let Some(request) = QuoteRequest::compose(supplier, &candidates, &self.signature)
            else {
                debug!(
                    supplier = supplier.name(),
                    "supplier covers none of the candidate categories"
                );
                continue;
            };

            match self
                .notifier
                .send(&request.to, request.subject, &request.body)
            {
                Ok(()) => {
                    info!(
                        supplier = supplier.name(),
                        email = supplier.email(),
                        medications = request.medication_count,
                        "quote request sent"
                    );
                    outcomes.push(QuoteOutcome::Sent {
                        supplier: supplier.name().to_string(),
                        email: supplier.email().to_string(),
                    });
                }
                Err(e) => match self.policy {
                    FailurePolicy::AbortOnFirstFailure => {
                        error!(
                            supplier = supplier.name(),
                            email = supplier.email(),
                            error = %e,
                            "quote request failed; aborting"
                        );
                        return Err(ReorderError::Notification {
                            supplier: supplier.name().to_string(),
                            email: supplier.email().to_string(),
                            source: e,
                        });
                    }
                    FailurePolicy::IsolatePerSupplier => {
                        warn!(
                            supplier = supplier.name(),
                            email = supplier.email(),
                            error = %e,
                            "quote request failed; continuing"
                        );
                        outcomes.push(QuoteOutcome::Failed {
                            supplier: supplier.name().to_string(),
                            email: supplier.email().to_string(),
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        if outcomes.is_empty() {
            warn!("no returned supplier covers the candidate categories");
            return Ok(vec![QuoteOutcome::NoSuppliers]);
        }
        Ok(outcomes)
    }

    /// [`Self::request_quotes`] rendered as report lines.
    pub fn request_quote_lines(&self) -> Result<Vec<String>, ReorderError> {
        Ok(self
            .request_quotes()?
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    /// Categories served by fewer than `min_suppliers` suppliers.
    pub fn redundancy_gaps(
        &self,
        min_suppliers: usize,
    ) -> Result<Vec<RedundancyGap>, ReorderError> {
        let counts = self.suppliers.suppliers_per_category()?;
        Ok(check_supplier_redundancy(counts, min_suppliers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use crate::message::QUOTE_SUBJECT;
    use crate::testing::{FakeStore, RecordingNotifier, category, medication, supplier};

    type TestService = QuoteRequestService<Arc<FakeStore>, Arc<FakeStore>, Arc<RecordingNotifier>>;

    fn service(
        store: FakeStore,
        notifier: RecordingNotifier,
    ) -> (TestService, Arc<FakeStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(store);
        let notifier = Arc::new(notifier);
        let svc = QuoteRequestService::new(store.clone(), store.clone(), notifier.clone());
        (svc, store, notifier)
    }

    #[test]
    fn empty_store_reports_no_candidates() {
        let (svc, store, notifier) = service(FakeStore::default(), RecordingNotifier::default());

        let lines = svc.request_quote_lines().unwrap();

        assert_eq!(lines, vec!["Aucun médicament à réapprovisionner"]);
        assert_eq!(notifier.attempts(), 0);
        assert_eq!(store.directory_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stock_above_threshold_reports_no_candidates() {
        let c1 = category(1, "Antalgiques");
        let store = FakeStore {
            medications: vec![medication(1, "StockOK", &c1, 100, 10)],
            suppliers: vec![supplier(1, "PharmaDistrib", "p@example.com", &[&c1])],
            ..FakeStore::default()
        };
        let (svc, store, notifier) = service(store, RecordingNotifier::default());

        let outcomes = svc.request_quotes().unwrap();

        assert_eq!(outcomes, vec![QuoteOutcome::NoCandidates]);
        assert_eq!(notifier.attempts(), 0);
        assert_eq!(store.directory_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stock_equal_to_threshold_notifies_every_supplier_of_the_category() {
        let c1 = category(1, "Antalgiques");
        let store = FakeStore {
            medications: vec![medication(1, "StockEgal", &c1, 5, 5)],
            suppliers: vec![
                supplier(1, "PharmaDistrib", "pharmadistrib@example.com", &[&c1]),
                supplier(2, "MediFrance", "medifrance@example.com", &[&c1]),
            ],
            ..FakeStore::default()
        };
        let (svc, _store, notifier) = service(store, RecordingNotifier::default());

        let lines = svc.request_quote_lines().unwrap();

        assert_eq!(
            lines,
            vec![
                "Mail envoyé à PharmaDistrib (pharmadistrib@example.com)",
                "Mail envoyé à MediFrance (medifrance@example.com)",
            ]
        );
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        for mail in &sent {
            assert_eq!(mail.subject, QUOTE_SUBJECT);
            assert!(mail.body.contains("StockEgal (stock actuel: 5, seuil: 5)"));
        }
    }

    #[test]
    fn category_without_supplier_reports_no_suppliers() {
        let c1 = category(1, "Antalgiques");
        let store = FakeStore {
            medications: vec![medication(1, "StockBas", &c1, 2, 10)],
            ..FakeStore::default()
        };
        let (svc, _store, notifier) = service(store, RecordingNotifier::default());

        let lines = svc.request_quote_lines().unwrap();

        assert_eq!(
            lines,
            vec!["Aucun fournisseur trouvé pour les médicaments à réapprovisionner"]
        );
        assert_eq!(notifier.attempts(), 0);
    }

    #[test]
    fn supplier_only_sees_its_categories_with_candidates() {
        let c1 = category(1, "Antalgiques");
        let c2 = category(2, "Antibiotiques");
        let c3 = category(3, "Vitamines");
        let store = FakeStore {
            medications: vec![
                medication(1, "Doliprane", &c1, 1, 10),
                medication(2, "Amoxicilline", &c2, 50, 10),
                medication(3, "Vitamine C", &c3, 0, 10),
            ],
            suppliers: vec![
                supplier(1, "PharmaDistrib", "p@example.com", &[&c1, &c2]),
                supplier(4, "BioMedic", "b@example.com", &[&c3]),
            ],
            ..FakeStore::default()
        };
        let (svc, _store, notifier) = service(store, RecordingNotifier::default());

        svc.request_quotes().unwrap();

        let sent = notifier.sent();
        let pharma = sent.iter().find(|m| m.to == "p@example.com").unwrap();
        assert!(pharma.body.contains("=== Catégorie : Antalgiques ==="));
        assert!(pharma.body.contains("Doliprane"));
        assert!(!pharma.body.contains("Antibiotiques"));
        assert!(!pharma.body.contains("Vitamine C"));

        let bio = sent.iter().find(|m| m.to == "b@example.com").unwrap();
        assert!(bio.body.contains("Vitamine C"));
        assert!(!bio.body.contains("Doliprane"));
    }

    #[test]
    fn unavailable_medications_are_ignored() {
        let c1 = category(1, "Antalgiques");
        let mut gone = medication(1, "Indisponible", &c1, 0, 10);
        gone.set_unavailable(true);
        let store = FakeStore {
            medications: vec![gone],
            suppliers: vec![supplier(1, "PharmaDistrib", "p@example.com", &[&c1])],
            ..FakeStore::default()
        };
        let (svc, _store, notifier) = service(store, RecordingNotifier::default());

        assert_eq!(svc.request_quotes().unwrap(), vec![QuoteOutcome::NoCandidates]);
        assert_eq!(notifier.attempts(), 0);
    }

    #[test]
    fn duplicated_suppliers_are_contacted_once() {
        let c1 = category(1, "Antalgiques");
        let store = FakeStore {
            medications: vec![
                medication(1, "Doliprane", &c1, 1, 10),
                medication(2, "Efferalgan", &c1, 1, 10),
            ],
            suppliers: vec![supplier(1, "PharmaDistrib", "p@example.com", &[&c1])],
            duplicate_suppliers: true,
            ..FakeStore::default()
        };
        let (svc, _store, notifier) = service(store, RecordingNotifier::default());

        let outcomes = svc.request_quotes().unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(notifier.attempts(), 1);
        let body = &notifier.sent()[0].body;
        assert!(body.contains("Doliprane"));
        assert!(body.contains("Efferalgan"));
    }

    #[test]
    fn isolate_policy_reports_failures_and_keeps_going() {
        let c1 = category(1, "Antalgiques");
        let store = FakeStore {
            medications: vec![medication(1, "Doliprane", &c1, 1, 10)],
            suppliers: vec![
                supplier(1, "PharmaDistrib", "p@example.com", &[&c1]),
                supplier(2, "MediFrance", "m@example.com", &[&c1]),
                supplier(3, "SantéPlus", "s@example.com", &[&c1]),
            ],
            ..FakeStore::default()
        };
        let (svc, _store, notifier) =
            service(store, RecordingNotifier::failing_for(&["m@example.com"]));

        let outcomes = svc.request_quotes().unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].is_failure());
        assert!(outcomes[1].is_failure());
        assert!(!outcomes[2].is_failure());
        assert!(outcomes[1]
            .to_string()
            .starts_with("Échec de l'envoi à MediFrance (m@example.com)"));
        assert_eq!(notifier.attempts(), 3);
        assert_eq!(notifier.sent().len(), 2);
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let c1 = category(1, "Antalgiques");
        let store = FakeStore {
            medications: vec![medication(1, "Doliprane", &c1, 1, 10)],
            suppliers: vec![
                supplier(1, "PharmaDistrib", "p@example.com", &[&c1]),
                supplier(2, "MediFrance", "m@example.com", &[&c1]),
                supplier(3, "SantéPlus", "s@example.com", &[&c1]),
            ],
            ..FakeStore::default()
        };
        let (svc, _store, notifier) =
            service(store, RecordingNotifier::failing_for(&["m@example.com"]));
        let svc = svc.with_failure_policy(FailurePolicy::AbortOnFirstFailure);

        let err = svc.request_quotes().unwrap_err();

        match err {
            ReorderError::Notification { supplier, email, .. } => {
                assert_eq!(supplier, "MediFrance");
                assert_eq!(email, "m@example.com");
            }
            _ => panic!("Expected Notification error"),
        }
        assert_eq!(notifier.attempts(), 2);
    }

    #[test]
    fn store_failures_are_fatal() {
        let (svc, _store, notifier) = service(
            FakeStore {
                fail_catalog: true,
                ..FakeStore::default()
            },
            RecordingNotifier::default(),
        );
        assert!(matches!(svc.request_quotes(), Err(ReorderError::Store(_))));
        assert_eq!(notifier.attempts(), 0);

        let c1 = category(1, "Antalgiques");
        let (svc, store, notifier) = service(
            FakeStore {
                medications: vec![medication(1, "Doliprane", &c1, 1, 10)],
                suppliers: vec![supplier(1, "PharmaDistrib", "p@example.com", &[&c1])],
                fail_directory: true,
                ..FakeStore::default()
            },
            RecordingNotifier::default(),
        );
        assert!(matches!(svc.request_quotes(), Err(ReorderError::Store(_))));
        assert_eq!(store.directory_calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.attempts(), 0);
    }

    #[test]
    fn rerunning_sends_again() {
        let c1 = category(1, "Antalgiques");
        let store = FakeStore {
            medications: vec![medication(1, "Doliprane", &c1, 1, 10)],
            suppliers: vec![supplier(1, "PharmaDistrib", "p@example.com", &[&c1])],
            ..FakeStore::default()
        };
        let (svc, _store, notifier) = service(store, RecordingNotifier::default());

        let first = svc.request_quotes().unwrap();
        let second = svc.request_quotes().unwrap();

        assert_eq!(first, second);
        assert_eq!(notifier.attempts(), 2);
    }

    #[test]
    fn redundancy_gaps_come_from_the_directory() {
        let c1 = category(1, "Antalgiques");
        let c2 = category(2, "Antibiotiques");
        let store = FakeStore {
            categories: vec![c1.clone(), c2.clone()],
            suppliers: vec![
                supplier(1, "PharmaDistrib", "p@example.com", &[&c1, &c2]),
                supplier(2, "MediFrance", "m@example.com", &[&c1]),
            ],
            ..FakeStore::default()
        };
        let (svc, _store, _) = service(store, RecordingNotifier::default());

        let gaps = svc.redundancy_gaps(2).unwrap();

        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].category, c2);
        assert_eq!(gaps[0].supplier_count, 1);
    }

    #[test]
    fn parses_failure_policy() {
        assert_eq!("abort".parse::<FailurePolicy>().unwrap(), FailurePolicy::AbortOnFirstFailure);
        assert_eq!(
            " Isolate ".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::IsolatePerSupplier
        );
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        /// (stock, level, unavailable, category index)
        fn medications_strategy() -> impl Strategy<Value = Vec<(u32, u32, bool, usize)>> {
            proptest::collection::vec((0u32..50, 0u32..50, any::<bool>(), 0usize..4), 0..20)
        }

        /// Each supplier: subset of the 4 categories, as a bitmask.
        fn suppliers_strategy() -> impl Strategy<Value = Vec<u8>> {
            proptest::collection::vec(0u8..16, 0..6)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: one notification per qualifying supplier, and each body
            /// only lists candidates from categories that supplier covers.
            #[test]
            fn notifications_respect_candidates_and_coverage(
                meds in medications_strategy(),
                masks in suppliers_strategy()
            ) {
                let categories = (0..4)
                    .map(|i| category(i as i32 + 1, &format!("Cat{i}")))
                    .collect::<Vec<_>>();

                let medications = meds
                    .iter()
                    .enumerate()
                    .map(|(i, (stock, level, unavailable, cat))| {
                        let mut m = medication(
                            i as i32 + 1,
                            &format!("Med{i}#"),
                            &categories[*cat],
                            *stock,
                            *level,
                        );
                        m.set_unavailable(*unavailable);
                        m
                    })
                    .collect::<Vec<_>>();

                let suppliers = masks
                    .iter()
                    .enumerate()
                    .map(|(i, mask)| {
                        let covered = categories
                            .iter()
                            .enumerate()
                            .filter(|(bit, _)| mask & (1 << bit) != 0)
                            .map(|(_, c)| c)
                            .collect::<Vec<_>>();
                        let email = format!("s{i}@example.com");
                        supplier(i as i32 + 1, &format!("S{i}"), &email, &covered)
                    })
                    .collect::<Vec<_>>();

                let store = FakeStore {
                    medications: medications.clone(),
                    suppliers: suppliers.clone(),
                    ..FakeStore::default()
                };
                let (svc, _store, notifier) = service(store, RecordingNotifier::default());

                let outcomes = svc.request_quotes().unwrap();
                let sent = notifier.sent();

                let due = medications.iter().filter(|m| m.needs_reorder()).collect::<Vec<_>>();
                let qualifying = suppliers
                    .iter()
                    .filter(|s| due.iter().any(|m| s.supplies(m.category().code())))
                    .collect::<Vec<_>>();

                prop_assert_eq!(sent.len(), qualifying.len());
                if due.is_empty() {
                    prop_assert_eq!(outcomes, vec![QuoteOutcome::NoCandidates]);
                } else if qualifying.is_empty() {
                    prop_assert_eq!(outcomes, vec![QuoteOutcome::NoSuppliers]);
                } else {
                    prop_assert_eq!(outcomes.len(), qualifying.len());
                }

                for s in &qualifying {
                    let mails = sent.iter().filter(|m| m.to == s.email()).collect::<Vec<_>>();
                    prop_assert_eq!(mails.len(), 1);
                    let body = &mails[0].body;
                    for m in &medications {
                        let listed = body.contains(&format!("- {} (", m.name()));
                        let expected = m.needs_reorder() && s.supplies(m.category().code());
                        prop_assert_eq!(listed, expected);
                    }
                }
            }
        }
    }
}
