use std::sync::Arc;

use pharmacie_infra::{
    AppConfig, NotifierConfig,
    notifier::{LogNotifier, mailgun::MailgunNotifier},
    seed::{SeedError, seed_demo_data},
    store::{InMemoryPharmacyStore, PostgresPharmacyStore},
};
use pharmacie_reorder::{
    CatalogStore, DEFAULT_MIN_SUPPLIERS, DEFAULT_SIGNATURE, FailurePolicy, Notifier, NotifyError,
    QuoteRequestService, StoreError, SupplierDirectory,
};

pub type SharedQuoteService =
    QuoteRequestService<Arc<dyn CatalogStore>, Arc<dyn SupplierDirectory>, Arc<dyn Notifier>>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("store initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("notifier initialization failed: {0}")]
    Notifier(#[from] NotifyError),

    #[error("demo data seeding failed: {0}")]
    Seed(#[from] SeedError),
}

/// Shared state handed to every handler.
pub struct AppServices {
    quotes: SharedQuoteService,
    min_suppliers: usize,
}

impl AppServices {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        suppliers: Arc<dyn SupplierDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            quotes: QuoteRequestService::new(catalog, suppliers, notifier),
            min_suppliers: DEFAULT_MIN_SUPPLIERS,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.quotes = self.quotes.with_failure_policy(policy);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.quotes = self.quotes.with_signature(signature);
        self
    }

    pub fn with_min_suppliers(mut self, min_suppliers: usize) -> Self {
        self.min_suppliers = min_suppliers;
        self
    }

    pub fn quotes(&self) -> &SharedQuoteService {
        &self.quotes
    }

    pub fn min_suppliers(&self) -> usize {
        self.min_suppliers
    }
}

/// Wire stores and the notifier from configuration.
///
/// Without a database URL the in-memory store is used and seeded with the
/// demo catalog.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, ServiceError> {
    let catalog: Arc<dyn CatalogStore>;
    let suppliers: Arc<dyn SupplierDirectory>;
    match &config.database_url {
        Some(url) => {
            let store = Arc::new(PostgresPharmacyStore::connect(url).await?);
            tracing::info!("using Postgres stores");
            catalog = store.clone();
            suppliers = store;
        }
        None => {
            let store = Arc::new(InMemoryPharmacyStore::new());
            seed_demo_data(&store)?;
            tracing::info!("using in-memory stores with demo data");
            catalog = store.clone();
            suppliers = store;
        }
    }

    let notifier: Arc<dyn Notifier> = match &config.notifier {
        NotifierConfig::Log => {
            tracing::info!("quote requests are logged, not sent");
            Arc::new(LogNotifier)
        }
        NotifierConfig::Mailgun {
            api_key,
            domain,
            from_email,
            base_url,
        } => {
            let mailgun =
                MailgunNotifier::new(base_url, domain, api_key.clone(), from_email.clone())?;
            tracing::info!(endpoint = mailgun.endpoint(), "sending quote requests via Mailgun");
            Arc::new(mailgun)
        }
    };

    let signature = if config.signature.trim().is_empty() {
        DEFAULT_SIGNATURE.to_string()
    } else {
        config.signature.clone()
    };

    let services = AppServices::new(catalog, suppliers, notifier)
        .with_failure_policy(config.failure_policy)
        .with_signature(signature)
        .with_min_suppliers(config.min_suppliers_per_category);
    tracing::info!(
        policy = ?services.quotes().failure_policy(),
        min_suppliers = services.min_suppliers(),
        "quote request service ready"
    );
    Ok(services)
}

/// Log a warning for each category served by too few suppliers.
pub async fn audit_supplier_redundancy(services: &Arc<AppServices>) {
    let services = Arc::clone(services);
    let audit = tokio::task::spawn_blocking(move || {
        services.quotes().redundancy_gaps(services.min_suppliers())
    })
    .await;

    match audit {
        Ok(Ok(gaps)) => {
            for gap in gaps {
                tracing::warn!(
                    category = %gap.category.code(),
                    label = gap.category.label(),
                    supplier_count = gap.supplier_count,
                    "category has too few suppliers"
                );
            }
        }
        Ok(Err(e)) => tracing::warn!(error = %e, "supplier redundancy audit failed"),
        Err(e) => tracing::warn!(error = %e, "supplier redundancy audit panicked"),
    }
}
