//! Application State

use std::sync::Arc;

use storefront_core::{CallRequestPolicy, CallRequestStore, Catalog, MemoryStore, OrderStore};
use storefront_payments::{CheckoutService, DownloadLinks, LinkSigner, RedirectUrls, StripeClient};
use storefront_store::MongoStore;

use crate::config::ServerConfig;
use crate::download::DownloadDir;
use crate::error::ApiError;

/// One store serving both record kinds
pub fn shared<S>(store: Arc<S>) -> (Arc<dyn OrderStore>, Arc<dyn CallRequestStore>)
where
    S: OrderStore + CallRequestStore + 'static,
{
    (store.clone(), store)
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout and verification (None - payments not configured)
    pub checkout: Option<Arc<CheckoutService>>,

    /// Lead storage for the contact form
    pub call_requests: Arc<dyn CallRequestStore>,

    pub call_policy: CallRequestPolicy,

    /// Deliverable files
    pub downloads: Arc<DownloadDir>,
}

impl AppState {
    /// Wire up catalog, stores and payment provider from configuration
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::builtin()?,
        };
        let catalog = Arc::new(catalog);

        let (orders, call_requests) = if let Some(mongo) = &config.mongodb {
            shared(Arc::new(MongoStore::new(mongo.clone())))
        } else {
            tracing::warn!("⚠ MongoDB not configured - orders and call requests kept in memory");
            tracing::warn!("  Set MONGODB_URI (or DB_USER, DB_PASS and DB_HOST) in .env");
            shared(Arc::new(MemoryStore::new()))
        };

        let signer = config
            .download_signing_secret
            .as_deref()
            .map(LinkSigner::new)
            .transpose()?;

        let mut links = DownloadLinks::new(&config.backend_url)?;
        if let Some(signer) = signer.clone() {
            links = links.signed(signer, config.download_link_ttl_secs);
        }

        let checkout = config.stripe_secret_key.as_deref().map(|key| {
            Arc::new(CheckoutService::new(
                catalog.clone(),
                Arc::new(StripeClient::new(key)),
                orders.clone(),
                links.clone(),
                RedirectUrls::for_frontend(&config.frontend_url),
            ))
        });

        Ok(Self {
            checkout,
            call_requests,
            call_policy: CallRequestPolicy {
                require_company: config.require_company,
            },
            downloads: Arc::new(DownloadDir::new(config.download_dir.clone(), signer)),
        })
    }

    /// Checkout service, or 503 when payments are disabled
    pub fn checkout(&self) -> Result<&CheckoutService, ApiError> {
        self.checkout
            .as_deref()
            .ok_or_else(|| ApiError::Unavailable("Payments not configured".into()))
    }
}
