//! Application state shared across handlers.

use std::sync::Arc;

use bazaar_core::{CartWidget, Catalog, CheckoutPolicy, OrderSubmitter};
use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{StorefrontConfig, WidgetStoreConfig};

/// One page's cart widget, locked for the duration of an event and its render.
pub type SharedWidget = Arc<Mutex<CartWidget>>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog, the live cart widgets, and the order submitter.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    submitter: Arc<dyn OrderSubmitter>,
    widgets: Cache<Uuid, SharedWidget>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `catalog` - Product catalog loaded at startup
    /// * `submitter` - Where placed orders are sent
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Catalog,
        submitter: Arc<dyn OrderSubmitter>,
    ) -> Self {
        let widgets = widget_cache(config.widgets);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                submitter,
                widgets,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a handle to the order submitter.
    #[must_use]
    pub fn submitter(&self) -> Arc<dyn OrderSubmitter> {
        Arc::clone(&self.inner.submitter)
    }

    /// Checkout policy applied to new widgets.
    #[must_use]
    pub fn checkout_policy(&self) -> CheckoutPolicy {
        self.inner.config.checkout_policy
    }

    /// Create a widget with an empty cart and return its id.
    pub async fn create_widget(&self) -> (Uuid, SharedWidget) {
        let id = Uuid::new_v4();
        let widget = Arc::new(Mutex::new(CartWidget::new(
            self.inner.catalog.currency(),
            self.checkout_policy(),
        )));
        self.inner.widgets.insert(id, Arc::clone(&widget)).await;
        tracing::debug!(widget_id = %id, "Created cart widget");
        (id, widget)
    }

    /// Look up a live widget. Returns `None` once it has expired.
    pub async fn widget(&self, id: Uuid) -> Option<SharedWidget> {
        self.inner.widgets.get(&id).await
    }

    /// Number of live widgets (approximate, for diagnostics).
    #[must_use]
    pub fn widget_count(&self) -> u64 {
        self.inner.widgets.entry_count()
    }
}

/// Cart widgets live until they sit idle past the configured timeout.
fn widget_cache(config: WidgetStoreConfig) -> Cache<Uuid, SharedWidget> {
    Cache::builder()
        .max_capacity(config.max_active)
        .time_to_idle(config.idle_timeout)
        .build()
}
