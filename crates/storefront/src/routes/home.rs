//! Storefront page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use bazaar_core::{CartView, CatalogProduct};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::security_headers::HTMX_ORIGIN;
use crate::routes::checkout::{CheckoutFormView, StatusView};
use crate::state::AppState;

/// Pinned htmx release served from [`HTMX_ORIGIN`].
const HTMX_VERSION: &str = "2.0.4";

/// One image in a product card's carousel.
#[derive(Debug, Clone)]
pub struct ImageSlideView {
    pub index: usize,
    pub src: String,
    /// The first image is active on page load.
    pub checked: bool,
}

/// Product card display data for templates.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub images: Vec<ImageSlideView>,
}

impl From<&CatalogProduct> for ProductCardView {
    fn from(product: &CatalogProduct) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.display(),
            images: product
                .images
                .iter()
                .enumerate()
                .map(|(index, src)| ImageSlideView {
                    index,
                    src: src.clone(),
                    checked: index == 0,
                })
                .collect(),
        }
    }
}

/// Storefront page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub widget_id: Uuid,
    pub htmx_src: String,
    pub products: Vec<ProductCardView>,
    pub cart: CartView,
    pub cart_oob: bool,
    pub checkout: CheckoutFormView,
    pub status: Option<StatusView>,
}

/// Display the storefront page with a fresh, empty cart.
///
/// Every page load gets its own widget; reloading starts a new cart.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> HomeTemplate {
    let (widget_id, widget) = state.create_widget().await;
    let cart = widget.lock().await.view();

    tracing::debug!(%widget_id, active_widgets = state.widget_count(), "Page load");

    HomeTemplate {
        widget_id,
        htmx_src: format!("{HTMX_ORIGIN}/htmx.org@{HTMX_VERSION}/dist/htmx.min.js"),
        products: state.catalog().products().iter().map(ProductCardView::from).collect(),
        cart,
        cart_oob: false,
        checkout: CheckoutFormView::new(None),
        status: None,
    }
}
