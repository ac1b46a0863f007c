//! Cart route handlers.
//!
//! Every cart control on the page posts to one endpoint per widget,
//! naming its action and product. The handler dispatches the event and
//! answers with the full cart fragment, which HTMX swaps in place of the
//! previous one.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
};
use bazaar_core::{CartEvent, CartView, ProductId};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::{AppState, SharedWidget};

/// Message returned for widgets that expired or never existed.
pub const WIDGET_EXPIRED_MESSAGE: &str = "Your session has expired, reload the page";

/// Cart fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart.html")]
pub struct CartTemplate {
    pub widget_id: Uuid,
    pub cart: CartView,
    /// Render as an out-of-band swap alongside another fragment.
    pub cart_oob: bool,
}

/// Cart event form data.
///
/// Every field is optional at the wire level; which ones are required
/// depends on `action`.
#[derive(Debug, Default, Deserialize)]
pub struct CartEventForm {
    pub action: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<String>,
    pub image: Option<String>,
}

impl TryFrom<CartEventForm> for CartEvent {
    type Error = AppError;

    fn try_from(form: CartEventForm) -> std::result::Result<Self, Self::Error> {
        let action = form.action.as_deref().map(str::trim).unwrap_or_default();

        match action {
            "add" => Ok(Self::Add {
                product_id: required_product(form.product_id.as_deref())?,
                quantity: optional_quantity(form.quantity.as_deref())?.unwrap_or(1),
                active_image: form
                    .image
                    .as_deref()
                    .and_then(|image| image.trim().parse::<usize>().ok()),
            }),
            "set_quantity" => Ok(Self::SetQuantity {
                product_id: required_product(form.product_id.as_deref())?,
                quantity: optional_quantity(form.quantity.as_deref())?
                    .ok_or_else(|| AppError::BadRequest("quantity is required".to_string()))?,
            }),
            "remove" => Ok(Self::Remove {
                product_id: required_product(form.product_id.as_deref())?,
            }),
            "clear" => Ok(Self::Clear),
            "" => Err(AppError::BadRequest("action is required".to_string())),
            other => Err(AppError::BadRequest(format!("unknown action: {other}"))),
        }
    }
}

fn required_product(value: Option<&str>) -> Result<ProductId> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("product_id is required".to_string()))?;
    ProductId::parse(value).map_err(|e| AppError::BadRequest(format!("product_id: {e}")))
}

/// Parse a quantity field. Blank counts as absent.
fn optional_quantity(value: Option<&str>) -> Result<Option<i64>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("invalid quantity: {v}"))),
        None => Ok(None),
    }
}

/// Fetch a live widget or answer 404.
pub(crate) async fn load_widget(state: &AppState, widget_id: Uuid) -> Result<SharedWidget> {
    state.widget(widget_id).await.ok_or_else(|| {
        tracing::debug!(%widget_id, "Unknown or expired widget");
        AppError::NotFound(WIDGET_EXPIRED_MESSAGE.to_string())
    })
}

/// Current cart fragment.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
) -> Result<CartTemplate> {
    let widget = load_widget(&state, widget_id).await?;
    let cart = widget.lock().await.view();

    Ok(CartTemplate {
        widget_id,
        cart,
        cart_oob: false,
    })
}

/// Apply a cart event and return the re-rendered cart (HTMX).
#[instrument(skip(state, form))]
pub async fn events(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
    Form(form): Form<CartEventForm>,
) -> Result<CartTemplate> {
    let event = CartEvent::try_from(form)?;
    let widget = load_widget(&state, widget_id).await?;

    if let CartEvent::Add { product_id, .. } = &event {
        add_breadcrumb("cart", "Added product", Some(&[("product_id", product_id.as_str())]));
    }

    // Mutation and render under one lock: the fragment always reflects
    // exactly this event's result.
    let cart = widget.lock().await.dispatch(state.catalog(), event)?;

    tracing::debug!(
        items = cart.item_count,
        revision = cart.revision,
        "Cart updated"
    );

    Ok(CartTemplate {
        widget_id,
        cart,
        cart_oob: false,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(action: &str, product_id: Option<&str>, quantity: Option<&str>) -> CartEventForm {
        CartEventForm {
            action: Some(action.to_string()),
            product_id: product_id.map(String::from),
            quantity: quantity.map(String::from),
            image: None,
        }
    }

    #[test]
    fn test_add_defaults_to_one() {
        let event = CartEvent::try_from(form("add", Some("mango"), None)).unwrap();
        assert_eq!(
            event,
            CartEvent::Add {
                product_id: ProductId::parse("mango").unwrap(),
                quantity: 1,
                active_image: None,
            }
        );
    }

    #[test]
    fn test_add_with_image() {
        let mut input = form("add", Some("mango"), Some("3"));
        input.image = Some("2".to_string());
        let event = CartEvent::try_from(input).unwrap();
        assert!(matches!(
            event,
            CartEvent::Add { quantity: 3, active_image: Some(2), .. }
        ));
    }

    #[test]
    fn test_unparseable_image_falls_back() {
        let mut input = form("add", Some("mango"), None);
        input.image = Some("first".to_string());
        let event = CartEvent::try_from(input).unwrap();
        assert!(matches!(event, CartEvent::Add { active_image: None, .. }));
    }

    #[test]
    fn test_set_quantity_requires_quantity() {
        assert!(CartEvent::try_from(form("set_quantity", Some("mango"), None)).is_err());
        assert!(CartEvent::try_from(form("set_quantity", Some("mango"), Some("two"))).is_err());

        let event = CartEvent::try_from(form("set_quantity", Some("mango"), Some(" 0 "))).unwrap();
        assert!(matches!(event, CartEvent::SetQuantity { quantity: 0, .. }));
    }

    #[test]
    fn test_remove_and_clear() {
        assert!(matches!(
            CartEvent::try_from(form("remove", Some("mango"), None)).unwrap(),
            CartEvent::Remove { .. }
        ));
        assert_eq!(CartEvent::try_from(form("clear", None, None)).unwrap(), CartEvent::Clear);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(CartEvent::try_from(form("remove", None, None)).is_err());
        assert!(CartEvent::try_from(form("remove", Some("no spaces"), None)).is_err());
        assert!(CartEvent::try_from(form("explode", Some("mango"), None)).is_err());
        assert!(CartEvent::try_from(CartEventForm::default()).is_err());
    }
}
