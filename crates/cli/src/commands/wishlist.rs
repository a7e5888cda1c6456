//! Wishlist commands.

use std::io::Write;

use aurum_core::ProductId;
use aurum_storefront::catalog::format_price;
use aurum_storefront::notify::{Notification, Notifier};
use aurum_storefront::wishlist::LOGIN_REQUIRED_MESSAGE;
use tracing::instrument;

use super::{App, CommandError};

/// Save or unsave a product given by id or slug.
///
/// Not being signed in is reported as a notification, not an error, and
/// skips the slug lookup.
///
/// # Errors
///
/// Returns an error if a slug cannot be resolved to a product.
#[instrument(skip(app))]
pub async fn toggle(app: &mut App, product: &str) -> Result<(), CommandError> {
    if !app.wishlist().is_authenticated() {
        app.notifier()
            .notify(Notification::error(LOGIN_REQUIRED_MESSAGE));
        return Ok(());
    }

    let product_id = match product.parse::<ProductId>() {
        Ok(id) => id,
        Err(_) => app.api().product_by_slug(product).await?.id,
    };
    app.wishlist_mut().toggle_wishlist(product_id).await;
    Ok(())
}

/// Print the wishlist.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub async fn list(app: &mut App, out: &mut impl Write) -> Result<(), CommandError> {
    if !app.wishlist().is_authenticated() {
        writeln!(out, "Log in to see your wishlist")?;
        return Ok(());
    }

    let currency = app.currency();
    let entries = app.wishlist_mut().fetch_all().await;
    if entries.is_empty() {
        writeln!(out, "Your wishlist is empty")?;
        return Ok(());
    }

    for entry in &entries {
        let id = entry
            .product_id
            .or(entry.id)
            .map_or_else(|| "?".to_string(), |id| id.to_string());
        let product = entry.product.as_ref();
        let name = product.and_then(|p| p.name.as_deref()).unwrap_or("(unnamed)");
        let price = product
            .and_then(|p| p.price)
            .map(|price| format_price(price, currency))
            .unwrap_or_default();
        writeln!(out, "{id:>6}  {name:<32} {price:>14}")?;
    }
    Ok(())
}
