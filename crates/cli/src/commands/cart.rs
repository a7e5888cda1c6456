//! Cart commands.
//!
//! The cart works signed in or out; only `add` touches the network, to
//! snapshot the product being added.

use std::io::Write;

use aurum_storefront::catalog::format_price;
use aurum_storefront::error::add_breadcrumb;
use rust_decimal::Decimal;
use tracing::instrument;

use super::{App, CommandError, resolve_cart_product};

/// Add `quantity` units of the product with this slug.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched or the cart cannot be
/// saved.
#[instrument(skip(app))]
pub async fn add(app: &mut App, slug: &str, quantity: u32) -> Result<(), CommandError> {
    let product = app.api().product_by_slug(slug).await?;
    let product_id = product.id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    app.cart_mut().add_to_cart(&product, quantity)?;
    Ok(())
}

/// Remove a cart line.
///
/// # Errors
///
/// Returns an error if the product is not identifiable or the cart cannot be
/// saved.
pub fn remove(app: &mut App, product: &str) -> Result<(), CommandError> {
    let product_id = resolve_cart_product(app, product)?;
    app.cart_mut().remove_from_cart(product_id)?;
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the product is not identifiable or the cart cannot be
/// saved.
pub fn set_quantity(app: &mut App, product: &str, quantity: i64) -> Result<(), CommandError> {
    let product_id = resolve_cart_product(app, product)?;
    app.cart_mut().update_quantity(product_id, quantity)?;
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn clear(app: &mut App) -> Result<(), CommandError> {
    app.cart_mut().clear_cart()?;
    Ok(())
}

/// Print the cart.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn show(app: &App, out: &mut impl Write) -> Result<(), CommandError> {
    let cart = app.cart();
    let currency = app.currency();

    if cart.is_empty() {
        writeln!(out, "Your cart is empty")?;
        return Ok(());
    }

    for line in cart.lines() {
        writeln!(
            out,
            "{:>6}  {:<32} {:>3} x {:>14} = {:>14}",
            line.product_id.as_i64(),
            line.name,
            line.quantity,
            format_price(line.unit_price, currency),
            format_price(line.line_total(), currency),
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Items:   {}", cart.cart_items_count())?;
    writeln!(out, "Total:   {}", format_price(cart.cart_total(), currency))?;
    let savings = cart.cart_savings();
    if savings > Decimal::ZERO {
        writeln!(out, "Savings: {}", format_price(savings, currency))?;
    }
    Ok(())
}
