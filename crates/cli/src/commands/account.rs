//! Account commands: sign-in, orders and addresses.

use std::io::Write;

use aurum_core::{AddressId, Email};
use aurum_storefront::AppError;
use aurum_storefront::api::AddressInput;
use aurum_storefront::catalog::format_price;
use clap::Args;
use secrecy::SecretString;

use super::{App, CommandError};

/// Fields for a new address.
#[derive(Debug, Args)]
pub struct AddressArgs {
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub line1: String,
    #[arg(long)]
    pub line2: Option<String>,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub postal_code: String,
    #[arg(long, default_value = "India")]
    pub country: String,
    /// Make this the default shipping address
    #[arg(long)]
    pub default: bool,
}

impl From<AddressArgs> for AddressInput {
    fn from(args: AddressArgs) -> Self {
        Self {
            full_name: args.full_name,
            phone: args.phone,
            line1: args.line1,
            line2: args.line2.filter(|l| !l.trim().is_empty()),
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
            country: args.country,
            is_default: args.default,
        }
    }
}

fn require_login(app: &App, what: &str) -> Result<(), AppError> {
    if app.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Unauthorized(what.to_string()))
    }
}

/// Sign in and greet the shopper.
///
/// # Errors
///
/// Returns an error if the email is malformed, the credentials are rejected
/// or the token cannot be stored.
pub async fn login(
    app: &mut App,
    email: &str,
    password: String,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(AppError::from)?;
    let password = SecretString::from(password);

    let user = app.login(&email, &password).await?;
    let name = user
        .as_ref()
        .and_then(|u| u.name.as_deref())
        .unwrap_or_else(|| email.as_str());
    writeln!(out, "Signed in as {name}")?;
    writeln!(out, "{} item(s) in your wishlist", app.wishlist().wishlist_count())?;
    Ok(())
}

/// Sign out. The cart is kept.
///
/// # Errors
///
/// Returns an error if the stored token cannot be removed.
pub fn logout(app: &mut App) -> Result<(), CommandError> {
    app.logout()?;
    Ok(())
}

/// Print order history.
///
/// # Errors
///
/// Returns an error if not signed in or the API request fails.
pub async fn orders(app: &App, out: &mut impl Write) -> Result<(), CommandError> {
    require_login(app, "orders")?;
    let currency = app.currency();

    let orders = app.api().orders().await?;
    if orders.is_empty() {
        writeln!(out, "No orders yet")?;
        return Ok(());
    }

    for order in &orders {
        let placed = order
            .created_at
            .map(|at| at.format("%d %b %Y").to_string())
            .unwrap_or_default();
        writeln!(
            out,
            "{:<12} {:<11} {:<18} {:>3} item(s) {:>14}",
            order.display_number(),
            placed,
            order.status.label(),
            order.item_count(),
            format_price(order.total, currency),
        )?;
        if let Some(cashback) = order.cashback_earned.filter(|c| !c.is_zero()) {
            writeln!(out, "{:12} cashback earned {}", "", format_price(cashback, currency))?;
        }
    }
    Ok(())
}

/// Print saved addresses.
///
/// # Errors
///
/// Returns an error if not signed in or the API request fails.
pub async fn addresses(app: &App, out: &mut impl Write) -> Result<(), CommandError> {
    require_login(app, "addresses")?;

    let addresses = app.api().addresses().await?;
    if addresses.is_empty() {
        writeln!(out, "No saved addresses")?;
        return Ok(());
    }

    for address in &addresses {
        let marker = if address.details.is_default { "*" } else { " " };
        writeln!(
            out,
            "{marker}{:>5}  {}: {}",
            address.id.as_i64(),
            address.details.full_name,
            address.details.one_line()
        )?;
    }
    Ok(())
}

/// Save a new address.
///
/// # Errors
///
/// Returns an error if not signed in or the API rejects the address.
pub async fn add_address(
    app: &App,
    args: AddressArgs,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    require_login(app, "addresses")?;

    let address = app.api().create_address(&args.into()).await?;
    writeln!(out, "Saved address {}", address.id)?;
    Ok(())
}

/// Delete a saved address.
///
/// # Errors
///
/// Returns an error if not signed in or the API request fails.
pub async fn delete_address(app: &App, id: i64) -> Result<(), CommandError> {
    require_login(app, "addresses")?;
    app.api().delete_address(AddressId::new(id)).await?;
    Ok(())
}
