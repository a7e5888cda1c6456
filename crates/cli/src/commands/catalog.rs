//! Catalog and offer commands.

use std::io::Write;

use aurum_storefront::api::ProductQuery;
use aurum_storefront::catalog::{ProductFilter, SortOrder, discount_percent, filter_products, format_price};
use aurum_storefront::offers::best_offer;
use clap::Args;
use rust_decimal::Decimal;

use super::{App, CommandError};

/// Product listing options.
#[derive(Debug, Args)]
pub struct ProductArgs {
    /// Search text
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(short, long)]
    pub category: Option<String>,
    /// Metal, e.g. gold, silver, platinum
    #[arg(short, long)]
    pub metal: Option<String>,
    #[arg(long)]
    pub min_price: Option<Decimal>,
    #[arg(long)]
    pub max_price: Option<Decimal>,
    /// Hide sold-out products
    #[arg(long)]
    pub in_stock: bool,
    /// featured, price-ascending, price-descending, newest, name-asc
    #[arg(long, default_value = "featured")]
    pub sort: String,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
}

impl ProductArgs {
    fn query(&self) -> ProductQuery {
        ProductQuery {
            search: self.search.clone(),
            category: self.category.clone(),
            page: self.page,
            limit: self.limit,
        }
    }

    fn filter(&self) -> ProductFilter {
        ProductFilter {
            // search and category are applied by the API
            query: None,
            category: None,
            metal: self.metal.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock_only: self.in_stock,
            sort: SortOrder::parse(&self.sort),
        }
    }
}

/// List products.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn products(app: &App, args: &ProductArgs, out: &mut impl Write) -> Result<(), CommandError> {
    let currency = app.currency();
    let page = app.api().list_products(&args.query()).await?;
    let products = filter_products(&page, &args.filter());

    if products.is_empty() {
        writeln!(out, "No products found")?;
        return Ok(());
    }

    for product in &products {
        let mut flags = Vec::new();
        if let Some(percent) = product
            .original_price
            .and_then(|original| discount_percent(product.price, original))
        {
            flags.push(format!("{percent}% off"));
        }
        if !product.in_stock() {
            flags.push("sold out".to_string());
        }
        if app.cart().is_in_cart(product.id) {
            flags.push(format!("{} in cart", app.cart().cart_quantity(product.id)));
        }
        if app.wishlist().is_in_wishlist(product.id) {
            flags.push("saved".to_string());
        }

        writeln!(
            out,
            "{:<28} {:<32} {:>14}  {}",
            product.slug,
            product.name,
            format_price(product.price, currency),
            flags.join(", ")
        )?;
    }
    Ok(())
}

/// List cashback offers and highlight the best one for `total`.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn offers(app: &App, total: Option<Decimal>, out: &mut impl Write) -> Result<(), CommandError> {
    let currency = app.currency();
    let total = total.unwrap_or_else(|| app.cart().cart_total());
    let offers = app.api().cashback_offers().await?;

    if offers.is_empty() {
        writeln!(out, "No cashback offers right now")?;
        return Ok(());
    }

    for offer in offers.iter().filter(|o| o.active) {
        writeln!(
            out,
            "{:<12} {:>5}%  min {:>12}  {}",
            offer.code,
            offer.percent.normalize(),
            format_price(offer.min_order_value, currency),
            offer.title
        )?;
    }

    writeln!(out)?;
    match best_offer(&offers, total) {
        Some((offer, amount)) => writeln!(
            out,
            "Best for {}: {} ({} cashback)",
            format_price(total, currency),
            offer.code,
            format_price(amount, currency)
        )?,
        None => {
            let nearest = offers
                .iter()
                .filter(|o| o.active && o.min_order_value > total)
                .min_by_key(|o| o.min_order_value);
            match nearest {
                Some(offer) => writeln!(
                    out,
                    "Spend {} more to unlock {} ({}% cashback)",
                    format_price(offer.min_order_value - total, currency),
                    offer.code,
                    offer.percent.normalize(),
                )?,
                None => writeln!(out, "No offer applies to {}", format_price(total, currency))?,
            }
        }
    }
    Ok(())
}
