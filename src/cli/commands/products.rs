//! cli::commands::products
//!
//! Product list commands. Both need a stored session.

use anyhow::{bail, Result};
use uuid::Uuid;

use super::auth::to_user_error;
use crate::cli::{Context, Services};
use crate::ui::output;

/// Print the signed-in user's products, one per line.
///
/// Quiet mode prints `<order product id>\t<product name>`.
pub async fn list(ctx: &Context, services: &Services) -> Result<()> {
    let Some(user) = services
        .session
        .current_user()
        .filter(|_| services.session.is_authenticated())
    else {
        bail!("Not logged in. Run 'foodcare auth login' first.");
    };

    let products = services
        .products
        .list_user_products(&user.user_id)
        .await
        .map_err(to_user_error)?;

    if ctx.verbosity.is_quiet() {
        for entry in &products {
            output::plain(format!(
                "{}\t{}",
                entry.order_product.order_product_id, entry.product.product_name
            ));
        }
        return Ok(());
    }

    if products.is_empty() {
        output::print("No products.", ctx.verbosity);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|entry| {
            let mut row = vec![
                entry.order_product.order_product_id.to_string(),
                entry.product.product_name.clone(),
            ];
            if let Some(end) = &entry.order_product.product_date_end {
                row.push(format!("until {}", end));
            }
            row
        })
        .collect();
    output::print(output::format_rows(&rows), ctx.verbosity);
    Ok(())
}

/// Remove one product from the user's list.
pub async fn delete(ctx: &Context, services: &Services, id: Uuid) -> Result<()> {
    if !services.session.is_authenticated() {
        bail!("Not logged in. Run 'foodcare auth login' first.");
    }

    services
        .products
        .delete_user_product(id)
        .await
        .map_err(to_user_error)?;

    output::print(format!("Removed {}.", id), ctx.verbosity);
    Ok(())
}
