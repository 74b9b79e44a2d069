//! Autocomplete handlers for Discord slash command parameters.
//!
//! Product names are not unique, so suggestions carry the product id as a `#id`
//! suffix. [`resolve_product`] accepts either such a label or a plain name that
//! matches exactly one product.

use crate::{
    bot::Context,
    core::product,
    entities::ProductModel,
    errors::{Error, Result},
};
use sea_orm::ConnectionTrait;

/// Discord shows at most this many suggestions.
const AUTOCOMPLETE_LIMIT: usize = 25;

/// Label used in suggestions: `Polo Shirt (XL) #12`.
#[must_use]
pub fn product_label(product: &ProductModel) -> String {
    match &product.size {
        Some(size) => format!("{} ({size}) #{}", product.name, product.id),
        None => format!("{} #{}", product.name, product.id),
    }
}

/// Extracts the id from the ` #id` suffix of a suggestion label.
#[must_use]
pub fn parse_product_ref(input: &str) -> Option<i64> {
    let (_, id) = input.trim().rsplit_once(" #")?;
    id.parse().ok()
}

/// Finds the product a command argument refers to.
///
/// An input is taken as a suggestion label only when it is exactly the label of the
/// product its `#id` points at; anything else is matched against product names.
///
/// # Errors
/// Returns [`Error::Validation`] if a name matches no product or more than one.
pub async fn resolve_product<C>(db: &C, input: &str) -> Result<ProductModel>
where
    C: ConnectionTrait,
{
    let input = input.trim();
    if let Some(id) = parse_product_ref(input) {
        if let Some(found) = product::get_product_by_id(db, id).await? {
            if product_label(&found) == input {
                return Ok(found);
            }
        }
    }

    let wanted = input.to_lowercase();
    let mut matches: Vec<ProductModel> = product::list_products(db)
        .await?
        .into_iter()
        .filter(|p| p.name.to_lowercase() == wanted)
        .collect();

    match matches.len() {
        0 => Err(Error::validation(format!("No product named '{input}'"))),
        1 => Ok(matches.remove(0)),
        n => Err(Error::validation(format!(
            "{n} products are named '{input}'; pick one from the suggestions"
        ))),
    }
}

/// Provides autocomplete suggestions for products.
///
/// Matches the partial input against product names and sizes, case-insensitively,
/// and returns up to 25 labels.
pub async fn autocomplete_product(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(products) = product::search_products(ctx.data().store.db(), partial).await else {
        return Vec::new();
    };
    products
        .iter()
        .take(AUTOCOMPLETE_LIMIT)
        .map(product_label)
        .collect()
}
