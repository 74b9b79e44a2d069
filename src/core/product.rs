//! Product business logic - catalog management for admins.
//!
//! Stock set here is an absolute override (the admin "edit stock" action). Relative
//! changes go through [`crate::core::ledger`].

use crate::{
    config::settings::ProductSeed,
    core::{
        ledger::MAX_STOCK,
        store::{Collection, Store},
    },
    entities::{Product, product},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Longest product name accepted, in characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Trims a product name and rejects it when blank or longer than [`MAX_NAME_CHARS`].
pub(crate) fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(Error::validation(format!(
            "Product name cannot be longer than {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_stock(stock: i64) -> Result<i64> {
    if stock < 0 {
        return Err(Error::validation(format!(
            "Stock cannot be negative, got {stock}"
        )));
    }
    if stock > MAX_STOCK {
        return Err(Error::validation(format!(
            "Stock cannot exceed {MAX_STOCK} units"
        )));
    }
    Ok(stock)
}

/// Retrieves every product, ordered by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .order_by_asc(product::Column::Name)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Products whose name or size contains `term`, case-insensitively. A blank term
/// matches everything.
pub async fn search_products<C>(db: &C, term: &str) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    let needle = term.trim().to_lowercase();
    let products = list_products(db).await?;
    if needle.is_empty() {
        return Ok(products);
    }
    Ok(products
        .into_iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p
                    .size
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
        })
        .collect())
}

/// Whether a product is below the low-stock threshold.
#[must_use]
pub const fn is_low_stock(product: &product::Model, threshold: i64) -> bool {
    product.stock < threshold
}

/// Products below `threshold`, lowest stock first.
pub async fn list_low_stock<C>(db: &C, threshold: i64) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Stock.lt(threshold))
        .order_by_asc(product::Column::Stock)
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty, or the name or size is too long
/// - The initial stock is negative or above [`MAX_STOCK`]
/// - The database insert operation fails
#[instrument(skip(store))]
pub async fn create_product(
    store: &Store,
    name: String,
    size: Option<String>,
    stock: i64,
) -> Result<product::Model> {
    let name = validate_name(&name)?;
    let stock = validate_stock(stock)?;
    let size = size.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    if size
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_NAME_CHARS)
    {
        return Err(Error::validation(format!(
            "Size cannot be longer than {MAX_NAME_CHARS} characters"
        )));
    }

    let now = Utc::now();
    let product = product::ActiveModel {
        name: Set(name),
        size: Set(size),
        stock: Set(stock),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = product.insert(store.db()).await?;

    store.notify(Collection::Products);
    info!(product_id = created.id, "Product created");
    Ok(created)
}

/// Overwrites a product's stock with an absolute value.
///
/// # Errors
/// Returns an error if:
/// - The new stock is negative
/// - The product does not exist
/// - The database update operation fails
#[instrument(skip(store))]
pub async fn set_stock(store: &Store, product_id: i64, stock: i64) -> Result<product::Model> {
    let stock = validate_stock(stock)?;

    let mut product: product::ActiveModel = get_product_by_id(store.db(), product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.stock = Set(stock);
    product.updated_at = Set(Utc::now());
    let updated = product.update(store.db()).await?;

    store.notify(Collection::Products);
    Ok(updated)
}

/// Permanently deletes a product. Requests referencing it are left untouched.
///
/// # Errors
/// Returns an error if the product does not exist or the delete fails.
#[instrument(skip(store))]
pub async fn delete_product(store: &Store, product_id: i64) -> Result<product::Model> {
    let product = get_product_by_id(store.db(), product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    Product::delete_by_id(product_id).exec(store.db()).await?;

    store.notify(Collection::Products);
    info!(product_id, name = %product.name, "Product deleted");
    Ok(product)
}

/// Inserts each seed entry whose name and size are not yet in the catalog. Returns
/// how many products were created.
///
/// # Errors
/// Returns an error if a seed entry is invalid or a database call fails.
pub async fn seed_products(store: &Store, seeds: &[ProductSeed]) -> Result<usize> {
    let key = |name: &str, size: Option<&str>| {
        (
            name.trim().to_lowercase(),
            size.map(|s| s.trim().to_lowercase()).unwrap_or_default(),
        )
    };
    let existing: Vec<(String, String)> = list_products(store.db())
        .await?
        .iter()
        .map(|p| key(&p.name, p.size.as_deref()))
        .collect();

    let mut created = 0;
    for seed in seeds {
        if existing.contains(&key(&seed.name, seed.size.as_deref())) {
            continue;
        }
        create_product(store, seed.name.clone(), seed.size.clone(), seed.stock).await?;
        created += 1;
    }

    if created > 0 {
        info!(created, "Seeded products from configuration");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let store = Store::new(MockDatabase::new(DatabaseBackend::Sqlite).into_connection());

        let result = create_product(&store, String::new(), None, 1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&store, "   ".to_string(), None, 1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&store, "Cap".to_string(), None, -1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&store, "Cap".to_string(), None, MAX_STOCK + 1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_product(&store, "c".repeat(MAX_NAME_CHARS + 1), None, 1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let long_size = Some("s".repeat(MAX_NAME_CHARS + 1));
        let result = create_product(&store, "Cap".to_string(), long_size, 1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_integration() -> Result<()> {
        let store = setup_test_store().await?;

        let product =
            create_product(&store, "  Polo Shirt ".to_string(), Some("XL".to_string()), 8).await?;
        assert_eq!(product.name, "Polo Shirt");
        assert_eq!(product.size.as_deref(), Some("XL"));
        assert_eq!(product.stock, 8);

        let blank_size = create_product(&store, "Cap".to_string(), Some(" ".to_string()), 0).await?;
        assert!(blank_size.size.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_names_are_not_unique() -> Result<()> {
        let store = setup_test_store().await?;
        create_product(&store, "Cap".to_string(), Some("S".to_string()), 1).await?;
        create_product(&store, "Cap".to_string(), Some("L".to_string()), 2).await?;
        assert_eq!(list_products(store.db()).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_products() -> Result<()> {
        let store = setup_test_store().await?;
        create_product(&store, "Polo Shirt".to_string(), Some("XL".to_string()), 1).await?;
        create_product(&store, "Cap".to_string(), Some("xl".to_string()), 1).await?;
        create_product(&store, "Scarf".to_string(), None, 1).await?;

        assert_eq!(search_products(store.db(), "POLO").await?.len(), 1);
        assert_eq!(search_products(store.db(), "xl").await?.len(), 2);
        assert_eq!(search_products(store.db(), "").await?.len(), 3);
        assert!(search_products(store.db(), "boots").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_stock() -> Result<()> {
        let (store, product) = setup_with_product(5).await?;

        let updated = set_stock(&store, product.id, 42).await?;
        assert_eq!(updated.stock, 42);
        assert!(updated.updated_at >= product.updated_at);

        assert!(matches!(
            set_stock(&store, product.id, -1).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            set_stock(&store, product.id, MAX_STOCK + 1).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            set_stock(&store, 999, 1).await,
            Err(Error::ProductNotFound { id: 999 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_keeps_requests() -> Result<()> {
        let (store, product) = setup_with_product(5).await?;
        let submitted = submit_test_request(&store, &product, 1).await?;

        let deleted = delete_product(&store, product.id).await?;
        assert_eq!(deleted.id, product.id);
        assert!(get_product_by_id(store.db(), product.id).await?.is_none());

        let request = crate::core::request::get_request_by_id(store.db(), submitted.id)
            .await?
            .unwrap();
        assert_eq!(request.product_id, Some(product.id));

        assert!(matches!(
            delete_product(&store, product.id).await,
            Err(Error::ProductNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock() -> Result<()> {
        let store = setup_test_store().await?;
        let low = create_product(&store, "Cap".to_string(), None, 4).await?;
        let edge = create_product(&store, "Scarf".to_string(), None, 5).await?;

        assert!(is_low_stock(&low, 5));
        assert!(!is_low_stock(&edge, 5));

        let listed = list_low_stock(store.db(), 5).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, low.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_products_skips_existing() -> Result<()> {
        let store = setup_test_store().await?;
        create_product(&store, "Cap".to_string(), None, 1).await?;

        let seeds = vec![
            ProductSeed {
                name: "cap".to_string(),
                size: None,
                stock: 9,
            },
            ProductSeed {
                name: "Scarf".to_string(),
                size: Some("One size".to_string()),
                stock: 3,
            },
        ];

        assert_eq!(seed_products(&store, &seeds).await?, 1);
        assert_eq!(seed_products(&store, &seeds).await?, 0);
        assert_eq!(list_products(store.db()).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_products_keeps_size_variants_apart() -> Result<()> {
        let store = setup_test_store().await?;
        create_product(&store, "Polo Shirt".to_string(), Some("M".to_string()), 4).await?;

        let seeds = vec![
            ProductSeed {
                name: "Polo Shirt".to_string(),
                size: Some("m".to_string()),
                stock: 20,
            },
            ProductSeed {
                name: "Polo Shirt".to_string(),
                size: Some("XL".to_string()),
                stock: 10,
            },
        ];

        assert_eq!(seed_products(&store, &seeds).await?, 1);
        let shirts = search_products(store.db(), "polo").await?;
        assert_eq!(shirts.len(), 2);
        Ok(())
    }
}
