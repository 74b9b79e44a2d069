//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        product,
        request::{self, Actor, NewRequest},
        store::Store,
    },
    entities,
    errors::Result,
};

/// Creates an in-memory `SQLite` store with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_store() -> Result<Store> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(Store::new(db))
}

/// The employee used by default in tests.
#[must_use]
pub fn test_employee() -> Actor {
    Actor::new("u-1", "Ana")
}

/// The admin used by default in tests.
#[must_use]
pub fn test_admin() -> Actor {
    Actor::new("admin-1", "Boss")
}

/// Creates a test product named "Test Product" (size "M") with the given stock.
pub async fn create_test_product(store: &Store, stock: i64) -> Result<entities::product::Model> {
    product::create_product(
        store,
        "Test Product".to_string(),
        Some("M".to_string()),
        stock,
    )
    .await
}

/// Submits a pending request from [`test_employee`] against `product`.
pub async fn submit_test_request(
    store: &Store,
    product: &entities::product::Model,
    quantity: i64,
) -> Result<entities::request::Model> {
    request::submit(
        store,
        &test_employee(),
        NewRequest {
            product_id: Some(product.id),
            product_name: product.name.clone(),
            quantity,
            note: None,
            action: None,
        },
    )
    .await
}

/// Sets up a store holding one product with the given stock.
/// Returns (store, product) for common test scenarios.
pub async fn setup_with_product(stock: i64) -> Result<(Store, entities::product::Model)> {
    let store = setup_test_store().await?;
    let product = create_test_product(&store, stock).await?;
    Ok((store, product))
}
