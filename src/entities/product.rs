//! Product entity - A catalog item whose stock level is tracked.
//!
//! Each product has a display name, an optional size descriptor and an on-hand stock
//! count. Names are not unique. Stock is never negative; every write path goes through
//! the guarded updates in `core::ledger` or the validated setters in `core::product`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Polo Shirt")
    pub name: String,
    /// Optional size descriptor (e.g., "XL", "500ml")
    pub size: Option<String>,
    /// Units currently on hand, never negative
    pub stock: i64,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Products are referenced by requests through a plain column, without a foreign key,
/// so deleting a product leaves its request history intact.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
