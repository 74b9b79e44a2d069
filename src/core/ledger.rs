//! Stock ledger - the only code that moves a product's stock level.
//!
//! Deltas are applied as a single guarded update (`stock = stock + delta` only where the
//! result stays non-negative), so two adjustments on the same product never read the
//! same starting value and overwrite each other.

use crate::{
    core::{
        request::{Actor, clean_note},
        store::{Collection, Store},
    },
    entities::{Product, RequestAction, RequestStatus, product, request},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Largest number of units one request or adjustment may move.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Largest stock level a product may hold.
pub const MAX_STOCK: i64 = 1_000_000_000_000;

/// Checks that `quantity` is a non-zero movement within [`MAX_QUANTITY`].
///
/// # Errors
/// Returns [`Error::Validation`] for zero or oversized quantities.
pub fn validate_quantity(quantity: i64) -> Result<i64> {
    if quantity == 0 {
        return Err(Error::validation("Quantity cannot be zero"));
    }
    if quantity.unsigned_abs() > MAX_QUANTITY.unsigned_abs() {
        return Err(Error::validation(format!(
            "Quantity cannot exceed {MAX_QUANTITY} units"
        )));
    }
    Ok(quantity)
}

/// What approving a stock-out does when it exceeds the stock on hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeStockPolicy {
    /// The approval fails with [`Error::InsufficientStock`] and the request stays pending.
    #[default]
    Reject,
    /// The approval goes through and the product's stock is clamped to zero.
    FloorAtZero,
}

/// Direction of an admin quick adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Add stock
    In,
    /// Remove stock
    Out,
}

impl Direction {
    /// Turns a positive amount into the signed delta for this direction.
    #[must_use]
    pub const fn signed(self, amount: i64) -> i64 {
        match self {
            Self::In => amount,
            Self::Out => -amount,
        }
    }
}

/// Atomically adds `delta` to a product's stock and returns the new level.
///
/// The update only matches while the result stays within `0..=MAX_STOCK`; when nothing
/// matched the product is re-read to tell a missing product apart from a limit hit.
///
/// # Errors
/// - [`Error::Validation`] if `delta` is zero, exceeds [`MAX_QUANTITY`], or would push the
///   stock past [`MAX_STOCK`]
/// - [`Error::ProductNotFound`] if the product does not exist
/// - [`Error::InsufficientStock`] if the result would be negative
pub async fn apply_delta<C>(db: &C, product_id: i64, delta: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let delta = validate_quantity(delta)?;

    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).add(delta),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::Stock.gte(-delta))
        .filter(product::Column::Stock.lte(MAX_STOCK - delta))
        .exec(db)
        .await?;

    let current = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    if result.rows_affected == 0 {
        if delta > 0 {
            return Err(Error::validation(format!(
                "Stock for {} would exceed {MAX_STOCK} units",
                current.name
            )));
        }
        return Err(Error::InsufficientStock {
            product_id,
            current: current.stock,
            requested: -delta,
        });
    }

    Ok(current.stock)
}

/// Applies `delta` under `policy`. With [`NegativeStockPolicy::FloorAtZero`] an
/// oversized stock-out empties the product instead of failing.
pub async fn apply_delta_with_policy<C>(
    db: &C,
    product_id: i64,
    delta: i64,
    policy: NegativeStockPolicy,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    match apply_delta(db, product_id, delta).await {
        Err(Error::InsufficientStock {
            current, requested, ..
        }) if policy == NegativeStockPolicy::FloorAtZero => {
            warn!(
                product_id,
                current, requested, "Stock-out exceeds stock on hand, flooring at zero"
            );
            Product::update_many()
                .col_expr(product::Column::Stock, Expr::value(0_i64))
                .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(product::Column::Id.eq(product_id))
                .exec(db)
                .await?;
            Ok(0)
        }
        other => other,
    }
}

/// Admin quick adjustment: moves stock and records a pre-approved audit request in the
/// same transaction.
///
/// # Errors
/// - [`Error::Validation`] if `amount` is not positive
/// - [`Error::ProductNotFound`] if the product does not exist
/// - [`Error::InsufficientStock`] if a stock-out exceeds the stock on hand
#[instrument(skip(store, note, admin), fields(admin = %admin.user_id))]
pub async fn direct_adjust(
    store: &Store,
    product_id: i64,
    direction: Direction,
    amount: i64,
    note: Option<String>,
    admin: &Actor,
) -> Result<request::Model> {
    if amount <= 0 {
        return Err(Error::validation(format!(
            "Adjustment amount must be positive, got {amount}"
        )));
    }
    let amount = validate_quantity(amount)?;
    let note = clean_note(note)?;

    let txn = store.db().begin().await?;

    let product = Product::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let delta = direction.signed(amount);
    let new_stock = apply_delta(&txn, product_id, delta).await?;

    let now = Utc::now();
    let audit = request::ActiveModel {
        product_id: Set(Some(product_id)),
        product_name: Set(product.name),
        employee_name: Set(admin.display_name.clone()),
        quantity: Set(delta),
        status: Set(RequestStatus::Approved),
        note: Set(note),
        action: Set(Some(RequestAction::DirectAdjust)),
        created_by: Set(admin.user_id.clone()),
        created_at: Set(now),
        processed_at: Set(Some(now)),
        updated_at: Set(None),
        ..Default::default()
    };
    let audit = audit.insert(&txn).await?;

    txn.commit().await?;
    store.notify(Collection::Products);
    store.notify(Collection::Requests);

    info!(product_id, delta, new_stock, audit_id = audit.id, "Direct stock adjustment applied");
    Ok(audit)
}
