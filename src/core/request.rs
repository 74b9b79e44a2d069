//! Request business logic - the stock-change request state machine.
//!
//! Requests are created `pending`, may be edited while pending, and are resolved exactly
//! once by an admin. Every status write is a compare-and-swap on `status = 'pending'`,
//! and approval applies its ledger delta inside the same database transaction, so a
//! request is never approved without its stock effect or vice versa.

use crate::{
    core::{
        ledger::{NegativeStockPolicy, apply_delta_with_policy, validate_quantity},
        product::validate_name,
        store::{Collection, Store},
    },
    entities::{Product, Request, RequestAction, RequestStatus, request},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument, warn};

/// Who is acting: the Discord user ID plus the display name snapshotted onto requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Stable user identifier
    pub user_id: String,
    /// Human-readable name
    pub display_name: String,
}

impl Actor {
    /// Creates an actor from an id and a display name.
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Input for [`submit`].
#[derive(Debug, Clone, Default)]
pub struct NewRequest {
    /// Existing product to adjust; must be `None` for `new_product` requests
    pub product_id: Option<i64>,
    /// Name of the product; replaced by the catalog name when `product_id` resolves
    pub product_name: String,
    /// Signed quantity, never zero
    pub quantity: i64,
    /// Optional annotation
    pub note: Option<String>,
    /// Optional tag, only `new_product` is accepted here
    pub action: Option<RequestAction>,
}

/// Which statuses a request query matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Every request
    #[default]
    Any,
    /// Exactly one status
    Only(RequestStatus),
    /// Approved or rejected
    Resolved,
}

/// A standing request query, used both for point-in-time reads and live subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    /// Status restriction
    pub status: StatusFilter,
    /// Only requests submitted by this user
    pub created_by: Option<String>,
    /// Newest first instead of oldest first
    pub newest_first: bool,
}

impl RequestFilter {
    /// Pending requests, oldest first (the admin queue).
    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: StatusFilter::Only(RequestStatus::Pending),
            ..Self::default()
        }
    }

    /// Approved requests, oldest first (the analytics input).
    #[must_use]
    pub fn approved() -> Self {
        Self {
            status: StatusFilter::Only(RequestStatus::Approved),
            ..Self::default()
        }
    }

    /// Approved and rejected requests, newest first (the history).
    #[must_use]
    pub fn resolved() -> Self {
        Self {
            status: StatusFilter::Resolved,
            created_by: None,
            newest_first: true,
        }
    }

    /// Everything one user submitted, newest first.
    #[must_use]
    pub fn created_by(user_id: impl Into<String>) -> Self {
        Self {
            status: StatusFilter::Any,
            created_by: Some(user_id.into()),
            newest_first: true,
        }
    }
}

/// Runs `filter` against the requests table.
pub async fn find_requests<C>(db: &C, filter: &RequestFilter) -> Result<Vec<request::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Request::find();
    query = match filter.status {
        StatusFilter::Any => query,
        StatusFilter::Only(status) => query.filter(request::Column::Status.eq(status)),
        StatusFilter::Resolved => {
            query.filter(request::Column::Status.ne(RequestStatus::Pending))
        }
    };
    if let Some(user_id) = &filter.created_by {
        query = query.filter(request::Column::CreatedBy.eq(user_id.as_str()));
    }
    query = if filter.newest_first {
        query
            .order_by_desc(request::Column::CreatedAt)
            .order_by_desc(request::Column::Id)
    } else {
        query
            .order_by_asc(request::Column::CreatedAt)
            .order_by_asc(request::Column::Id)
    };
    query.all(db).await.map_err(Into::into)
}

/// Retrieves a request by id, `None` if it does not exist.
pub async fn get_request_by_id<C>(db: &C, request_id: i64) -> Result<Option<request::Model>>
where
    C: ConnectionTrait,
{
    Request::find_by_id(request_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// The admin queue: pending requests, oldest first.
pub async fn list_pending_requests<C>(db: &C) -> Result<Vec<request::Model>>
where
    C: ConnectionTrait,
{
    find_requests(db, &RequestFilter::pending()).await
}

/// All approved requests, the input to analytics.
pub async fn list_approved_requests<C>(db: &C) -> Result<Vec<request::Model>>
where
    C: ConnectionTrait,
{
    find_requests(db, &RequestFilter::approved()).await
}

/// Approved and rejected requests, newest first.
pub async fn list_resolved_requests<C>(db: &C) -> Result<Vec<request::Model>>
where
    C: ConnectionTrait,
{
    find_requests(db, &RequestFilter::resolved()).await
}

/// Requests submitted by one user, newest first.
pub async fn list_requests_by_creator<C>(db: &C, user_id: &str) -> Result<Vec<request::Model>>
where
    C: ConnectionTrait,
{
    find_requests(db, &RequestFilter::created_by(user_id)).await
}

/// Longest note a request may carry, in characters.
pub const MAX_NOTE_CHARS: usize = 500;

/// Trims a note, drops it when blank, and rejects it when longer than
/// [`MAX_NOTE_CHARS`].
pub(crate) fn clean_note(note: Option<String>) -> Result<Option<String>> {
    let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if note
        .as_ref()
        .is_some_and(|text| text.chars().count() > MAX_NOTE_CHARS)
    {
        return Err(Error::validation(format!(
            "Note cannot be longer than {MAX_NOTE_CHARS} characters"
        )));
    }
    Ok(note)
}

/// Submits a new `pending` request.
///
/// When `product_id` is set the product must exist and its current name is snapshotted.
/// `new_product` requests carry no product id and a positive quantity.
///
/// # Errors
/// - [`Error::Validation`] for a zero or oversized quantity, a blank or over-long name or
///   note, a missing product reference, or a malformed `new_product` request
/// - [`Error::ProductNotFound`] if `product_id` does not resolve
#[instrument(skip(store, new), fields(employee = %employee.user_id, quantity = new.quantity))]
pub async fn submit(store: &Store, employee: &Actor, new: NewRequest) -> Result<request::Model> {
    validate_quantity(new.quantity)?;
    let note = clean_note(new.note)?;

    let product_name = match (new.action, new.product_id) {
        (Some(RequestAction::DirectAdjust), _) => {
            return Err(Error::validation(
                "Direct adjustments are recorded by the ledger, not submitted",
            ));
        }
        (Some(RequestAction::NewProduct), Some(_)) => {
            return Err(Error::validation(
                "A new-product request cannot reference an existing product",
            ));
        }
        (Some(RequestAction::NewProduct), None) => {
            if new.quantity < 0 {
                return Err(Error::validation(
                    "A new-product request must have a positive quantity",
                ));
            }
            validate_name(&new.product_name)?
        }
        (None, None) => {
            return Err(Error::validation("A product reference is required"));
        }
        (None, Some(product_id)) => {
            Product::find_by_id(product_id)
                .one(store.db())
                .await?
                .ok_or(Error::ProductNotFound { id: product_id })?
                .name
        }
    };

    let model = request::ActiveModel {
        product_id: Set(new.product_id),
        product_name: Set(product_name),
        employee_name: Set(employee.display_name.clone()),
        quantity: Set(new.quantity),
        status: Set(RequestStatus::Pending),
        note: Set(note),
        action: Set(new.action),
        created_by: Set(employee.user_id.clone()),
        created_at: Set(Utc::now()),
        processed_at: Set(None),
        updated_at: Set(None),
        ..Default::default()
    };
    let created = model.insert(store.db()).await?;

    store.notify(Collection::Requests);
    info!(request_id = created.id, "Request submitted");
    Ok(created)
}

/// Changes the quantity and note of a pending request.
///
/// # Errors
/// - [`Error::Validation`] for a zero or oversized quantity, an over-long note, or a
///   stock-out on a `new_product` request
/// - [`Error::RequestNotFound`] if the request does not exist
/// - [`Error::InvalidState`] if the request is no longer pending
#[instrument(skip(store, note))]
pub async fn edit(
    store: &Store,
    request_id: i64,
    quantity: i64,
    note: Option<String>,
) -> Result<request::Model> {
    validate_quantity(quantity)?;
    let note = clean_note(note)?;

    let existing = get_request_by_id(store.db(), request_id)
        .await?
        .ok_or(Error::RequestNotFound { id: request_id })?;

    if existing.status != RequestStatus::Pending {
        return Err(Error::InvalidState {
            request_id,
            status: existing.status,
        });
    }
    if existing.action == Some(RequestAction::NewProduct) && quantity < 0 {
        return Err(Error::validation(
            "A new-product request must have a positive quantity",
        ));
    }

    let now = Utc::now();
    let result = Request::update_many()
        .col_expr(request::Column::Quantity, Expr::value(quantity))
        .col_expr(request::Column::Note, Expr::value(note.clone()))
        .col_expr(request::Column::UpdatedAt, Expr::value(now))
        .filter(request::Column::Id.eq(request_id))
        .filter(request::Column::Status.eq(RequestStatus::Pending))
        .exec(store.db())
        .await?;

    if result.rows_affected == 0 {
        return Err(status_conflict(store.db(), request_id).await);
    }

    store.notify(Collection::Requests);
    Ok(request::Model {
        quantity,
        note,
        updated_at: Some(now),
        ..existing
    })
}

/// Approves a pending request and applies its stock delta.
///
/// Runs in one transaction: the status swap and the ledger update either both commit or
/// neither does. A request whose product has since been deleted is approved without a
/// ledger effect.
///
/// # Errors
/// - [`Error::RequestNotFound`] if the request does not exist
/// - [`Error::InvalidState`] if it is no longer pending
/// - [`Error::InsufficientStock`] under [`NegativeStockPolicy::Reject`] when the stock-out
///   exceeds the stock on hand; the request then stays pending
#[instrument(skip(store))]
pub async fn approve(
    store: &Store,
    request_id: i64,
    policy: NegativeStockPolicy,
) -> Result<request::Model> {
    let txn = store.db().begin().await?;

    let pending = get_request_by_id(&txn, request_id)
        .await?
        .ok_or(Error::RequestNotFound { id: request_id })?;
    if !pending.status.can_transition_to(RequestStatus::Approved) {
        return Err(Error::InvalidState {
            request_id,
            status: pending.status,
        });
    }

    let now = Utc::now();
    let swapped = Request::update_many()
        .col_expr(request::Column::Status, Expr::value(RequestStatus::Approved))
        .col_expr(request::Column::ProcessedAt, Expr::value(now))
        .filter(request::Column::Id.eq(request_id))
        .filter(request::Column::Status.eq(RequestStatus::Pending))
        .exec(&txn)
        .await?;
    if swapped.rows_affected == 0 {
        return Err(status_conflict(&txn, request_id).await);
    }

    let mut new_stock = None;
    if let Some(product_id) = pending.product_id {
        if Product::find_by_id(product_id).one(&txn).await?.is_some() {
            new_stock = Some(
                apply_delta_with_policy(&txn, product_id, pending.quantity, policy).await?,
            );
        } else {
            warn!(
                request_id,
                product_id, "Product no longer exists, approving without stock change"
            );
        }
    }

    txn.commit().await?;

    store.notify(Collection::Requests);
    if new_stock.is_some() {
        store.notify(Collection::Products);
    }
    info!(request_id, ?new_stock, "Request approved");

    Ok(request::Model {
        status: RequestStatus::Approved,
        processed_at: Some(now),
        ..pending
    })
}

/// Rejects a pending request. No stock is touched.
///
/// # Errors
/// - [`Error::RequestNotFound`] if the request does not exist
/// - [`Error::InvalidState`] if it is no longer pending
#[instrument(skip(store))]
pub async fn reject(store: &Store, request_id: i64) -> Result<request::Model> {
    let now = Utc::now();
    let swapped = Request::update_many()
        .col_expr(request::Column::Status, Expr::value(RequestStatus::Rejected))
        .col_expr(request::Column::ProcessedAt, Expr::value(now))
        .filter(request::Column::Id.eq(request_id))
        .filter(request::Column::Status.eq(RequestStatus::Pending))
        .exec(store.db())
        .await?;
    if swapped.rows_affected == 0 {
        return Err(status_conflict(store.db(), request_id).await);
    }

    store.notify(Collection::Requests);
    info!(request_id, "Request rejected");

    get_request_by_id(store.db(), request_id)
        .await?
        .ok_or(Error::RequestNotFound { id: request_id })
}

/// Explains why a compare-and-swap on a pending request matched nothing.
async fn status_conflict<C>(db: &C, request_id: i64) -> Error
where
    C: ConnectionTrait,
{
    match get_request_by_id(db, request_id).await {
        Ok(Some(current)) => Error::InvalidState {
            request_id,
            status: current.status,
        },
        Ok(None) => Error::RequestNotFound { id: request_id },
        Err(e) => e,
    }
}
