//! Request entity - A proposed stock change awaiting an admin decision.
//!
//! Requests carry a signed quantity (positive = stock-in, negative = stock-out) and
//! denormalized snapshots of the product and employee names taken at submission time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a request.
///
/// `Pending` is the only non-terminal state; see [`RequestStatus::can_transition_to`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted, waiting for an admin
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted; the ledger delta has been applied
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined; no ledger effect
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl RequestStatus {
    /// Returns true for `Approved` and `Rejected`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The only legal transitions are `pending -> approved` and `pending -> rejected`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
        )
    }

    /// Lowercase name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional tag on requests that are not a plain stock-in/out against an existing product.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    /// Employee asks for a product that is not yet in the catalog
    #[sea_orm(string_value = "new_product")]
    NewProduct,
    /// Audit record written by an admin quick adjustment
    #[sea_orm(string_value = "direct_adjust")]
    DirectAdjust,
}

/// Request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Referenced product, absent for `new_product` requests
    pub product_id: Option<i64>,
    /// Product name at submission time
    pub product_name: String,
    /// Submitter display name
    pub employee_name: String,
    /// Signed quantity: positive adds stock, negative removes it
    pub quantity: i64,
    /// Current lifecycle state
    pub status: RequestStatus,
    /// Free-text annotation
    pub note: Option<String>,
    /// Optional tag for non-standard requests
    pub action: Option<RequestAction>,
    /// Discord user ID of the submitter
    pub created_by: String,
    /// When the request was submitted
    pub created_at: DateTimeUtc,
    /// When an admin approved or rejected it
    pub processed_at: Option<DateTimeUtc>,
    /// When it was last edited
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    /// Positive quantities add stock.
    #[must_use]
    pub const fn is_stock_in(&self) -> bool {
        self.quantity > 0
    }
}

/// Requests reference products by plain id; see [`super::product::Relation`].
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_transitions_are_legal() {
        use RequestStatus::{Approved, Pending, Rejected};

        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));

        for from in [Approved, Rejected] {
            for to in [Pending, Approved, Rejected] {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be illegal");
            }
        }
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_status_display_matches_stored_value() {
        assert_eq!(RequestStatus::Pending.to_string(), "pending");
        assert_eq!(RequestStatus::Approved.to_string(), "approved");
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(!RequestStatus::Pending.is_terminal());
    }
}
