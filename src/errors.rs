//! Unified error type for the stock service.
//!
//! Every business operation returns [`Result`]. The variants map one-to-one onto the
//! failure kinds callers have to distinguish: bad input, an operation against a request
//! that is no longer pending, a stock adjustment that would go negative, a missing
//! record, and a failing store.

use crate::entities::request::RequestStatus;
use thiserror::Error;

/// All errors surfaced by the library and the bot layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input (zero quantity, blank name, missing product reference).
    #[error("Invalid input: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// The request is not `pending`, so it can no longer be edited, approved or rejected.
    #[error("Request {request_id} is already {status}")]
    InvalidState {
        /// The request that was targeted
        request_id: i64,
        /// The status it is currently in
        status: RequestStatus,
    },

    /// Applying the adjustment would drive the product's stock below zero.
    #[error("Insufficient stock for product {product_id}: have {current}, need {requested}")]
    InsufficientStock {
        /// Product being adjusted
        product_id: i64,
        /// Stock on hand when the adjustment was attempted
        current: i64,
        /// Units the adjustment tried to remove
        requested: i64,
    },

    /// No product with this id exists.
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Missing product id
        id: i64,
    },

    /// No request with this id exists.
    #[error("Request not found: {id}")]
    RequestNotFound {
        /// Missing request id
        id: i64,
    },

    /// The underlying store call failed.
    #[error("Store unavailable: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// I/O failure outside the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing or unreadable.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Discord gateway or HTTP failure.
    #[error("Discord error: {0}")]
    Discord(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
