//! Discord command implementations organized by audience.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Admin commands: review queue, adjustments, statistics, cleanup
pub mod admin;

/// General utility commands
pub mod general;

/// Product catalog commands
pub mod product;

/// Employee request commands
pub mod request;

use crate::{bot::BotData, errors::Error};

/// Every command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        general::ping(),
        general::help(),
        product::products(),
        product::product(),
        request::stock_in(),
        request::stock_out(),
        request::request_new_product(),
        request::edit_request(),
        request::my_requests(),
        admin::pending(),
        admin::approve(),
        admin::reject(),
        admin::adjust(),
        admin::stats(),
        admin::history(),
        admin::cleanup(),
    ]
}
