//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete and
//! resolving the product references those suggestions produce.

/// Autocomplete handlers for product names
pub mod autocomplete;
