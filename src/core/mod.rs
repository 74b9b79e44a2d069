//! Core business logic - framework-agnostic catalog, request, ledger, analytics and
//! retention operations over the shared [`store::Store`].

/// Approved-request statistics (windowed totals and top sellers)
pub mod analytics;
/// Stock mutations with the non-negative invariant
pub mod ledger;
/// Product catalog operations
pub mod product;
/// Stock-change request lifecycle
pub mod request;
/// Purging of stale resolved requests
pub mod retention;
/// Database handle plus live change feed
pub mod store;
