//! Stock movement analytics.
//!
//! Statistics are a pure projection of the approved requests and the wall clock:
//! nothing is persisted and every update recomputes from the full set. Windows are
//! evaluated in the timezone of the `now` passed in, so "today" means the caller's
//! calendar day.

use crate::{
    core::{
        request::{RequestFilter, list_approved_requests},
        store::{RequestSubscription, Store},
    },
    entities::{RequestStatus, request},
    errors::Result,
};
use chrono::{DateTime, Datelike, Duration, Local, TimeZone, Utc};
use std::collections::HashMap;

/// How many products [`StockStats::top_sellers`] holds at most.
pub const TOP_SELLER_LIMIT: usize = 3;

/// Days covered by the "last week" window.
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// Days covered by the top-seller window.
pub const TOP_SELLER_WINDOW_DAYS: i64 = 30;

/// Units moved in one direction, bucketed by window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTotals {
    /// Same calendar day as now
    pub today: i64,
    /// Within the last seven days, boundary included
    pub last_7_days: i64,
    /// Same calendar month and year as now
    pub this_month: i64,
    /// The calendar month before this one
    pub previous_month: i64,
}

/// A product ranked by units taken out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopSeller {
    /// Product name as snapshotted on the requests
    pub product_name: String,
    /// Total units taken out in the window
    pub quantity: i64,
}

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockStats {
    /// Positive-quantity totals
    pub stock_in: WindowTotals,
    /// Negative-quantity totals, as magnitudes
    pub stock_out: WindowTotals,
    /// Most stocked-out products over the last 30 days, highest first
    pub top_sellers: Vec<TopSeller>,
}

/// Computes [`StockStats`] from approved requests as of `now`.
///
/// Requests that are not approved are ignored. Ties in the top-seller ranking keep the
/// order in which the products were first seen in `requests`.
#[must_use]
pub fn compute_stats<Tz: TimeZone>(requests: &[request::Model], now: &DateTime<Tz>) -> StockStats {
    let tz = now.timezone();
    let today = now.date_naive();
    let (this_year, this_month) = (now.year(), now.month());
    let (prev_year, prev_month) = if this_month == 1 {
        (this_year - 1, 12)
    } else {
        (this_year, this_month - 1)
    };

    let now_utc = now.with_timezone(&Utc);
    let week_start = now_utc - Duration::days(WEEK_WINDOW_DAYS);
    let top_seller_start = now_utc - Duration::days(TOP_SELLER_WINDOW_DAYS);

    let mut stats = StockStats::default();
    let mut sellers: Vec<TopSeller> = Vec::new();
    let mut seller_index: HashMap<&str, usize> = HashMap::new();

    for r in requests
        .iter()
        .filter(|r| r.status == RequestStatus::Approved)
    {
        let local = r.created_at.with_timezone(&tz);
        let amount = r.quantity.saturating_abs();
        let totals = if r.is_stock_in() {
            &mut stats.stock_in
        } else {
            &mut stats.stock_out
        };

        if local.date_naive() == today {
            totals.today = totals.today.saturating_add(amount);
        }
        if r.created_at >= week_start {
            totals.last_7_days = totals.last_7_days.saturating_add(amount);
        }
        if local.year() == this_year && local.month() == this_month {
            totals.this_month = totals.this_month.saturating_add(amount);
        }
        if local.year() == prev_year && local.month() == prev_month {
            totals.previous_month = totals.previous_month.saturating_add(amount);
        }

        if !r.is_stock_in() && r.created_at >= top_seller_start {
            match seller_index.get(r.product_name.as_str()) {
                Some(&i) => {
                    sellers[i].quantity = sellers[i].quantity.saturating_add(amount);
                }
                None => {
                    seller_index.insert(r.product_name.as_str(), sellers.len());
                    sellers.push(TopSeller {
                        product_name: r.product_name.clone(),
                        quantity: amount,
                    });
                }
            }
        }
    }

    // stable sort keeps first-seen order among equal totals
    sellers.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    sellers.truncate(TOP_SELLER_LIMIT);
    stats.top_sellers = sellers;
    stats
}

/// Reads the approved set and computes statistics for the local clock.
///
/// # Errors
/// Returns an error if the approved requests cannot be read.
pub async fn current_stats(store: &Store) -> Result<StockStats> {
    let approved = list_approved_requests(store.db()).await?;
    Ok(compute_stats(&approved, &Local::now()))
}

/// Live statistics: recomputed from scratch on every change to the approved set.
#[derive(Debug)]
pub struct StatsFeed {
    subscription: RequestSubscription,
}

impl StatsFeed {
    /// Subscribes to approved requests.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            subscription: store.subscribe_requests(RequestFilter::approved()),
        }
    }

    /// Waits for the next change and returns freshly computed statistics. The first call
    /// returns immediately.
    pub async fn next(&mut self) -> Option<Result<StockStats>> {
        let snapshot = self.subscription.next().await?;
        Some(snapshot.map(|approved| compute_stats(&approved, &Local::now())))
    }
}
