//! Background tasks that follow the store's change feed.
//!
//! The stats watcher keeps a [`StatsCache`] current so `/stats` rarely has to hit the
//! database. The low-stock watcher reports products the moment they drop below the
//! threshold; the bot forwards those alerts to a configured channel.

use crate::{
    bot::format::format_product,
    core::{
        analytics::{StatsFeed, StockStats, current_stats},
        store::Store,
    },
    entities::ProductModel,
    errors::Result,
};
use poise::serenity_prelude as serenity;
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::{
    sync::{RwLock, mpsc},
    task::JoinHandle,
    time::Instant,
};
use tracing::{error, info, warn};

/// Cached statistics older than this are recomputed on read, so calendar windows roll
/// over even when nothing changes.
pub const STATS_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// Latest statistics and when they were computed.
#[derive(Debug, Clone, Default)]
pub struct StatsCache {
    latest: Arc<RwLock<Option<(Instant, StockStats)>>>,
}

impl StatsCache {
    /// The cached statistics, unless they are older than `max_age`.
    pub async fn fresh(&self, max_age: Duration) -> Option<StockStats> {
        let guard = self.latest.read().await;
        guard
            .as_ref()
            .filter(|(at, _)| at.elapsed() <= max_age)
            .map(|(_, stats)| stats.clone())
    }

    /// Replaces the cached statistics.
    pub async fn publish(&self, stats: StockStats) {
        *self.latest.write().await = Some((Instant::now(), stats));
    }
}

/// Statistics for `/stats`: the cache when fresh, otherwise recomputed and cached.
///
/// # Errors
/// Returns an error if the approved requests cannot be read.
pub async fn cached_stats(store: &Store, cache: &StatsCache) -> Result<StockStats> {
    if let Some(stats) = cache.fresh(STATS_MAX_AGE).await {
        return Ok(stats);
    }
    let stats = current_stats(store).await?;
    cache.publish(stats.clone()).await;
    Ok(stats)
}

/// Recomputes statistics on every change to the approved set and publishes them to
/// `cache`. Ends when the store is dropped.
pub fn spawn_stats_watcher(store: &Store, cache: StatsCache) -> JoinHandle<()> {
    let mut feed = StatsFeed::new(store);
    tokio::spawn(async move {
        while let Some(update) = feed.next().await {
            match update {
                Ok(stats) => cache.publish(stats).await,
                Err(e) => error!(error = %e, "Failed to refresh statistics"),
            }
        }
    })
}

/// Products in `products` that are low now but were not in `seen_low`. `seen_low` is
/// replaced by the current low set.
pub fn newly_low<'a>(
    seen_low: &mut HashSet<i64>,
    products: &'a [ProductModel],
    threshold: i64,
) -> Vec<&'a ProductModel> {
    let low: Vec<&ProductModel> = products.iter().filter(|p| p.stock < threshold).collect();
    let fresh = low
        .iter()
        .copied()
        .filter(|p| !seen_low.contains(&p.id))
        .collect();
    *seen_low = low.iter().map(|p| p.id).collect();
    fresh
}

/// Sends a product to `alerts` each time its stock drops below `threshold`.
///
/// The current catalog is read before the task starts; products that are already low
/// then are logged, not alerted. Ends when the store is dropped or `alerts` closes.
///
/// # Errors
/// Returns an error if the initial catalog snapshot cannot be read.
pub async fn spawn_low_stock_watcher(
    store: &Store,
    threshold: i64,
    alerts: mpsc::Sender<ProductModel>,
) -> Result<JoinHandle<()>> {
    let mut catalog = store.subscribe_products();
    let mut seen_low = HashSet::new();
    if let Some(initial) = catalog.next().await {
        let already_low = newly_low(&mut seen_low, &initial?, threshold).len();
        if already_low > 0 {
            info!(already_low, threshold, "Products already low on stock");
        }
    }

    Ok(tokio::spawn(async move {
        while let Some(snapshot) = catalog.next().await {
            let products = match snapshot {
                Ok(products) => products,
                Err(e) => {
                    error!(error = %e, "Failed to read catalog for low-stock check");
                    continue;
                }
            };
            for product in newly_low(&mut seen_low, &products, threshold) {
                if alerts.send(product.clone()).await.is_err() {
                    return;
                }
            }
        }
    }))
}

/// Logs each low-stock alert and, when `channel` is set, posts it there.
pub async fn forward_low_stock_alerts(
    mut alerts: mpsc::Receiver<ProductModel>,
    http: Arc<serenity::Http>,
    channel: Option<serenity::ChannelId>,
    threshold: i64,
) {
    while let Some(product) = alerts.recv().await {
        warn!(product_id = product.id, stock = product.stock, "Product is low on stock");
        let Some(channel) = channel else {
            continue;
        };
        let text = format!("⚠️ Low stock: {}", format_product(&product, threshold));
        if let Err(e) = channel.say(&http, text).await {
            error!(error = %e, %channel, "Failed to post low-stock alert");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{ledger::NegativeStockPolicy, product::set_stock, request::approve};
    use crate::test_utils::*;
    use chrono::Utc;
    use tokio::time::{sleep, timeout};

    fn product(id: i64, stock: i64) -> ProductModel {
        let now = Utc::now();
        ProductModel {
            id,
            name: format!("Product {id}"),
            size: None,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_newly_low_reports_only_crossings() {
        let mut seen = HashSet::new();

        let first = [product(1, 2), product(2, 9)];
        let fresh: Vec<i64> = newly_low(&mut seen, &first, 5).iter().map(|p| p.id).collect();
        assert_eq!(fresh, vec![1]);

        let second = [product(1, 1), product(2, 4)];
        let fresh: Vec<i64> = newly_low(&mut seen, &second, 5).iter().map(|p| p.id).collect();
        assert_eq!(fresh, vec![2]);

        // restocked, then low again
        let third = [product(1, 8), product(2, 4)];
        assert!(newly_low(&mut seen, &third, 5).is_empty());
        let fourth = [product(1, 0), product(2, 4)];
        let fresh: Vec<i64> = newly_low(&mut seen, &fourth, 5).iter().map(|p| p.id).collect();
        assert_eq!(fresh, vec![1]);
    }

    #[tokio::test]
    async fn test_low_stock_watcher_alerts_once_per_crossing() -> Result<()> {
        let (store, product) = setup_with_product(10).await?;
        let (tx, mut rx) = mpsc::channel(8);
        let _watcher = spawn_low_stock_watcher(&store, 5, tx).await?;

        set_stock(&store, product.id, 2).await?;
        let alert = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alert.id, product.id);
        assert_eq!(alert.stock, 2);

        set_stock(&store, product.id, 1).await?;
        let repeat = timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(repeat.is_err(), "a product that stays low must not alert again");
        Ok(())
    }

    #[tokio::test]
    async fn test_low_stock_watcher_skips_products_low_at_start() -> Result<()> {
        let (store, _) = setup_with_product(1).await?;
        let (tx, mut rx) = mpsc::channel(8);
        let _watcher = spawn_low_stock_watcher(&store, 5, tx).await?;

        let alert = timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(alert.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_stats_watcher_follows_approvals() -> Result<()> {
        let (store, product) = setup_with_product(0).await?;
        let cache = StatsCache::default();
        let _watcher = spawn_stats_watcher(&store, cache.clone());

        let submitted = submit_test_request(&store, &product, 7).await?;
        approve(&store, submitted.id, NegativeStockPolicy::Reject).await?;

        let stats = timeout(Duration::from_secs(5), async {
            loop {
                if let Some(stats) = cache.fresh(STATS_MAX_AGE).await {
                    if stats.stock_in.today == 7 {
                        return stats;
                    }
                }
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(stats.stock_in.this_month, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_cached_stats_recomputes_when_empty_or_stale() -> Result<()> {
        let (store, product) = setup_with_product(0).await?;
        let cache = StatsCache::default();

        assert_eq!(cached_stats(&store, &cache).await?, StockStats::default());
        assert!(cache.fresh(STATS_MAX_AGE).await.is_some());

        let submitted = submit_test_request(&store, &product, 3).await?;
        approve(&store, submitted.id, NegativeStockPolicy::Reject).await?;
        // served from the cache until it is refreshed
        assert_eq!(cached_stats(&store, &cache).await?.stock_in.today, 0);

        cache.publish(current_stats(&store).await?).await;
        assert_eq!(cached_stats(&store, &cache).await?.stock_in.today, 3);
        Ok(())
    }
}
