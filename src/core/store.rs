//! The shared document store and its live change feed.
//!
//! [`Store`] pairs the `SeaORM` connection with a broadcast channel. Every mutation in
//! `core` publishes the [`Collection`] it touched, and subscriptions turn those
//! notifications into full-replace snapshots of a standing query.

use crate::{
    core::request::{RequestFilter, find_requests},
    entities::{Product, ProductModel, RequestModel, product},
    errors::Result,
};
use sea_orm::{DatabaseConnection, QueryOrder, prelude::*};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

const CHANGE_FEED_CAPACITY: usize = 256;

/// The tables that publish change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// The product catalog
    Products,
    /// Stock-change requests
    Requests,
}

/// Database connection shared with a change notifier.
///
/// Cloning is cheap; clones share both the connection pool and the feed.
#[derive(Debug, Clone)]
pub struct Store {
    db: Arc<DatabaseConnection>,
    changes: broadcast::Sender<Collection>,
}

impl Store {
    /// Wraps an open connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            db: Arc::new(db),
            changes,
        }
    }

    /// The underlying connection, for reads and for opening transactions.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Publishes that `collection` changed. Having no subscribers is not an error.
    pub fn notify(&self, collection: Collection) {
        let receivers = self.changes.send(collection).unwrap_or(0);
        trace!(?collection, receivers, "Published change notification");
    }

    /// Starts a live query over requests matching `filter`.
    #[must_use]
    pub fn subscribe_requests(&self, filter: RequestFilter) -> RequestSubscription {
        RequestSubscription {
            db: Arc::clone(&self.db),
            listener: ChangeListener::new(self.changes.subscribe(), Collection::Requests),
            filter,
        }
    }

    /// Starts a live query over the whole product catalog.
    #[must_use]
    pub fn subscribe_products(&self) -> ProductSubscription {
        ProductSubscription {
            db: Arc::clone(&self.db),
            listener: ChangeListener::new(self.changes.subscribe(), Collection::Products),
        }
    }
}

/// Waits for notifications about one collection. The first wait returns immediately so
/// subscribers always start with an initial snapshot.
#[derive(Debug)]
struct ChangeListener {
    rx: broadcast::Receiver<Collection>,
    collection: Collection,
    primed: bool,
}

impl ChangeListener {
    const fn new(rx: broadcast::Receiver<Collection>, collection: Collection) -> Self {
        Self {
            rx,
            collection,
            primed: false,
        }
    }

    /// Returns `false` once every [`Store`] handle has been dropped.
    async fn changed(&mut self) -> bool {
        if !self.primed {
            self.primed = true;
            return true;
        }
        loop {
            match self.rx.recv().await {
                Ok(collection) if collection == self.collection => return true,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, collection = ?self.collection, "Subscriber lagged, refreshing");
                    return true;
                }
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }
}

/// Live snapshots of a request query. Drop it to unsubscribe.
#[derive(Debug)]
pub struct RequestSubscription {
    db: Arc<DatabaseConnection>,
    listener: ChangeListener,
    filter: RequestFilter,
}

impl RequestSubscription {
    /// Waits for the next snapshot. The first call yields the current result set.
    ///
    /// Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Result<Vec<RequestModel>>> {
        if !self.listener.changed().await {
            return None;
        }
        Some(find_requests(self.db.as_ref(), &self.filter).await)
    }
}

/// Live snapshots of the product catalog. Drop it to unsubscribe.
#[derive(Debug)]
pub struct ProductSubscription {
    db: Arc<DatabaseConnection>,
    listener: ChangeListener,
}

impl ProductSubscription {
    /// Waits for the next catalog snapshot, ordered by name.
    pub async fn next(&mut self) -> Option<Result<Vec<ProductModel>>> {
        if !self.listener.changed().await {
            return None;
        }
        Some(
            Product::find()
                .order_by_asc(product::Column::Name)
                .order_by_asc(product::Column::Id)
                .all(self.db.as_ref())
                .await
                .map_err(Into::into),
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{product, request};
    use crate::test_utils::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_subscription_starts_with_current_snapshot() -> Result<()> {
        let (store, product) = setup_with_product(10).await?;
        submit_test_request(&store, &product, 2).await?;

        let mut sub = store.subscribe_requests(RequestFilter::pending());
        let first = sub.next().await.unwrap()?;
        assert_eq!(first.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_subscription_refreshes_after_change() -> Result<()> {
        let (store, product) = setup_with_product(10).await?;
        let mut sub = store.subscribe_requests(RequestFilter::pending());
        assert!(sub.next().await.unwrap()?.is_empty());

        let submitted = submit_test_request(&store, &product, 3).await?;
        let snapshot = timeout(Duration::from_secs(5), sub.next())
            .await
            .unwrap()
            .unwrap()?;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, submitted.id);

        request::reject(&store, submitted.id).await?;
        let snapshot = timeout(Duration::from_secs(5), sub.next())
            .await
            .unwrap()
            .unwrap()?;
        assert!(snapshot.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_subscription_ignores_other_collections() -> Result<()> {
        let store = setup_test_store().await?;
        let mut sub = store.subscribe_requests(RequestFilter::pending());
        sub.next().await.unwrap()?;

        product::create_product(&store, "Cap".to_string(), None, 1).await?;
        let waited = timeout(Duration::from_millis(100), sub.next()).await;
        assert!(waited.is_err(), "a product change must not wake a request subscriber");
        Ok(())
    }

    #[tokio::test]
    async fn test_product_subscription_sees_new_products() -> Result<()> {
        let store = setup_test_store().await?;
        let mut sub = store.subscribe_products();
        assert!(sub.next().await.unwrap()?.is_empty());

        product::create_product(&store, "Cap".to_string(), Some("M".to_string()), 4).await?;
        let snapshot = timeout(Duration::from_secs(5), sub.next())
            .await
            .unwrap()
            .unwrap()?;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "Cap");
        Ok(())
    }

    #[tokio::test]
    async fn test_store_clones_share_connection_and_feed() -> Result<()> {
        let store = setup_test_store().await?;
        let handle = store.clone();
        let mut sub = store.subscribe_products();
        assert!(sub.next().await.unwrap()?.is_empty());

        product::create_product(&handle, "Cap".to_string(), None, 2).await?;
        let snapshot = timeout(Duration::from_secs(5), sub.next())
            .await
            .unwrap()
            .unwrap()?;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(product::list_products(store.db()).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_subscription_ends_when_store_dropped() -> Result<()> {
        let store = setup_test_store().await?;
        let mut sub = store.subscribe_products();
        sub.next().await.unwrap()?;
        drop(store);
        assert!(sub.next().await.is_none());
        Ok(())
    }
}
