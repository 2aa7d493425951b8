//! Cached read views and their explicit invalidation.
//!
//! Every mutation names the views it makes stale; the handler applies that
//! set here after the write lands. Read handlers serve the cached payload
//! until it is invalidated and rebuilt on the next request.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Storefront,
    AdminProducts,
    AdminCategories,
}

#[derive(Default)]
pub struct ViewCache {
    cached: RwLock<HashMap<View, Value>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, view: View) -> Option<Value> {
        self.cached.read().await.get(&view).cloned()
    }

    pub async fn put(&self, view: View, payload: Value) {
        self.cached.write().await.insert(view, payload);
    }

    pub async fn invalidate(&self, views: &[View]) {
        let mut cached = self.cached.write().await;
        for view in views {
            cached.remove(view);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_invalidate_removes_only_named_views() {
        let cache = ViewCache::new();
        cache.put(View::Storefront, json!({ "page": 1 })).await;
        cache.put(View::AdminProducts, json!({ "page": 2 })).await;

        cache.invalidate(&[View::Storefront, View::AdminCategories]).await;

        assert_eq!(cache.get(View::Storefront).await, None);
        assert_eq!(cache.get(View::AdminProducts).await, Some(json!({ "page": 2 })));
    }
}
