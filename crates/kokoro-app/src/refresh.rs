//! Cross-view refresh protocol.
//!
//! Views register a named no-argument refresh capability at initialization;
//! the editor invokes every registered capability after a successful
//! mutation. An empty registry is not an error - a page that only shows the
//! entry form simply registers nothing. Refreshes re-run the view's current
//! month fetch without resetting its navigation position, and each view
//! absorbs its own failures.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// A no-argument refresh capability.
///
/// Implementations must be idempotent re-fetches: fan-out after one
/// mutation runs them concurrently and they may complete in either order.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self);
}

/// Registry of refresh capabilities, keyed by view name.
#[derive(Default)]
pub struct RefreshHub {
    views: RwLock<BTreeMap<String, Arc<dyn Refresh>>>,
}

impl RefreshHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a view's refresh capability.
    pub async fn register(&self, name: &str, view: Arc<dyn Refresh>) {
        tracing::debug!("[RefreshHub] registering view '{}'", name);
        self.views.write().await.insert(name.to_string(), view);
    }

    /// Removes a view's capability; absent names are ignored.
    pub async fn deregister(&self, name: &str) {
        self.views.write().await.remove(name);
    }

    /// Invokes every registered capability, joined concurrently.
    pub async fn notify_all(&self) {
        let views: Vec<Arc<dyn Refresh>> = self.views.read().await.values().cloned().collect();
        if views.is_empty() {
            return;
        }
        tracing::debug!("[RefreshHub] notifying {} view(s)", views.len());
        futures::future::join_all(views.iter().map(|view| view.refresh())).await;
    }

    pub async fn len(&self) -> usize {
        self.views.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.views.read().await.is_empty()
    }
}
