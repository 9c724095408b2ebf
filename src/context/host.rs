use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use thiserror::Error;

/// The foreground browsing context as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveContext {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("active context querying is not supported by this host")]
    Unsupported,
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

pub type ContextListener = Arc<dyn Fn() + Send + Sync>;

/// Registration handle returned by `subscribe_active_context`.
/// Dropping it unregisters the listener.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new<F>(unsubscribe: F) -> Self where F: FnOnce() + Send + Sync + 'static {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn noop() -> Self {
        Self { unsubscribe: None }
    }

    pub fn cancel(mut self) {
        self.run_unsubscribe();
    }

    fn run_unsubscribe(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_unsubscribe();
    }
}

/// Capability supplied by whatever hosts the session (a browser side panel,
/// a terminal, a test).
#[async_trait]
pub trait ContextHost: Send + Sync {
    async fn query_active_context(&self) -> Result<Option<ActiveContext>, HostError>;

    /// Registers `listener` to be called whenever the active context changes
    /// (activation of another tab, navigation within the current one).
    fn subscribe_active_context(&self, listener: ContextListener) -> Subscription;
}

/// Host for environments without any browsing context.
pub struct DetachedHost;

#[async_trait]
impl ContextHost for DetachedHost {
    async fn query_active_context(&self) -> Result<Option<ActiveContext>, HostError> {
        Err(HostError::Unsupported)
    }

    fn subscribe_active_context(&self, _listener: ContextListener) -> Subscription {
        Subscription::noop()
    }
}

type ListenerMap = HashMap<u64, ContextListener>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process host whose active context is driven by explicit navigation
/// calls. Used by the terminal client and in tests.
#[derive(Default)]
pub struct NavigationHost {
    active: Mutex<Option<ActiveContext>>,
    listeners: Arc<Mutex<ListenerMap>>,
    next_id: AtomicU64,
}

impl NavigationHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_active(url: &str, title: Option<&str>) -> Self {
        let host = Self::new();
        *lock(&host.active) = Some(ActiveContext {
            url: url.to_string(),
            title: title.map(str::to_string),
        });
        host
    }

    pub fn navigate(&self, url: &str, title: Option<&str>) {
        *lock(&self.active) = Some(ActiveContext {
            url: url.to_string(),
            title: title.map(str::to_string),
        });
        self.notify();
    }

    /// Leaves the foreground with no browsing context at all.
    pub fn close(&self) {
        *lock(&self.active) = None;
        self.notify();
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn notify(&self) {
        let listeners: Vec<ContextListener> = lock(&self.listeners).values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }
}

#[async_trait]
impl ContextHost for NavigationHost {
    async fn query_active_context(&self) -> Result<Option<ActiveContext>, HostError> {
        Ok(lock(&self.active).clone())
    }

    fn subscribe_active_context(&self, listener: ContextListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).insert(id, listener);

        let listeners = Arc::clone(&self.listeners);
        Subscription::new(move || {
            lock(&listeners).remove(&id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(counter: &Arc<AtomicUsize>) -> ContextListener {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn navigation_notifies_until_unsubscribed() {
        let host = NavigationHost::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let subscription = host.subscribe_active_context(counting_listener(&calls));

        host.navigate("https://www.partselect.com/", None);
        host.close();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        subscription.cancel();
        assert_eq!(host.listener_count(), 0);
        host.navigate("https://www.partselect.com/", None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let host = NavigationHost::new();
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let _first = host.subscribe_active_context(counting_listener(&calls));
            let _second = host.subscribe_active_context(counting_listener(&calls));
            assert_eq!(host.listener_count(), 2);
        }
        assert_eq!(host.listener_count(), 0);
    }

    #[tokio::test]
    async fn detached_host_reports_unsupported() {
        let host = DetachedHost;
        assert!(matches!(host.query_active_context().await, Err(HostError::Unsupported)));
        let calls = Arc::new(AtomicUsize::new(0));
        drop(host.subscribe_active_context(counting_listener(&calls)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
