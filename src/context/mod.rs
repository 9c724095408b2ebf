pub mod host;

use log::debug;
use std::sync::{ Arc, Mutex, PoisonError };
use tokio::sync::{ mpsc, watch };
use tokio::task::JoinHandle;
use url::Url;

use crate::models::chat::PageContext;

pub use self::host::{ ActiveContext, ContextHost, DetachedHost, HostError, NavigationHost, Subscription };

/// True when `url` is on `domain` or one of its subdomains.
pub fn matches_domain(url: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    match Url::parse(url).ok().as_ref().and_then(Url::host_str) {
        Some(host) => host == domain || host.ends_with(&format!(".{}", domain)),
        None => false,
    }
}

struct TrackerInner {
    host: Arc<dyn ContextHost>,
    allowed_domain: String,
    current: watch::Sender<Option<PageContext>>,
}

impl TrackerInner {
    async fn refresh(&self) {
        let next = match self.host.query_active_context().await {
            Ok(Some(active)) if matches_domain(&active.url, &self.allowed_domain) => {
                Some(PageContext {
                    url: active.url,
                    title: active.title.filter(|t| !t.trim().is_empty()),
                })
            }
            Ok(_) => None,
            Err(HostError::Unsupported) => {
                return;
            }
            Err(e) => {
                debug!("Active context query failed: {}", e);
                return;
            }
        };

        self.current.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!("Page context changed: {:?}", next);
            *current = next;
            true
        });
    }
}

struct Running {
    subscription: Subscription,
    task: JoinHandle<()>,
}

/// Tracks the active page while it belongs to the allowed domain.
pub struct PageContextTracker {
    inner: Arc<TrackerInner>,
    running: Mutex<Option<Running>>,
}

impl PageContextTracker {
    pub fn new(host: Arc<dyn ContextHost>, allowed_domain: &str) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(TrackerInner {
                host,
                allowed_domain: allowed_domain.to_string(),
                current,
            }),
            running: Mutex::new(None),
        }
    }

    /// Subscribes to the host and performs an initial query. Must be called
    /// from within a tokio runtime. Calling it twice is a no-op.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let subscription = self.inner.host.subscribe_active_context(
            Arc::new(move || {
                let _ = tx.send(());
            })
        );

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            inner.refresh().await;
            while rx.recv().await.is_some() {
                inner.refresh().await;
            }
        });

        *running = Some(Running { subscription, task });
    }

    /// Unsubscribes from the host and stops the update task.
    pub fn stop(&self) {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(Running { subscription, task }) = running {
            subscription.cancel();
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub async fn refresh(&self) {
        self.inner.refresh().await;
    }

    pub fn current(&self) -> Option<PageContext> {
        self.inner.current.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Option<PageContext>> {
        self.inner.current.subscribe()
    }
}

impl Drop for PageContextTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
