//! Cosmetic "still working" indicator

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Callback fired on a fixed interval while a blocking request is in flight
#[derive(Clone)]
pub struct Ticker {
    every: Duration,
    callback: Arc<dyn Fn() + Send + Sync>,
}

impl Ticker {
    pub fn new(every: Duration, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            every,
            callback: Arc::new(callback),
        }
    }

    fn spawn(&self) -> JoinHandle<()> {
        let every = self.every;
        let callback = self.callback.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                callback();
            }
        })
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker").field("every", &self.every).finish()
    }
}

/// Await `fut`, running `ticker` alongside it until it resolves
pub async fn with_ticker<F, T>(ticker: Option<&Ticker>, fut: F) -> T
where
    F: Future<Output = T>,
{
    let handle = ticker.map(Ticker::spawn);
    let output = fut.await;
    if let Some(handle) = handle {
        handle.abort();
    }
    output
}
