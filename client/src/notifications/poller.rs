//! Unread-count poller.
//!
//! Polls the notifications endpoint on a fixed interval while a session
//! is authenticated and publishes the unread count through a watch
//! channel. On a fetch failure the count drops to 0 rather than keeping
//! a stale value, so the badge never over-reports.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::api::ApiClient;
use crate::auth::session::SessionSnapshot;

/// Periodic unread-count poller. Build one, then [`UnreadPoller::spawn`]
/// it into a background task.
pub struct UnreadPoller {
    api: Arc<ApiClient>,
    session: watch::Receiver<SessionSnapshot>,
    poll_interval: Duration,
}

impl UnreadPoller {
    pub fn new(
        api: Arc<ApiClient>,
        session: watch::Receiver<SessionSnapshot>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            session,
            poll_interval,
        }
    }

    /// Start polling. The first tick fires immediately so the badge
    /// hydrates without waiting a full interval.
    pub fn spawn(self) -> PollerHandle {
        let UnreadPoller {
            api,
            session,
            poll_interval,
        } = self;
        let (tx, rx) = watch::channel(0usize);

        let task = tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;

                if !session.borrow().is_authenticated {
                    tx.send_replace(0);
                    continue;
                }

                let count = match api.list_notifications().await {
                    Ok(notifications) => notifications.iter().filter(|n| !n.is_read).count(),
                    Err(e) => {
                        tracing::warn!("Unread poll failed: {}", e);
                        0
                    }
                };
                tx.send_replace(count);
            }
        });

        tracing::info!(interval_secs = poll_interval.as_secs(), "Unread poller started");
        PollerHandle { count: rx, task }
    }
}

/// Handle to a running poller. The timer is the one resource that needs
/// explicit teardown; dropping the handle aborts the task.
pub struct PollerHandle {
    count: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Current badge count.
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Watch receiver that yields on every poll result.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.clone()
    }

    pub fn stop(&self) {
        self.task.abort();
        tracing::info!("Unread poller stopped");
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
