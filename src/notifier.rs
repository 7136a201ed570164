use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("relay rejected notice with status {0}")]
    Rejected(u16),
}

// 1. Notifier Contract
/// Notifier
///
/// Delivers the "new login detected" notice to the account owner. Implementations may be
/// slow or unreliable; callers never await them on the request path.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_login_notice(&self, identifier: &str, display_name: &str) -> Result<(), NotifyError>;
}

pub type NotifierState = Arc<dyn Notifier>;

/// The message sent to the account owner.
pub fn login_notice_body(identifier: &str, display_name: &str) -> String {
    format!(
        "Hello {display_name},\n\n\
         A sign-in to your campus portal account ({identifier}) was just detected.\n\
         If this was not you, change your password immediately."
    )
}

pub const LOGIN_NOTICE_SUBJECT: &str = "New sign-in to your campus portal account";

// 2. HTTP Mail Relay
/// HttpNotifier
///
/// Posts `{to, subject, body}` JSON to a mail relay. The reqwest client carries its own
/// timeout in addition to the dispatcher's per-delivery bound.
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    to: &'a str,
    subject: &'a str,
    body: String,
}

impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_login_notice(&self, identifier: &str, display_name: &str) -> Result<(), NotifyError> {
        let message = RelayMessage {
            to: identifier,
            subject: LOGIN_NOTICE_SUBJECT,
            body: login_notice_body(identifier, display_name),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

/// LogNotifier
///
/// Used when no relay is configured. Records that a notice would have been sent.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_login_notice(&self, identifier: &str, _display_name: &str) -> Result<(), NotifyError> {
        tracing::info!(%identifier, "login notice (no relay configured)");
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockNotifier
///
/// Records every notice it receives. Can be told to fail or to stall, so tests can show
/// that neither outcome reaches the login response.
#[derive(Clone, Default)]
pub struct MockNotifier {
    pub should_fail: bool,
    pub delay: Option<Duration>,
    sent: Arc<Mutex<Vec<LoginNotice>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn new_stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<LoginNotice> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_login_notice(&self, identifier: &str, display_name: &str) -> Result<(), NotifyError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().await.push(LoginNotice {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
        });
        if self.should_fail {
            return Err(NotifyError::Transport("Mock Notifier Error: Simulation requested".to_string()));
        }
        Ok(())
    }
}

// 4. Detached Dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginNotice {
    pub identifier: String,
    pub display_name: String,
}

/// Counters for the notification worker. Readable at any time without touching the
/// request path.
#[derive(Debug, Default)]
pub struct DispatchStats {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// NotificationDispatcher
///
/// Hands login notices to a background worker over a bounded queue. `dispatch` never
/// awaits: a full or closed queue drops the notice and counts it.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<LoginNotice>,
    stats: Arc<DispatchStats>,
}

impl NotificationDispatcher {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(notifier: NotifierState, timeout: Duration, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stats = Arc::new(DispatchStats::default());
        tokio::spawn(run_worker(rx, notifier, timeout, stats.clone()));
        Self { tx, stats }
    }

    pub fn dispatch(&self, notice: LoginNotice) {
        if let Err(e) = self.tx.try_send(notice) {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("login notice dropped: {e}");
        }
    }

    pub fn stats(&self) -> DispatchSnapshot {
        self.stats.snapshot()
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<LoginNotice>,
    notifier: NotifierState,
    timeout: Duration,
    stats: Arc<DispatchStats>,
) {
    while let Some(notice) = rx.recv().await {
        let delivery = notifier.send_login_notice(&notice.identifier, &notice.display_name);
        match tokio::time::timeout(timeout, delivery).await {
            Ok(Ok(())) => {
                stats.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(identifier = %notice.identifier, "login notice delivered");
            }
            Ok(Err(e)) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(identifier = %notice.identifier, "login notice failed: {e}");
            }
            Err(_) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(identifier = %notice.identifier, ?timeout, "login notice timed out");
            }
        }
    }
    tracing::debug!("notification worker stopped");
}
