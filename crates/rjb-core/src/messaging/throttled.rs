use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* outbound calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls to the same chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return how long to wait before using it.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = self.next.max(now);
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }

    /// No reservation pending: a fresh limiter would behave the same.
    fn is_idle(&self, now: Instant) -> bool {
        self.next <= now
    }
}

/// MessagingPort decorator that spaces outbound calls.
///
/// Multi-segment job lists go out back to back; spacing them keeps a burst under
/// Telegram's per-chat flood limit. This only delays calls, it never retries them.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<i64, IntervalLimiter>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn throttle_chat(&self, chat_id: ChatId) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let mut map = self.per_chat.lock().await;
            let now = Instant::now();
            map.retain(|_, lim| !lim.is_idle(now));
            map.entry(chat_id.0)
                .or_insert_with(|| IntervalLimiter::new(self.cfg.per_chat_min_interval))
                .reserve()
        };

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_html(chat_id, html).await
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        // Typing indicators are cheap and best-effort; only the global limiter applies.
        let wait = { self.global.lock().await.reserve() };
        if !wait.is_zero() {
            sleep(wait).await;
        }
        self.inner.send_chat_action(chat_id, action).await
    }
}
