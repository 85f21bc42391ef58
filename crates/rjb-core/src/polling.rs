//! Pull-mode delivery: long-poll for updates, hand them off, advance the cursor.
//!
//! Delivery is at-least-once. The cursor moves past an update as soon as it has been
//! handed to the dispatcher, whether or not the handler later succeeds, and nothing
//! is de-duplicated.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::{Config, DispatchMode},
    cursor::UpdateCursor,
    dispatch::Dispatcher,
    domain::Update,
    Result,
};

/// Pull capability of an update source (Telegram `getUpdates`).
#[async_trait]
pub trait UpdateFeed: Send + Sync {
    /// Return updates with `id >= offset`, waiting up to `timeout` for at least one.
    async fn fetch(&self, offset: i64, timeout: Duration) -> Result<Vec<Update>>;
}

#[derive(Clone, Copy, Debug)]
pub struct PullSettings {
    pub timeout: Duration,
    pub backoff: Duration,
    pub mode: DispatchMode,
}

impl PullSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            timeout: cfg.poll_timeout,
            backoff: cfg.poll_backoff,
            mode: cfg.dispatch_mode,
        }
    }
}

/// Hands updates to the dispatcher according to a `DispatchMode`.
pub struct Handoff {
    mode: DispatchMode,
    dispatcher: Arc<Dispatcher>,
    queues: ChatQueues,
}

impl Handoff {
    pub fn new(mode: DispatchMode, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            mode,
            dispatcher,
            queues: ChatQueues::default(),
        }
    }

    /// Returns once the update is handed off. For `Inline` that is after the handler ran.
    pub async fn submit(&self, update: Update) {
        match self.mode {
            DispatchMode::Inline => run_logged(&self.dispatcher, &update).await,
            DispatchMode::Detached => {
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move { run_logged(&dispatcher, &update).await });
            }
            DispatchMode::PerChat => self.queues.enqueue(&self.dispatcher, update),
        }
    }
}

async fn run_logged(dispatcher: &Dispatcher, update: &Update) {
    if let Err(e) = dispatcher.dispatch(update).await {
        warn!(
            update_id = update.id.0,
            chat_id = update.chat_id.0,
            error = %e,
            "handler failed; update stays consumed"
        );
    }
}

/// One unbounded queue + worker task per chat. Workers live for the process lifetime.
#[derive(Default)]
struct ChatQueues {
    inner: Mutex<HashMap<i64, mpsc::UnboundedSender<Update>>>,
}

impl ChatQueues {
    fn enqueue(&self, dispatcher: &Arc<Dispatcher>, update: Update) {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let chat = update.chat_id.0;

        let update = match map.get(&chat) {
            Some(tx) => match tx.send(update) {
                Ok(()) => return,
                // Worker is gone (runtime shutting down); start a fresh one.
                Err(mpsc::error::SendError(update)) => update,
            },
            None => update,
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<Update>();
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                run_logged(&dispatcher, &update).await;
            }
        });
        // A freshly created receiver is alive, so this send cannot fail.
        let _ = tx.send(update);
        map.insert(chat, tx);
    }
}

/// One fetch + hand-off cycle.
///
/// On fetch failure the error is returned and the caller keeps its cursor, so the same
/// range is requested again. On success every returned update is advanced past, including
/// ones without text (which are skipped).
pub async fn pull_cycle(
    feed: &dyn UpdateFeed,
    handoff: &Handoff,
    mut cursor: UpdateCursor,
    timeout: Duration,
) -> Result<UpdateCursor> {
    let updates = feed.fetch(cursor.next(), timeout).await?;
    if !updates.is_empty() {
        debug!(count = updates.len(), offset = cursor.next(), "fetched updates");
    }

    for update in updates {
        let id = update.id;
        if update.text.is_empty() {
            debug!(update_id = id.0, "update without text, skipping");
        } else {
            handoff.submit(update).await;
        }
        cursor.advance(id);
    }
    Ok(cursor)
}

/// Run pull cycles until `shutdown` fires. Returns the final cursor.
pub async fn run_polling(
    feed: Arc<dyn UpdateFeed>,
    dispatcher: Arc<Dispatcher>,
    settings: PullSettings,
    shutdown: CancellationToken,
) -> UpdateCursor {
    let handoff = Handoff::new(settings.mode, dispatcher);
    let mut cursor = UpdateCursor::default();
    info!(
        mode = %settings.mode,
        timeout_secs = settings.timeout.as_secs(),
        "polling for updates"
    );

    loop {
        let outcome = tokio::select! {
            _ = shutdown.cancelled() => break,
            r = pull_cycle(feed.as_ref(), &handoff, cursor, settings.timeout) => r,
        };

        match outcome {
            Ok(next) => cursor = next,
            Err(e) => {
                warn!(
                    error = %e,
                    offset = cursor.next(),
                    backoff_ms = settings.backoff.as_millis() as u64,
                    "fetching updates failed, retrying"
                );
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(settings.backoff) => {}
                }
            }
        }
    }

    info!(offset = cursor.next(), "polling stopped");
    cursor
}
