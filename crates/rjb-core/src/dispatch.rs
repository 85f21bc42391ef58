//! Command dispatch shared by push (webhook) and pull (polling) delivery.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    chunking::chunk,
    command::{self, ParsedCommand},
    domain::{ChatId, Update},
    formatting::format_listing,
    messaging::{port::MessagingPort, types::ChatAction},
    search::{JobQuery, JobSearch, DEFAULT_COUNT, MAX_COUNT},
    templates, Result,
};

/// The recognized command set. Matching is exact and case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Jobs(JobQuery),
    Unknown,
}

impl BotCommand {
    pub fn resolve(parsed: &ParsedCommand) -> Self {
        match parsed.name.as_str() {
            "/start" => Self::Start,
            "/help" => Self::Help,
            "/jobs" => Self::Jobs(jobs_query(parsed)),
            _ => Self::Unknown,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Jobs(_) => "jobs",
            Self::Unknown => "unknown",
        }
    }
}

/// Build the search query from `/jobs` options. Filters pass through untouched.
pub fn jobs_query(parsed: &ParsedCommand) -> JobQuery {
    let filter = |key: &str| parsed.option(key).map(str::to_string);
    JobQuery {
        count: count_option(parsed.option("count")),
        geo: filter("geo"),
        industry: filter("industry"),
        tag: filter("tag"),
    }
}

/// `--count`: 1..=50, anything else (missing, non-numeric, out of range) is the default.
fn count_option(raw: Option<&str>) -> u8 {
    raw.and_then(|v| v.parse::<u8>().ok())
        .filter(|n| (1..=MAX_COUNT).contains(n))
        .unwrap_or(DEFAULT_COUNT)
}

/// Handler core. Stateless per update; cheap to share behind an `Arc`.
pub struct Dispatcher {
    messenger: Arc<dyn MessagingPort>,
    search: Arc<dyn JobSearch>,
    message_limit: usize,
}

impl Dispatcher {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        search: Arc<dyn JobSearch>,
        message_limit: usize,
    ) -> Self {
        Self {
            messenger,
            search,
            message_limit,
        }
    }

    /// Push entry point: exactly one update per call. Updates without text are acknowledged
    /// without doing anything.
    pub async fn handle_push(&self, update: &Update) -> Result<()> {
        if update.text.is_empty() {
            debug!(update_id = update.id.0, "push update without text, skipping");
            return Ok(());
        }
        self.dispatch(update).await
    }

    /// Parse the update text, run the matching handler and send the reply.
    ///
    /// Send failures propagate; a failed send aborts the remaining segments but does not
    /// roll back the ones already delivered.
    pub async fn dispatch(&self, update: &Update) -> Result<()> {
        let parsed = command::parse(&update.text);
        let cmd = BotCommand::resolve(&parsed);
        info!(
            update_id = update.id.0,
            chat_id = update.chat_id.0,
            from = %update.sender_label(),
            command = cmd.label(),
            "dispatching update"
        );

        let chat = update.chat_id;
        match cmd {
            BotCommand::Start => self.send(chat, templates::WELCOME).await,
            BotCommand::Help => self.send(chat, templates::HELP).await,
            BotCommand::Jobs(query) => self.run_jobs(chat, &query).await,
            BotCommand::Unknown => self.send(chat, templates::UNKNOWN_COMMAND).await,
        }
    }

    async fn run_jobs(&self, chat: ChatId, query: &JobQuery) -> Result<()> {
        if self.messenger.capabilities().supports_chat_actions {
            if let Err(e) = self
                .messenger
                .send_chat_action(chat, ChatAction::Typing)
                .await
            {
                debug!(chat_id = chat.0, error = %e, "typing indicator failed");
            }
        }

        let records = match self.search.search(query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(chat_id = chat.0, error = %e, "job search failed");
                return self.send(chat, templates::SEARCH_FAILED).await;
            }
        };

        if records.is_empty() {
            return self.send(chat, templates::NO_RESULTS).await;
        }

        let blocks: Vec<_> = records.iter().map(format_listing).collect();
        let segments = chunk(
            &blocks,
            self.effective_limit(),
            templates::results_header,
            templates::continuation_header,
        );
        debug!(
            chat_id = chat.0,
            records = records.len(),
            segments = segments.len(),
            "sending job list"
        );

        for segment in &segments {
            self.send(chat, segment).await?;
        }
        Ok(())
    }

    fn effective_limit(&self) -> usize {
        self.message_limit
            .min(self.messenger.capabilities().max_message_len)
    }

    async fn send(&self, chat: ChatId, html: &str) -> Result<()> {
        self.messenger.send_html(chat, html).await.map(|_| ())
    }
}
