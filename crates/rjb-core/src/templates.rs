//! User-facing texts (Telegram HTML).

pub const WELCOME: &str = "Welcome to Remote Jobs Bot!

<b>Available Commands:</b>
• /jobs - Get latest remote jobs
• /jobs --count 5 - Get specific number of jobs
• /jobs --geo USA - Filter by location
• /jobs --industry tech - Filter by industry
• /jobs --tag python - Filter by technology tag
• /help - Show this help message

<b>Example:</b> <code>/jobs --count 3 --geo USA --tag golang</code>";

pub const HELP: &str = "<b>Available Commands:</b>

<b>/jobs</b> - Get latest remote jobs (default: 5 jobs)

<b>Options:</b>
• <code>--count N</code> - Number of jobs (1-50)
• <code>--geo LOCATION</code> - Filter by location (USA, Europe, etc.)
• <code>--industry INDUSTRY</code> - Filter by industry
• <code>--tag TECHNOLOGY</code> - Filter by technology (python, golang, etc.)

<b>Examples:</b>
• <code>/jobs</code>
• <code>/jobs --count 10</code>
• <code>/jobs --geo USA --tag golang</code>
• <code>/jobs --industry tech --count 3</code>";

pub const UNKNOWN_COMMAND: &str = "❓ Unknown command. Type /help for available commands.";

pub const SEARCH_FAILED: &str =
    "❌ Sorry, I couldn't fetch jobs right now. Please try again later.";

pub const NO_RESULTS: &str = "😔 No jobs found with the specified criteria. Try different filters.";

pub fn results_header(total: usize) -> String {
    format!("🎯 Found {total} remote jobs:\n\n")
}

pub fn continuation_header(position: usize, total: usize) -> String {
    format!("📋 Continuing jobs list ({position}/{total}):\n\n")
}

/// Served on `GET /` by the webhook server.
pub const STATUS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Remote Jobs Telegram Bot</title></head>
<body>
<h1>Remote Jobs Telegram Bot</h1>
<p>Bot is running and ready to receive webhooks.</p>
<ul>
<li><code>/start</code> - welcome message</li>
<li><code>/jobs</code> - latest remote jobs</li>
<li><code>/help</code> - command reference</li>
</ul>
</body>
</html>
"#;
