use std::{env, fmt, fs, net::SocketAddr, path::Path, str::FromStr, time::Duration};

use crate::{chunking::DEFAULT_MESSAGE_LIMIT, errors::Error, Result};

pub const DEFAULT_JOBICY_BASE_URL: &str = "https://jobicy.p.rapidapi.com/api/v2/remote-jobs";
pub const DEFAULT_JOBICY_HOST: &str = "jobicy.p.rapidapi.com";

/// How the polling loop hands updates to the dispatcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Handle each update inside the fetch cycle, one after another.
    Inline,
    /// Fire-and-forget task per update. No ordering across updates.
    #[default]
    Detached,
    /// One queue per chat: ordered within a chat, concurrent across chats.
    PerChat,
}

impl FromStr for DispatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "detached" => Ok(Self::Detached),
            "per_chat" | "per-chat" => Ok(Self::PerChat),
            other => Err(Error::Config(format!(
                "DISPATCH_MODE must be inline, detached or per_chat (got {other:?})"
            ))),
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Detached => write!(f, "detached"),
            Self::PerChat => write!(f, "per_chat"),
        }
    }
}

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub telegram_bot_token: String,
    pub rapidapi_key: String,

    // Search provider
    pub jobicy_base_url: String,
    pub jobicy_host: String,
    pub search_timeout: Duration,

    // Outbound
    pub message_limit: usize,

    // Pull mode
    pub poll_timeout: Duration,
    pub poll_backoff: Duration,
    pub dispatch_mode: DispatchMode,

    // Push mode
    pub webhook_addr: SocketAddr,
    pub webhook_path: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source. `load()` uses the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required credentials: never defaulted.
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("TOKEN"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;
        let rapidapi_key = get("RAPIDAPI_KEY").ok_or_else(|| {
            Error::Config("RAPIDAPI_KEY environment variable is required".to_string())
        })?;

        let jobicy_base_url =
            get("JOBICY_BASE_URL").unwrap_or_else(|| DEFAULT_JOBICY_BASE_URL.to_string());
        let jobicy_host = get("JOBICY_HOST").unwrap_or_else(|| DEFAULT_JOBICY_HOST.to_string());
        let search_timeout =
            Duration::from_millis(parse_num(get("SEARCH_TIMEOUT_MS")).unwrap_or(10_000));

        let message_limit = parse_num(get("MESSAGE_LIMIT")).unwrap_or(DEFAULT_MESSAGE_LIMIT);
        if message_limit == 0 {
            return Err(Error::Config("MESSAGE_LIMIT must be positive".to_string()));
        }

        let poll_timeout = Duration::from_secs(parse_num(get("POLL_TIMEOUT_SECS")).unwrap_or(30));
        let poll_backoff =
            Duration::from_millis(parse_num(get("POLL_BACKOFF_MS")).unwrap_or(5_000));
        let dispatch_mode = match get("DISPATCH_MODE") {
            Some(v) => v.parse()?,
            None => DispatchMode::default(),
        };

        let webhook_addr = get("WEBHOOK_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("WEBHOOK_ADDR is not a socket address: {e}")))?;
        let mut webhook_path = get("WEBHOOK_PATH").unwrap_or_else(|| "/api/webhook".to_string());
        if !webhook_path.starts_with('/') {
            webhook_path.insert(0, '/');
        }

        Ok(Self {
            telegram_bot_token,
            rapidapi_key,
            jobicy_base_url,
            jobicy_host,
            search_timeout,
            message_limit,
            poll_timeout,
            poll_backoff,
            dispatch_mode,
            webhook_addr,
            webhook_path,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_num<T: FromStr>(v: Option<String>) -> Option<T> {
    v.and_then(|s| s.trim().parse::<T>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_with_only_credentials() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("RAPIDAPI_KEY", "key"),
        ]))
        .unwrap();

        assert_eq!(cfg.message_limit, 4000);
        assert_eq!(cfg.poll_timeout, Duration::from_secs(30));
        assert_eq!(cfg.poll_backoff, Duration::from_secs(5));
        assert_eq!(cfg.dispatch_mode, DispatchMode::Detached);
        assert_eq!(cfg.jobicy_base_url, DEFAULT_JOBICY_BASE_URL);
        assert_eq!(cfg.webhook_path, "/api/webhook");
        assert_eq!(cfg.webhook_addr.port(), 8080);
    }

    #[test]
    fn legacy_token_variable_is_accepted() {
        let cfg = Config::from_lookup(lookup(&[("TOKEN", "t"), ("RAPIDAPI_KEY", "k")])).unwrap();
        assert_eq!(cfg.telegram_bot_token, "t");
    }

    #[test]
    fn missing_credentials_are_fatal() {
        let err = Config::from_lookup(lookup(&[("RAPIDAPI_KEY", "k")])).unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("TELEGRAM_BOT_TOKEN")));

        let err = Config::from_lookup(lookup(&[("TOKEN", "t"), ("RAPIDAPI_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(m) if m.contains("RAPIDAPI_KEY")));
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("TOKEN", "t"),
            ("RAPIDAPI_KEY", "k"),
            ("MESSAGE_LIMIT", "1200"),
            ("DISPATCH_MODE", "per-chat"),
            ("WEBHOOK_ADDR", "127.0.0.1:9000"),
            ("WEBHOOK_PATH", "hook"),
        ]))
        .unwrap();
        assert_eq!(cfg.message_limit, 1200);
        assert_eq!(cfg.dispatch_mode, DispatchMode::PerChat);
        assert_eq!(cfg.webhook_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.webhook_path, "/hook");
    }

    #[test]
    fn rejects_unknown_dispatch_mode() {
        let err = Config::from_lookup(lookup(&[
            ("TOKEN", "t"),
            ("RAPIDAPI_KEY", "k"),
            ("DISPATCH_MODE", "parallel"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
