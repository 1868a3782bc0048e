use secrecy::SecretString;
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant specializing in debate topics, formats, and strategies.";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The streaming proxies exposed under `/api/streaming/{route}`.
///
/// Every route relays frames the same way; they differ only in the upstream
/// endpoint they dial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamRoute {
    Proxy,
    Transcribe,
    Tts,
    Translate,
}

impl StreamRoute {
    pub const ALL: [StreamRoute; 4] = [
        StreamRoute::Proxy,
        StreamRoute::Transcribe,
        StreamRoute::Tts,
        StreamRoute::Translate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StreamRoute::Proxy => "proxy",
            StreamRoute::Transcribe => "transcribe",
            StreamRoute::Tts => "tts",
            StreamRoute::Translate => "translate",
        }
    }

    /// The environment variable overriding this route's upstream URL.
    pub fn url_var(self) -> &'static str {
        match self {
            StreamRoute::Proxy => "UPSTREAM_PROXY_URL",
            StreamRoute::Transcribe => "UPSTREAM_TRANSCRIBE_URL",
            StreamRoute::Tts => "UPSTREAM_TTS_URL",
            StreamRoute::Translate => "UPSTREAM_TRANSLATE_URL",
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            StreamRoute::Proxy => "wss://api.sarvam.ai/v1/streaming?language=en",
            StreamRoute::Transcribe => "wss://api.sarvam.ai/speech-to-text/ws?language-code=hi-IN",
            StreamRoute::Tts => "wss://api.sarvam.ai/text-to-speech/ws?model=bulbul:v2",
            StreamRoute::Translate => {
                "wss://api.sarvam.ai/speech-to-text-translate/ws?model=saaras:v2.5"
            }
        }
    }
}

impl fmt::Display for StreamRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamRoute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamRoute::ALL
            .into_iter()
            .find(|route| route.as_str() == s)
            .ok_or_else(|| format!("unknown stream route '{}'", s))
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub api_key: SecretString,
    pub upstream_urls: BTreeMap<StreamRoute, String>,
    pub connect_timeout: Duration,
    pub send_timeout: Duration,
    pub speech_url: String,
    pub chat_api_base: String,
    pub chat_model: String,
    pub system_prompt: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let api_key = std::env::var("UPSTREAM_API_KEY")
            .or_else(|_| std::env::var("SARVAM_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| {
                ConfigError::MissingVar(
                    "UPSTREAM_API_KEY (or SARVAM_API_KEY) must be set".to_string(),
                )
            })?;

        let mut upstream_urls = BTreeMap::new();
        for route in StreamRoute::ALL {
            let url = std::env::var(route.url_var())
                .unwrap_or_else(|_| route.default_url().to_string());
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(ConfigError::InvalidValue(
                    route.url_var().to_string(),
                    format!("'{}' is not a ws:// or wss:// URL", url),
                ));
            }
            upstream_urls.insert(route, url);
        }

        let connect_timeout = seconds_var("CONNECT_TIMEOUT_SECS", 10)?;
        let send_timeout = seconds_var("SEND_TIMEOUT_SECS", 15)?;

        let speech_url = std::env::var("SPEECH_URL")
            .unwrap_or_else(|_| voice_upstream::DEFAULT_SPEECH_URL.to_string());
        if !(speech_url.starts_with("http://") || speech_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "SPEECH_URL".to_string(),
                format!("'{}' is not an http:// or https:// URL", speech_url),
            ));
        }

        let chat_api_base = std::env::var("CHAT_API_BASE")
            .unwrap_or_else(|_| "https://api.sarvam.ai/v1".to_string());
        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "sarvam-m".to_string());
        let system_prompt = std::env::var("CHAT_SYSTEM_PROMPT")
            .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            api_key,
            upstream_urls,
            connect_timeout,
            send_timeout,
            speech_url,
            chat_api_base,
            chat_model,
            system_prompt,
            log_level,
        })
    }

    /// The upstream URL for a route, falling back to its built-in default.
    pub fn upstream_url(&self, route: StreamRoute) -> &str {
        self.upstream_urls
            .get(&route)
            .map(String::as_str)
            .unwrap_or_else(|| route.default_url())
    }
}

/// Reads a positive whole number of seconds.
fn seconds_var(name: &str, default: u64) -> Result<Duration, ConfigError> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive number of seconds", raw),
        )),
    }
}
