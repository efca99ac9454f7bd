//! Environment-driven configuration.
//!
//! Everything the binary needs to reach its collaborators lives here:
//! the completion endpoint, the model identifier, and the SQLite path.
//! Values come from environment variables (a `.env` file is loaded by
//! the binary before this runs); each has a sensible default except the
//! API key, whose absence is reported at call time rather than at startup.

use std::env;
use std::path::PathBuf;

pub const APP_NAME: &str = "chartbrief";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const ENV_API_URL: &str = "CHARTBRIEF_API_URL";
const ENV_API_KEY: &str = "CHARTBRIEF_API_KEY";
const ENV_MODEL: &str = "CHARTBRIEF_MODEL";
const ENV_DB_PATH: &str = "CHARTBRIEF_DB";

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Runtime configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the OpenAI-compatible completion API.
    pub api_base_url: String,
    /// Bearer token for the completion API. `None` until configured;
    /// summarization degrades to a displayable failure without it.
    pub api_key: Option<String>,
    /// Model identifier sent with each completion request.
    pub model: String,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from environment variables, falling back to
    /// defaults for everything except the API key.
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var(ENV_API_URL)
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key: env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty()),
            model: env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            db_path: env::var(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_db_path()),
        }
    }
}

/// Default database location: `<user data dir>/chartbrief/chartbrief.db`,
/// or the current directory when no data dir can be determined.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chartbrief.db")
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info")
}
