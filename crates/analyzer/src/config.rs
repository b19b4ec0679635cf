//! Environment-driven configuration.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// User agent sent to SEC EDGAR when none is configured.
///
/// The SEC asks for a contact address; deployments should set
/// `EDGAR_USER_AGENT` to their own.
pub const DEFAULT_EDGAR_USER_AGENT: &str = "stock-analyzer/0.1 (admin@example.com)";

/// Runtime configuration for [`crate::StockAnalyzer`].
///
/// Built explicitly or read from the environment (with `.env` support via
/// `dotenvy`). Absent keys simply leave the corresponding provider
/// unconfigured; the orchestrator degrades to whatever sources remain.
#[derive(Clone, Default)]
pub struct Config {
    /// Polygon.io API key (`POLYGON_API_KEY`).
    pub polygon_api_key: Option<String>,
    /// FRED API key (`FRED_API_KEY`).
    pub fred_api_key: Option<String>,
    /// User agent for SEC EDGAR requests (`EDGAR_USER_AGENT`).
    pub edgar_user_agent: String,
    /// SQLite database path (`ANALYZER_DB_PATH`); `None` disables the store.
    pub db_path: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("polygon_api_key", &self.polygon_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("fred_api_key", &self.fred_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("edgar_user_agent", &self.edgar_user_agent)
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the environment, reading a `.env` file
    /// first when present.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            polygon_api_key: env_var("POLYGON_API_KEY"),
            fred_api_key: env_var("FRED_API_KEY"),
            edgar_user_agent: env_var("EDGAR_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_EDGAR_USER_AGENT.to_string()),
            db_path: env_var("ANALYZER_DB_PATH").map(PathBuf::from),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
