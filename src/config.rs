use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::errors::{DriverError, Result};

const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_CONCURRENT_REQUESTS: u32 = 8;

/// Driver configuration. Built from `Default` or [`DriverConfig::from_env`]
/// and passed explicitly to [`crate::Driver::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    pub browser_type: BrowserType,
    pub navigation_timeout_ms: u64,
    /// Profile directory reused across sessions (cookies, local storage).
    /// `None` launches with a fresh ephemeral profile.
    pub persistent_context_dir: Option<PathBuf>,
    pub launch: LaunchArgs,
    /// Register the request blocklist on the page at launch.
    pub block_resources: bool,
    /// Consumed by a caller-side download orchestrator, not by the driver.
    pub concurrent_requests: u32,
    /// Consumed by an external CAPTCHA-solving collaborator, not by the driver.
    pub captcha_solver_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchArgs {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserType {
    Chromium,
    Chrome,
}

impl BrowserType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chromium" => Some(BrowserType::Chromium),
            "chrome" => Some(BrowserType::Chrome),
            _ => None,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browser_type: BrowserType::Chromium,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            persistent_context_dir: None,
            launch: LaunchArgs::default(),
            block_resources: true,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            captcha_solver_api_key: None,
        }
    }
}

impl Default for LaunchArgs {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1280, 720),
            extra_args: vec![],
        }
    }
}

impl DriverConfig {
    /// Defaults overridden by environment variables. A `.env` file in the
    /// working directory is loaded first if present. Malformed numeric and
    /// boolean values keep the default for that key; an unknown
    /// `BROWSER_TYPE` is an error.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(value) = env::var("BROWSER_TYPE") {
            config.browser_type = BrowserType::parse(&value).ok_or_else(|| {
                DriverError::InvalidConfig(format!("unsupported BROWSER_TYPE '{value}'"))
            })?;
        }
        if let Ok(value) = env::var("NAVIGATION_TIMEOUT") {
            config.navigation_timeout_ms = parse_u64("NAVIGATION_TIMEOUT", &value)
                .unwrap_or(config.navigation_timeout_ms);
        }
        if let Ok(value) = env::var("PERSISTENT_CONTEXT_DIR") {
            if !value.trim().is_empty() {
                config.persistent_context_dir = Some(PathBuf::from(value));
            }
        }
        if let Ok(value) = env::var("HEADLESS") {
            config.launch.headless = parse_bool("HEADLESS", &value).unwrap_or(config.launch.headless);
        }
        if let Ok(value) = env::var("LAUNCH_ARGS") {
            config.launch.extra_args = split_args(&value);
        }
        if let Ok(value) = env::var("BLOCK_RESOURCES") {
            config.block_resources =
                parse_bool("BLOCK_RESOURCES", &value).unwrap_or(config.block_resources);
        }
        if let Ok(value) = env::var("CONCURRENT_REQUESTS") {
            config.concurrent_requests = parse_u64("CONCURRENT_REQUESTS", &value)
                .map(|n| n as u32)
                .unwrap_or(config.concurrent_requests);
        }
        if let Ok(value) = env::var("CAPTCHA_SOLVER_API_KEY") {
            if !value.trim().is_empty() {
                config.captcha_solver_api_key = Some(value);
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.navigation_timeout_ms == 0 {
            return Err(DriverError::InvalidConfig(
                "NAVIGATION_TIMEOUT must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn split_args(value: &str) -> Vec<String> {
    value
        .split([',', ' '])
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_u64(key: &str, value: &str) -> Option<u64> {
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(key, value, "ignoring malformed integer setting");
            None
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => {
            tracing::warn!(key, value, "ignoring malformed boolean setting");
            None
        }
    }
}
