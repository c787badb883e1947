//! Harness configuration.
//!
//! Everything the process environment contributes is captured here once at
//! startup and read-only afterwards; components receive the configuration
//! value explicitly instead of probing globals.

use crate::args::HarnessArgs;
use crate::credentials::Credentials;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default remote grid WebDriver endpoint.
pub const REMOTE_HUB_URL: &str = "http://ondemand.saucelabs.com:80/wd/hub";

/// Default local WebDriver endpoint.
pub const LOCAL_HUB_URL: &str = "http://0.0.0.0:4444/wd/hub";

/// HTTP tuning applied to the underlying automation client.
///
/// The session layer itself never retries; a fixed retry count and delay on
/// the client is the whole policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTuning {
    /// Per-call timeout
    pub timeout: Duration,
    /// Extra connection attempts after the first failure
    pub retries: u32,
    /// Delay between attempts
    pub retry_delay: Duration,
}

impl Default for HttpTuning {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retries: 5,
            retry_delay: Duration::from_secs(15),
        }
    }
}

/// Configuration for one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Grid credentials; absent means local-only execution
    pub credentials: Option<Credentials>,
    /// Emit diagnostic logging of session events
    pub verbose: bool,
    /// Raw `DESIRED` capability override, captured at startup
    pub desired_json: Option<String>,
    /// Raw `BROWSERKEY` descriptor, captured at startup
    pub browser_key_json: Option<String>,
    /// HTTP tuning for the automation client
    pub http: HttpTuning,
    /// Remote grid WebDriver endpoint
    pub remote_hub: String,
    /// Local WebDriver endpoint
    pub local_hub: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessConfig {
    /// Create a configuration with defaults and no credentials.
    #[must_use]
    pub fn new() -> Self {
        Self {
            credentials: None,
            verbose: false,
            desired_json: None,
            browser_key_json: None,
            http: HttpTuning::default(),
            remote_hub: REMOTE_HUB_URL.to_string(),
            local_hub: LOCAL_HUB_URL.to_string(),
        }
    }

    /// Capture the process environment and parsed flags once.
    ///
    /// Reads `DESIRED` and `BROWSERKEY` raw (parsing happens at build time so
    /// malformed values fail at the point of use), and honors either the
    /// `--verbose` flag or the `VERBOSE` variable.
    #[must_use]
    pub fn from_env(args: &HarnessArgs) -> Self {
        let mut config = Self::new();
        config.desired_json = std::env::var("DESIRED").ok();
        config.browser_key_json = std::env::var("BROWSERKEY").ok();
        config.verbose = args.verbose || std::env::var("VERBOSE").is_ok_and(|v| !v.is_empty());
        config
    }

    /// Set grid credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Enable or disable verbose event logging.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the raw `DESIRED` capability override.
    #[must_use]
    pub fn with_desired_json(mut self, raw: impl Into<String>) -> Self {
        self.desired_json = Some(raw.into());
        self
    }

    /// Set the raw `BROWSERKEY` descriptor.
    #[must_use]
    pub fn with_browser_key_json(mut self, raw: impl Into<String>) -> Self {
        self.browser_key_json = Some(raw.into());
        self
    }

    /// Set the HTTP tuning.
    #[must_use]
    pub const fn with_http(mut self, http: HttpTuning) -> Self {
        self.http = http;
        self
    }

    /// Override the remote grid endpoint.
    #[must_use]
    pub fn with_remote_hub(mut self, url: impl Into<String>) -> Self {
        self.remote_hub = url.into();
        self
    }

    /// Override the local WebDriver endpoint.
    #[must_use]
    pub fn with_local_hub(mut self, url: impl Into<String>) -> Self {
        self.local_hub = url.into();
        self
    }

    /// Credentials usable for remote execution, if any.
    ///
    /// Empty credentials are treated as absent.
    #[must_use]
    pub fn grid_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| c.is_complete())
    }
}
