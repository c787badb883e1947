//! Desired-capabilities descriptor for remote browser sessions.
//!
//! The descriptor tells the grid which browser, platform and device to
//! provision. Suites usually take the default and override it through the
//! `DESIRED` environment variable; the builder then stamps the test name and
//! tags on whatever was selected.

use crate::credentials::Credentials;
use crate::environment::EnvironmentSelection;
use crate::result::{ConducirError, ConducirResult};
use serde::{Deserialize, Serialize};

/// Test name used when running without grid credentials.
const LOCAL_TEST_NAME: &str = "local e2e";

/// Account tag used when running without grid credentials.
const LOCAL_ACCOUNT_TAG: &str = "local";

/// Desired-capabilities descriptor consumed by the session-acquisition call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Browser to provision
    pub browser_name: String,
    /// Browser version, grid default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Platform to provision, grid default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Whether the target environment is a mobile browser
    #[serde(default)]
    pub mobile: bool,
    /// Test name shown on the grid dashboard
    #[serde(default)]
    pub name: String,
    /// Ordered tags: account identifier, then environment tag
    #[serde(default)]
    pub tags: Vec<String>,
    /// Vendor-specific fields passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Capabilities {
    /// Plain firefox, the default when nothing else is asked for.
    #[must_use]
    pub fn firefox() -> Self {
        Self::named("firefox")
    }

    /// Chrome on the pinned desktop platform.
    #[must_use]
    pub fn chrome() -> Self {
        let mut caps = Self::named("chrome");
        caps.platform = Some("OS X 10.9".to_string());
        caps
    }

    /// Safari 7.
    #[must_use]
    pub fn safari() -> Self {
        let mut caps = Self::named("safari");
        caps.version = Some("7".to_string());
        caps
    }

    /// Internet Explorer 11 (the grid's default IE version).
    #[must_use]
    pub fn ie11() -> Self {
        Self::named("internet explorer")
    }

    /// Internet Explorer 10.
    #[must_use]
    pub fn ie10() -> Self {
        let mut caps = Self::named("internet explorer");
        caps.version = Some("10".to_string());
        caps
    }

    /// Internet Explorer 9.
    #[must_use]
    pub fn ie9() -> Self {
        let mut caps = Self::named("internet explorer");
        caps.version = Some("9".to_string());
        caps
    }

    /// Look up a known browser environment by its short name.
    ///
    /// Returns `None` for names outside the matrix; callers that need an
    /// arbitrary browser construct the descriptor directly.
    #[must_use]
    pub fn known(name: &str) -> Option<Self> {
        match name {
            "firefox" => Some(Self::firefox()),
            "chrome" => Some(Self::chrome()),
            "safari" => Some(Self::safari()),
            "ie11" => Some(Self::ie11()),
            "ie10" => Some(Self::ie10()),
            "ie9" => Some(Self::ie9()),
            _ => None,
        }
    }

    fn named(browser_name: &str) -> Self {
        Self {
            browser_name: browser_name.to_string(),
            version: None,
            platform: None,
            mobile: false,
            name: String::new(),
            tags: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Serialize to the wire map consumed by the WebDriver session request.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if serialization fails.
    pub fn to_wire(&self) -> ConducirResult<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(ConducirError::DesiredParse {
                message: format!("capabilities serialized to non-object JSON: {other}"),
            }),
        }
    }
}

/// Builds the final descriptor from the raw override plus run context.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityBuilder<'a> {
    credentials: Option<&'a Credentials>,
    selection: &'a EnvironmentSelection,
}

impl<'a> CapabilityBuilder<'a> {
    /// Create a builder for one session start.
    #[must_use]
    pub fn new(credentials: Option<&'a Credentials>, selection: &'a EnvironmentSelection) -> Self {
        Self {
            credentials,
            selection,
        }
    }

    /// Build the descriptor.
    ///
    /// `raw_desired` is the raw value of the `DESIRED` override variable.
    /// When unset, the plain firefox default applies. The test name and the
    /// `[account, env]` tag pair are stamped on top of whatever was selected.
    ///
    /// # Errors
    ///
    /// Returns [`ConducirError::DesiredParse`] for malformed JSON; no partial
    /// descriptor is ever produced.
    pub fn build(&self, raw_desired: Option<&str>) -> ConducirResult<Capabilities> {
        let mut caps = match raw_desired {
            Some(raw) => {
                serde_json::from_str::<Capabilities>(raw).map_err(|e| {
                    ConducirError::DesiredParse {
                        message: e.to_string(),
                    }
                })?
            }
            None => Capabilities::firefox(),
        };

        caps.name = self
            .credentials
            .map_or_else(|| LOCAL_TEST_NAME.to_string(), |c| c.test_name.clone());
        let account = self
            .credentials
            .map_or_else(|| LOCAL_ACCOUNT_TAG.to_string(), |c| c.user.clone());
        caps.tags = vec![account, self.selection.tag.to_string()];

        Ok(caps)
    }
}

/// Probe the raw `BROWSERKEY` descriptor for the mobile flag.
///
/// An unset variable means a desktop browser. A set variable must be valid
/// JSON; its `mobile` field (absent meaning `false`) decides.
///
/// # Errors
///
/// Returns [`ConducirError::BrowserKeyParse`] for malformed JSON.
pub fn mobile_probe(raw_browser_key: Option<&str>) -> ConducirResult<bool> {
    let Some(raw) = raw_browser_key else {
        return Ok(false);
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ConducirError::BrowserKeyParse {
            message: e.to_string(),
        })?;
    Ok(value
        .get("mobile")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false))
}
