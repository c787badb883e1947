//! Deployment target resolution.
//!
//! Maps harness flags to a base URL and environment tag. The selection is
//! recomputed on every call so it always reflects the arguments it was given,
//! nothing is cached.

use crate::args::{AliasStyle, HarnessArgs};
use crate::result::{ConducirError, ConducirResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Default base URL when no flags are given.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/";

/// Deployment target label for a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvTag {
    /// Local development target
    Dev,
    /// Staging target
    Stage,
    /// Production target
    Production,
}

impl fmt::Display for EnvTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => write!(f, "dev"),
            Self::Stage => write!(f, "stage"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Resolved deployment target: base URL plus tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSelection {
    /// Absolute base URL with a trailing slash
    pub base_url: String,
    /// Three-valued deployment tag
    pub tag: EnvTag,
}

impl EnvironmentSelection {
    /// True when the base URL points at a local loopback host.
    #[must_use]
    pub fn is_loopback(&self) -> bool {
        is_loopback_url(&self.base_url)
    }
}

/// One alias table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AliasEntry {
    name: String,
    base_url: String,
    tag: EnvTag,
}

/// Alias name to `(base_url, tag)` mapping.
///
/// The two CLI generations (`--env=<alias>` and the legacy standalone
/// switches) address this single table; [`AliasStyle`] only records which
/// surface supplied the alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AliasTable {
    /// The built-in alias table.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                AliasEntry {
                    name: "stage".to_string(),
                    base_url: "http://staging.sonos.com/v1/".to_string(),
                    tag: EnvTag::Stage,
                },
                AliasEntry {
                    name: "production".to_string(),
                    base_url: "http://static.sonos.com/v1/".to_string(),
                    tag: EnvTag::Production,
                },
                AliasEntry {
                    name: "static".to_string(),
                    base_url: "http://localhost:8000/".to_string(),
                    tag: EnvTag::Dev,
                },
            ],
        }
    }

    /// An empty table, for fully custom deployments.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace an alias entry.
    #[must_use]
    pub fn with_entry(
        mut self,
        name: impl Into<String>,
        base_url: impl Into<String>,
        tag: EnvTag,
    ) -> Self {
        let name = name.into();
        self.entries.retain(|e| e.name != name);
        self.entries.push(AliasEntry {
            name,
            base_url: base_url.into(),
            tag,
        });
        self
    }

    /// Look up an alias by name.
    fn lookup(&self, name: &str) -> Option<(&str, EnvTag)> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| (e.base_url.as_str(), e.tag))
    }

    /// Number of known aliases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no aliases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves harness flags into an [`EnvironmentSelection`].
#[derive(Debug, Clone, Default)]
pub struct EnvironmentResolver {
    table: AliasTable,
}

impl EnvironmentResolver {
    /// Create a resolver over the built-in alias table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver over a custom alias table.
    #[must_use]
    pub fn with_table(table: AliasTable) -> Self {
        Self { table }
    }

    /// Resolve the deployment target from parsed harness flags.
    ///
    /// Precedence, highest first:
    /// 1. an explicit known alias maps to its fixed `(base_url, tag)` pair,
    ///    even when a URL override is also present;
    /// 2. an explicit base URL is used verbatim (a trailing slash is appended
    ///    if absent) and tagged `Dev` when it points at a loopback host,
    ///    `Production` otherwise;
    /// 3. with neither, the default local pair applies.
    ///
    /// An alias that is not in the table is an error, as is a URL override
    /// that is not an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConducirError::UnknownEnvironment`] or
    /// [`ConducirError::InvalidBaseUrl`].
    pub fn resolve(&self, args: &HarnessArgs) -> ConducirResult<EnvironmentSelection> {
        let alias = args.alias();
        if let Some((name, style)) = alias {
            if style == AliasStyle::Legacy {
                tracing::debug!(alias = name, "legacy environment switch in use");
            }
        }
        self.resolve_parts(alias.map(|(name, _)| name), args.base_url())
    }

    /// Resolve from already-extracted alias and URL parts.
    ///
    /// # Errors
    ///
    /// Same as [`EnvironmentResolver::resolve`].
    pub fn resolve_parts(
        &self,
        alias: Option<&str>,
        url: Option<&str>,
    ) -> ConducirResult<EnvironmentSelection> {
        if let Some(name) = alias {
            let (base_url, tag) =
                self.table
                    .lookup(name)
                    .ok_or_else(|| ConducirError::UnknownEnvironment {
                        name: name.to_string(),
                    })?;
            tracing::debug!(alias = name, %tag, base_url, "resolved environment alias");
            return Ok(EnvironmentSelection {
                base_url: base_url.to_string(),
                tag,
            });
        }

        if let Some(url) = url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConducirError::InvalidBaseUrl {
                    url: url.to_string(),
                });
            }
            let mut base_url = url.to_string();
            if !base_url.ends_with('/') {
                base_url.push('/');
            }
            // A loopback host always means a dev run, whatever else was asked.
            let tag = if is_loopback_url(&base_url) {
                EnvTag::Dev
            } else {
                EnvTag::Production
            };
            tracing::debug!(%tag, %base_url, "resolved explicit base URL");
            return Ok(EnvironmentSelection { base_url, tag });
        }

        Ok(EnvironmentSelection {
            base_url: DEFAULT_BASE_URL.to_string(),
            tag: EnvTag::Dev,
        })
    }
}

/// True when the URL's host is a local loopback marker.
#[must_use]
pub fn is_loopback_url(url: &str) -> bool {
    static LOOPBACK: OnceLock<Regex> = OnceLock::new();
    let re = LOOPBACK.get_or_init(|| {
        Regex::new(r"^[a-z+]+://(localhost|127\.0\.0\.1|0\.0\.0\.0|\[::1\])(:\d+)?(/|$)")
            .expect("loopback pattern compiles")
    });
    re.is_match(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use proptest::prelude::*;

    fn args(argv: &[&str]) -> HarnessArgs {
        let mut full = vec!["e2e"];
        full.extend_from_slice(argv);
        HarnessArgs::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_stage_alias_fixed_pair() {
        let selection = EnvironmentResolver::new()
            .resolve(&args(&["--env", "stage"]))
            .unwrap();
        assert_eq!(selection.base_url, "http://staging.sonos.com/v1/");
        assert_eq!(selection.tag, EnvTag::Stage);
    }

    #[test]
    fn test_production_alias_fixed_pair() {
        let selection = EnvironmentResolver::new()
            .resolve(&args(&["--env", "production"]))
            .unwrap();
        assert_eq!(selection.base_url, "http://static.sonos.com/v1/");
        assert_eq!(selection.tag, EnvTag::Production);
    }

    #[test]
    fn test_static_alias_is_local_dev() {
        let selection = EnvironmentResolver::new()
            .resolve(&args(&["--env", "static"]))
            .unwrap();
        assert_eq!(selection.base_url, "http://localhost:8000/");
        assert_eq!(selection.tag, EnvTag::Dev);
        assert!(selection.is_loopback());
    }

    #[test]
    fn test_legacy_switches_hit_same_table() {
        let resolver = EnvironmentResolver::new();
        let flagged = resolver.resolve(&args(&["--env", "stage"])).unwrap();
        let legacy = resolver.resolve(&args(&["--stage"])).unwrap();
        assert_eq!(flagged, legacy);
    }

    #[test]
    fn test_no_flags_defaults_to_local_dev() {
        let selection = EnvironmentResolver::new().resolve(&args(&[])).unwrap();
        assert_eq!(selection.base_url, "http://localhost:3000/");
        assert_eq!(selection.tag, EnvTag::Dev);
    }

    #[test]
    fn test_unknown_alias_is_an_error() {
        let err = EnvironmentResolver::new()
            .resolve(&args(&["--env", "qa7"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConducirError::UnknownEnvironment { name } if name == "qa7"
        ));
    }

    #[test]
    fn test_url_override_appends_trailing_slash() {
        let selection = EnvironmentResolver::new()
            .resolve(&args(&["--url", "https://qa.example.com/v2"]))
            .unwrap();
        assert_eq!(selection.base_url, "https://qa.example.com/v2/");
        assert_eq!(selection.tag, EnvTag::Production);
    }

    #[test]
    fn test_url_override_keeps_existing_slash() {
        let selection = EnvironmentResolver::new()
            .resolve(&args(&["--url", "https://qa.example.com/"]))
            .unwrap();
        assert_eq!(selection.base_url, "https://qa.example.com/");
    }

    #[test]
    fn test_loopback_url_always_tags_dev() {
        let resolver = EnvironmentResolver::new();
        for url in [
            "http://localhost:9999",
            "http://127.0.0.1/app",
            "http://0.0.0.0:4444/wd/hub",
        ] {
            let selection = resolver.resolve(&args(&["--url", url])).unwrap();
            assert_eq!(selection.tag, EnvTag::Dev, "url: {url}");
        }
    }

    #[test]
    fn test_alias_wins_over_url() {
        let selection = EnvironmentResolver::new()
            .resolve(&args(&["--env", "stage", "--url", "http://localhost:3000"]))
            .unwrap();
        assert_eq!(selection.base_url, "http://staging.sonos.com/v1/");
        assert_eq!(selection.tag, EnvTag::Stage);
    }

    #[test]
    fn test_invalid_url_is_an_error() {
        let err = EnvironmentResolver::new()
            .resolve(&args(&["--url", "ftp://example.com"]))
            .unwrap_err();
        assert!(matches!(err, ConducirError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_custom_table_entry() {
        let table = AliasTable::builtin().with_entry("qa", "http://qa.example.com/", EnvTag::Stage);
        let resolver = EnvironmentResolver::with_table(table);
        let selection = resolver.resolve_parts(Some("qa"), None).unwrap();
        assert_eq!(selection.base_url, "http://qa.example.com/");
        assert_eq!(selection.tag, EnvTag::Stage);
    }

    #[test]
    fn test_with_entry_replaces_existing() {
        let table =
            AliasTable::builtin().with_entry("stage", "http://stage2.example.com/", EnvTag::Stage);
        assert_eq!(table.len(), 3);
        let resolver = EnvironmentResolver::with_table(table);
        let selection = resolver.resolve_parts(Some("stage"), None).unwrap();
        assert_eq!(selection.base_url, "http://stage2.example.com/");
    }

    #[test]
    fn test_env_tag_display() {
        assert_eq!(EnvTag::Dev.to_string(), "dev");
        assert_eq!(EnvTag::Stage.to_string(), "stage");
        assert_eq!(EnvTag::Production.to_string(), "production");
    }

    #[test]
    fn test_env_tag_serde_lowercase() {
        assert_eq!(serde_json::to_string(&EnvTag::Production).unwrap(), "\"production\"");
        let tag: EnvTag = serde_json::from_str("\"dev\"").unwrap();
        assert_eq!(tag, EnvTag::Dev);
    }

    #[test]
    fn test_is_loopback_url_rejects_lookalikes() {
        assert!(!is_loopback_url("http://localhost.example.com/"));
        assert!(!is_loopback_url("http://notlocalhost:3000/"));
        assert!(is_loopback_url("http://localhost/"));
    }

    proptest! {
        #[test]
        fn prop_resolved_url_always_ends_with_slash(path in "[a-z0-9/]{0,12}") {
            let url = format!("http://qa.example.com/{path}");
            let selection = EnvironmentResolver::new()
                .resolve_parts(None, Some(&url))
                .unwrap();
            prop_assert!(selection.base_url.ends_with('/'));
        }

        #[test]
        fn prop_loopback_port_never_changes_dev_tag(port in 1u16..=65535) {
            let url = format!("http://localhost:{port}");
            let selection = EnvironmentResolver::new()
                .resolve_parts(None, Some(&url))
                .unwrap();
            prop_assert_eq!(selection.tag, EnvTag::Dev);
        }
    }
}
