//! Command-line surface for the e2e harness.
//!
//! Two generations of flags are recognized: the current `--env <alias>` /
//! `--url <url>` pair and the legacy standalone switches (`--stage`,
//! `--production`, `--static`). Both feed the same alias table in
//! [`crate::environment::EnvironmentResolver`].

use clap::Parser;

/// Which CLI surface supplied an environment alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasStyle {
    /// `--env=<alias>` flag
    Flag,
    /// Legacy standalone switch (`--stage`, `--production`, `--static`)
    Legacy,
}

/// Harness flags, typically parsed from the test runner's trailing arguments.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "e2e", about = "Browser e2e suite configuration")]
pub struct HarnessArgs {
    /// Named deployment target to exercise (stage, production, static)
    #[arg(long)]
    pub env: Option<String>,

    /// Absolute base URL override
    #[arg(long)]
    pub url: Option<String>,

    /// Enable diagnostic logging of session events
    #[arg(long, env = "VERBOSE", value_parser = clap::builder::FalseyValueParser::new())]
    pub verbose: bool,

    /// Legacy switch for the staging target
    #[arg(long, hide = true)]
    pub stage: bool,

    /// Legacy switch for the production target
    #[arg(long, hide = true)]
    pub production: bool,

    /// Legacy switch for the static local target
    #[arg(long = "static", hide = true)]
    pub r#static: bool,
}

impl HarnessArgs {
    /// Parse from the process arguments.
    #[must_use]
    pub fn from_cli() -> Self {
        Self::parse()
    }

    /// The environment alias, if any was given, with the surface it came from.
    ///
    /// `--env` takes priority over the legacy switches; among the legacy
    /// switches the first set one wins, in declaration order.
    #[must_use]
    pub fn alias(&self) -> Option<(&str, AliasStyle)> {
        if let Some(env) = self.env.as_deref() {
            return Some((env, AliasStyle::Flag));
        }
        if self.stage {
            return Some(("stage", AliasStyle::Legacy));
        }
        if self.production {
            return Some(("production", AliasStyle::Legacy));
        }
        if self.r#static {
            return Some(("static", AliasStyle::Legacy));
        }
        None
    }

    /// The explicit base URL override, if any was given.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
