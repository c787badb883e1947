//! Conducir: configuration glue for browser end-to-end test suites.
//!
//! Conducir (Spanish: "to drive") resolves CLI flags and environment
//! variables into a deployment target, builds the desired-capabilities
//! descriptor for a remote browser-automation session, and manages the
//! session lifecycle around a WebDriver hub: acquire, record case outcomes,
//! report the aggregated status, release.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     Conducir Architecture                      │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────────────┐   │
//! │  │ CLI flags │──►│ Environment  │──►│ Capability          │   │
//! │  │ env vars  │   │ Resolver     │   │ Builder             │   │
//! │  └───────────┘   └──────────────┘   └──────────┬──────────┘   │
//! │                                                ▼              │
//! │                  ┌──────────────┐   ┌─────────────────────┐   │
//! │                  │ WebDriver    │◄──│ Session             │   │
//! │                  │ hub / grid   │   │ Lifecycle           │   │
//! │                  └──────────────┘   └─────────────────────┘   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use conducir::{
//!     CapabilityBuilder, EnvironmentResolver, HarnessArgs, HarnessConfig, HubDriver, Session,
//! };
//!
//! # async fn run() -> conducir::ConducirResult<()> {
//! let args = HarnessArgs::from_cli();
//! let config = HarnessConfig::from_env(&args);
//! conducir::init_diagnostics(config.verbose);
//!
//! let selection = EnvironmentResolver::new().resolve(&args)?;
//! let capabilities = CapabilityBuilder::new(config.grid_credentials(), &selection)
//!     .build(config.desired_json.as_deref())?;
//!
//! let endpoint = conducir::select_endpoint(&config, &selection);
//! let driver = HubDriver::new(&endpoint, config.http, config.grid_credentials());
//! let mut session = Session::new(driver, endpoint);
//! if config.verbose {
//!     session.attach_verbose_logging();
//! }
//!
//! session.start(&capabilities).await?;
//! session.record_case("landing page renders", true)?;
//! let all_passed = session.finish().await?;
//! # let _ = all_passed;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod args;
mod capabilities;
mod config;
mod credentials;
mod diagnostics;
mod driver;
mod environment;
mod harness;
mod result;
mod session;
mod viewport;

pub use args::{AliasStyle, HarnessArgs};
pub use capabilities::{mobile_probe, Capabilities, CapabilityBuilder};
pub use config::{HarnessConfig, HttpTuning, LOCAL_HUB_URL, REMOTE_HUB_URL};
pub use credentials::Credentials;
pub use diagnostics::init_diagnostics;
pub use driver::{AutomationDriver, HubDriver, SessionEvent};
pub use environment::{
    is_loopback_url, AliasTable, EnvTag, EnvironmentResolver, EnvironmentSelection,
    DEFAULT_BASE_URL,
};
pub use harness::{CaseOutcome, RunStatus};
pub use result::{ConducirError, ConducirResult};
pub use session::{select_endpoint, Endpoint, Session, SessionState};
pub use viewport::{Viewport, ViewportSize, VIEWPORT_HEIGHT};
