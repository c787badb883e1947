//! Browser session lifecycle.
//!
//! One session per test run: acquire a browser from the selected endpoint,
//! fold every case's terminal pass/fail status into a single running flag,
//! then report the aggregate (remote runs only) and release the browser.
//! Operations are strictly sequenced; there is no overlap between teardown
//! and still-running cases.

use crate::capabilities::Capabilities;
use crate::config::HarnessConfig;
use crate::driver::{AutomationDriver, SessionEvent};
use crate::environment::{EnvTag, EnvironmentSelection};
use crate::harness::{CaseOutcome, RunStatus};
use crate::result::{ConducirError, ConducirResult};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session requested yet
    NotStarted,
    /// Waiting on the automation endpoint
    Acquiring,
    /// Browser available, no case recorded yet
    Ready,
    /// At least one case outcome recorded
    Recording,
    /// Reporting the aggregated status upstream
    ReportingResult,
    /// Session released
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::Acquiring => "acquiring",
            Self::Ready => "ready",
            Self::Recording => "recording",
            Self::ReportingResult => "reporting-result",
            Self::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// The automation endpoint a session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Remote grid endpoint
    Remote(String),
    /// Local WebDriver endpoint
    Local(String),
}

impl Endpoint {
    /// The endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Remote(url) | Self::Local(url) => url,
        }
    }

    /// True for the remote grid.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Pick the automation endpoint for a run.
///
/// The remote grid is used when usable credentials are configured and the
/// resolved target is not a dev environment. Missing credentials downgrade a
/// would-be remote run to the local endpoint with a warning rather than
/// aborting.
#[must_use]
pub fn select_endpoint(config: &HarnessConfig, selection: &EnvironmentSelection) -> Endpoint {
    if selection.tag != EnvTag::Dev {
        if config.grid_credentials().is_some() {
            return Endpoint::Remote(config.remote_hub.clone());
        }
        tracing::warn!(
            tag = %selection.tag,
            "no grid credentials configured, downgrading to the local endpoint"
        );
    }
    Endpoint::Local(config.local_hub.clone())
}

/// One browser session lifecycle around a test run.
#[derive(Debug)]
pub struct Session<D: AutomationDriver> {
    driver: D,
    endpoint: Endpoint,
    state: SessionState,
    status: RunStatus,
    run_id: Uuid,
    log_task: Option<tokio::task::JoinHandle<()>>,
}

impl<D: AutomationDriver> Session<D> {
    /// Create a session over a driver bound to the given endpoint.
    #[must_use]
    pub fn new(driver: D, endpoint: Endpoint) -> Self {
        Self {
            driver,
            endpoint,
            state: SessionState::NotStarted,
            status: RunStatus::new(),
            run_id: Uuid::new_v4(),
            log_task: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Identifier for this run, used in diagnostics.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// True while no recorded case has failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.status.all_passed()
    }

    /// Accumulated case outcomes.
    #[must_use]
    pub const fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Subscribe to the driver's diagnostic events.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.driver.subscribe()
    }

    /// Forward driver events to the log.
    ///
    /// Diagnostics only; control flow is unaffected. The forwarding task ends
    /// with the session.
    pub fn attach_verbose_logging(&mut self) {
        if self.log_task.is_some() {
            return;
        }
        let mut events = self.driver.subscribe();
        let run_id = self.run_id;
        self.log_task = Some(tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    SessionEvent::Status(info) => {
                        tracing::debug!(%run_id, "{info}");
                    }
                    SessionEvent::Command { method, path, data } => {
                        tracing::debug!(%run_id, %method, %path, ?data, "command");
                    }
                }
            }
        }));
    }

    /// Acquire the browser session.
    ///
    /// A failed acquisition is fatal: the session moves to `Closed` and the
    /// error propagates. Retry policy lives in the driver, not here.
    ///
    /// # Errors
    ///
    /// Returns [`ConducirError::InvalidState`] when called more than once,
    /// or the driver's acquisition error.
    pub async fn start(&mut self, capabilities: &Capabilities) -> ConducirResult<()> {
        if self.state != SessionState::NotStarted {
            return Err(ConducirError::InvalidState {
                message: format!("start called in state {}", self.state),
            });
        }
        self.state = SessionState::Acquiring;
        tracing::info!(
            run_id = %self.run_id,
            endpoint = %self.endpoint,
            browser = %capabilities.browser_name,
            "acquiring browser session"
        );
        match self.driver.init(capabilities).await {
            Ok(()) => {
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    /// Fold one case's terminal outcome into the run.
    ///
    /// A single failure marks the whole run failed, irreversibly.
    ///
    /// # Errors
    ///
    /// Returns [`ConducirError::InvalidState`] outside `Ready`/`Recording`.
    pub fn record(&mut self, outcome: CaseOutcome) -> ConducirResult<()> {
        match self.state {
            SessionState::Ready => self.state = SessionState::Recording,
            SessionState::Recording => {}
            other => {
                return Err(ConducirError::InvalidState {
                    message: format!("record called in state {other}"),
                });
            }
        }
        if outcome.passed {
            tracing::debug!(run_id = %self.run_id, case = %outcome.name, "case passed");
        } else {
            tracing::warn!(
                run_id = %self.run_id,
                case = %outcome.name,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "case failed"
            );
        }
        self.status.record(outcome);
        Ok(())
    }

    /// Convenience wrapper for [`Session::record`].
    ///
    /// # Errors
    ///
    /// Same as [`Session::record`].
    pub fn record_case(&mut self, name: &str, passed: bool) -> ConducirResult<()> {
        let outcome = if passed {
            CaseOutcome::pass(name)
        } else {
            CaseOutcome::fail(name, "case reported failure")
        };
        self.record(outcome)
    }

    /// Report the aggregated status (remote runs only) and release the
    /// session.
    ///
    /// Release always happens, even when reporting fails; the report error
    /// still surfaces afterwards. Returns the aggregated all-passed flag.
    ///
    /// # Errors
    ///
    /// Returns [`ConducirError::InvalidState`] before `start`, or the first
    /// of the report/release errors.
    pub async fn finish(mut self) -> ConducirResult<bool> {
        match self.state {
            SessionState::Ready | SessionState::Recording => {}
            other => {
                return Err(ConducirError::InvalidState {
                    message: format!("finish called in state {other}"),
                });
            }
        }
        self.state = SessionState::ReportingResult;
        let all_passed = self.status.all_passed();

        let report_result = if self.endpoint.is_remote() {
            tracing::info!(run_id = %self.run_id, all_passed, "reporting job status");
            self.driver.report_result(all_passed).await
        } else {
            Ok(())
        };

        let quit_result = self.driver.quit().await;
        self.state = SessionState::Closed;
        if let Some(task) = self.log_task.take() {
            task.abort();
        }
        tracing::info!(
            run_id = %self.run_id,
            all_passed,
            passed = self.status.passed_count(),
            failed = self.status.failed_count(),
            "session closed"
        );

        report_result?;
        quit_result?;
        Ok(all_passed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::broadcast;

    #[derive(Debug, Default)]
    struct Probe {
        init_browser: Option<String>,
        quit: bool,
        reported: Option<bool>,
    }

    struct FakeDriver {
        events: broadcast::Sender<SessionEvent>,
        probe: Arc<Mutex<Probe>>,
        fail_init: bool,
        fail_report: bool,
    }

    impl FakeDriver {
        fn new() -> (Self, Arc<Mutex<Probe>>) {
            let (events, _) = broadcast::channel(32);
            let probe = Arc::new(Mutex::new(Probe::default()));
            (
                Self {
                    events,
                    probe: Arc::clone(&probe),
                    fail_init: false,
                    fail_report: false,
                },
                probe,
            )
        }
    }

    #[async_trait]
    impl AutomationDriver for FakeDriver {
        async fn init(&mut self, capabilities: &Capabilities) -> ConducirResult<()> {
            if self.fail_init {
                return Err(ConducirError::SessionInit {
                    endpoint: "fake".to_string(),
                    message: "connection refused".to_string(),
                });
            }
            let _ = self
                .events
                .send(SessionEvent::Status("acquired".to_string()));
            self.probe.lock().unwrap().init_browser = Some(capabilities.browser_name.clone());
            Ok(())
        }

        async fn quit(&mut self) -> ConducirResult<()> {
            self.probe.lock().unwrap().quit = true;
            Ok(())
        }

        async fn report_result(&mut self, passed: bool) -> ConducirResult<()> {
            if self.fail_report {
                return Err(ConducirError::ReportFailed {
                    message: "grid unreachable".to_string(),
                });
            }
            self.probe.lock().unwrap().reported = Some(passed);
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
            self.events.subscribe()
        }
    }

    fn remote() -> Endpoint {
        Endpoint::Remote("http://grid.example.com/wd/hub".to_string())
    }

    fn local() -> Endpoint {
        Endpoint::Local("http://0.0.0.0:4444/wd/hub".to_string())
    }

    #[tokio::test]
    async fn test_remote_run_reports_folded_status() {
        let (driver, probe) = FakeDriver::new();
        let mut session = Session::new(driver, remote());
        session.start(&Capabilities::firefox()).await.unwrap();
        session.record_case("a", true).unwrap();
        session.record_case("b", false).unwrap();
        session.record_case("c", true).unwrap();
        let all_passed = session.finish().await.unwrap();
        assert!(!all_passed);
        let probe = probe.lock().unwrap();
        assert_eq!(probe.init_browser.as_deref(), Some("firefox"));
        assert_eq!(probe.reported, Some(false));
        assert!(probe.quit);
    }

    #[tokio::test]
    async fn test_local_run_skips_report_but_releases() {
        let (driver, probe) = FakeDriver::new();
        let mut session = Session::new(driver, local());
        session.start(&Capabilities::firefox()).await.unwrap();
        session.record_case("a", true).unwrap();
        let all_passed = session.finish().await.unwrap();
        assert!(all_passed);
        let probe = probe.lock().unwrap();
        assert!(probe.reported.is_none());
        assert!(probe.quit);
    }

    #[tokio::test]
    async fn test_release_happens_even_when_report_fails() {
        let (mut driver, probe) = FakeDriver::new();
        driver.fail_report = true;
        let mut session = Session::new(driver, remote());
        session.start(&Capabilities::firefox()).await.unwrap();
        session.record_case("a", true).unwrap();
        let err = session.finish().await.unwrap_err();
        assert!(matches!(err, ConducirError::ReportFailed { .. }));
        assert!(probe.lock().unwrap().quit);
    }

    #[tokio::test]
    async fn test_empty_run_reports_passed() {
        let (driver, probe) = FakeDriver::new();
        let mut session = Session::new(driver, remote());
        session.start(&Capabilities::firefox()).await.unwrap();
        assert!(session.finish().await.unwrap());
        assert_eq!(probe.lock().unwrap().reported, Some(true));
    }

    #[tokio::test]
    async fn test_start_twice_is_invalid() {
        let (driver, _probe) = FakeDriver::new();
        let mut session = Session::new(driver, local());
        session.start(&Capabilities::firefox()).await.unwrap();
        let err = session.start(&Capabilities::firefox()).await.unwrap_err();
        assert!(matches!(err, ConducirError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_record_before_start_is_invalid() {
        let (driver, _probe) = FakeDriver::new();
        let mut session = Session::new(driver, local());
        let err = session.record_case("a", true).unwrap_err();
        assert!(matches!(err, ConducirError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_finish_before_start_is_invalid() {
        let (driver, _probe) = FakeDriver::new();
        let session = Session::new(driver, local());
        let err = session.finish().await.unwrap_err();
        assert!(matches!(err, ConducirError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_failed_acquisition_closes_session() {
        let (mut driver, probe) = FakeDriver::new();
        driver.fail_init = true;
        let mut session = Session::new(driver, local());
        let err = session.start(&Capabilities::firefox()).await.unwrap_err();
        assert!(matches!(err, ConducirError::SessionInit { .. }));
        assert_eq!(session.state(), SessionState::Closed);
        assert!(probe.lock().unwrap().init_browser.is_none());
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let (driver, _probe) = FakeDriver::new();
        let mut session = Session::new(driver, local());
        assert_eq!(session.state(), SessionState::NotStarted);
        session.start(&Capabilities::firefox()).await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        session.record_case("a", true).unwrap();
        assert_eq!(session.state(), SessionState::Recording);
    }

    #[tokio::test]
    async fn test_verbose_logging_does_not_change_outcome() {
        let (driver, probe) = FakeDriver::new();
        let mut session = Session::new(driver, remote());
        session.attach_verbose_logging();
        session.start(&Capabilities::firefox()).await.unwrap();
        session.record_case("a", false).unwrap();
        let all_passed = session.finish().await.unwrap();
        assert!(!all_passed);
        assert_eq!(probe.lock().unwrap().reported, Some(false));
    }

    #[tokio::test]
    async fn test_session_events_observable_through_session() {
        let (driver, _probe) = FakeDriver::new();
        let mut session = Session::new(driver, local());
        let mut rx = session.subscribe();
        session.start(&Capabilities::firefox()).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event, SessionEvent::Status("acquired".to_string()));
    }

    #[test]
    fn test_select_endpoint_remote_with_credentials() {
        let config = HarnessConfig::new().with_credentials(Credentials::new("u", "k", "t"));
        let selection = EnvironmentSelection {
            base_url: "http://staging.sonos.com/v1/".to_string(),
            tag: EnvTag::Stage,
        };
        let endpoint = select_endpoint(&config, &selection);
        assert!(endpoint.is_remote());
        assert_eq!(endpoint.url(), crate::config::REMOTE_HUB_URL);
    }

    #[test]
    fn test_select_endpoint_downgrades_without_credentials() {
        let config = HarnessConfig::new();
        let selection = EnvironmentSelection {
            base_url: "http://staging.sonos.com/v1/".to_string(),
            tag: EnvTag::Stage,
        };
        let endpoint = select_endpoint(&config, &selection);
        assert!(!endpoint.is_remote());
        assert_eq!(endpoint.url(), crate::config::LOCAL_HUB_URL);
    }

    #[test]
    fn test_select_endpoint_dev_is_always_local() {
        let config = HarnessConfig::new().with_credentials(Credentials::new("u", "k", "t"));
        let selection = EnvironmentSelection {
            base_url: "http://localhost:3000/".to_string(),
            tag: EnvTag::Dev,
        };
        assert!(!select_endpoint(&config, &selection).is_remote());
    }
}
