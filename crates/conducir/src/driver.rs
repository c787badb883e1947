//! Automation driver: the client side of the browser session.
//!
//! The [`AutomationDriver`] trait is the contract the session lifecycle
//! depends on. When compiled with the `webdriver` feature, [`HubDriver`]
//! speaks the WebDriver protocol to a hub (local or remote grid) through
//! fantoccini, and reports the aggregated job status to the grid's REST API.
//! Without the feature, a mock implementation with the same surface stands in
//! for unit testing.

use crate::capabilities::Capabilities;
use crate::result::ConducirResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Diagnostic events published by a driver.
///
/// Purely observational; subscribing or dropping the receiver has no effect
/// on control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Session status change
    Status(String),
    /// Outbound protocol command
    Command {
        /// HTTP method of the command
        method: String,
        /// Command path
        path: String,
        /// Command payload, if any
        data: Option<serde_json::Value>,
    },
}

/// Contract between the session lifecycle and the automation client.
#[async_trait]
pub trait AutomationDriver: Send {
    /// Acquire a browser session with the given capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint cannot be reached within the
    /// client's retry budget.
    async fn init(&mut self, capabilities: &Capabilities) -> ConducirResult<()>;

    /// Release the browser session.
    ///
    /// # Errors
    ///
    /// Returns an error when the release call fails or times out.
    async fn quit(&mut self) -> ConducirResult<()>;

    /// Report the aggregated pass/fail status upstream.
    ///
    /// Drivers without an upstream reporting surface keep the default no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when the report call fails.
    async fn report_result(&mut self, passed: bool) -> ConducirResult<()> {
        let _ = passed;
        Ok(())
    }

    /// Subscribe to the driver's diagnostic event stream.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

// ============================================================================
// Real WebDriver implementation (when the `webdriver` feature is enabled)
// ============================================================================

#[cfg(feature = "webdriver")]
mod wire {
    use super::{async_trait, broadcast, AutomationDriver, Capabilities, SessionEvent};
    use crate::config::HttpTuning;
    use crate::credentials::Credentials;
    use crate::result::{ConducirError, ConducirResult};
    use crate::session::Endpoint;

    /// REST base of the remote grid's job API.
    const JOB_API_BASE: &str = "https://saucelabs.com/rest/v1";

    /// Account context for the grid's job-status REST call.
    #[derive(Debug, Clone)]
    struct JobAuth {
        user: String,
        access_key: String,
        rest_base: String,
    }

    /// WebDriver client for a hub endpoint.
    pub struct HubDriver {
        endpoint: String,
        http: HttpTuning,
        job_auth: Option<JobAuth>,
        client: Option<fantoccini::Client>,
        session_id: Option<String>,
        events: broadcast::Sender<SessionEvent>,
    }

    impl std::fmt::Debug for HubDriver {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("HubDriver")
                .field("endpoint", &self.endpoint)
                .field("http", &self.http)
                .field("connected", &self.client.is_some())
                .field("session_id", &self.session_id)
                .finish()
        }
    }

    impl HubDriver {
        /// Create a driver for the given endpoint.
        ///
        /// Credentials enable job-status reporting and are only meaningful
        /// for remote endpoints.
        #[must_use]
        pub fn new(
            endpoint: &Endpoint,
            http: HttpTuning,
            credentials: Option<&Credentials>,
        ) -> Self {
            let (events, _) = broadcast::channel(32);
            let job_auth = match endpoint {
                Endpoint::Remote(_) => credentials.map(|c| JobAuth {
                    user: c.user.clone(),
                    access_key: c.access_key.clone(),
                    rest_base: JOB_API_BASE.to_string(),
                }),
                Endpoint::Local(_) => None,
            };
            Self {
                endpoint: endpoint.url().to_string(),
                http,
                job_auth,
                client: None,
                session_id: None,
                events,
            }
        }

        /// The WebDriver session id, once acquired.
        #[must_use]
        pub fn session_id(&self) -> Option<&str> {
            self.session_id.as_deref()
        }

        fn emit(&self, event: SessionEvent) {
            let _ = self.events.send(event);
        }

        async fn connect_once(
            &self,
            caps: &serde_json::Map<String, serde_json::Value>,
        ) -> ConducirResult<fantoccini::Client> {
            let mut builder = fantoccini::ClientBuilder::native();
            builder.capabilities(caps.clone());
            let connect = builder.connect(&self.endpoint);
            match tokio::time::timeout(self.http.timeout, connect).await {
                Err(_) => Err(ConducirError::Timeout {
                    ms: self.http.timeout.as_millis() as u64,
                }),
                Ok(Err(e)) => Err(ConducirError::SessionInit {
                    endpoint: self.endpoint.clone(),
                    message: e.to_string(),
                }),
                Ok(Ok(client)) => Ok(client),
            }
        }
    }

    #[async_trait]
    impl AutomationDriver for HubDriver {
        async fn init(&mut self, capabilities: &Capabilities) -> ConducirResult<()> {
            let caps = capabilities.to_wire()?;
            self.emit(SessionEvent::Command {
                method: "POST".to_string(),
                path: "/session".to_string(),
                data: Some(serde_json::Value::Object(caps.clone())),
            });

            let mut last_err = None;
            for attempt in 0..=self.http.retries {
                if attempt > 0 {
                    tracing::debug!(attempt, "retrying session acquisition");
                    tokio::time::sleep(self.http.retry_delay).await;
                }
                match self.connect_once(&caps).await {
                    Ok(mut client) => {
                        let session_id = client.session_id().await.ok().flatten();
                        self.emit(SessionEvent::Status(format!(
                            "session acquired at {}",
                            self.endpoint
                        )));
                        self.client = Some(client);
                        self.session_id = session_id;
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::warn!(attempt, error = %e, "session acquisition attempt failed");
                        last_err = Some(e);
                    }
                }
            }
            Err(last_err.unwrap_or_else(|| ConducirError::SessionInit {
                endpoint: self.endpoint.clone(),
                message: "no connection attempt was made".to_string(),
            }))
        }

        async fn quit(&mut self) -> ConducirResult<()> {
            let Some(client) = self.client.take() else {
                return Ok(());
            };
            self.emit(SessionEvent::Command {
                method: "DELETE".to_string(),
                path: "/session".to_string(),
                data: None,
            });
            match tokio::time::timeout(self.http.timeout, client.close()).await {
                Err(_) => Err(ConducirError::Timeout {
                    ms: self.http.timeout.as_millis() as u64,
                }),
                Ok(result) => {
                    result.map_err(|e| ConducirError::SessionClose {
                        message: e.to_string(),
                    })?;
                    self.emit(SessionEvent::Status("session released".to_string()));
                    Ok(())
                }
            }
        }

        async fn report_result(&mut self, passed: bool) -> ConducirResult<()> {
            let Some(auth) = self.job_auth.clone() else {
                return Err(ConducirError::ReportFailed {
                    message: "no grid credentials for job-status reporting".to_string(),
                });
            };
            let Some(session_id) = self.session_id.clone() else {
                return Err(ConducirError::ReportFailed {
                    message: "no active session id".to_string(),
                });
            };

            let url = format!("{}/{}/jobs/{}", auth.rest_base, auth.user, session_id);
            self.emit(SessionEvent::Command {
                method: "PUT".to_string(),
                path: url.clone(),
                data: Some(serde_json::json!({ "passed": passed })),
            });

            let response = reqwest::Client::new()
                .put(&url)
                .basic_auth(&auth.user, Some(&auth.access_key))
                .json(&serde_json::json!({ "passed": passed }))
                .send()
                .await
                .map_err(|e| ConducirError::ReportFailed {
                    message: e.to_string(),
                })?;
            response
                .error_for_status()
                .map_err(|e| ConducirError::ReportFailed {
                    message: e.to_string(),
                })?;
            self.emit(SessionEvent::Status(format!("job marked passed={passed}")));
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
            self.events.subscribe()
        }
    }
}

// ============================================================================
// Mock implementation (when the `webdriver` feature is NOT enabled)
// ============================================================================

#[cfg(not(feature = "webdriver"))]
mod mock {
    use super::{async_trait, broadcast, AutomationDriver, Capabilities, SessionEvent};
    use crate::config::HttpTuning;
    use crate::credentials::Credentials;
    use crate::result::{ConducirError, ConducirResult};
    use crate::session::Endpoint;

    /// Mock stand-in for the WebDriver hub client.
    #[derive(Debug)]
    pub struct HubDriver {
        endpoint: String,
        #[allow(dead_code)]
        http: HttpTuning,
        can_report: bool,
        initialized: Option<Capabilities>,
        closed: bool,
        reported: Option<bool>,
        events: broadcast::Sender<SessionEvent>,
    }

    impl HubDriver {
        /// Create a mock driver with the same surface as the real one.
        #[must_use]
        pub fn new(
            endpoint: &Endpoint,
            http: HttpTuning,
            credentials: Option<&Credentials>,
        ) -> Self {
            let (events, _) = broadcast::channel(32);
            Self {
                endpoint: endpoint.url().to_string(),
                http,
                can_report: endpoint.is_remote() && credentials.is_some(),
                initialized: None,
                closed: false,
                reported: None,
                events,
            }
        }

        /// Capabilities the session was acquired with, if any.
        #[must_use]
        pub fn initialized_capabilities(&self) -> Option<&Capabilities> {
            self.initialized.as_ref()
        }

        /// Whether the session was released.
        #[must_use]
        pub fn is_closed(&self) -> bool {
            self.closed
        }

        /// The job status that was reported, if any.
        #[must_use]
        pub fn reported_status(&self) -> Option<bool> {
            self.reported
        }

        fn emit(&self, event: SessionEvent) {
            let _ = self.events.send(event);
        }
    }

    #[async_trait]
    impl AutomationDriver for HubDriver {
        async fn init(&mut self, capabilities: &Capabilities) -> ConducirResult<()> {
            self.emit(SessionEvent::Command {
                method: "POST".to_string(),
                path: "/session".to_string(),
                data: None,
            });
            self.initialized = Some(capabilities.clone());
            self.emit(SessionEvent::Status(format!(
                "mock session acquired at {}",
                self.endpoint
            )));
            Ok(())
        }

        async fn quit(&mut self) -> ConducirResult<()> {
            self.closed = true;
            self.emit(SessionEvent::Status("mock session released".to_string()));
            Ok(())
        }

        async fn report_result(&mut self, passed: bool) -> ConducirResult<()> {
            if !self.can_report {
                return Err(ConducirError::ReportFailed {
                    message: "no grid credentials for job-status reporting".to_string(),
                });
            }
            self.reported = Some(passed);
            self.emit(SessionEvent::Status(format!("job marked passed={passed}")));
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
            self.events.subscribe()
        }
    }
}

// Re-export based on feature
#[cfg(feature = "webdriver")]
pub use wire::HubDriver;

#[cfg(not(feature = "webdriver"))]
pub use mock::HubDriver;
