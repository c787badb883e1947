//! Remote-grid account credentials.
//!
//! Credentials are constructed once at suite startup and passed explicitly
//! into the components that need them. Absence is a valid, degraded state:
//! the suite can still run against a local automation endpoint.

use serde::{Deserialize, Serialize};

/// Account credentials for the remote browser grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account user name
    pub user: String,
    /// Account access key
    pub access_key: String,
    /// Test name reported to the grid dashboard
    pub test_name: String,
}

impl Credentials {
    /// Create a new credentials value.
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        access_key: impl Into<String>,
        test_name: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            access_key: access_key.into(),
            test_name: test_name.into(),
        }
    }

    /// Check that both account fields are non-empty.
    ///
    /// Empty credentials cannot authenticate against the grid and are
    /// treated the same as absent ones by the session layer.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.access_key.is_empty()
    }
}
