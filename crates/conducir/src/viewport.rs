//! Named viewport sizes.
//!
//! Every named size shares the same fixed height; only the width varies.

use crate::result::{ConducirError, ConducirResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed viewport height shared by every named size.
pub const VIEWPORT_HEIGHT: u32 = 1000;

/// Named viewport widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportSize {
    /// 430px wide
    Small,
    /// 700px wide
    Medium,
    /// 1280px wide
    Large,
    /// 1500px wide
    Xlarge,
    /// 1950px wide
    Xxlarge,
}

impl ViewportSize {
    /// All named sizes, smallest first.
    pub const ALL: [Self; 5] = [
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::Xlarge,
        Self::Xxlarge,
    ];

    /// Pixel dimensions for this size.
    #[must_use]
    pub const fn dimensions(self) -> Viewport {
        let width = match self {
            Self::Small => 430,
            Self::Medium => 700,
            Self::Large => 1280,
            Self::Xlarge => 1500,
            Self::Xxlarge => 1950,
        };
        Viewport {
            width,
            height: VIEWPORT_HEIGHT,
        }
    }
}

impl fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
            Self::Xxlarge => "xxlarge",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ViewportSize {
    type Err = ConducirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "xlarge" => Ok(Self::Xlarge),
            "xxlarge" => Ok(Self::Xxlarge),
            other => Err(ConducirError::UnknownViewport {
                name: other.to_string(),
            }),
        }
    }
}

/// Pixel dimensions of a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Look up a named viewport.
    ///
    /// # Errors
    ///
    /// Returns [`ConducirError::UnknownViewport`] for names outside the table.
    pub fn lookup(name: &str) -> ConducirResult<Self> {
        Ok(name.parse::<ViewportSize>()?.dimensions())
    }
}
