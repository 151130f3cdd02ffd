use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Feed ordering for a subreddit listing. Becomes the last path segment of
/// the listing endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Timeline {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

impl Timeline {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeline::Hot => "hot",
            Timeline::New => "new",
            Timeline::Top => "top",
            Timeline::Rising => "rising",
        }
    }
}

impl FromStr for Timeline {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(Timeline::Hot),
            "new" => Ok(Timeline::New),
            "top" => Ok(Timeline::Top),
            "rising" => Ok(Timeline::Rising),
            other => Err(CoreError::InvalidTimeline(other.to_string())),
        }
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
