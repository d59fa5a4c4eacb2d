use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Summer,
    Monsoon,
    Autumn,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Summer => "summer",
            Self::Monsoon => "monsoon",
            Self::Autumn => "autumn",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season for the reference region's climate: Dec-Feb winter, Mar-May summer,
/// Jun-Sep monsoon, Oct-Nov autumn.
pub fn season_for(date: DateTime<Utc>) -> Season {
    match date.month() {
        12 | 1 | 2 => Season::Winter,
        3..=5 => Season::Summer,
        6..=9 => Season::Monsoon,
        _ => Season::Autumn,
    }
}
