//! Content packs.

use crate::error::Error;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// A content theme with its own source vocabulary and trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pack {
    Adventure,
    Combat,
    Shelter,
}

impl Pack {
    pub const ALL: [Pack; 3] = [Pack::Adventure, Pack::Combat, Pack::Shelter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pack::Adventure => "adventure",
            Pack::Combat => "combat",
            Pack::Shelter => "shelter",
        }
    }

    /// Prefix shared by every source identifier of this pack (`adv-hero`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Pack::Adventure => "adv",
            Pack::Combat => "cmb",
            Pack::Shelter => "shl",
        }
    }
}

impl fmt::Display for Pack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pack {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adventure" => Ok(Pack::Adventure),
            "combat" => Ok(Pack::Combat),
            "shelter" => Ok(Pack::Shelter),
            other => Err(Error::UnknownPack(other.to_string())),
        }
    }
}
