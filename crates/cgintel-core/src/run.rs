use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The pipeline stage an audited run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Obf,
    Amazon,
    Promote,
    Enrich,
}

impl RunType {
    pub const ALL: [RunType; 4] = [
        RunType::Obf,
        RunType::Amazon,
        RunType::Promote,
        RunType::Enrich,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunType::Obf => "obf",
            RunType::Amazon => "amazon",
            RunType::Promote => "promote",
            RunType::Enrich => "enrich",
        }
    }
}

impl std::fmt::Display for RunType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        RunType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or(CoreError::InvalidRunType(wanted))
    }
}
