//! Chat mode / session type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of conversation a session holds, and the mode a message is sent in.
///
/// Sessions carry it as a label; sends use it to pick a backend path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Plain request/response chat.
    #[default]
    Normal,
    /// Chat augmented with file search and classification metadata.
    Enhanced,
    /// Multi-step agent execution. Labelled only; there is no send path.
    Agentic,
}

impl ChatMode {
    pub const ALL: [ChatMode; 3] = [ChatMode::Normal, ChatMode::Enhanced, ChatMode::Agentic];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Normal => "normal",
            ChatMode::Enhanced => "enhanced",
            ChatMode::Agentic => "agentic",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(ChatMode::Normal),
            "enhanced" => Ok(ChatMode::Enhanced),
            "agentic" => Ok(ChatMode::Agentic),
            other => Err(format!(
                "unknown chat mode '{other}' (expected normal, enhanced or agentic)"
            )),
        }
    }
}
