//! Authentication types.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Where the bearer token lives between requests.
///
/// The HTTP backend reads the token for every call and clears it when the
/// backend answers 401.
pub trait TokenStore: Send + Sync {
    /// Returns the current token, if any.
    fn token(&self) -> Option<String>;

    /// Replaces the stored token.
    fn set_token(&self, token: &str) -> Result<()>;

    /// Forgets the stored token.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Successful login answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}
