//! The credentials a user gets after logging in

use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Just a wrapper around a username and the bearer token the auth service gave them.
///
/// Sessions are passed explicitly to every task service call, rather than being read from some global storage.
/// Dropping a session is logging out.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    username: String,
    token: String,
}

impl Session {
    pub fn new<S: ToString, T: ToString>(username: S, token: T) -> Self {
        Self { username: username.to_string(), token: token.to_string() }
    }

    pub fn username(&self) -> &str { &self.username }
    pub fn token(&self) -> &str { &self.token }

    /// The value of the `Authorization` header of authenticated requests
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Store this session to `path`, readable by the current user only (on unix)
    pub fn save_to_file(&self, path: &Path) -> Result<(), ServiceError> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(0o600);
            // `mode` only applies to new files
            if path.exists() {
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
            }
        }

        let file = options.open(path)?;
        serde_json::to_writer(file, self)?;
        log::debug!("Session saved to {:?}", path);
        Ok(())
    }

    /// Load a session stored by [`Self::save_to_file`]
    pub fn from_file(path: &Path) -> Result<Self, ServiceError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// Tokens are secrets, they should never end up in logs
impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}
