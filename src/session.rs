//! Session context handed to the profile page.
//!
//! The page only needs to read the signed-in email and to dispatch a logout;
//! both go through [`SessionContext`] instead of a process-wide store.

use std::{fs, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::utils::write_atomic;
use crate::errors::Result;

/// Client-side routes the profile page can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Profile,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Profile => "/profile",
        }
    }
}

pub trait SessionContext {
    /// Email of the signed-in user, if any.
    fn email(&self) -> Option<&str>;

    /// Clears the signed-in user.
    fn log_out(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<SessionUser>,
}

/// Session store, optionally persisted to a JSON file.
#[derive(Debug, Default)]
pub struct SessionStore {
    path: Option<PathBuf>,
    user: Option<SessionUser>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the session file at `path`; a missing file means nobody is signed in.
    pub fn open(path: PathBuf) -> Result<Self> {
        let user = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str::<SessionFile>(&data)?.user
        } else {
            None
        };
        Ok(Self {
            path: Some(path),
            user,
        })
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn sign_in(&mut self, email: impl Into<String>) -> Result<()> {
        self.user = Some(SessionUser {
            email: email.into(),
            signed_in_at: Utc::now(),
        });
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = SessionFile {
            user: self.user.clone(),
        };
        write_atomic(path, &serde_json::to_string_pretty(&file)?)
    }
}

impl SessionContext for SessionStore {
    fn email(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.email.as_str())
    }

    fn log_out(&mut self) -> Result<()> {
        if let Some(user) = self.user.take() {
            tracing::info!(email = %user.email, "session cleared");
        }
        self.persist()
    }
}
