use dirs::home_dir;
use std::{
    env, fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::Result;

const DEFAULT_DIR_NAME: &str = ".profile_core";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "db.json";
const SESSION_FILE: &str = "session.json";
const TMP_SUFFIX: &str = "tmp";

/// Environment variable overriding the application data directory.
pub const HOME_ENV: &str = "PROFILE_CORE_HOME";

/// Returns the application-specific data directory, defaulting to `~/.profile_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Resolves the well-known files below an application directory.
pub struct PathResolver;

impl PathResolver {
    pub fn resolve_base(custom: Option<PathBuf>) -> PathBuf {
        custom.unwrap_or_else(app_data_dir)
    }

    pub fn config_dir_in(base: &Path) -> PathBuf {
        base.join(CONFIG_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        Self::config_dir_in(base).join(CONFIG_FILE)
    }

    pub fn database_file_in(base: &Path) -> PathBuf {
        base.join(DATABASE_FILE)
    }

    pub fn session_file_in(base: &Path) -> PathBuf {
        base.join(SESSION_FILE)
    }
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes `contents` next to `path` first, then renames it into place.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = path.with_extension(TMP_SUFFIX);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
