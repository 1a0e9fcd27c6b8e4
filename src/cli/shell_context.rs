use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;

use crate::{
    config::{Config, ConfigManager},
    profile::ProfilePage,
    session::{Route, SessionStore},
    storage::JsonDataStore,
};

use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub session: SessionStore,
    /// Mounted while a user is signed in.
    pub page: Option<ProfilePage<JsonDataStore>>,
    pub route: Route,
    pub base_dir: PathBuf,
    pub running: bool,
}

impl ShellContext {
    pub fn has_pending_edits(&self) -> bool {
        self.page
            .as_ref()
            .is_some_and(|page| page.personal().is_editable() || page.payment().is_editable())
    }
}
