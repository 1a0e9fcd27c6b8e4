//! Shell context construction, dispatch and error reporting.

use std::{io, path::PathBuf};

use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;

use crate::{
    config::ConfigManager,
    core::utils::PathResolver,
    domain::FormKind,
    errors::ProfileError,
    profile::ProfilePage,
    session::{Route, SessionContext, SessionStore},
    storage::JsonDataStore,
};

pub use crate::errors::CliError;

use super::commands;
use super::io as cli_io;
use super::registry::{CommandEntry, CommandRegistry};
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not signed in. Use `login <email>` first.")]
    NotSignedIn,
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] ProfileError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, PathResolver::resolve_base(None))
    }

    /// Builds a shell rooted at `base_dir`, restoring the persisted session.
    pub fn with_base_dir(mode: CliMode, base_dir: PathBuf) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(base_dir.clone())?;
        let config = config_manager.load()?;
        let session = SessionStore::open(PathResolver::session_file_in(&base_dir))?;

        if mode == CliMode::Script {
            colored::control::set_override(false);
        }

        let mut context = ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            session,
            page: None,
            route: Route::Landing,
            base_dir,
            running: true,
        };

        if let Some(email) = context.session.email().map(str::to_string) {
            match context.mount_page() {
                Ok(true) => cli_io::print_info(format!("Restored session for {}.", email)),
                Ok(false) => cli_io::print_warning(format!(
                    "Restored session for {}, but no user record matches.",
                    email
                )),
                Err(err) => cli_io::print_warning(format!("Could not load the profile: {}", err)),
            }
        }
        Ok(context)
    }

    pub(crate) fn prompt(&self) -> String {
        match self.session.email() {
            Some(email) => format!("profile [{}]> ", email),
            None => "profile> ".into(),
        }
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    /// Database path: the configured override or `<app dir>/db.json`.
    pub(crate) fn data_file(&self) -> PathBuf {
        self.config
            .data_file
            .clone()
            .unwrap_or_else(|| PathResolver::database_file_in(&self.base_dir))
    }

    /// Opens the data store, mounts a fresh page and runs the loader.
    ///
    /// The page stays mounted when the load fails so `reload` can retry.
    pub(crate) fn mount_page(&mut self) -> Result<bool, CommandError> {
        let store = JsonDataStore::new(self.data_file())?;
        let mut page = ProfilePage::with_config(store, &self.config);
        let loaded = page.load(&self.session);
        self.page = Some(page);
        self.route = Route::Profile;
        Ok(loaded?)
    }

    pub(crate) fn page_mut(&mut self) -> Result<&mut ProfilePage<JsonDataStore>, CommandError> {
        self.page.as_mut().ok_or(CommandError::NotSignedIn)
    }

    pub(crate) fn page(&self) -> Result<&ProfilePage<JsonDataStore>, CommandError> {
        self.page.as_ref().ok_or(CommandError::NotSignedIn)
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.print_warning(&err.to_string());
                return Ok(LoopControl::Continue);
            }
        };
        let Some((raw, rest)) = tokens.split_first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.dispatch(&raw.to_lowercase(), raw, &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, input), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm(&self, prompt: &str, default: bool) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, default)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        self.confirm("Exit shell?", true)
            .map_err(|err| CliError::Input(err.to_string()))
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::NotSignedIn => {
                self.print_error("Not signed in.");
                cli_io::print_hint("Try `login ana@example.com` to open a profile.");
            }
            other => self.print_error(&other.to_string()),
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        cli_io::print_error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }
}

/// Parses the `<personal|payment>` argument shared by the form commands.
pub(crate) fn parse_form(args: &[&str], usage: &str) -> Result<FormKind, CommandError> {
    let Some(raw) = args.first() else {
        return Err(CommandError::InvalidArguments(format!("usage: {}", usage)));
    };
    raw.parse::<FormKind>()
        .map_err(|err| CommandError::InvalidArguments(err.to_string()))
}
