use std::{
    borrow::Cow,
    fmt,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output::info as output_info;
use crate::domain::FormKind;
use crate::profile::fields;

/// Set to run commands from stdin without prompts or colours.
pub const SCRIPT_ENV: &str = "PROFILE_CORE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    let helper = CommandHelper::new(context.command_names());
    editor.set_helper(Some(helper));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    output_info("Type `help` to list commands.");

    loop {
        if !context.running {
            break;
        }
        let prompt = context.prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                editor.add_history_entry(trimmed).ok();

                match handle_line(context, trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err),
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output_info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err),
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            context.print_warning(&err.message);
            return Ok(LoopControl::Continue);
        }
    };

    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    if raw.starts_with('#') {
        return Ok(LoopControl::Continue);
    }
    let command = raw.to_lowercase();
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    tracing::debug!(command = %command, args = args.len(), "dispatching shell command");

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>) -> Self {
        let mut commands: Vec<String> = names
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        commands.sort();
        commands.dedup();
        Self { commands }
    }
}

impl Helper for CommandHelper {}

impl CommandHelper {
    /// Byte offset where the word under the cursor starts, plus its candidates.
    ///
    /// The first word completes to commands, the second to form names and the
    /// third, for `set`, to the editable fields of that form.
    fn candidates(&self, prefix: &str) -> (usize, Vec<String>) {
        let start = prefix
            .char_indices()
            .rev()
            .find(|(_, ch)| ch.is_whitespace())
            .map(|(idx, ch)| idx + ch.len_utf8())
            .unwrap_or(0);

        let previous: Vec<&str> = prefix[..start].split_whitespace().collect();
        let needle = prefix[start..].to_ascii_lowercase();
        let pool: Vec<String> = match previous.as_slice() {
            [] => self.commands.clone(),
            [command] if takes_form_argument(command) => FormKind::ALL
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
            [command, form] if command.eq_ignore_ascii_case("set") => form
                .parse::<FormKind>()
                .map(|kind| {
                    fields::descriptors(kind)
                        .iter()
                        .filter(|descriptor| descriptor.editable)
                        .map(|descriptor| descriptor.name.to_string())
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        let matches = pool
            .into_iter()
            .filter(|name| name.to_ascii_lowercase().starts_with(&needle))
            .collect();
        (start, matches)
    }
}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.candidates(&line[..pos]);
        let candidates = matches
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();
        Ok((start, candidates))
    }
}

fn takes_form_argument(command: &str) -> bool {
    matches!(
        command.to_ascii_lowercase().as_str(),
        "edit" | "set" | "save" | "cancel"
    )
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let _ = ctx;
        Ok(ValidationResult::Valid(None))
    }
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_values_stay_together() {
        let tokens = parse_command_line("set personal address \"Av. Sol 123\"").unwrap();
        assert_eq!(tokens, vec!["set", "personal", "address", "Av. Sol 123"]);
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line("set personal name \"Ana").is_err());
    }

    fn helper() -> CommandHelper {
        CommandHelper::new(vec!["edit", "exit", "set", "save", "show"])
    }

    fn complete(line: &str) -> (usize, Vec<String>) {
        let history = DefaultHistory::new();
        let ctx = ReadlineContext::new(&history);
        let (start, pairs) = helper().complete(line, line.len(), &ctx).unwrap();
        (start, pairs.into_iter().map(|pair| pair.replacement).collect())
    }

    #[test]
    fn form_commands_complete_form_names() {
        assert!(takes_form_argument("EDIT"));
        assert!(!takes_form_argument("login"));
        assert_eq!(complete("ex"), (0, vec!["exit".to_string()]));
        assert_eq!(complete("edit pa"), (5, vec!["payment".to_string()]));
        assert_eq!(complete("show pe").1, Vec::<String>::new());
    }

    #[test]
    fn set_completes_editable_field_names() {
        let (start, names) = complete("set personal ");
        assert_eq!(start, 13);
        assert!(names.contains(&"phoneNumber".to_string()));
        assert!(!names.contains(&"country".to_string()));

        assert_eq!(
            complete("set payment c"),
            (12, vec!["cardNumber".to_string(), "cvc".to_string()])
        );
        assert!(complete("set billing c").1.is_empty());
    }

    #[test]
    fn multibyte_whitespace_does_not_split_characters() {
        let (start, names) = complete("edit\u{a0}pe");
        assert_eq!(start, 6);
        assert_eq!(names, vec!["personal".to_string()]);

        let (start, names) = complete("set\u{3000}payment\u{3000}cv");
        assert_eq!(start, 16);
        assert_eq!(names, vec!["cvc".to_string()]);
    }
}
