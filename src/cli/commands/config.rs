use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::config::Config;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View and change page settings",
        "config [show|set <key> <value>]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        return show_config(context);
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: config set <{}> <value>",
                    Config::KEYS.join("|")
                )));
            }
            let key = args[1];
            let value = args[2..].join(" ");
            context.config.set(key, value.trim())?;
            context.persist_config()?;
            io::print_success(format!("Updated `{}`.", key));
            if context.page.is_some() {
                io::print_info("Run `reload` to apply the new settings to the open profile.");
            }
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{}`; use `config show` or `config set`",
            other
        ))),
    }
}

fn show_config(context: &ShellContext) -> CommandResult {
    output_section("Configuration");
    for (key, value) in context.config.entries() {
        io::print_info(format!("  {:<18} {}", key, value));
    }
    io::print_info(format!(
        "  {:<18} {}",
        "file",
        context.config_manager.path().display()
    ));
    Ok(())
}
