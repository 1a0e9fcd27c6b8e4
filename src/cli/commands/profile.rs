use crate::cli::core::{parse_form, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{self, section as output_section};
use crate::cli::registry::CommandEntry;
use crate::domain::FormKind;
use crate::profile::{fields, SaveOutcome};

const EDIT_USAGE: &str = "edit <personal|payment>";
const SET_USAGE: &str = "set <personal|payment> <field> <value...>";
const SAVE_USAGE: &str = "save <personal|payment>";
const CANCEL_USAGE: &str = "cancel <personal|payment>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("show", "Render both profile forms", "show", cmd_show),
        CommandEntry::new("edit", "Start editing a form (Cambiar)", EDIT_USAGE, cmd_edit),
        CommandEntry::new(
            "set",
            "Change a field of the form being edited",
            SET_USAGE,
            cmd_set,
        ),
        CommandEntry::new("save", "Save a form (Guardar)", SAVE_USAGE, cmd_save),
        CommandEntry::new(
            "cancel",
            "Discard edits to a form (Cancelar)",
            CANCEL_USAGE,
            cmd_cancel,
        ),
        CommandEntry::new(
            "reload",
            "Reload the profile from the data store",
            "reload",
            cmd_reload,
        ),
    ]
}

fn cmd_show(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let page = context.page()?;
    output_section(format!("Profile ({})", context.route.path()));
    for kind in FormKind::ALL {
        output::block(page.view(kind).render());
        output::block("");
    }
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = parse_form(args, EDIT_USAGE)?;
    context.page_mut()?.begin_edit(kind)?;
    io::print_info(format!(
        "Editing {}. Use `set {} <field> <value>`, then `save {}` or `cancel {}`.",
        fields::form_title(kind),
        kind,
        kind,
        kind
    ));
    Ok(())
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = parse_form(args, SET_USAGE)?;
    let Some(&field) = args.get(1) else {
        return Err(CommandError::InvalidArguments(format!(
            "usage: {}",
            SET_USAGE
        )));
    };
    let value = args[2..].join(" ");

    let page = context.page_mut()?;
    let message = page.input(kind, field, &value)?;
    let label = fields::descriptor(kind, field)
        .map(|descriptor| descriptor.label)
        .unwrap_or(field);
    if message.is_empty() {
        io::print_info(format!("{} updated.", label));
    } else {
        io::print_warning(format!("{} {}", label, message));
    }

    let failing: Vec<&str> = match kind {
        FormKind::Personal => page.personal().errors().failing().map(|(name, _)| name).collect(),
        FormKind::Payment => page.payment().errors().failing().map(|(name, _)| name).collect(),
    };
    if !failing.is_empty() {
        io::print_hint(format!(
            "Saving is disabled until these fields are fixed: {}",
            failing.join(", ")
        ));
    }
    Ok(())
}

fn cmd_save(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = parse_form(args, SAVE_USAGE)?;
    match context.page_mut()?.save(kind)? {
        SaveOutcome::Saved(changes) => {
            let names: Vec<&str> = changes.iter().map(|change| change.field).collect();
            io::print_success(format!(
                "Saved {} field(s) of {}: {}",
                changes.len(),
                fields::form_title(kind),
                names.join(", ")
            ));
        }
        SaveOutcome::Unchanged => io::print_info("No changes to save."),
    }
    Ok(())
}

fn cmd_cancel(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let kind = parse_form(args, CANCEL_USAGE)?;
    context.page_mut()?.cancel(kind)?;
    io::print_info(format!("Changes to {} discarded.", fields::form_title(kind)));
    Ok(())
}

fn cmd_reload(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.page.is_none() {
        return Err(CommandError::NotSignedIn);
    }
    if context.mount_page()? {
        io::print_success("Profile reloaded.");
    } else {
        io::print_warning("No user record matches the session; the profile is empty.");
    }
    Ok(())
}
