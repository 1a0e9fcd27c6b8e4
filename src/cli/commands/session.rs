use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::session::{Route, SessionContext};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "login",
            "Sign in with an email and open the profile page",
            "login <email>",
            cmd_login,
        ),
        CommandEntry::new(
            "whoami",
            "Show the signed-in email and matched user",
            "whoami",
            cmd_whoami,
        ),
        CommandEntry::new(
            "logout",
            "Close the session and return to the landing page",
            "logout",
            cmd_logout,
        ),
    ]
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [email] = args else {
        return Err(CommandError::InvalidArguments("usage: login <email>".into()));
    };
    context.session.sign_in(*email)?;
    if context.mount_page()? {
        io::print_success(format!("Signed in as {}.", email));
    } else {
        io::print_warning(format!(
            "Signed in as {}, but no user record matches; the profile is empty.",
            email
        ));
    }
    io::print_info(format!("Navigated to {}", context.route.path()));
    Ok(())
}

fn cmd_whoami(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let Some(user) = context.session.user() else {
        io::print_info("Not signed in.");
        return Ok(());
    };
    io::print_info(format!(
        "Signed in as {} since {}",
        user.email,
        user.signed_in_at.format("%Y-%m-%d %H:%M UTC")
    ));
    match context.page.as_ref().and_then(|page| page.user_id()) {
        Some(id) => io::print_info(format!("User record: {}", id)),
        None => io::print_info("User record: none"),
    }
    Ok(())
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let route = match context.page.as_mut() {
        Some(page) => page.log_out(&mut context.session)?,
        None => {
            context.session.log_out()?;
            Route::Landing
        }
    };
    context.page = None;
    context.route = route;
    io::print_success(format!("Signed out. Navigated to {}", route.path()));
    Ok(())
}
