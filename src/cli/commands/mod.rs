pub mod config;
pub mod profile;
pub mod session;
pub mod system;

use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in session::definitions()
        .into_iter()
        .chain(profile::definitions())
        .chain(config::definitions())
        .chain(system::definitions())
    {
        registry.register(entry);
    }
}
