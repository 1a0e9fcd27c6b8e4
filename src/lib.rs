#![doc(test(attr(deny(warnings))))]

//! Profile Core models the "my account" page of a storefront: two editable
//! records (personal data and payment data) with inline validation, an
//! edit/cancel/save state machine per record, and persistence through a
//! CRUD-style data service.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod profile;
pub mod session;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Profile Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }
}
