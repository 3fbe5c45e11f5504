#![doc(test(attr(deny(warnings))))]

//! Daily Checklist walks a user through a short set of habit questions each
//! day, stores the answers with a remote activity service and keeps the
//! user's own checklist items locally.

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod custom_items;
pub mod errors;
pub mod service;
pub mod storage;
pub mod summary;
pub mod time;
pub mod utils;
pub mod wizard;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Daily Checklist tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
