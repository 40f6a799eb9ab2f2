//! Shared helpers for integration tests.

use dyne::{App, Settings};

/// App with access logging quieted so test output stays clean.
pub fn app() -> App {
    let mut settings = Settings::default();
    settings.logging.access_log = false;
    App::with_settings(settings)
}
