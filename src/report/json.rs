//! JSON output for report pages.
//!
//! Serializes the same page structs the HTTP surface returns, for scripting.

use crate::pages::Page;

pub fn render(page: &Page) -> String {
    serde_json::to_string_pretty(page).unwrap_or_else(|e| {
        tracing::error!("failed to serialize report: {e}");
        String::from("{}")
    })
}
