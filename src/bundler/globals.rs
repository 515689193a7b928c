//! Page globals and element ids shared by the generated scripts.
//!
//! The bootstrap instrumentation and the runtime shims run in the same page
//! and find each other through these names, so both generators take them
//! from one value.

use serde::Serialize;

/// Names the generated scripts agree on at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShimGlobals {
    /// `window` property carrying the extension id into page scripts.
    pub extension_id_var: String,
    /// `window` property guarding against loading the app twice.
    pub init_flag: String,
    /// Element the Flutter view is mounted into.
    pub container_id: String,
    /// Floating overlay element.
    pub overlay_id: String,
    /// Overlay title bar used as the drag handle.
    pub header_id: String,
    /// Overlay close button.
    pub close_id: String,
    /// Key that toggles the overlay together with Ctrl+Shift.
    pub toggle_key: String,
    /// Delay before the overlay first shows itself.
    pub show_delay_ms: u32,
    /// Delay between showing the overlay and loading Flutter into it.
    pub init_delay_ms: u32,
}

impl Default for ShimGlobals {
    fn default() -> Self {
        Self {
            extension_id_var: "FLUTTER_EXTENSION_ID".into(),
            init_flag: "flutterInitialized".into(),
            container_id: "flutter-extension-container".into(),
            overlay_id: "flutter-extension-overlay".into(),
            header_id: "flutter-extension-header".into(),
            close_id: "flutter-extension-close".into(),
            toggle_key: "F".into(),
            show_delay_ms: 1000,
            init_delay_ms: 100,
        }
    }
}

/// Quotes `value` as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".into())
}
