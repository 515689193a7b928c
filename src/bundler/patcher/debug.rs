//! Console diagnostics compiled into generated JavaScript.
//!
//! Every diagnostic in the generated code is a named [`LogPoint`]. A
//! [`LogTable`] resolves all of them once per run to either the console
//! statement or an inert comment, so templates never branch on the mode.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

/// Whether generated code logs to the browser console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugMode {
    /// Every log point becomes a console call.
    #[default]
    Verbose,
    /// Every log point becomes a comment.
    Silent,
}

macro_rules! log_points {
    ($( $variant:ident => $key:literal, $method:literal, $message:literal $(, $arg:literal)* ; )+) => {
        /// A named diagnostic location in generated JavaScript.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum LogPoint {
            $( $variant, )+
        }

        impl LogPoint {
            /// Every log point, in declaration order.
            pub const ALL: &'static [LogPoint] = &[ $( LogPoint::$variant, )+ ];

            /// Template key.
            pub fn key(self) -> &'static str {
                match self {
                    $( Self::$variant => $key, )+
                }
            }

            fn console_call(self) -> String {
                match self {
                    $( Self::$variant => {
                        let args: &[&str] = &[ $( $arg ),* ];
                        let mut call = format!("console.{}('{}'", $method, $message);
                        for arg in args {
                            call.push_str(", ");
                            call.push_str(arg);
                        }
                        call.push_str(");");
                        call
                    } )+
                }
            }
        }
    };
}

log_points! {
    // bootstrap instrumentation
    PatchStart => "patch_start", "log", "Applying Chrome extension Flutter patch...";
    ExtensionId => "extension_id", "log", "Extension ID detected:", "extensionId";
    ExtensionIdMissing => "extension_id_missing", "error", "Extension ID not detected - Flutter URLs will not work properly";
    FetchIntercepted => "fetch_intercepted", "log", "Flutter fetch intercepted:", "url";
    FetchRedirected => "fetch_redirected", "log", "Flutter fetch redirected:", "url", "'->'", "newUrl";
    ImportIntercepted => "import_intercepted", "log", "Dynamic import intercepted:", "url";
    ImportRedirected => "import_redirected", "log", "Dynamic import redirected:", "url", "'->'", "newUrl";
    PathResolved => "path_resolved", "log", "Flutter c() function redirected:", "parts", "'->'", "fullUrl";
    CanvasKitRedirected => "canvaskit_redirected", "log", "Redirecting CDN CanvasKit load to local copy:", "value", "'->'", "localPath";
    DescriptorInstalled => "descriptor_installed", "log", "Setting buildConfig for", "compileTarget";
    InitStart => "init_start", "log", "Starting Flutter initialization with Chrome extension configuration...";
    EntrypointLoading => "entrypoint_loading", "log", "Loading Flutter entrypoint with renderer:", "renderer";
    EntrypointUrl => "entrypoint_url", "log", "Using Chrome extension URL for entrypoint:", "url";
    EntrypointUrlFallback => "entrypoint_url_fallback", "warn", "Extension ID not available, using relative URL";
    EntrypointLoaded => "entrypoint_loaded", "log", "Flutter entrypoint loaded, initializing engine...";
    HostFound => "host_found", "log", "Using Chrome extension container as Flutter host:", "container";
    HostMissing => "host_missing", "error", "Flutter container not found! Falling back to body";
    EngineReady => "engine_ready", "log", "Flutter engine initialized, running app...";
    AppStarted => "app_started", "log", "Flutter app started successfully in Chrome extension container";
    AppFailed => "app_failed", "error", "Error initializing Flutter engine in Chrome extension:", "error";
    PatchEnd => "patch_end", "log", "Chrome extension Flutter patch applied";

    // popup loader
    PopupConfig => "popup_config", "log", "Configuring Flutter for Chrome extension environment...";

    // overlay loader
    ContentConfig => "content_config", "log", "Configuring Flutter for Chrome content script environment...";
    ContentFetchIntercepted => "content_fetch_intercepted", "log", "Flutter fetch intercepted:", "url";
    ContentFetchRedirected => "content_fetch_redirected", "log", "Flutter fetch redirected:", "url", "'->'", "newUrl";
    ContentImportIntercepted => "content_import_intercepted", "log", "Dynamic import intercepted:", "url";
    ContentImportRedirected => "content_import_redirected", "log", "Dynamic import redirected:", "url", "'->'", "newUrl";
    ContentReady => "content_ready", "log", "Flutter loader ready, starting Chrome content script initialization...";
    ContentDelegated => "content_delegated", "log", "Flutter initialization delegated to patched bootstrap";

    // overlay controller
    ContentLoaded => "content_loaded", "log", "Flutter Extension Content Script loaded";
    OverlayCreate => "overlay_create", "log", "Creating Flutter overlay window...";
    OverlayCreated => "overlay_created", "log", "Flutter overlay window created";
    OverlayShown => "overlay_shown", "log", "Flutter overlay shown";
    OverlayInit => "overlay_init", "log", "Starting Flutter initialization after overlay is ready...";
    OverlayHidden => "overlay_hidden", "log", "Flutter overlay hidden";
    ContentInit => "content_init", "log", "Initializing Flutter in content script...";
    ContentSkip => "content_skip", "log", "Flutter already initialized, skipping...";
    ContentExtensionId => "content_extension_id", "log", "Setting global extension ID for Flutter:", "extensionId";
    InitScriptLoaded => "init_script_loaded", "log", "Flutter init script loaded successfully in content script";
    InitScriptFailed => "init_script_failed", "error", "Failed to load Flutter initialization script in content script";
    BootstrapLoaded => "bootstrap_loaded", "log", "Flutter bootstrap loaded successfully in content script";
    BootstrapFailed => "bootstrap_failed", "error", "Failed to load Flutter bootstrap script in content script";
    ContentInitialized => "content_initialized", "log", "Flutter Extension Content Script initialized. Press Ctrl+Shift+F to toggle.";
}

impl fmt::Display for LogPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Every log point resolved to its emitted statement.
///
/// Serializes as a map from [`LogPoint::key`] to statement so templates
/// reference `{{debug.<key>}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct LogTable {
    statements: BTreeMap<&'static str, String>,
}

impl LogTable {
    /// Resolves every log point for `mode`.
    pub fn new(mode: DebugMode) -> Self {
        let statements = LogPoint::ALL
            .iter()
            .map(|&point| {
                let statement = match mode {
                    DebugMode::Verbose => point.console_call(),
                    DebugMode::Silent => format!("/* {point} */"),
                };
                (point.key(), statement)
            })
            .collect();
        Self { statements }
    }

    /// The statement emitted for `point`.
    pub fn statement(&self, point: LogPoint) -> &str {
        self.statements
            .get(point.key())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_points_are_console_calls() {
        let table = LogTable::new(DebugMode::Verbose);
        assert_eq!(
            table.statement(LogPoint::FetchRedirected),
            "console.log('Flutter fetch redirected:', url, '->', newUrl);"
        );
        assert_eq!(
            table.statement(LogPoint::HostMissing),
            "console.error('Flutter container not found! Falling back to body');"
        );
    }

    #[test]
    fn silent_points_are_inert_markers() {
        let table = LogTable::new(DebugMode::Silent);
        for &point in LogPoint::ALL {
            let statement = table.statement(point);
            assert!(statement.starts_with("/* ") && statement.ends_with(" */"));
            assert!(!statement.contains("console"));
        }
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = LogPoint::ALL.iter().map(|p| p.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), LogPoint::ALL.len());
    }
}
