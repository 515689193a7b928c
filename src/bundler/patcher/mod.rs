//! Structural rewrites of Flutter's generated scripts.
//!
//! [`patch_bootstrap`] turns `flutter_bootstrap.js` into a loader that works
//! from a `chrome-extension://` origin: the auto-start code is stripped and
//! an instrumentation block is appended that re-points URL resolution at the
//! extension and starts the app in the extension's container element.
//! [`patch_application`] does the equivalent for a compiled `main.dart.js`
//! hosted next to other apps in one overlay package.

mod app;
mod debug;
mod strip;
mod template;

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

pub use app::{APP_DIR_MARKER, patch_application};
pub use debug::{DebugMode, LogPoint, LogTable};
pub use strip::{Stripped, contains_auto_start, engine_revision, strip};
pub use template::{BEGIN_MARKER, END_MARKER};

use crate::bundler::{
    CompileTarget, Settings,
    error::{ErrorExt, Result},
    globals::{ShimGlobals, js_string},
};

/// Engine revision used when the stripped configuration carried none.
pub const DEFAULT_ENGINE_REVISION: &str = "1c9c20e7c3dd48c66f400a24d48ea806b4ab312a";

/// Bootstrap file name in the compiled output.
pub const BOOTSTRAP_FILE: &str = "flutter_bootstrap.js";

/// Suffix of the pre-patch copy written next to the bootstrap.
pub const BACKUP_SUFFIX: &str = ".backup";

/// The `_flutter.buildConfig` installed by the instrumentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDescriptor {
    pub engine_revision: String,
    pub builds: Vec<BuildVariant>,
}

/// One entry of [`BuildDescriptor::builds`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildVariant {
    pub compile_target: &'static str,
    pub renderer: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_wasm_path: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js_support_runtime_path: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_js_path: Option<&'static str>,
}

impl BuildDescriptor {
    /// The single-variant descriptor for `target`.
    pub fn for_target(target: CompileTarget, engine_revision: impl Into<String>) -> Self {
        let variant = match target {
            CompileTarget::Binary => BuildVariant {
                compile_target: target.compiler(),
                renderer: target.renderer(),
                main_wasm_path: Some("main.dart.wasm"),
                js_support_runtime_path: Some("main.dart.mjs"),
                main_js_path: None,
            },
            CompileTarget::Interpreted => BuildVariant {
                compile_target: target.compiler(),
                renderer: target.renderer(),
                main_wasm_path: None,
                js_support_runtime_path: None,
                main_js_path: Some("main.dart.js"),
            },
        };
        Self {
            engine_revision: engine_revision.into(),
            builds: vec![variant],
        }
    }
}

/// Rewrites bootstrap text for the extension origin.
pub fn patch_bootstrap(text: &str, settings: &Settings) -> Result<String> {
    patch_bootstrap_with(text, settings, &ShimGlobals::default())
}

/// [`patch_bootstrap`] with explicit page globals.
///
/// An instrumentation block left by an earlier run is dropped before the
/// strip, so the result does not depend on whether `text` was patched.
pub fn patch_bootstrap_with(text: &str, settings: &Settings, globals: &ShimGlobals) -> Result<String> {
    let (fresh, earlier_revision) = match text.find(BEGIN_MARKER) {
        Some(at) => {
            log::warn!("bootstrap already instrumented, replacing the earlier block");
            (&text[..at], engine_revision(&text[at..]))
        }
        None => (text, None),
    };

    let stripped = strip(fresh)?;
    if stripped.removed_calls == 0 && earlier_revision.is_none() {
        log::warn!("no auto-start loader call found in bootstrap");
    }

    let target = settings.compile_target();
    let revision = stripped
        .engine_revision
        .clone()
        .or(earlier_revision)
        .unwrap_or_else(|| DEFAULT_ENGINE_REVISION.to_string());
    let descriptor = BuildDescriptor::for_target(target, revision);

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_template_string("bootstrap", template::BOOTSTRAP_TEMPLATE)?;

    let data = json!({
        "begin_marker": BEGIN_MARKER,
        "end_marker": END_MARKER,
        "debug": LogTable::new(settings.debug_mode()),
        "binary": target == CompileTarget::Binary,
        "compile_target": js_string(target.compiler()),
        "renderer": js_string(target.renderer()),
        "build_config": serde_json::to_string_pretty(&descriptor)?,
        "container_id": js_string(&globals.container_id),
        "extension_id_var": js_string(&globals.extension_id_var),
        "entrypoint": js_string("main.dart.js"),
    });
    let block = handlebars.render("bootstrap", &data)?;

    let mut out = stripped.text;
    let kept = out.trim_end().len();
    out.truncate(kept);
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(&block);
    Ok(out)
}

/// Patches a bootstrap file in place, keeping a byte copy at `<path>.backup`.
///
/// Returns the backup path. The backup is written before the bootstrap is
/// touched and is left behind if patching fails.
pub async fn patch_bootstrap_file(path: &Path, settings: &Settings) -> Result<PathBuf> {
    let backup = backup_path(path);
    tokio::fs::copy(path, &backup)
        .await
        .fs_context("failed to back up bootstrap", &backup)?;

    let text = tokio::fs::read_to_string(path)
        .await
        .fs_context("failed to read bootstrap", path)?;
    let patched = patch_bootstrap(&text, settings)?;
    tokio::fs::write(path, patched)
        .await
        .fs_context("failed to write patched bootstrap", path)?;

    log::info!("patched {}", path.display());
    Ok(backup)
}

/// `<path>.backup`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{SettingsBuilder, Topology};

    const FRESH: &str = r#"(()=>{var _flutter = window._flutter = {};})();
_flutter.buildConfig = {"engineRevision":"feedbeef","builds":[{"compileTarget":"dart2js","renderer":"canvaskit","mainJsPath":"main.dart.js"}]};

_flutter.loader.load({
  serviceWorkerSettings: {
    serviceWorkerVersion: "1234"
  }
});
"#;

    fn settings(target: CompileTarget, debug: bool) -> Settings {
        SettingsBuilder::new()
            .output_dir("out")
            .compile_target(target)
            .topology(Topology::Popup)
            .debug_logging(debug)
            .build()
            .unwrap()
    }

    #[test]
    fn output_never_matches_strip_pattern() {
        for target in [CompileTarget::Binary, CompileTarget::Interpreted] {
            for debug in [true, false] {
                let out = patch_bootstrap(FRESH, &settings(target, debug)).unwrap();
                assert!(!contains_auto_start(&out), "{target} debug={debug}");
            }
        }
    }

    #[test]
    fn binary_target_installs_wasm_descriptor() {
        let out = patch_bootstrap(FRESH, &settings(CompileTarget::Binary, true)).unwrap();
        assert!(out.contains(r#""compileTarget": "dart2wasm""#));
        assert!(out.contains(r#""renderer": "skwasm""#));
        assert!(out.contains(r#""mainWasmPath": "main.dart.wasm""#));
        assert!(out.contains(r#""jsSupportRuntimePath": "main.dart.mjs""#));
        assert!(out.contains(r#""engineRevision": "feedbeef""#));
        assert!(out.contains("flutterLoader.load({"));
        assert!(!out.contains("loadEntrypoint"));
    }

    #[test]
    fn interpreted_target_uses_entrypoint_loader() {
        let out = patch_bootstrap(FRESH, &settings(CompileTarget::Interpreted, true)).unwrap();
        assert!(out.contains(r#""mainJsPath": "main.dart.js""#));
        assert!(out.contains("flutterLoader.loadEntrypoint({"));
        assert!(!out.contains("mainWasmPath"));
    }

    #[test]
    fn instrumentation_covers_every_resolution_path() {
        let out = patch_bootstrap(FRESH, &settings(CompileTarget::Binary, true)).unwrap();
        for needle in [
            "chrome.runtime.id",
            r#"window["FLUTTER_EXTENSION_ID"]"#,
            r#"script[src*="chrome-extension://"]"#,
            "document.currentScript",
            "Object.defineProperty(document, 'baseURI'",
            "window.fetch = function",
            "window.import = function",
            "window.c = function",
            "gstatic.com/flutter-canvaskit",
            "canvaskit/chromium/",
            "element.setAttribute = function",
            "Object.defineProperty(element, 'src'",
            r#"document.getElementById("flutter-extension-container")"#,
            "return document.body;",
            "await appRunner.runApp();",
        ] {
            assert!(out.contains(needle), "missing `{needle}`");
        }
    }

    #[test]
    fn extension_id_sources_are_tried_in_order() {
        let out = patch_bootstrap(FRESH, &settings(CompileTarget::Binary, true)).unwrap();
        let block = &out[out.find(BEGIN_MARKER).unwrap()..];

        let order: Vec<usize> = [
            "var extensionId = '';",
            "extensionId = chrome.runtime.id;",
            r#"extensionId = window["FLUTTER_EXTENSION_ID"];"#,
            r#"document.querySelectorAll('script[src*="chrome-extension://"]')"#,
            "const currentScript = document.currentScript;",
        ]
        .iter()
        .map(|needle| block.find(needle).unwrap_or_else(|| panic!("missing `{needle}`")))
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");
        assert!(!block.contains("var extensionId = window.extensionId;"));
    }

    #[test]
    fn silent_mode_emits_no_console_calls() {
        let out = patch_bootstrap(FRESH, &settings(CompileTarget::Binary, false)).unwrap();
        let block = &out[out.find(BEGIN_MARKER).unwrap()..];
        assert!(!block.contains("console."));
        assert!(block.contains("/* fetch_redirected */"));
    }

    #[test]
    fn repatching_replaces_previous_block() {
        let settings = settings(CompileTarget::Binary, true);
        let once = patch_bootstrap(FRESH, &settings).unwrap();
        let twice = patch_bootstrap(&once, &settings).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.matches(BEGIN_MARKER).count(), 1);
    }

    #[tokio::test]
    async fn file_patch_keeps_byte_identical_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BOOTSTRAP_FILE);
        std::fs::write(&path, FRESH).unwrap();

        let backup = patch_bootstrap_file(&path, &settings(CompileTarget::Binary, true))
            .await
            .unwrap();

        assert_eq!(backup, dir.path().join("flutter_bootstrap.js.backup"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), FRESH);
        assert!(!contains_auto_start(&std::fs::read_to_string(&path).unwrap()));
    }
}
