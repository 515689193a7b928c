//! Runtime shims shipped inside the package.
//!
//! These run in the browser, not during the build. The popup topology gets a
//! loader and a fixed-size host page; the overlay topology gets a loader for
//! the page-injection context, the overlay controller and its stylesheet.

mod template;

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde_json::{Value, json};

pub use crate::bundler::globals::ShimGlobals;
use crate::bundler::{
    CompileTarget, Settings, Topology,
    error::{ErrorExt, Result},
    globals::js_string,
    patcher::LogTable,
};

/// Popup page dimensions in CSS pixels.
pub const POPUP_SIZE: (u32, u32) = (500, 600);

/// A file produced by the generator, relative to the package root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: &'static str,
    pub contents: String,
}

/// Renders the topology-specific shims for one build.
pub struct ShimGenerator<'a> {
    settings: &'a Settings,
    globals: ShimGlobals,
}

impl<'a> ShimGenerator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self::with_globals(settings, ShimGlobals::default())
    }

    pub fn with_globals(settings: &'a Settings, globals: ShimGlobals) -> Self {
        Self { settings, globals }
    }

    pub fn globals(&self) -> &ShimGlobals {
        &self.globals
    }

    /// Renders every shim for the configured topology.
    pub fn generate(&self) -> Result<Vec<GeneratedFile>> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        let sources: &[(&'static str, &str)] = match self.settings.topology() {
            Topology::Popup => &[
                ("flutter_init.js", template::POPUP_INIT_JS),
                ("popup.html", template::POPUP_HTML),
            ],
            Topology::Overlay => &[
                ("flutter_init.js", template::OVERLAY_INIT_JS),
                ("content_script.js", template::CONTENT_SCRIPT_JS),
                ("content_script.css", template::CONTENT_SCRIPT_CSS),
            ],
        };

        let data = self.template_data();
        sources
            .iter()
            .map(|&(path, source)| -> Result<GeneratedFile> {
                handlebars.register_template_string(path, source)?;
                let contents = handlebars.render(path, &data)?;
                Ok(GeneratedFile { path, contents })
            })
            .collect()
    }

    /// Renders and writes every shim into `dir`.
    pub async fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for file in self.generate()? {
            let path = dir.join(file.path);
            tokio::fs::write(&path, file.contents)
                .await
                .fs_context("failed to write shim", &path)?;
            log::debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    fn template_data(&self) -> Value {
        let g = &self.globals;
        let name = self.settings.name();
        let description = self.settings.description();
        json!({
            "debug": LogTable::new(self.settings.debug_mode()),
            "ids": {
                "container_id": g.container_id,
                "overlay_id": g.overlay_id,
                "header_id": g.header_id,
                "close_id": g.close_id,
            },
            "js": {
                "container_id": js_string(&g.container_id),
                "overlay_id": js_string(&g.overlay_id),
                "header_id": js_string(&g.header_id),
                "close_id": js_string(&g.close_id),
                "extension_id_var": js_string(&g.extension_id_var),
                "init_flag": js_string(&g.init_flag),
                "toggle_key": js_string(&g.toggle_key),
                "name": js_string(name),
            },
            "html": {
                "name": handlebars::html_escape(name),
                "description": handlebars::html_escape(&description),
            },
            "timing": {
                "show_delay_ms": g.show_delay_ms,
                "init_delay_ms": g.init_delay_ms,
            },
            "popup": {
                "width": POPUP_SIZE.0,
                "height": POPUP_SIZE.1,
            },
        })
    }
}

/// Every package path the shims and the patched bootstrap fetch at runtime.
///
/// The manifest must expose all of these as web-accessible resources, or
/// the overlay topology fails with resource-denied errors.
pub fn requested_resources(topology: Topology, target: CompileTarget) -> Vec<&'static str> {
    let mut resources = vec![
        "flutter_bootstrap.js",
        "flutter.js",
        "assets/AssetManifest.bin.json",
        "assets/FontManifest.json",
        "canvaskit/canvaskit.js",
        "canvaskit/canvaskit.wasm",
        "canvaskit/chromium/canvaskit.js",
        "canvaskit/chromium/canvaskit.wasm",
    ];
    match target {
        CompileTarget::Binary => resources.extend([
            "main.dart.wasm",
            "main.dart.mjs",
            "canvaskit/skwasm.js",
            "canvaskit/skwasm.wasm",
        ]),
        CompileTarget::Interpreted => resources.push("main.dart.js"),
    }
    if topology == Topology::Overlay {
        resources.push("flutter_init.js");
    }
    resources
}
