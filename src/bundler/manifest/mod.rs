//! Extension manifest synthesis.
//!
//! [`synthesize`] is pure: the same settings always give the same manifest.
//! It branches only on topology, which picks the activation block and adds
//! the permissions an injected overlay needs.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::bundler::{
    Settings, Topology,
    error::{ErrorExt, Result},
};

/// Manifest file name at the package root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Content security policy for extension pages. `wasm-unsafe-eval` lets
/// Skwasm and CanvasKit instantiate their modules.
pub const EXTENSION_PAGES_CSP: &str = "script-src 'self' 'wasm-unsafe-eval'; object-src 'self'; connect-src 'self' data: blob: https://fonts.gstatic.com; font-src 'self' https://fonts.gstatic.com;";

/// Resources reachable from any page. Covers both compile targets so one
/// manifest works whichever variant was built.
pub const WEB_ACCESSIBLE_RESOURCES: &[&str] = &[
    "assets/*",
    "canvaskit/*",
    "canvaskit/chromium/*",
    "canvaskit/skwasm.js",
    "canvaskit/skwasm.wasm",
    "canvaskit/skwasm_heavy.js",
    "canvaskit/skwasm_heavy.wasm",
    "canvaskit/canvaskit.js",
    "canvaskit/canvaskit.wasm",
    "*.js",
    "*.mjs",
    "*.wasm",
    "flutter.js",
    "flutter_bootstrap.js",
    "flutter_init.js",
    "flutter_service_worker.js",
    "main.dart.js",
    "main.dart.mjs",
    "main.dart.wasm",
];

/// The extension manifest, version 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDescriptor {
    pub manifest_version: u8,
    pub name: String,
    pub version: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub icons: BTreeMap<String, String>,
    pub web_accessible_resources: Vec<WebAccessibleResources>,
    pub content_security_policy: ContentSecurityPolicy,
    /// Exactly one activation block.
    #[serde(flatten)]
    pub activation: Activation,
}

/// How the extension surfaces its UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Toolbar button opening a popup page.
    Action(ActionBlock),
    /// Scripts injected into matching pages.
    ContentScripts(Vec<ContentScriptRule>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBlock {
    pub default_popup: String,
    pub default_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentScriptRule {
    pub matches: Vec<String>,
    pub js: Vec<String>,
    pub css: Vec<String>,
    pub run_at: RunAt,
}

/// Point in page load at which content scripts are injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAt {
    DocumentStart,
    DocumentEnd,
    DocumentIdle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAccessibleResources {
    pub resources: Vec<String>,
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSecurityPolicy {
    pub extension_pages: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builds the manifest for `settings`.
pub fn synthesize(settings: &Settings) -> ManifestDescriptor {
    let mut permissions = strings(&["activeTab"]);

    let activation = match settings.topology() {
        Topology::Popup => Activation::Action(ActionBlock {
            default_popup: "popup.html".into(),
            default_title: settings.name().into(),
        }),
        Topology::Overlay => {
            permissions.extend(strings(&["scripting", "storage"]));
            Activation::ContentScripts(vec![ContentScriptRule {
                matches: strings(&["<all_urls>"]),
                js: strings(&["content_script.js"]),
                css: strings(&["content_script.css"]),
                run_at: RunAt::DocumentEnd,
            }])
        }
    };

    let icons = [
        ("16", "icons/Icon-192.png"),
        ("48", "icons/Icon-192.png"),
        ("128", "icons/Icon-512.png"),
    ]
    .into_iter()
    .map(|(size, path)| (size.to_string(), path.to_string()))
    .collect();

    ManifestDescriptor {
        manifest_version: 3,
        name: settings.name().into(),
        version: settings.version_string().into(),
        description: settings.description(),
        permissions,
        icons,
        web_accessible_resources: vec![WebAccessibleResources {
            resources: strings(WEB_ACCESSIBLE_RESOURCES),
            matches: strings(&["<all_urls>"]),
        }],
        content_security_policy: ContentSecurityPolicy {
            extension_pages: EXTENSION_PAGES_CSP.into(),
        },
        activation,
    }
}

impl ManifestDescriptor {
    /// Requested paths no web-accessible pattern matches.
    ///
    /// Patterns use glob semantics where `*` also crosses `/`, as the
    /// browser matches them.
    pub fn uncovered<'r>(&self, requested: &[&'r str]) -> Result<Vec<&'r str>> {
        let patterns = self
            .web_accessible_resources
            .iter()
            .flat_map(|entry| &entry.resources)
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(requested
            .iter()
            .copied()
            .filter(|path| !patterns.iter().any(|p| p.matches(path)))
            .collect())
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes `manifest.json` into `dir`.
    pub async fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(MANIFEST_FILE);
        tokio::fs::write(&path, self.to_json()?)
            .await
            .fs_context("failed to write manifest", &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{CompileTarget, SettingsBuilder, shims::requested_resources};
    use serde_json::Value;

    fn manifest(topology: Topology) -> ManifestDescriptor {
        let settings = SettingsBuilder::new()
            .output_dir("out")
            .topology(topology)
            .build()
            .unwrap();
        synthesize(&settings)
    }

    fn json(topology: Topology) -> Value {
        serde_json::from_str(&manifest(topology).to_json().unwrap()).unwrap()
    }

    #[test]
    fn popup_has_only_action_block() {
        let value = json(Topology::Popup);
        assert_eq!(value["action"]["default_popup"], "popup.html");
        assert_eq!(value["action"]["default_title"], "Flutter App Extension");
        assert!(value.get("content_scripts").is_none());
        assert_eq!(value["permissions"], serde_json::json!(["activeTab"]));
    }

    #[test]
    fn overlay_has_only_content_scripts_and_extra_permissions() {
        let value = json(Topology::Overlay);
        assert!(value.get("action").is_none());
        let rule = &value["content_scripts"][0];
        assert_eq!(rule["matches"], serde_json::json!(["<all_urls>"]));
        assert_eq!(rule["js"], serde_json::json!(["content_script.js"]));
        assert_eq!(rule["css"], serde_json::json!(["content_script.css"]));
        assert_eq!(rule["run_at"], "document_end");
        assert_eq!(
            value["permissions"],
            serde_json::json!(["activeTab", "scripting", "storage"])
        );
    }

    #[test]
    fn both_topologies_share_resources_and_policy() {
        let popup = manifest(Topology::Popup);
        let overlay = manifest(Topology::Overlay);
        assert_eq!(popup.web_accessible_resources, overlay.web_accessible_resources);
        assert_eq!(popup.content_security_policy.extension_pages, EXTENSION_PAGES_CSP);
        assert_eq!(popup.manifest_version, 3);
        assert_eq!(popup.icons["128"], "icons/Icon-512.png");
    }

    #[test]
    fn every_shim_request_is_web_accessible() {
        for topology in [Topology::Popup, Topology::Overlay] {
            for target in [CompileTarget::Binary, CompileTarget::Interpreted] {
                let requested = requested_resources(topology, target);
                let uncovered = manifest(topology).uncovered(&requested).unwrap();
                assert!(uncovered.is_empty(), "{uncovered:?}");
            }
        }
    }

    #[test]
    fn uncovered_reports_missing_patterns() {
        let mut m = manifest(Topology::Popup);
        m.web_accessible_resources[0].resources = vec!["assets/*".into()];
        let uncovered = m.uncovered(&["assets/a.png", "main.dart.js"]).unwrap();
        assert_eq!(uncovered, ["main.dart.js"]);
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let m = manifest(Topology::Overlay);
        let parsed: ManifestDescriptor = serde_json::from_str(&m.to_json().unwrap()).unwrap();
        assert_eq!(parsed, m);
    }
}
