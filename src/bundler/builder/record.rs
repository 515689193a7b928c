//! `BUILD_INFO.md`, the human readable record of one packaging run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use handlebars::Handlebars;
use serde::Serialize;

use crate::bundler::{
    CompileTarget, Settings, Topology,
    error::{ErrorExt, Result},
};

/// Record file name at the package root.
pub const BUILD_INFO_FILE: &str = "BUILD_INFO.md";

const BUILD_INFO_TEMPLATE: &str = r#"# Chrome Extension Build Information

**Generated:** {{generated_at}}
**Flutter Version:** {{flutter_version}}
**Extension Name:** {{name}}
**Extension Version:** {{version}}
**Extension Mode:** {{topology}}
**Build Type:** {{compile_target}}

## Installation Instructions

1. Open Chrome and navigate to `chrome://extensions/`
2. Enable "Developer mode" in the top right corner
3. Click "Load unpacked" button
4. Select the `{{output_dir}}` directory
5. The extension should now appear in your extensions list

## Usage

{{#if overlay}}
1. The extension injects itself into every page you visit
2. Look for the floating overlay window in the top-right corner
3. Use Ctrl+Shift+F to toggle the overlay on/off
4. Drag the overlay by its title bar to move it around
5. Click the × button to close the overlay
{{else}}
1. Click on the extension icon in the Chrome toolbar
2. The Flutter app will load in the popup
{{/if}}

## Technical Details

- **Compiler**: {{compiler}} with the {{renderer}} renderer
- **Manifest Version**: 3
- **Content Security Policy**: allows `wasm-unsafe-eval` for WebAssembly

## Checksums

- `flutter_bootstrap.js`: `{{bootstrap_sha256}}`
- `flutter_bootstrap.js.backup`: `{{backup_sha256}}`
- package contents: `{{package_sha256}}`

## Files Structure

- `manifest.json`: extension configuration
{{#if overlay}}
- `content_script.js`: overlay controller injected into pages
- `content_script.css`: overlay styling
{{else}}
- `popup.html`: popup host page
{{/if}}
- `flutter_init.js`: extension-aware Flutter loader
- `flutter_bootstrap.js`: patched bootstrap (original kept as `flutter_bootstrap.js.backup`)
- `canvaskit/`: rendering engine files
- `assets/`: Flutter app assets

## Development

To rebuild this extension, run:
```bash
{{rebuild_command}}
```
"#;

/// What one run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRecord {
    pub generated_at: DateTime<Utc>,
    /// First line of `flutter --version`, or `Unknown`.
    pub flutter_version: String,
    pub name: String,
    pub version: String,
    pub topology: Topology,
    pub compile_target: CompileTarget,
    pub output_dir: PathBuf,
    pub bootstrap_sha256: String,
    pub backup_sha256: String,
    /// Digest of the package tree before the record itself was written.
    pub package_sha256: String,
    pub rebuild_command: String,
}

impl BuildRecord {
    /// Renders the record as Markdown.
    pub fn render(&self) -> Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string("build_info", BUILD_INFO_TEMPLATE)?;

        let mut data = serde_json::to_value(self)?;
        if let Some(map) = data.as_object_mut() {
            map.insert(
                "generated_at".into(),
                self.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().into(),
            );
            map.insert("output_dir".into(), self.output_dir.display().to_string().into());
            map.insert("overlay".into(), (self.topology == Topology::Overlay).into());
            map.insert("compiler".into(), self.compile_target.compiler().into());
            map.insert("renderer".into(), self.compile_target.renderer().into());
        }
        Ok(handlebars.render("build_info", &data)?)
    }

    /// Writes `BUILD_INFO.md` into `dir`, replacing any earlier record.
    pub async fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(BUILD_INFO_FILE);
        tokio::fs::write(&path, self.render()?)
            .await
            .fs_context("failed to write build record", &path)?;
        Ok(path)
    }
}

/// The CLI invocation that reproduces `settings`.
pub fn rebuild_command(settings: &Settings) -> String {
    let mut parts = vec![
        env!("CARGO_PKG_NAME").to_string(),
        "build".into(),
        format!("--output {}", quote(&settings.output_dir().display().to_string())),
        format!("--name {}", quote(settings.name())),
        format!("--version {}", quote(settings.version_string())),
        format!("--mode {}", settings.topology()),
        format!("--target {}", settings.compile_target()),
    ];
    if settings.project_dir() != Path::new(".") {
        parts.push(format!(
            "--project-dir {}",
            quote(&settings.project_dir().display().to_string())
        ));
    }
    if settings.debug_mode() == crate::bundler::patcher::DebugMode::Silent {
        parts.push("--no-debug".into());
    }
    parts.join(" ")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::SettingsBuilder;
    use chrono::TimeZone;

    fn record(topology: Topology) -> BuildRecord {
        let settings = SettingsBuilder::new()
            .output_dir("chrome-extension")
            .topology(topology)
            .debug_logging(false)
            .build()
            .unwrap();
        BuildRecord {
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            flutter_version: "Flutter 3.24.0".into(),
            name: settings.name().into(),
            version: settings.version_string().into(),
            topology,
            compile_target: settings.compile_target(),
            output_dir: settings.output_dir().to_path_buf(),
            bootstrap_sha256: "aa".into(),
            backup_sha256: "bb".into(),
            package_sha256: "cc".into(),
            rebuild_command: rebuild_command(&settings),
        }
    }

    #[test]
    fn popup_record_describes_popup_usage() {
        let text = record(Topology::Popup).render().unwrap();
        assert!(text.contains("**Generated:** 2024-05-01 12:30:00 UTC"));
        assert!(text.contains("**Flutter Version:** Flutter 3.24.0"));
        assert!(text.contains("**Extension Mode:** popup"));
        assert!(text.contains("**Build Type:** binary"));
        assert!(text.contains("`popup.html`"));
        assert!(!text.contains("Ctrl+Shift+F"));
        assert!(text.contains("`flutter_bootstrap.js`: `aa`"));
    }

    #[test]
    fn overlay_record_describes_toggle() {
        let text = record(Topology::Overlay).render().unwrap();
        assert!(text.contains("Ctrl+Shift+F"));
        assert!(text.contains("`content_script.js`"));
        assert!(!text.contains("`popup.html`"));
    }

    #[test]
    fn rebuild_command_reproduces_flags() {
        let command = record(Topology::Overlay).rebuild_command;
        assert_eq!(
            command,
            "kodegen_bundler_extension build --output \"chrome-extension\" \
             --name \"Flutter App Extension\" --version \"1.0.0\" \
             --mode overlay --target binary --no-debug"
        );
    }
}
