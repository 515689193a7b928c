//! End-to-end packaging runs against a pre-built fixture tree.

use std::path::{Path, PathBuf};

use kodegen_bundler_extension::bundler::{
    CompileTarget, Error, PackageSettings, Pipeline, Settings, SettingsBuilder, Stage, Topology,
    builder::checksum::calculate_sha256,
    patcher::{BEGIN_MARKER, contains_auto_start},
};
use serde_json::Value;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const BOOTSTRAP: &str = r#"(()=>{var _flutter = window._flutter = {};})();
if (!window._flutter) {
  window._flutter = {};
}
_flutter.buildConfig = {"engineRevision":"c0ffee1234","builds":[{"compileTarget":"dart2wasm","renderer":"skwasm","mainWasmPath":"main.dart.wasm","jsSupportRuntimePath":"main.dart.mjs"},{"compileTarget":"dart2js","renderer":"canvaskit","mainJsPath":"main.dart.js"}]};

_flutter.loader.load({
  serviceWorkerSettings: {
    serviceWorkerVersion: "3048349"
  }
});
"#;

/// A Flutter project with an existing `build/web`.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("app");
        let web = project.join("build/web");
        std::fs::create_dir_all(web.join("assets")).unwrap();
        std::fs::create_dir_all(web.join("canvaskit/chromium")).unwrap();
        std::fs::create_dir_all(web.join("icons")).unwrap();

        std::fs::write(project.join("pubspec.yaml"), "name: app\n").unwrap();
        std::fs::write(web.join("flutter_bootstrap.js"), BOOTSTRAP).unwrap();
        std::fs::write(web.join("flutter.js"), "// loader\n").unwrap();
        std::fs::write(web.join("main.dart.js"), "// program\n").unwrap();
        std::fs::write(web.join("main.dart.wasm"), [0u8, 97, 115, 109]).unwrap();
        std::fs::write(web.join("main.dart.mjs"), "// runtime\n").unwrap();
        std::fs::write(web.join("index.html"), "<html></html>\n").unwrap();
        std::fs::write(web.join("assets/AssetManifest.bin.json"), "\"\"").unwrap();
        std::fs::write(web.join("canvaskit/canvaskit.wasm"), [0u8]).unwrap();
        std::fs::write(web.join("canvaskit/chromium/canvaskit.js"), "// chromium\n").unwrap();
        std::fs::write(web.join("icons/Icon-192.png"), [0u8]).unwrap();

        Self { dir }
    }

    fn project(&self) -> PathBuf {
        self.dir.path().join("app")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("extension")
    }

    fn settings(&self, topology: Topology, target: CompileTarget) -> SettingsBuilder {
        SettingsBuilder::new()
            .output_dir(self.output())
            .project_dir(self.project())
            .topology(topology)
            .compile_target(target)
            .skip_build(true)
    }
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn manifest(dir: &Path) -> Value {
    serde_json::from_str(&read(dir.join("manifest.json"))).unwrap()
}

async fn run(settings: Settings) -> Result<kodegen_bundler_extension::bundler::BuildRecord, Error> {
    Pipeline::new(settings).run().await
}

#[tokio::test]
async fn binary_popup_package() {
    let fixture = Fixture::new();
    let settings = fixture
        .settings(Topology::Popup, CompileTarget::Binary)
        .package_settings(PackageSettings {
            name: "Notes".into(),
            version: "2.1.0".into(),
            description: None,
        })
        .build()
        .unwrap();

    let record = run(settings).await.unwrap();
    let out = fixture.output();

    let manifest = manifest(&out);
    assert_eq!(manifest["manifest_version"], 3);
    assert_eq!(manifest["name"], "Notes");
    assert_eq!(manifest["version"], "2.1.0");
    assert_eq!(manifest["action"]["default_popup"], "popup.html");
    assert!(manifest.get("content_scripts").is_none());
    assert_eq!(
        manifest["description"],
        "A Chrome extension popup running Flutter with WebAssembly"
    );

    let bootstrap = read(out.join("flutter_bootstrap.js"));
    assert!(!contains_auto_start(&bootstrap));
    assert_eq!(bootstrap.matches(BEGIN_MARKER).count(), 1);
    assert!(bootstrap.contains(r#""compileTarget": "dart2wasm""#));
    assert!(bootstrap.contains(r#""engineRevision": "c0ffee1234""#));
    assert_eq!(read(out.join("flutter_bootstrap.js.backup")), BOOTSTRAP);

    assert!(read(out.join("popup.html")).contains("flutter-extension-container"));
    assert!(out.join("flutter_init.js").is_file());
    assert!(!out.join("content_script.js").exists());

    // Compiled files are carried over untouched.
    assert_eq!(read(out.join("main.dart.mjs")), "// runtime\n");
    assert!(out.join("canvaskit/chromium/canvaskit.js").is_file());
    assert!(out.join("assets/AssetManifest.bin.json").is_file());

    let info = read(out.join("BUILD_INFO.md"));
    assert!(info.contains("**Extension Name:** Notes"));
    assert!(info.contains("**Extension Mode:** popup"));
    assert!(info.contains(&record.bootstrap_sha256));

    assert_eq!(record.topology, Topology::Popup);
    assert_eq!(record.compile_target, CompileTarget::Binary);
    assert_eq!(
        record.bootstrap_sha256,
        calculate_sha256(&out.join("flutter_bootstrap.js")).await.unwrap()
    );
    assert_eq!(
        record.backup_sha256,
        calculate_sha256(&out.join("flutter_bootstrap.js.backup")).await.unwrap()
    );
    assert!(!record.flutter_version.is_empty());
}

#[tokio::test]
async fn interpreted_overlay_package() {
    let fixture = Fixture::new();
    let settings = fixture
        .settings(Topology::Overlay, CompileTarget::Interpreted)
        .debug_logging(false)
        .build()
        .unwrap();

    run(settings).await.unwrap();
    let out = fixture.output();

    let manifest = manifest(&out);
    assert!(manifest.get("action").is_none());
    assert_eq!(manifest["content_scripts"][0]["run_at"], "document_end");
    assert_eq!(
        manifest["permissions"],
        serde_json::json!(["activeTab", "scripting", "storage"])
    );

    let script = read(out.join("content_script.js"));
    let set_global = script.find("window[EXTENSION_ID_VAR] = extensionId;").unwrap();
    let load_bootstrap = script.find("'flutter_bootstrap.js'").unwrap();
    assert!(set_global < load_bootstrap);
    assert!(!script.contains("console."));

    let css = read(out.join("content_script.css"));
    assert!(css.contains("position: fixed;"));
    assert!(css.contains("cursor: move;"));

    let bootstrap = read(out.join("flutter_bootstrap.js"));
    assert!(bootstrap.contains(r#""mainJsPath": "main.dart.js""#));
    assert!(!contains_auto_start(&bootstrap));
    assert!(!out.join("popup.html").exists());
}

#[tokio::test]
async fn rerun_replaces_previous_output() {
    let fixture = Fixture::new();
    let settings = fixture
        .settings(Topology::Popup, CompileTarget::Binary)
        .build()
        .unwrap();

    let first = run(settings.clone()).await.unwrap();
    std::fs::write(fixture.output().join("stale.txt"), "old").unwrap();
    let second = run(settings).await.unwrap();

    assert!(!fixture.output().join("stale.txt").exists());
    assert_eq!(first.bootstrap_sha256, second.bootstrap_sha256);
}

#[tokio::test]
async fn missing_pubspec_fails_before_output_is_touched() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.project().join("pubspec.yaml")).unwrap();
    let settings = fixture
        .settings(Topology::Popup, CompileTarget::Binary)
        .build()
        .unwrap();

    let err = run(settings).await.unwrap_err();
    assert!(matches!(err, Error::Precondition { .. }), "{err}");
    assert!(!fixture.output().exists());
}

#[tokio::test]
async fn skipped_build_needs_existing_output() {
    let fixture = Fixture::new();
    std::fs::remove_dir_all(fixture.project().join("build")).unwrap();
    let settings = fixture
        .settings(Topology::Popup, CompileTarget::Binary)
        .build()
        .unwrap();

    let err = run(settings).await.unwrap_err();
    assert!(matches!(err, Error::Precondition { .. }), "{err}");
}

#[tokio::test]
async fn missing_bootstrap_fails_the_patch_stage() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.project().join("build/web/flutter_bootstrap.js")).unwrap();
    let settings = fixture
        .settings(Topology::Popup, CompileTarget::Binary)
        .build()
        .unwrap();

    let err = run(settings).await.unwrap_err();
    match &err {
        Error::StageFailed { stage, source } => {
            assert_eq!(*stage, Stage::PatchBootstrap);
            assert!(matches!(**source, Error::BootstrapMissing { .. }), "{source}");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Earlier stages already ran.
    assert!(fixture.output().join("manifest.json").is_file());
}

#[tokio::test]
async fn cancelled_run_stops_before_the_first_stage() {
    let fixture = Fixture::new();
    let settings = fixture
        .settings(Topology::Popup, CompileTarget::Binary)
        .build()
        .unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = Pipeline::new(settings)
        .with_cancellation(cancel)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err.root(), Error::Cancelled { .. }), "{err}");
    assert!(!fixture.output().exists());
}

#[tokio::test]
async fn archive_is_written_last() {
    let fixture = Fixture::new();
    let archive = fixture.dir.path().join("extension.zip");
    let settings = fixture
        .settings(Topology::Popup, CompileTarget::Binary)
        .archive(Some(&archive))
        .build()
        .unwrap();

    run(settings).await.unwrap();

    let zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
    let names: Vec<&str> = zip.file_names().collect();
    assert!(names.contains(&"manifest.json"));
    assert!(names.contains(&"BUILD_INFO.md"));
    assert!(names.contains(&"canvaskit/chromium/canvaskit.js"));
}
