//! Per-app rewrite of a compiled `main.dart.js`.
//!
//! Several apps share one overlay package, each under `apps/<id>/`. The
//! compiled program assumes it owns the page's asset base, so three
//! rewrites make it derive its name and asset base from its own script URL.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::bundler::{globals::js_string, patch::PatchFailure};

/// Path segment preceding the app id in overlay script URLs.
pub const APP_DIR_MARKER: &str = "/overlay/apps/";

static PROGRAM_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(function dartProgram\(\)\s*\{").expect("Invalid program regex"));

static ENGINE_HANDOFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\w+)\.didCreateEngineInitializer\(\s*(\w+)\.(prepareEngineInitializer\$\d+)\(\)\s*\);",
    )
    .expect("Invalid engine handoff regex")
});

static ASSET_BASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"AssetManager:\s*function AssetManager\((\w+)\)\s*\{\s*this\._assetBase\s*=\s*\w+;")
        .expect("Invalid asset manager regex")
});

/// Makes a compiled program aware of the app directory it is served from.
///
/// `app_dir_marker` is the URL path segment right before the app id, e.g.
/// [`APP_DIR_MARKER`]. Every rewrite is required: a missing anchor fails
/// with the index of that rewrite and nothing is returned.
pub fn patch_application(text: &str, app_dir_marker: &str) -> Result<String, PatchFailure> {
    let helpers = format!(
        r#"(function dartProgram() {{
  var flutterExtensionScriptSrc = document.currentScript ? document.currentScript.src : '';
  function getAppName() {{
    var marker = {marker};
    var start = flutterExtensionScriptSrc.indexOf(marker);
    if (start < 0) return '';
    return flutterExtensionScriptSrc.substring(start + marker.length).split('/')[0];
  }}
  function flutterExtensionAssetBase() {{
    return flutterExtensionScriptSrc.substring(0, flutterExtensionScriptSrc.lastIndexOf('/') + 1);
  }}
"#,
        marker = js_string(app_dir_marker),
    );

    let text = replace_once(0, &PROGRAM_HEAD, text, |_| helpers.clone(), "`dartProgram` head")?;
    let text = replace_once(
        1,
        &ENGINE_HANDOFF,
        &text,
        |caps| {
            format!(
                "var engine = {}.{}();\n      engine.appname = getAppName();\n      {}.didCreateEngineInitializer(engine);",
                &caps[2], &caps[3], &caps[1]
            )
        },
        "engine initializer handoff",
    )?;
    replace_once(
        2,
        &ASSET_BASE,
        &text,
        |caps| {
            format!(
                "AssetManager: function AssetManager({}) {{\n      this._assetBase = flutterExtensionAssetBase();",
                &caps[1]
            )
        },
        "`AssetManager` asset base",
    )
}

fn replace_once(
    index: usize,
    pattern: &Regex,
    text: &str,
    replacement: impl Fn(&Captures<'_>) -> String,
    anchor: &str,
) -> Result<String, PatchFailure> {
    let caps = pattern
        .captures(text)
        .ok_or_else(|| PatchFailure::new(index, format!("anchor not found: {anchor}")))?;
    let whole = caps.get(0).map_or(0..0, |m| m.range());

    let mut out = String::with_capacity(text.len() + 512);
    out.push_str(&text[..whole.start]);
    out.push_str(&replacement(&caps));
    out.push_str(&text[whole.end..]);
    Ok(out)
}
