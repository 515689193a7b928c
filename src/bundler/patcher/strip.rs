//! Removal of the bootstrap's own auto-start code.
//!
//! `flutter build web` ends the bootstrap with a `_flutter.loader.load({...})`
//! call and a `_flutter.buildConfig = {...};` assignment. Both are located by
//! structural patterns rather than exact text so that formatting changes
//! upstream do not defeat the strip.

use std::sync::LazyLock;

use regex::Regex;

use crate::bundler::patch::PatchFailure;

/// Head of an auto-start call, up to and including its opening parenthesis.
static LOAD_CALL_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bwindow\s*\.\s*)?\b_flutter\s*\.\s*loader\s*\.\s*load\s*\(")
        .expect("Invalid loader call regex")
});

/// A complete build configuration assignment.
static BUILD_CONFIG_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bwindow\s*\.\s*)?\b_flutter\s*\.\s*buildConfig\s*=[^=][^;]*;")
        .expect("Invalid build config regex")
});

static ENGINE_REVISION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?engineRevision["']?\s*:\s*["']([0-9A-Za-z_.-]+)["']"#)
        .expect("Invalid engine revision regex")
});

/// Result of stripping a bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stripped {
    /// Bootstrap text without auto-start code.
    pub text: String,
    /// Engine revision found in the removed build configuration.
    pub engine_revision: Option<String>,
    /// Number of loader calls removed.
    pub removed_calls: usize,
    /// Number of build configuration assignments removed.
    pub removed_configs: usize,
}

/// Whether `text` still contains code the strip step removes.
pub fn contains_auto_start(text: &str) -> bool {
    LOAD_CALL_HEAD.is_match(text) || BUILD_CONFIG_ASSIGNMENT.is_match(text)
}

/// First `engineRevision` value in `text`.
pub fn engine_revision(text: &str) -> Option<String> {
    ENGINE_REVISION.captures(text).map(|caps| caps[1].to_string())
}

/// Removes every auto-start loader call and build configuration assignment.
///
/// A no-op when neither is present. Fails only when a loader call is not
/// closed before the end of the text.
pub fn strip(text: &str) -> Result<Stripped, PatchFailure> {
    let engine_revision = BUILD_CONFIG_ASSIGNMENT
        .find_iter(text)
        .find_map(|m| engine_revision(m.as_str()));

    let removed_configs = BUILD_CONFIG_ASSIGNMENT.find_iter(text).count();
    let without_config = BUILD_CONFIG_ASSIGNMENT.replace_all(text, "");

    let mut out = String::with_capacity(without_config.len());
    let mut pos = 0;
    let mut removed_calls = 0;
    while let Some(head) = LOAD_CALL_HEAD.find_at(&without_config, pos) {
        let open = head.end() - 1;
        let close = call_end(&without_config, open).ok_or_else(|| {
            PatchFailure::new(0, format!("unterminated loader call at byte {}", head.start()))
        })?;
        out.push_str(&without_config[pos..head.start()]);
        pos = statement_end(&without_config, close);
        removed_calls += 1;
    }
    out.push_str(&without_config[pos..]);

    if removed_calls + removed_configs > 0 {
        log::debug!("stripped {removed_calls} loader call(s) and {removed_configs} build config(s)");
    }

    Ok(Stripped {
        text: out,
        engine_revision,
        removed_calls,
        removed_configs,
    })
}

/// Index just past the bracket closing the one at `open`.
///
/// Skips string literals, template literals and comments. Regular
/// expression literals are not recognized.
fn call_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i = skip_quoted(bytes, i + 1, quote)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |p| i + p);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..].find("*/").map(|p| i + 2 + p + 2)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> Option<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Extends a call ending at `close` over a trailing semicolon, if any.
fn statement_end(text: &str, close: usize) -> usize {
    let rest = &text[close..];
    let trimmed = rest.trim_start_matches([' ', '\t']);
    if trimmed.starts_with(';') {
        close + (rest.len() - trimmed.len()) + 1
    } else {
        close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERATED: &str = r#"(()=>{var a=1;})();
_flutter.buildConfig = {"engineRevision":"abc123","builds":[{"compileTarget":"dart2js","renderer":"canvaskit","mainJsPath":"main.dart.js"}]};

_flutter.loader.load({
  serviceWorkerSettings: {
    serviceWorkerVersion: "42" /* ) */
  },
  onEntrypointLoaded: async function(e) { const s = ")}"; await e.initializeEngine(); }
});
console.log('tail');
"#;

    #[test]
    fn removes_loader_call_and_build_config() {
        let stripped = strip(GENERATED).unwrap();
        assert_eq!(stripped.removed_calls, 1);
        assert_eq!(stripped.removed_configs, 1);
        assert_eq!(stripped.engine_revision.as_deref(), Some("abc123"));
        assert!(!contains_auto_start(&stripped.text));
        assert!(stripped.text.starts_with("(()=>{var a=1;})();"));
        assert!(stripped.text.ends_with("console.log('tail');\n"));
    }

    #[test]
    fn tolerates_window_prefix_and_spacing() {
        let text = "window._flutter . loader.load ( {config: {}} ) ;\nrest();";
        let stripped = strip(text).unwrap();
        assert_eq!(stripped.text, "\nrest();");
    }

    #[test]
    fn absent_patterns_are_a_no_op() {
        let text = "console.log('nothing to do');\n";
        let stripped = strip(text).unwrap();
        assert_eq!(stripped.text, text);
        assert_eq!(stripped.removed_calls + stripped.removed_configs, 0);
    }

    #[test]
    fn unterminated_call_is_reported() {
        assert!(strip("_flutter.loader.load({ oops").is_err());
    }

    #[test]
    fn load_entrypoint_is_not_an_auto_start_call() {
        assert!(!contains_auto_start("_flutter.loader.loadEntrypoint({});"));
    }
}
