//! Compile target and deployment topology.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the application code is compiled by `flutter build web`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompileTarget {
    /// dart2js output rendered with CanvasKit.
    #[value(alias = "js", alias = "web")]
    Interpreted,
    /// dart2wasm output rendered with Skwasm.
    #[default]
    #[value(alias = "wasm")]
    Binary,
}

impl CompileTarget {
    /// Compiler identifier used in the build descriptor.
    pub fn compiler(self) -> &'static str {
        match self {
            Self::Interpreted => "dart2js",
            Self::Binary => "dart2wasm",
        }
    }

    /// Renderer paired with the compiler.
    pub fn renderer(self) -> &'static str {
        match self {
            Self::Interpreted => "canvaskit",
            Self::Binary => "skwasm",
        }
    }

    /// Human readable language name.
    pub fn language(self) -> &'static str {
        match self {
            Self::Interpreted => "JavaScript",
            Self::Binary => "WebAssembly",
        }
    }

    /// Extra arguments for `flutter build web`.
    pub fn build_args(self) -> &'static [&'static str] {
        match self {
            Self::Interpreted => &["--debug"],
            Self::Binary => &["--wasm", "--debug"],
        }
    }
}

impl fmt::Display for CompileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interpreted => "interpreted",
            Self::Binary => "binary",
        })
    }
}

/// Where the application runs inside the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Isolated page opened from the toolbar icon.
    #[default]
    Popup,
    /// Floating window injected into every visited page.
    #[value(alias = "content_scripts", alias = "content-scripts")]
    #[serde(alias = "content_scripts")]
    Overlay,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Popup => "popup",
            Self::Overlay => "overlay",
        })
    }
}
