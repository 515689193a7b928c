//! Command line argument parsing and validation.
//!
//! This module provides comprehensive CLI argument parsing using clap,
//! with proper validation and error handling.

use std::{path::PathBuf, time::Duration};

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::bundler::{
    CompileTarget, Topology,
    settings::{DEFAULT_NAME, DEFAULT_VERSION},
};

/// Flutter web to Chrome extension packager
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_extension",
    version,
    about = "Packages Flutter web builds as Chrome extensions",
    long_about = "Packages a Flutter web build as a Manifest V3 Chrome extension.

The bootstrap script is rewritten so every asset, module and engine file is
loaded from the chrome-extension:// origin. The app runs either in a toolbar
popup or in a draggable overlay injected into every page.

Usage:
  kodegen_bundler_extension build --output chrome-extension
  kodegen_bundler_extension build --output ext --mode overlay --target interpreted --no-debug
  kodegen_bundler_extension compose --config apps.json --package build/unpacked
  kodegen_bundler_extension diff --original flutter.js --modified flutter.patched.js --output flutter.js.patch

Exit code 0 = the package (or patch output) exists at the given path."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Print additional progress details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build one Flutter project into an extension directory
    Build(BuildArgs),
    /// Compose several Flutter projects into one multi-app package
    Compose(ComposeArgs),
    /// Write a patch that turns one file into another
    Diff(DiffArgs),
    /// Apply a patch file with fuzzy matching
    Apply(ApplyArgs),
}

#[derive(ClapArgs, Debug)]
pub struct BuildArgs {
    /// Output directory for the extension (erased first)
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Extension name
    #[arg(long, default_value = DEFAULT_NAME)]
    pub name: String,

    /// Extension version
    #[arg(long = "version", value_name = "VERSION", default_value = DEFAULT_VERSION)]
    pub extension_version: String,

    /// Extension description (derived from mode and target when omitted)
    #[arg(long)]
    pub description: Option<String>,

    /// Compile target: binary (dart2wasm) or interpreted (dart2js)
    #[arg(short, long, value_enum, default_value_t = CompileTarget::Binary)]
    pub target: CompileTarget,

    /// Where the app runs: popup or overlay
    #[arg(short, long, value_enum, default_value_t = Topology::Popup)]
    pub mode: Topology,

    /// Skip `flutter build web` and package the existing build
    #[arg(long)]
    pub no_build: bool,

    /// Remove console diagnostics from generated scripts
    #[arg(long)]
    pub no_debug: bool,

    /// Flutter project root
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Compiled web output [default: <project-dir>/build/web]
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Time limit for `flutter build web`, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Time limit for the whole run, in seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Also write the package as a zip archive
    #[arg(long, value_name = "PATH")]
    pub zip: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct ComposeArgs {
    /// Project descriptor (JSON, or TOML by extension)
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Package root the apps are copied into
    #[arg(short, long, value_name = "DIR")]
    pub package: PathBuf,

    /// Clone directory for remote projects [default: <config dir>/.workspace]
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Reuse each project's existing build/web
    #[arg(long)]
    pub no_build: bool,

    /// Maximum concurrent builds [default: CPU count]
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Time limit per project build, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct DiffArgs {
    /// Known original text
    #[arg(long, value_name = "FILE")]
    pub original: PathBuf,

    /// Desired text
    #[arg(long, value_name = "FILE")]
    pub modified: PathBuf,

    /// Patch file to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(ClapArgs, Debug)]
pub struct ApplyArgs {
    /// Patch file written by `diff`
    #[arg(long, value_name = "FILE")]
    pub patch: PathBuf,

    /// Text to patch
    #[arg(long, value_name = "FILE")]
    pub original: PathBuf,

    /// Where to write the result
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Lines a hunk may have moved [default: 64]
    #[arg(long, value_name = "N")]
    pub window: Option<usize>,

    /// Context lines that may be ignored per hunk side [default: 2]
    #[arg(long, value_name = "N")]
    pub fuzz: Option<usize>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Build(build) => {
                if build.output.as_os_str().is_empty() {
                    return Err("Output directory cannot be empty".to_string());
                }
                if build.name.trim().is_empty() {
                    return Err("Extension name cannot be empty".to_string());
                }
                if build.extension_version.trim().is_empty() {
                    return Err("Extension version cannot be empty".to_string());
                }
                if build.timeout == Some(0) || build.deadline == Some(0) {
                    return Err("Time limits must be at least one second".to_string());
                }
            }
            Command::Compose(compose) => {
                if compose.jobs == Some(0) {
                    return Err("--jobs must be at least 1".to_string());
                }
                if compose.timeout == Some(0) {
                    return Err("Time limits must be at least one second".to_string());
                }
            }
            Command::Diff(_) | Command::Apply(_) => {}
        }
        Ok(())
    }
}

/// Seconds from the command line as a [`Duration`].
pub fn seconds(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let mut output = super::OutputManager::new(args.verbose, args.quiet);
        if std::env::var_os("NO_COLOR").is_some() {
            output = output.without_color();
        }

        Self { output }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print error message
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.output.error(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
